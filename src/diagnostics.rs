//! Diagnostic logging that works on both web and native targets.

#[cfg(target_arch = "wasm32")]
pub fn log_error(scope: &str, details: &str) {
    web_sys::console::error_1(&format!("[{scope}] {details}").into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log_error(scope: &str, details: &str) {
    eprintln!("[{scope}] {details}");
}
