use crate::api::{SignUpOutcome, SupabaseClient};
use crate::components::Route;
use crate::db;
use crate::diagnostics::log_error;
use crate::session::SessionStore;
use dioxus::prelude::*;

const MIN_PASSWORD_LENGTH: usize = 6;

/// Client-side checks before any request leaves the page.
fn validate_credentials(email: &str, password: &str) -> Option<&'static str> {
    if email.trim().is_empty() || password.is_empty() {
        return Some("Please fill in all fields");
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Some("Password must be at least 6 characters long");
    }
    None
}

#[component]
pub fn Auth() -> Element {
    let client = use_context::<SupabaseClient>();
    let session = use_context::<Signal<SessionStore>>();
    let navigator = use_navigator();

    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut busy = use_signal(|| false);

    let on_login = {
        let client = client.clone();
        move |_| {
            if busy() {
                return;
            }
            if let Some(message) = validate_credentials(&email(), &password()) {
                crate::utils::notify_user(message);
                return;
            }
            busy.set(true);
            let client = client.clone();
            let email_value = email().trim().to_string();
            let password_value = password();
            spawn(async move {
                let mut session = session;
                let mut busy = busy;
                match client.sign_in(&email_value, &password_value).await {
                    Ok(established) => {
                        if let Err(err) = db::save_session(&established).await {
                            log_error("db", &format!("failed to persist session: {err}"));
                        }
                        session.with_mut(|s| s.establish(established));
                        navigator.replace(Route::Home {});
                    }
                    Err(err) => {
                        log_error("auth", &format!("login failed: {err}"));
                        crate::utils::notify_user(&format!("Error: {err}"));
                    }
                }
                busy.set(false);
            });
        }
    };

    let on_sign_up = {
        let client = client.clone();
        move |_| {
            if busy() {
                return;
            }
            if let Some(message) = validate_credentials(&email(), &password()) {
                crate::utils::notify_user(message);
                return;
            }
            busy.set(true);
            let client = client.clone();
            let email_value = email().trim().to_string();
            let password_value = password();
            spawn(async move {
                let mut session = session;
                let mut busy = busy;
                match client.sign_up(&email_value, &password_value).await {
                    Ok(SignUpOutcome::SignedIn(established)) => {
                        if let Err(err) = db::save_session(&established).await {
                            log_error("db", &format!("failed to persist session: {err}"));
                        }
                        session.with_mut(|s| s.establish(established));
                        navigator.replace(Route::Home {});
                    }
                    Ok(SignUpOutcome::ConfirmationRequired) => {
                        crate::utils::notify_user("Check your email for confirmation.");
                    }
                    Err(err) => {
                        log_error("auth", &format!("sign-up failed: {err}"));
                        crate::utils::notify_user(&format!("Error: {err}"));
                    }
                }
                busy.set(false);
            });
        }
    };

    rsx! {
        div { class: "bg-[#22221E]",
            div { class: "flex justify-center items-center h-screen",
                div { class: "flex flex-row bg-[#59ADFD] shadow-xl h-[60%] w-[70%] rounded-[10px] text-gray-800",
                    div { class: "flex flex-col justify-center items-center w-full gap-6",
                        p { class: "bg-blue-500 text-xl pl-12 pr-12 pt-3 pb-3 rounded-md",
                            "Welcome To Chelly"
                        }
                        input {
                            value: "{email}",
                            oninput: move |e| email.set(e.value()),
                            r#type: "email",
                            placeholder: "Email",
                            class: "rounded-md w-[40%] h-10 p-2",
                        }
                        input {
                            value: "{password}",
                            oninput: move |e| password.set(e.value()),
                            r#type: "password",
                            placeholder: "Password",
                            class: "rounded-md w-[40%] h-10 p-2",
                        }
                        div { class: "flex flex-row",
                            button {
                                class: "bg-blue-500 pl-16 pr-16 pt-3 pb-3 rounded-md",
                                disabled: busy(),
                                onclick: on_login,
                                "Login"
                            }
                            button {
                                class: "bg-blue-500 pl-16 pr-16 pt-3 pb-3 rounded-md ml-4",
                                disabled: busy(),
                                onclick: on_sign_up,
                                "Sign Up"
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_checked_before_any_request() {
        assert_eq!(
            validate_credentials("", "secret1"),
            Some("Please fill in all fields")
        );
        assert_eq!(
            validate_credentials("a@b.c", ""),
            Some("Please fill in all fields")
        );
        assert_eq!(
            validate_credentials("a@b.c", "short"),
            Some("Password must be at least 6 characters long")
        );
        assert_eq!(validate_credentials("a@b.c", "secret1"), None);
    }
}
