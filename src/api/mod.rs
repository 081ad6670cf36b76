pub mod models;
pub mod supabase;

pub use models::*;
pub use supabase::*;
