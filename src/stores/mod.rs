pub mod notes;
pub mod playlist;

pub use notes::*;
pub use playlist::*;
