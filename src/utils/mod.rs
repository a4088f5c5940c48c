pub mod config;
pub mod cookie_source;
pub mod logger;
pub mod settings;

pub use config::*;
pub use cookie_source::get_cookie;
pub use logger::{Colors, setup_logging};
