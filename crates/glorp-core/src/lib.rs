pub mod backoff;
pub mod config;
pub mod error;
pub mod types;

pub use backoff::Backoff;
pub use config::GlorpConfig;
pub use error::{GlorpError, Result};
