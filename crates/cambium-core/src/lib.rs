pub mod config;
pub mod error;
pub mod types;

pub use config::CambiumConfig;
pub use error::{CambiumError, Result};
pub use types::*;
