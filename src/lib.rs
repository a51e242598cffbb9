pub mod config;
pub mod error;
pub mod fetch;
pub mod logger;

pub use error::{AppError, Result};
