pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;

pub use error::{Error, Result};
