// Library interface for testing

// Declare all modules
pub mod assets;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod generate;
pub mod queries;
pub mod schema;
pub mod script;
pub mod serve;
pub mod timeline;
pub mod tts;

// Re-export the error type for convenience
pub use error::{Error, Result};
