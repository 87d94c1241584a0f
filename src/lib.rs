//! Lola - voice assistant backend
//!
//! Turns a spoken prompt plus device metadata into LLM turns, running device
//! tools (open apps, prepare messages, weather, to-do list) along the way.

pub mod agent;
pub mod tools;
pub mod adapters;
pub mod config;
pub mod error;
pub mod ui;

pub use error::{Error, Result};
