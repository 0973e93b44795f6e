//! # waymark-core
//!
//! Core types, errors, and abstractions for the waymark chat backend.
//!
//! This crate provides the foundational data structures that other waymark
//! crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod media_types;
pub mod models;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use media_types::{detect_content_type, safe_extension, sanitize_filename};
pub use models::*;
