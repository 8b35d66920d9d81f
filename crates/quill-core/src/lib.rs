//! # Quill Core
//!
//! The domain layer of the Quill blog API.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod caller;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod slug;

pub use caller::Caller;
pub use error::DomainError;
