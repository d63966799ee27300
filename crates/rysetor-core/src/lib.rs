//! # RyseTor Core
//!
//! The domain layer of RyseTor.
//! Entities, ports and the account/social workflows live here, with zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, FieldError};
