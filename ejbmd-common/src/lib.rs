//! Shared types for the EJB metadata merge engine
//!
//! Holds the descriptor object model, the class metadata capability the merge
//! engine queries instead of reflecting over compiled classes, configuration
//! loading and the common error type.

pub mod class_index;
pub mod config;
pub mod descriptor;
pub mod error;

pub use error::{Error, Result};
