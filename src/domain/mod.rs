//! Domain layer for meta-factory
//!
//! Records exchanged between agents, critics and orchestrators, plus the
//! ports the core is written against.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
