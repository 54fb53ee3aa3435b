//! Provider registry module.
//!
//! This module provides:
//! - The built-in provider catalog and its default ranks
//! - Registration and priority ordering per data category
//! - Attempt diagnostics for failover sweeps

pub mod catalog;
mod diagnostics;
mod registry;

pub use diagnostics::{FetchDiagnostics, ProviderAttempt};
pub use registry::{ProviderRegistry, RegisteredProvider};
