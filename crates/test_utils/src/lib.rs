//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! gateway test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built payers, members, NPIs and dates
//! - `builders`: Builder patterns for request construction
//! - `exchange`: Scripted stand-in for the HTTP exchange
//! - `assertions`: Custom assertion helpers for money and X12
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod exchange;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use exchange::*;
pub use assertions::*;
pub use generators::*;
