//! Common test utilities shared by the integration tests.
//!
//! This module provides:
//! - Test fixtures (sample projects, roles, pipelines)
//! - Event assertions
//! - Test doubles for the completion service and page fetching

pub mod assertions;
pub mod doubles;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use doubles::*;
#[allow(unused_imports)]
pub use fixtures::*;
