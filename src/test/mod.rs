//! Shared fixtures for the unit tests.
//!
//! Tests never depend on binaries checked into the repository; every image they parse is
//! synthesised with [`ImageBuilder`].

mod builders;

pub use builders::{ImageBuilder, TEST_IMAGE_BASE};
