//! Common test utilities for media-bundle integration tests

#[allow(dead_code)]
pub mod archive;
#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use archive::*;
#[allow(unused_imports)]
pub use fixtures::*;
