//! Starknet Foundry Buildpack
//!
//! A Cloud Native Buildpack that installs the Starknet Foundry toolchain
//! (`sncast`, `snforge`) into a cached layer, verifies the binaries and
//! records them in a Syft SBOM.

pub mod build;
pub mod cli;
pub mod config;
pub mod dependency;
pub mod detect;
pub mod error;
pub mod extract;
pub mod foundry;
pub mod layer;
pub mod probe;
pub mod sbom;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{BuildpackError, BuildpackResult};
