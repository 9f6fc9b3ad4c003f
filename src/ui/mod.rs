//! Build log output
//!
//! Buildpack output is read in CI logs, so everything is plain line-based
//! text with `console` styling that degrades to no colour off a terminal.
//!
//! Layout:
//!
//! ```text
//! AMP Buildpack for Starknet Foundry 0.1.0
//!   https://github.com/amp-buildpacks/starknet-foundry
//!   Build Configuration:
//!     $BP_STARKNET_FOUNDRY_LIBC     Default  gnu  libc flavor
//!   starknet-foundry-gnu: Contributing to layer
//!     Downloading from https://...
//! ```

mod output;

pub use output::{body, config_row, header, title, warn};
