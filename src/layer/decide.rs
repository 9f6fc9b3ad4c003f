//! Reuse-or-recreate decision for cached layers

use crate::layer::record::LayerRecord;

/// What to do with a layer restored from a previous build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Previous contents match, keep them untouched
    Reuse,
    /// Missing or stale, wipe and contribute again
    Recreate,
}

/// Compare the previous layer record with the desired one.
///
/// Reuse only when a record exists and both its types and metadata are
/// identical to what this build wants.
pub fn decide(cached: Option<&LayerRecord>, desired: &LayerRecord) -> Decision {
    match cached {
        Some(cached) if cached == desired => Decision::Reuse,
        _ => Decision::Recreate,
    }
}
