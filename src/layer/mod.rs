//! Build layers
//!
//! A layer is a directory under the layers root plus a `<name>.toml`
//! record holding its visibility flags and metadata. Whether an existing
//! layer can be reused is decided purely from the previous record and the
//! desired one, see [`decide`].

pub mod contributor;
pub mod decide;
pub mod record;

pub use contributor::{DependencyLayerContributor, LayerContributor};
pub use decide::{decide, Decision};
pub use record::{Layer, LayerRecord, LayerTypes, SbomFormat};
