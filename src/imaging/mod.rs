//! Image handling: registry, responsive variants and the pixel backend.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize** | Lanczos3, encoded in the source format |
//! | **Freshness** | SHA-256 content hash, see [`crate::cache`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for variant dimension math
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Registry**: [`ImageRegistry`] and the cache-aware resolver

pub mod backend;
mod calculations;
mod params;
pub mod registry;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use params::{Quality, ResizeParams};
pub use registry::{
    BatchOutcome, ImageEntry, ImageError, ImageRegistry, ImageSettings, ImageSource, ImageVariant,
    ResolveContext, publish_cache, resolve_all,
};
pub use rust_backend::RustBackend;
