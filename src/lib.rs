//! printwarp renders photorealistic product mockups.
//!
//! A flat user design is composited onto a fixed product photograph. A per-pixel displacement
//! map bends the design along the product's surface, and multiply blending lets the photo's own
//! shading show through.
//!
//! # Pipeline overview
//!
//! 1. **Load**: [`AssetStore::load`] decodes base, mask and the optional displacement and shadow
//!    rasters concurrently.
//! 2. **Prepare**: [`PreparedMockup::prepare`] extracts the printable [`MaskBounds`] and builds a
//!    normalized [`DisplacementBuffer`] (from the shipped map, or from the photo's luma).
//! 3. **Render**: [`CompositingEngine::render`] places the design, displaces, multiply-blends and
//!    applies the shadow pass, recomputing the whole output on every call.
//!
//! [`MockupSession`] ties these together for interactive callers: it holds the
//! [`RenderContext`], applies parameter changes and publishes results latest-wins.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No IO in the engine**: all file access happens in [`AssetStore`] and [`MockupConfig`].
//! - **Straight RGBA8** end-to-end; output has the base photo's dimensions.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod analyze;
mod assets;
mod config;
mod foundation;
mod render;
mod session;

pub use analyze::displacement::{
    DEFAULT_COMPRESSION, DISPLACEMENT_NEUTRAL, DisplacementBuffer, DisplacementSource,
    build_displacement, masked_average_luma, normalize_displacement,
};
pub use analyze::mask::{MASK_THRESHOLD, is_mask_pixel, mask_bounds};
pub use assets::decode::{decode_design, decode_image};
pub use assets::store::{
    AssetOutcome, AssetPaths, AssetRole, AssetStore, LoadReport, LoadedAssets, normalize_rel_path,
};
pub use config::{AssetNames, MockupConfig};
pub use foundation::core::{MaskBounds, PixelBuffer, Rect};
pub use foundation::error::{PrintwarpError, PrintwarpResult};
pub use render::compose::{
    ComposeInputs, DEFAULT_DISPLACEMENT_PX_PER_PERCENT, DEFAULT_SHADOW_OPACITY, MIN_ALPHA, compose,
    displaced_coord, displacement_offset, max_displacement, rasterize_design, sample_coord,
    shadow_multiply,
};
pub use render::engine::{
    CompositingEngine, EngineOpts, EngineState, PreparedMockup, RenderContext,
};
pub use render::params::{MAX_PERCENT, MAX_SCALE, ProductPreset, RenderParameters};
pub use render::placement::{PixelRect, design_rect};
pub use session::{LatestFrame, MockupSession, RenderJob, RenderTicket};
