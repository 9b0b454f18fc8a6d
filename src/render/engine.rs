use std::sync::Arc;

use crate::{
    analyze::displacement::{
        DEFAULT_COMPRESSION, DisplacementBuffer, DisplacementSource, build_displacement,
    },
    analyze::mask::mask_bounds,
    assets::store::LoadedAssets,
    foundation::core::{MaskBounds, PixelBuffer},
    foundation::error::{PrintwarpError, PrintwarpResult},
    render::compose::{
        ComposeInputs, DEFAULT_DISPLACEMENT_PX_PER_PERCENT, DEFAULT_SHADOW_OPACITY, compose,
        max_displacement, rasterize_design,
    },
    render::params::RenderParameters,
    render::placement::{PixelRect, design_rect},
};

/// Fixed engine constants and threading controls.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOpts {
    /// Peak single-axis offset in pixels per percent of displacement intensity.
    pub displacement_px_per_percent: f32,
    /// Factor applied to luma deviations when normalizing displacement maps.
    pub displacement_compression: f32,
    /// Opacity of the multiply shadow pass.
    pub shadow_opacity: f32,
    /// Spread compose rows over rayon workers.
    pub parallel: bool,
    /// Dedicated worker count; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            displacement_px_per_percent: DEFAULT_DISPLACEMENT_PX_PER_PERCENT,
            displacement_compression: DEFAULT_COMPRESSION,
            shadow_opacity: DEFAULT_SHADOW_OPACITY,
            parallel: true,
            threads: None,
        }
    }
}

impl EngineOpts {
    /// Reject non-finite or out-of-range constants.
    pub fn validate(&self) -> PrintwarpResult<()> {
        let finite_non_negative = |name: &str, v: f32| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(PrintwarpError::validation(format!(
                    "{name} must be finite and >= 0, got {v}"
                )))
            }
        };
        finite_non_negative("displacement_px_per_percent", self.displacement_px_per_percent)?;
        finite_non_negative("displacement_compression", self.displacement_compression)?;
        finite_non_negative("shadow_opacity", self.shadow_opacity)?;
        if self.shadow_opacity > 1.0 {
            return Err(PrintwarpError::validation("shadow_opacity must be <= 1"));
        }
        if self.threads == Some(0) {
            return Err(PrintwarpError::validation(
                "engine 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Source buffers and derived analysis for one product, computed once after loading.
///
/// Every buffer shares the base photo's dimensions.
#[derive(Clone, Debug)]
pub struct PreparedMockup {
    base: PixelBuffer,
    mask: PixelBuffer,
    displacement: DisplacementBuffer,
    displacement_source: DisplacementSource,
    shadow: Option<PixelBuffer>,
    bounds: MaskBounds,
}

impl PreparedMockup {
    /// Analyze freshly loaded assets: resample auxiliary rasters to the base size, extract the
    /// mask bounds and build the normalized displacement map.
    pub fn prepare(assets: LoadedAssets, compression: f32) -> PrintwarpResult<Self> {
        let (w, h) = assets.base.dimensions();
        let mask = assets.mask.resized(w, h)?;
        let provided = assets
            .displacement
            .map(|d| d.resized(w, h))
            .transpose()?;
        let (displacement, displacement_source) =
            build_displacement(&assets.base, &mask, provided.as_ref(), compression)?;
        let shadow = assets.shadow.map(|s| s.resized(w, h)).transpose()?;

        let out = Self::assemble(assets.base, mask, displacement, displacement_source, shadow)?;
        tracing::info!(
            width = w,
            height = h,
            source = ?out.displacement_source,
            shadow = out.shadow.is_some(),
            "mockup prepared"
        );
        Ok(out)
    }

    /// Assemble from an already-encoded displacement map, skipping normalization.
    pub fn from_parts(
        base: PixelBuffer,
        mask: PixelBuffer,
        displacement: DisplacementBuffer,
        shadow: Option<PixelBuffer>,
    ) -> PrintwarpResult<Self> {
        let (w, h) = base.dimensions();
        let mask = mask.resized(w, h)?;
        let displacement = DisplacementBuffer::from_encoded(displacement.pixels().resized(w, h)?);
        let shadow = shadow.map(|s| s.resized(w, h)).transpose()?;
        Self::assemble(base, mask, displacement, DisplacementSource::Provided, shadow)
    }

    fn assemble(
        base: PixelBuffer,
        mask: PixelBuffer,
        displacement: DisplacementBuffer,
        displacement_source: DisplacementSource,
        shadow: Option<PixelBuffer>,
    ) -> PrintwarpResult<Self> {
        let bounds = mask_bounds(&mask);
        if bounds.is_empty() {
            tracing::warn!("mask has no printable pixels; designs will not be placed");
        }
        Ok(Self {
            base,
            mask,
            displacement,
            displacement_source,
            shadow,
            bounds,
        })
    }

    /// Product photo.
    pub fn base(&self) -> &PixelBuffer {
        &self.base
    }

    /// Mask resampled to the base size.
    pub fn mask(&self) -> &PixelBuffer {
        &self.mask
    }

    /// Normalized displacement map.
    pub fn displacement(&self) -> &DisplacementBuffer {
        &self.displacement
    }

    /// Whether the displacement map was shipped or generated.
    pub fn displacement_source(&self) -> DisplacementSource {
        self.displacement_source
    }

    /// Shadow overlay, if any.
    pub fn shadow(&self) -> Option<&PixelBuffer> {
        self.shadow.as_ref()
    }

    /// Printable-area bounding box.
    pub fn bounds(&self) -> MaskBounds {
        self.bounds
    }
}

/// Observable engine states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Assets incomplete or no design supplied; rendering is a no-op.
    NotReady,
    /// Every render fully recomputes the output.
    Ready,
}

/// Everything a single render call needs. Holds no state between calls.
#[derive(Clone, Debug, Default)]
pub struct RenderContext {
    /// Prepared product, `None` until required assets loaded.
    pub mockup: Option<Arc<PreparedMockup>>,
    /// User design, `None` until one is supplied.
    pub design: Option<PixelBuffer>,
    /// Current placement and warp settings.
    pub params: RenderParameters,
}

impl RenderContext {
    /// [`EngineState::Ready`] once both a mockup and a design are present.
    pub fn state(&self) -> EngineState {
        if self.mockup.is_some() && self.design.is_some() {
            EngineState::Ready
        } else {
            EngineState::NotReady
        }
    }
}

/// Composites a design onto a prepared product photo.
#[derive(Debug)]
pub struct CompositingEngine {
    opts: EngineOpts,
    pool: Option<rayon::ThreadPool>,
}

impl CompositingEngine {
    /// Validate `opts` and build a dedicated worker pool when `threads` is set.
    pub fn new(opts: EngineOpts) -> PrintwarpResult<Self> {
        opts.validate()?;
        let pool = match opts.threads {
            Some(n) if opts.parallel => Some(build_thread_pool(n)?),
            _ => None,
        };
        Ok(Self { opts, pool })
    }

    /// Engine constants in use.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    /// Render `ctx` from scratch.
    ///
    /// Returns `Ok(None)` without doing any work when `ctx` is not ready.
    pub fn render(&self, ctx: &RenderContext) -> PrintwarpResult<Option<PixelBuffer>> {
        self.render_cancellable(ctx, &|| false)
    }

    /// Like [`CompositingEngine::render`], but polls `superseded` between rows and returns
    /// `Ok(None)` as soon as it reports `true`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn render_cancellable(
        &self,
        ctx: &RenderContext,
        superseded: &(dyn Fn() -> bool + Sync),
    ) -> PrintwarpResult<Option<PixelBuffer>> {
        let (Some(mockup), Some(design)) = (ctx.mockup.as_deref(), ctx.design.as_ref()) else {
            tracing::debug!("render skipped: engine not ready");
            return Ok(None);
        };
        let params = ctx.params.clamped(RenderParameters::default());

        let canvas = mockup.base().dimensions();
        let rect =
            design_rect(mockup.bounds(), design.dimensions(), &params).and_then(PixelRect::from_rect);
        tracing::debug!(?rect, ?params, "design placement");
        let placed = rasterize_design(design, rect, canvas)?;

        let inputs = ComposeInputs {
            base: mockup.base(),
            mask: mockup.mask(),
            displacement: mockup.displacement(),
            design: &placed,
            shadow: mockup.shadow(),
            max_displacement: max_displacement(
                params.displacement_intensity,
                self.opts.displacement_px_per_percent,
            ),
            shadow_opacity: self.opts.shadow_opacity,
        };

        let parallel = self.opts.parallel;
        let out = match &self.pool {
            Some(pool) => pool.install(|| compose(&inputs, parallel, superseded))?,
            None => compose(&inputs, parallel, superseded)?,
        };
        if out.is_none() {
            tracing::debug!("render superseded before completion");
        }
        Ok(out)
    }
}

fn build_thread_pool(threads: usize) -> PrintwarpResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| PrintwarpError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
