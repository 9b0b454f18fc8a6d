use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    assets::decode::decode_design,
    assets::store::{AssetStore, LoadReport},
    config::MockupConfig,
    foundation::core::PixelBuffer,
    foundation::error::{PrintwarpError, PrintwarpResult},
    render::engine::{CompositingEngine, EngineState, PreparedMockup, RenderContext},
    render::params::RenderParameters,
};

/// Identifies one render request against a [`LatestFrame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderTicket(u64);

/// Single-writer, latest-wins publish point for finished composites.
///
/// Each request takes a ticket; starting a new request supersedes every older ticket, and only
/// the newest ticket may commit.
#[derive(Debug, Default)]
pub struct LatestFrame {
    generation: AtomicU64,
    frame: Mutex<Option<Arc<PixelBuffer>>>,
}

impl LatestFrame {
    /// Start a new request, superseding all earlier tickets.
    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// `true` while no newer request has started.
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Publish `frame` if `ticket` is still current. Returns whether it was published.
    pub fn commit(&self, ticket: RenderTicket, frame: Arc<PixelBuffer>) -> bool {
        let Ok(mut slot) = self.frame.lock() else {
            return false;
        };
        // Checked under the lock so a superseded writer never overwrites a newer frame.
        if !self.is_current(ticket) {
            return false;
        }
        *slot = Some(frame);
        true
    }

    /// Most recently published composite.
    pub fn latest(&self) -> Option<Arc<PixelBuffer>> {
        self.frame.lock().ok().and_then(|slot| slot.clone())
    }
}

/// A self-contained render request that can run on any thread.
#[derive(Debug)]
pub struct RenderJob {
    ctx: RenderContext,
    engine: Arc<CompositingEngine>,
    frames: Arc<LatestFrame>,
    ticket: RenderTicket,
}

impl RenderJob {
    /// Ticket this job commits under.
    pub fn ticket(&self) -> RenderTicket {
        self.ticket
    }

    /// Render and publish. `Ok(None)` when the engine is not ready or a newer job superseded
    /// this one.
    pub fn run(self) -> PrintwarpResult<Option<Arc<PixelBuffer>>> {
        let frames = &self.frames;
        let ticket = self.ticket;
        let superseded = || !frames.is_current(ticket);

        let Some(out) = self.engine.render_cancellable(&self.ctx, &superseded)? else {
            return Ok(None);
        };
        let out = Arc::new(out);
        if !frames.commit(ticket, out.clone()) {
            tracing::debug!(?ticket, "render finished after being superseded; dropped");
            return Ok(None);
        }
        Ok(Some(out))
    }
}

/// Thin controller over the engine: owns the [`RenderContext`], applies user input to it and
/// publishes every render through a [`LatestFrame`].
#[derive(Debug)]
pub struct MockupSession {
    engine: Arc<CompositingEngine>,
    ctx: RenderContext,
    defaults: RenderParameters,
    report: Option<LoadReport>,
    frames: Arc<LatestFrame>,
}

impl MockupSession {
    /// Load and prepare the product described by `config`.
    ///
    /// A missing base or mask does not fail here: the session stays [`EngineState::NotReady`]
    /// for its whole lifetime and every render is a no-op.
    pub fn open(config: &MockupConfig) -> PrintwarpResult<Self> {
        let engine = CompositingEngine::new(config.engine.clone())?;
        let paths = config.asset_paths()?;

        let (mockup, report) = match AssetStore::load(&paths) {
            Ok(assets) => {
                let report = assets.report.clone();
                let mockup =
                    PreparedMockup::prepare(assets, config.engine.displacement_compression)?;
                (Some(mockup), Some(report))
            }
            Err(PrintwarpError::MissingRequiredAsset { role, reason }) => {
                tracing::error!(
                    product = %config.product,
                    %role,
                    %reason,
                    "mockup not ready; rendering disabled"
                );
                (None, None)
            }
            Err(e) => return Err(e),
        };

        let mut session = Self::from_prepared(mockup, config.default_params(), engine);
        session.report = report;
        Ok(session)
    }

    /// Build around an already prepared mockup (or `None` for a permanently not-ready session).
    pub fn from_prepared(
        mockup: Option<PreparedMockup>,
        defaults: RenderParameters,
        engine: CompositingEngine,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            ctx: RenderContext {
                mockup: mockup.map(Arc::new),
                design: None,
                params: defaults,
            },
            defaults,
            report: None,
            frames: Arc::new(LatestFrame::default()),
        }
    }

    /// Current engine state.
    pub fn state(&self) -> EngineState {
        self.ctx.state()
    }

    /// `true` once the required assets loaded, design or not.
    pub fn assets_ready(&self) -> bool {
        self.ctx.mockup.is_some()
    }

    /// Prepared product, if loaded.
    pub fn mockup(&self) -> Option<&PreparedMockup> {
        self.ctx.mockup.as_deref()
    }

    /// Per-asset outcomes from [`MockupSession::open`].
    pub fn load_report(&self) -> Option<&LoadReport> {
        self.report.as_ref()
    }

    /// Render input as it stands.
    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Current parameters.
    pub fn params(&self) -> RenderParameters {
        self.ctx.params
    }

    /// Replace all parameters, clamping each into range.
    pub fn set_params(&mut self, params: RenderParameters) {
        self.ctx.params = params.clamped(self.defaults);
    }

    /// Set the design scale percentage.
    pub fn set_scale(&mut self, scale: f32) {
        self.set_params(RenderParameters {
            scale,
            ..self.ctx.params
        });
    }

    /// Set the design anchor percentages.
    pub fn set_offset(&mut self, offset_x: f32, offset_y: f32) {
        self.set_params(RenderParameters {
            offset_x,
            offset_y,
            ..self.ctx.params
        });
    }

    /// Set the displacement intensity percentage.
    pub fn set_displacement_intensity(&mut self, displacement_intensity: f32) {
        self.set_params(RenderParameters {
            displacement_intensity,
            ..self.ctx.params
        });
    }

    /// Restore the product's default parameters. The design is kept.
    pub fn reset(&mut self) {
        self.ctx.params = self.defaults;
    }

    /// Use an already decoded design.
    pub fn set_design(&mut self, design: PixelBuffer) {
        self.ctx.design = Some(design);
    }

    /// Decode and use a design; undecodable bytes are rejected and the previous design kept.
    pub fn set_design_bytes(&mut self, bytes: &[u8]) -> PrintwarpResult<()> {
        let design = decode_design(bytes)?;
        tracing::debug!(width = design.width(), height = design.height(), "design set");
        self.ctx.design = Some(design);
        Ok(())
    }

    /// Drop the current design, returning the engine to not-ready.
    pub fn clear_design(&mut self) {
        self.ctx.design = None;
    }

    /// Snapshot the current input into a job that supersedes every earlier one.
    pub fn begin_render(&self) -> RenderJob {
        RenderJob {
            ctx: self.ctx.clone(),
            engine: self.engine.clone(),
            frames: self.frames.clone(),
            ticket: self.frames.begin(),
        }
    }

    /// Render the current input synchronously and publish it.
    pub fn render(&self) -> PrintwarpResult<Option<Arc<PixelBuffer>>> {
        self.begin_render().run()
    }

    /// Latest published composite.
    pub fn latest_frame(&self) -> Option<Arc<PixelBuffer>> {
        self.frames.latest()
    }

    /// Publish point shared with a presentation layer.
    pub fn frames(&self) -> Arc<LatestFrame> {
        self.frames.clone()
    }
}
