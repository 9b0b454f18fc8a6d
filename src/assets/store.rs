use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    assets::decode as assets_decode,
    foundation::core::PixelBuffer,
    foundation::error::{PrintwarpError, PrintwarpResult},
};

/// The four named raster slots of a product mockup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetRole {
    /// Product photograph the design is composited onto. Required.
    Base,
    /// Printable-area mask. Required.
    Mask,
    /// Per-pixel displacement map. Optional; auto-generated from the base when absent.
    Displacement,
    /// Shadow overlay multiplied over the finished composite. Optional.
    Shadow,
}

impl AssetRole {
    /// All roles in load order.
    pub const ALL: [AssetRole; 4] = [
        AssetRole::Base,
        AssetRole::Mask,
        AssetRole::Displacement,
        AssetRole::Shadow,
    ];

    /// Whether a failure to load this role blocks rendering.
    pub fn is_required(self) -> bool {
        matches!(self, AssetRole::Base | AssetRole::Mask)
    }

    /// Lowercase name used in diagnostics and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            AssetRole::Base => "base",
            AssetRole::Mask => "mask",
            AssetRole::Displacement => "displacement",
            AssetRole::Shadow => "shadow",
        }
    }
}

impl std::fmt::Display for AssetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved file locations for one mockup. `None` marks an optional slot as not provided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    /// Product photo.
    pub base: PathBuf,
    /// Printable-area mask.
    pub mask: PathBuf,
    /// Displacement map, if the product ships one.
    pub displacement: Option<PathBuf>,
    /// Shadow overlay, if the product ships one.
    pub shadow: Option<PathBuf>,
}

impl AssetPaths {
    /// Conventional layout: `base.png`, `mask.png`, `displacement.png`, `shadow.png` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            base: dir.join("base.png"),
            mask: dir.join("mask.png"),
            displacement: Some(dir.join("displacement.png")),
            shadow: Some(dir.join("shadow.png")),
        }
    }

    /// Location configured for `role`.
    pub fn path_for(&self, role: AssetRole) -> Option<&Path> {
        match role {
            AssetRole::Base => Some(self.base.as_path()),
            AssetRole::Mask => Some(self.mask.as_path()),
            AssetRole::Displacement => self.displacement.as_deref(),
            AssetRole::Shadow => self.shadow.as_deref(),
        }
    }
}

/// How a single asset load attempt settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Decoded successfully.
    Loaded {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// No location configured or no file at the location.
    Absent,
    /// The file exists but could not be read or decoded.
    Failed(String),
}

/// Per-role outcomes of one [`AssetStore::load`] call, in [`AssetRole::ALL`] order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// One entry per role.
    pub outcomes: Vec<(AssetRole, AssetOutcome)>,
}

impl LoadReport {
    /// Outcome recorded for `role`, if the role was attempted.
    pub fn outcome(&self, role: AssetRole) -> Option<&AssetOutcome> {
        self.outcomes
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, o)| o)
    }
}

/// Decoded source buffers for one mockup.
#[derive(Clone, Debug)]
pub struct LoadedAssets {
    /// Product photo.
    pub base: PixelBuffer,
    /// Printable-area mask.
    pub mask: PixelBuffer,
    /// Displacement map when provided and decodable.
    pub displacement: Option<PixelBuffer>,
    /// Shadow overlay when provided and decodable.
    pub shadow: Option<PixelBuffer>,
    /// What happened to each slot.
    pub report: LoadReport,
}

/// Loads and decodes the mockup rasters.
///
/// IO is front-loaded here so analysis and compositing stay IO-free.
pub struct AssetStore;

impl AssetStore {
    /// Load all four slots concurrently and settle once every attempt has resolved.
    ///
    /// A missing or undecodable base or mask yields [`PrintwarpError::MissingRequiredAsset`];
    /// optional slots only record their outcome.
    pub fn load(paths: &AssetPaths) -> PrintwarpResult<LoadedAssets> {
        let mut settled: Vec<(AssetRole, Result<Option<PixelBuffer>, String>)> = AssetRole::ALL
            .par_iter()
            .map(|&role| (role, load_slot(paths.path_for(role))))
            .collect();
        settled.sort_by_key(|(role, _)| *role);

        let mut report = LoadReport::default();
        let mut base = None;
        let mut mask = None;
        let mut displacement = None;
        let mut shadow = None;
        let mut missing = None;

        for (role, result) in settled {
            let outcome = match &result {
                Ok(Some(buf)) => AssetOutcome::Loaded {
                    width: buf.width(),
                    height: buf.height(),
                },
                Ok(None) => AssetOutcome::Absent,
                Err(msg) => AssetOutcome::Failed(msg.clone()),
            };
            log_outcome(role, paths.path_for(role), &outcome);

            if role.is_required() && missing.is_none() {
                match &outcome {
                    AssetOutcome::Absent => missing = Some((role, "asset not found".to_string())),
                    AssetOutcome::Failed(msg) => missing = Some((role, msg.clone())),
                    AssetOutcome::Loaded { .. } => {}
                }
            }
            report.outcomes.push((role, outcome));

            let buf = result.ok().flatten();
            match role {
                AssetRole::Base => base = buf,
                AssetRole::Mask => mask = buf,
                AssetRole::Displacement => displacement = buf,
                AssetRole::Shadow => shadow = buf,
            }
        }

        if let Some((role, reason)) = missing {
            tracing::error!(%role, %reason, "required asset missing; mockup will not become ready");
            return Err(PrintwarpError::missing_required(role, reason));
        }

        match (base, mask) {
            (Some(base), Some(mask)) => Ok(LoadedAssets {
                base,
                mask,
                displacement,
                shadow,
                report,
            }),
            (None, _) => Err(PrintwarpError::missing_required(
                AssetRole::Base,
                "asset not found",
            )),
            (_, None) => Err(PrintwarpError::missing_required(
                AssetRole::Mask,
                "asset not found",
            )),
        }
    }
}

fn load_slot(path: Option<&Path>) -> Result<Option<PixelBuffer>, String> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            let err = anyhow::Error::new(e)
                .context(format!("read asset bytes from '{}'", path.display()));
            return Err(format!("{err:#}"));
        }
    };
    assets_decode::decode_image(&bytes)
        .with_context(|| format!("decode '{}'", path.display()))
        .map(Some)
        .map_err(|e| format!("{e:#}"))
}

fn log_outcome(role: AssetRole, path: Option<&Path>, outcome: &AssetOutcome) {
    let path = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<none>".to_string());
    match outcome {
        AssetOutcome::Loaded { width, height } => {
            tracing::info!(%role, %path, width, height, "asset loaded");
        }
        AssetOutcome::Absent => {
            tracing::warn!(%role, %path, required = role.is_required(), "asset absent");
        }
        AssetOutcome::Failed(reason) => {
            tracing::warn!(%role, %path, %reason, required = role.is_required(), "asset failed");
        }
    }
}

/// Normalize and validate config-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> PrintwarpResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PrintwarpError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(PrintwarpError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PrintwarpError::validation(
                "asset paths must not contain '..'",
            ));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PrintwarpError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}
