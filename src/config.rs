use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    assets::store::{AssetPaths, normalize_rel_path},
    foundation::error::{PrintwarpError, PrintwarpResult},
    render::engine::EngineOpts,
    render::params::{ProductPreset, RenderParameters},
};

/// File names of the product rasters inside the configured assets directory.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetNames {
    /// Product photo.
    pub base: String,
    /// Printable-area mask.
    pub mask: String,
    /// Displacement map; `null` disables it and forces auto-generation.
    pub displacement: Option<String>,
    /// Shadow overlay; `null` disables the shadow pass.
    pub shadow: Option<String>,
}

impl Default for AssetNames {
    fn default() -> Self {
        Self {
            base: "base.png".to_string(),
            mask: "mask.png".to_string(),
            displacement: Some("displacement.png".to_string()),
            shadow: Some("shadow.png".to_string()),
        }
    }
}

/// JSON product profile: where the rasters live, default parameters and engine constants.
///
/// ```json
/// {
///   "product": "tshirt",
///   "assets_dir": "mockups/tshirt",
///   "assets": { "shadow": null },
///   "defaults": { "scale": 70, "offset_x": 50, "offset_y": 50, "displacement_intensity": 35 },
///   "engine": { "shadow_opacity": 0.25 }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockupConfig {
    /// Product name; also selects a [`ProductPreset`] when `defaults` is omitted.
    pub product: String,
    /// Directory holding the rasters, relative to the config file.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    /// Raster file names.
    #[serde(default)]
    pub assets: AssetNames,
    /// Parameters restored on reset.
    #[serde(default)]
    pub defaults: Option<RenderParameters>,
    /// Engine constants.
    #[serde(default)]
    pub engine: EngineOpts,
    /// Directory relative paths resolve against; set by [`MockupConfig::from_path`].
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_assets_dir() -> String {
    ".".to_string()
}

impl MockupConfig {
    /// Parse and validate a JSON profile. Relative paths resolve against `root`.
    pub fn from_json_str(s: &str, root: impl Into<PathBuf>) -> PrintwarpResult<Self> {
        let mut cfg: MockupConfig =
            serde_json::from_str(s).map_err(|e| PrintwarpError::serde(e.to_string()))?;
        cfg.root = root.into();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a JSON profile; relative paths resolve against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> PrintwarpResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read mockup config '{}'", path.display()))?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_json_str(&s, root)
    }

    /// Check names, default parameters and engine constants.
    pub fn validate(&self) -> PrintwarpResult<()> {
        if self.product.trim().is_empty() {
            return Err(PrintwarpError::validation("product must be non-empty"));
        }
        self.assets_dir()?;
        normalize_rel_path(&self.assets.base)?;
        normalize_rel_path(&self.assets.mask)?;
        for name in [&self.assets.displacement, &self.assets.shadow]
            .into_iter()
            .flatten()
        {
            normalize_rel_path(name)?;
        }
        if let Some(defaults) = &self.defaults {
            defaults.validate()?;
        }
        self.engine.validate()
    }

    /// Parameters a reset restores: explicit `defaults`, else the product preset.
    pub fn default_params(&self) -> RenderParameters {
        self.defaults
            .unwrap_or_else(|| ProductPreset::from_product_name(&self.product).defaults())
    }

    /// Absolute-or-root-relative locations of the four rasters.
    pub fn asset_paths(&self) -> PrintwarpResult<AssetPaths> {
        let dir = self.assets_dir()?;
        let resolve = |name: &str| -> PrintwarpResult<PathBuf> {
            Ok(dir.join(normalize_rel_path(name)?))
        };
        Ok(AssetPaths {
            base: resolve(&self.assets.base)?,
            mask: resolve(&self.assets.mask)?,
            displacement: self.assets.displacement.as_deref().map(&resolve).transpose()?,
            shadow: self.assets.shadow.as_deref().map(&resolve).transpose()?,
        })
    }

    fn assets_dir(&self) -> PrintwarpResult<PathBuf> {
        let trimmed = self.assets_dir.trim();
        if trimmed.is_empty() || trimmed == "." || trimmed == "./" {
            return Ok(self.root.clone());
        }
        Ok(self.root.join(normalize_rel_path(trimmed)?))
    }
}
