use crate::assets::store::AssetRole;

/// Convenience result type used across printwarp.
pub type PrintwarpResult<T> = Result<T, PrintwarpError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum PrintwarpError {
    /// Invalid user-provided parameters or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// The base photo or the mask could not be loaded; the mockup can never become ready.
    #[error("missing required asset '{role}': {reason}")]
    MissingRequiredAsset {
        /// Which asset slot failed.
        role: AssetRole,
        /// Human-readable cause (absent file, decode failure, ...).
        reason: String,
    },

    /// Bytes that could not be decoded as a raster image.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PrintwarpError {
    /// Build a [`PrintwarpError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PrintwarpError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PrintwarpError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`PrintwarpError::MissingRequiredAsset`] value.
    pub fn missing_required(role: AssetRole, reason: impl Into<String>) -> Self {
        Self::MissingRequiredAsset {
            role,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
