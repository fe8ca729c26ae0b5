//! Camera response cache.
//!
//! The response is estimated once from a bracket set and reused by every
//! later HDR capture. The cache belongs to the caller, who decides when it
//! is stale and calls [`ResponseCache::invalidate`].

use crate::CalibrationResult;
use projcal_hdr::CameraResponse;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Holds at most one estimated camera response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCache {
    response: Option<CameraResponse>,
}

impl ResponseCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding `response`.
    pub fn with_response(response: CameraResponse) -> Self {
        Self {
            response: Some(response),
        }
    }

    /// Cached response, if any.
    pub fn get(&self) -> Option<&CameraResponse> {
        self.response.as_ref()
    }

    /// Stores a response, replacing any previous one.
    pub fn insert(&mut self, response: CameraResponse) {
        self.response = Some(response);
    }

    /// Drops the cached response so the next capture re-estimates it.
    pub fn invalidate(&mut self) {
        if self.response.take().is_some() {
            debug!("camera response invalidated");
        }
    }

    /// Returns true if no response is cached.
    pub fn is_empty(&self) -> bool {
        self.response.is_none()
    }

    /// Loads a response saved with [`ResponseCache::save`].
    pub fn load(path: impl AsRef<Path>) -> CalibrationResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let response: CameraResponse = serde_json::from_str(&content)?;
        // Re-validate table sizes
        let response = CameraResponse::from_curves(
            response.curve(projcal_core::Channel::Red).to_vec(),
            response.curve(projcal_core::Channel::Green).to_vec(),
            response.curve(projcal_core::Channel::Blue).to_vec(),
        )?;
        Ok(Self::with_response(response))
    }

    /// Writes the cached response as JSON. An empty cache writes nothing.
    pub fn save(&self, path: impl AsRef<Path>) -> CalibrationResult<bool> {
        match &self.response {
            Some(r) => {
                fs::write(path.as_ref(), serde_json::to_string_pretty(r)?)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
