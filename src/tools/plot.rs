//! Interaction plots for the two-way ANOVA.
//!
//! The library does not render anything itself. It builds an
//! [`InteractionPlotRequest`] and hands it to an [`InteractionPlotter`]
//! supplied by the caller; the returned [`EncodedImage`] is passed back
//! untouched.

use serde::{
    Deserialize,
    Serialize,
};

/// Per-bin means of the response for each of the two factor levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionPlotRequest {
    /// Bin indices on the x axis, ascending.
    pub bins:     Vec<u32>,
    pub levels:   [String; 2],
    /// `means[l][i]` is the mean of level `l` in `bins[i]`, `None` when that
    /// level has no samples in the bin.
    pub means:    [Vec<Option<f64>>; 2],
    /// Name of the response (the bin group).
    pub response: String,
    /// Name of the second factor.
    pub factor:   String,
}

/// Opaque payload produced by an [`InteractionPlotter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedImage(pub Vec<u8>);

impl EncodedImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for EncodedImage {
    fn from(bytes: Vec<u8>) -> Self {
        EncodedImage(bytes)
    }
}

pub trait InteractionPlotter {
    fn render(
        &self,
        request: &InteractionPlotRequest,
    ) -> anyhow::Result<EncodedImage>;
}

/// Plotter that renders nothing and returns an empty image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlotter;

impl InteractionPlotter for NoopPlotter {
    fn render(
        &self,
        _request: &InteractionPlotRequest,
    ) -> anyhow::Result<EncodedImage> {
        Ok(EncodedImage::default())
    }
}

/// Plotter emitting the request itself as JSON, for rendering downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPlotter;

impl InteractionPlotter for JsonPlotter {
    fn render(
        &self,
        request: &InteractionPlotRequest,
    ) -> anyhow::Result<EncodedImage> {
        Ok(EncodedImage(serde_json::to_vec_pretty(request)?))
    }
}
