//! Chart snapshot capture for the document report
//!
//! Capturing the chart is the one asynchronous and fallible step of a
//! report export. Failures are logged and the chart section is left out;
//! they never abort the export.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::constants;
use crate::error::CaptureError;

/// Source of a raster snapshot of the dashboard chart
pub trait ChartCapture {
    /// Capture the chart at `pixel_ratio` times its natural resolution
    fn capture(&self, pixel_ratio: f32) -> impl Future<Output = Result<DynamicImage, CaptureError>>;
}

/// Chart rendered ahead of time to a PNG file at natural (1×) resolution
#[derive(Debug, Clone)]
pub struct PngFileCapture {
    path: PathBuf,
}

impl PngFileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PngFileCapture { path: path.into() }
    }
}

impl ChartCapture for PngFileCapture {
    async fn capture(&self, pixel_ratio: f32) -> Result<DynamicImage, CaptureError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let image = image::load_from_memory(&bytes)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(CaptureError::Empty);
        }
        Ok(scale_snapshot(image, pixel_ratio))
    }
}

/// Placeholder for exports without a chart element
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChart;

impl ChartCapture for NoChart {
    async fn capture(&self, _pixel_ratio: f32) -> Result<DynamicImage, CaptureError> {
        Err(CaptureError::Unavailable("no chart element supplied".to_string()))
    }
}

/// Resample a 1× raster to the requested pixel density
pub fn scale_snapshot(image: DynamicImage, pixel_ratio: f32) -> DynamicImage {
    if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 || (pixel_ratio - 1.0).abs() < f32::EPSILON {
        return image;
    }
    let (width, height) = image.dimensions();
    let scaled_width = ((width as f32 * pixel_ratio).round() as u32).max(1);
    let scaled_height = ((height as f32 * pixel_ratio).round() as u32).max(1);
    image.resize_exact(scaled_width, scaled_height, FilterType::Triangle)
}

/// Capture the chart at the report pixel density, suppressing any failure
pub async fn capture_chart_snapshot<C: ChartCapture>(chart: &C) -> Option<DynamicImage> {
    match chart.capture(constants::CHART_PIXEL_RATIO).await {
        Ok(image) => {
            debug!(width = image.width(), height = image.height(), "Captured chart snapshot");
            Some(image)
        }
        Err(e) => {
            warn!(error = %e, "Chart capture failed, exporting report without chart");
            None
        }
    }
}
