use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that abort an export. Nothing is delivered when one of these is returned.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Workbook construction or serialization failed
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// PDF construction or serialization failed
    #[error("Document error: {0}")]
    Document(String),

    /// A configured font could not be loaded
    #[error("Font error: {0}")]
    Font(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A record could not be turned into a sheet row
    #[error("Record error: {0}")]
    Record(String),

    /// An artifact name that is not a single file name
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),
}

impl ExportError {
    pub fn document(msg: impl Into<String>) -> Self {
        ExportError::Document(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        ExportError::Font(msg.into())
    }
}

/// Chart capture failures. These never escape a report export; the chart
/// section is dropped instead.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no chart element available: {0}")]
    Unavailable(String),

    #[error("failed to read chart source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode chart image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("captured chart image is empty")]
    Empty,
}
