/// Multipart field the upload endpoint reads the CSV from.
pub const UPLOAD_FIELD_NAME: &str = "file";
pub const CSV_MIME_TYPE: &str = "text/csv";
pub const CSV_EXTENSION: &str = "csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Upload,
    Detect,
}

impl Endpoint {
    /// Path relative to the service base URL. The service routes are
    /// registered with a trailing slash.
    pub fn path(self) -> &'static str {
        match self {
            Self::Upload => "upload/",
            Self::Detect => "detect/",
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Self::Upload => "POST",
            Self::Detect => "GET",
        }
    }
}
