use crate::status::describe;

/// Failures surfaced by the spider.
#[derive(Debug, thiserror::Error)]
pub enum DartError {
    /// The API answered with a status envelope instead of data.
    #[error("OpenDart status {status}: {message} ({})", describe(.status))]
    Api { status: String, message: String },

    /// Connection failures and non-2xx responses, as reported by the HTTP client.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("no .xml file found in {0}")]
    MissingXml(String),

    #[error("progress bar template: {0}")]
    Template(#[from] indicatif::style::TemplateError),
}

impl DartError {
    /// The API status code, if the failure came from an OpenDart envelope.
    pub fn status(&self) -> Option<&str> {
        match self {
            DartError::Api { status, .. } => Some(status),
            _ => None,
        }
    }
}
