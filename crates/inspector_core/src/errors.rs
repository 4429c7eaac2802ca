use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectorError {
    #[error("invalid service URL: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("service returned an error (status={status}): {message}")]
    Api { status: u16, message: String },
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("file operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("encoding conversion failed: {0}")]
    Encoding(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("report export failed: {0}")]
    Core(#[from] InspectorError),
    #[error("{0}")]
    Context(String),
}

impl ExportError {
    pub fn context<T: Into<String>>(self, message: T) -> Self {
        let message = message.into();
        match self {
            ExportError::Core(err) => ExportError::Context(format!("{message}: {err}")),
            ExportError::Context(existing) => {
                ExportError::Context(format!("{message}: {existing}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_chains_messages() {
        let err = ExportError::from(InspectorError::Auth("bad token".into()))
            .context("listing datasets")
            .context("dumping inspector data");
        assert_eq!(
            err.to_string(),
            "dumping inspector data: listing datasets: authentication failed: bad token"
        );
    }
}
