use std::fmt;
use thiserror::Error;

/// Which call of a generation attempt failed upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamStage {
    Outline,
    Image { panel: u32 },
}

impl fmt::Display for UpstreamStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamStage::Outline => write!(f, "outline"),
            UpstreamStage::Image { panel } => write!(f, "image for panel {}", panel),
        }
    }
}

/// Structural problems found while reading an outline response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("outline is not a valid JSON object: {detail}")]
    Malformed { detail: String },
    #[error("outline is missing field `{0}`")]
    MissingField(&'static str),
    #[error("panel at index {0} is missing a required field")]
    InvalidPanel(usize),
}

impl ParseError {
    /// Machine readable reason code, e.g. `missing-field:title`.
    pub fn reason(&self) -> String {
        match self {
            ParseError::Malformed { .. } => "malformed".to_string(),
            ParseError::MissingField(name) => format!("missing-field:{}", name),
            ParseError::InvalidPanel(index) => format!("invalid-panel:{}", index),
        }
    }
}

#[derive(Debug, Error)]
pub enum ComicError {
    #[error("{0}")]
    Validation(String),
    #[error("{stage} request failed: {message}")]
    Upstream {
        stage: UpstreamStage,
        message: String,
    },
    #[error("failed to parse story ({reason}): {0}", reason = .0.reason())]
    Parse(#[from] ParseError),
}

impl ComicError {
    pub fn validation(message: impl Into<String>) -> Self {
        ComicError::Validation(message.into())
    }

    /// Wraps an adapter failure, keeping the whole context chain in the message.
    pub fn upstream(stage: UpstreamStage, err: anyhow::Error) -> Self {
        ComicError::Upstream {
            stage,
            message: format!("{:#}", err),
        }
    }
}

pub type ComicResult<T> = std::result::Result<T, ComicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes() {
        assert_eq!(
            ParseError::Malformed { detail: "eof".into() }.reason(),
            "malformed"
        );
        assert_eq!(ParseError::MissingField("title").reason(), "missing-field:title");
        assert_eq!(ParseError::InvalidPanel(2).reason(), "invalid-panel:2");
    }

    #[test]
    fn test_upstream_message_keeps_context() {
        let err = anyhow::anyhow!("connection reset").context("POST /images/generations");
        let err = ComicError::upstream(UpstreamStage::Image { panel: 3 }, err);
        let text = err.to_string();
        assert!(text.starts_with("image for panel 3 request failed"));
        assert!(text.contains("connection reset"));
    }

    #[test]
    fn test_parse_error_display_includes_reason() {
        let err: ComicError = ParseError::MissingField("panels").into();
        assert!(err.to_string().contains("missing-field:panels"));
    }
}
