//! Error taxonomy for the conversion pipeline.

use thiserror::Error;

use crate::audio::AssemblyError;
use tts_client::TtsError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The selected pages contained no extractable text at all.
    #[error("no extractable text found in the selected pages (is this a scanned PDF?)")]
    ExtractionEmpty,

    #[error("invalid page range {start}-{end}: {reason} (document has {page_count} pages)")]
    InvalidRange {
        start: usize,
        end: usize,
        page_count: usize,
        reason: &'static str,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read PDF: {0}")]
    Pdf(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] TtsError),

    /// Every provider in the chain failed on one chunk. The job is failed
    /// and any partial audio discarded.
    #[error("all speech providers failed on chunk {chunk_index}: {last_error}")]
    AllProvidersFailed {
        chunk_index: usize,
        last_error: String,
    },

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("conversion cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stable machine-checkable kind, carried in job results.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExtractionEmpty => "extraction_empty",
            Self::InvalidRange { .. } => "invalid_range",
            Self::Config(_) => "configuration",
            Self::Pdf(_) => "pdf",
            Self::Synthesis(_) => "synthesis",
            Self::AllProvidersFailed { .. } => "all_providers_failed",
            Self::Assembly(AssemblyError::MissingExternalTool { .. }) => "missing_external_tool",
            Self::Assembly(_) => "assembly",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(PipelineError::ExtractionEmpty.kind(), "extraction_empty");
        assert_eq!(
            PipelineError::InvalidRange {
                start: 5,
                end: 3,
                page_count: 10,
                reason: "start page is after end page"
            }
            .kind(),
            "invalid_range"
        );
        assert_eq!(
            PipelineError::Assembly(AssemblyError::MissingExternalTool {
                tool: "ffmpeg".to_string()
            })
            .kind(),
            "missing_external_tool"
        );
        assert_eq!(PipelineError::Cancelled.kind(), "cancelled");
    }

    #[test]
    fn test_invalid_range_message_names_the_problem() {
        let err = PipelineError::InvalidRange {
            start: 5,
            end: 12,
            page_count: 3,
            reason: "end page is past the last page",
        };
        let message = err.to_string();
        assert!(message.contains("5-12"));
        assert!(message.contains("3 pages"));
    }
}
