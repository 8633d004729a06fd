//! The end-to-end conversion job: extract, chunk, synthesize, assemble.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use log::{debug, warn};
use tts_client::{SpeechProvider, VoiceProfile};

use crate::audio::{self, AssemblyOptions, AssemblyReport};
use crate::error::PipelineError;
use crate::pdf::{self, PageRange, StructureOptions};
use crate::synth::{DEFAULT_MAX_RETRIES, Synthesizer};
use crate::text::{self, chunker};

/// Pipeline stage reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Chunking,
    Synthesizing,
    Assembling,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Extracting => "Extracting text",
            Self::Chunking => "Chunking text",
            Self::Synthesizing => "Synthesizing speech",
            Self::Assembling => "Assembling audio",
        }
    }
}

/// Progress snapshot delivered after every unit of work.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub stage: Stage,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// Machine-checkable error carried in a failed result.
#[derive(Debug, Clone, Serialize)]
pub struct JobError {
    pub kind: String,
    pub message: String,
}

/// Structured outcome of one conversion.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    pub chunk_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_estimate_secs: Option<f64>,
}

impl JobResult {
    fn completed(chunk_count: usize, duration_estimate_secs: f64) -> Self {
        Self {
            status: JobStatus::Completed,
            error: None,
            chunk_count,
            duration_estimate_secs: Some(duration_estimate_secs),
        }
    }

    fn failed(error: &PipelineError, chunk_count: usize) -> Self {
        Self {
            status: JobStatus::Failed,
            error: Some(JobError {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
            chunk_count,
            duration_estimate_secs: None,
        }
    }
}

/// Everything needed to run one conversion.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub pages: PageRange,
    pub voice: VoiceProfile,
    /// Explicit provider voice id, bypassing the accent/gender mapping.
    pub voice_id: Option<String>,
    pub max_chunk_chars: usize,
    pub structure: StructureOptions,
    pub assembly: AssemblyOptions,
    pub max_retries: u32,
    pub output_path: PathBuf,
}

impl JobOptions {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            pages: PageRange::ALL,
            voice: VoiceProfile::default(),
            voice_id: None,
            max_chunk_chars: chunker::DEFAULT_MAX_CHUNK_CHARS,
            structure: StructureOptions::default(),
            assembly: AssemblyOptions::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            output_path,
        }
    }
}

/// One document-to-audiobook conversion against a fixed provider chain.
pub struct AudiobookJob<'a> {
    chain: &'a [Box<dyn SpeechProvider>],
    options: JobOptions,
    created_at: DateTime<Utc>,
}

impl<'a> AudiobookJob<'a> {
    pub fn new(chain: &'a [Box<dyn SpeechProvider>], options: JobOptions) -> Self {
        Self {
            chain,
            options,
            created_at: Utc::now(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Run the pipeline to completion, translating any failure into a
    /// structured result. On failure, partial output is removed rather
    /// than left behind looking complete.
    pub async fn run<F>(
        &self,
        pdf_bytes: &[u8],
        cancel: &AtomicBool,
        mut on_progress: F,
    ) -> (JobResult, Option<AssemblyReport>)
    where
        F: FnMut(Progress),
    {
        let mut chunk_count = 0;
        match self
            .run_inner(pdf_bytes, cancel, &mut chunk_count, &mut on_progress)
            .await
        {
            Ok(report) => (JobResult::completed(chunk_count, report.duration_secs), Some(report)),
            Err(e) => {
                if self.options.output_path.exists() {
                    let _ = std::fs::remove_file(&self.options.output_path);
                }
                (JobResult::failed(&e, chunk_count), None)
            }
        }
    }

    async fn run_inner<F>(
        &self,
        pdf_bytes: &[u8],
        cancel: &AtomicBool,
        chunk_count: &mut usize,
        on_progress: &mut F,
    ) -> Result<AssemblyReport, PipelineError>
    where
        F: FnMut(Progress),
    {
        let opts = &self.options;

        on_progress(Progress {
            stage: Stage::Extracting,
            completed: 0,
            total: 1,
        });
        let blocks = pdf::extract_blocks(pdf_bytes, opts.pages, &opts.structure)?;
        debug!("extracted {} blocks", blocks.len());
        on_progress(Progress {
            stage: Stage::Extracting,
            completed: 1,
            total: 1,
        });

        on_progress(Progress {
            stage: Stage::Chunking,
            completed: 0,
            total: 1,
        });
        let flattened = text::flatten_blocks(&blocks);
        let chunks = chunker::split_into_chunks(&flattened, opts.max_chunk_chars)?;
        *chunk_count = chunks.len();
        debug!(
            "{} chunks from {} flattened chars",
            chunks.len(),
            flattened.chars().count()
        );
        on_progress(Progress {
            stage: Stage::Chunking,
            completed: 1,
            total: 1,
        });

        // The chunk limit should sit at or below every provider's input
        // limit; warn when a later chain entry could reject chunks.
        if let Some(min_limit) = self.chain.iter().map(|p| p.max_input_chars()).min() {
            if opts.max_chunk_chars > min_limit {
                warn!(
                    "chunk size {} exceeds the smallest provider input limit {}",
                    opts.max_chunk_chars, min_limit
                );
            }
        }

        let mut synthesizer = Synthesizer::new(self.chain, opts.voice)
            .with_max_retries(opts.max_retries)
            .with_voice_id(opts.voice_id.clone());
        let outcome = synthesizer
            .run(&chunks, cancel, |completed, total| {
                on_progress(Progress {
                    stage: Stage::Synthesizing,
                    completed,
                    total,
                })
            })
            .await;
        if outcome.is_err() {
            debug!("chunk states at failure: {:?}", synthesizer.states());
        }
        let mut segments = outcome?;

        on_progress(Progress {
            stage: Stage::Assembling,
            completed: 0,
            total: 1,
        });
        let report = audio::assemble_mp3(&mut segments, &opts.output_path, &opts.assembly)?;
        on_progress(Progress {
            stage: Stage::Assembling,
            completed: 1,
            total: 1,
        });

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_carries_kind_and_message() {
        let error = PipelineError::ExtractionEmpty;
        let result = JobResult::failed(&error, 0);
        assert_eq!(result.status, JobStatus::Failed);
        let job_error = result.error.as_ref().unwrap();
        assert_eq!(job_error.kind, "extraction_empty");
        assert!(job_error.message.contains("no extractable text"));
        assert!(result.duration_estimate_secs.is_none());
    }

    #[test]
    fn test_completed_result() {
        let result = JobResult::completed(12, 340.5);
        assert_eq!(result.status, JobStatus::Completed);
        assert!(result.error.is_none());
        assert_eq!(result.chunk_count, 12);
        assert_eq!(result.duration_estimate_secs, Some(340.5));
    }

    #[test]
    fn test_result_serializes_for_callers() {
        let result = JobResult::failed(&PipelineError::Cancelled, 3);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"kind\":\"cancelled\""));
    }

    #[test]
    fn test_default_job_options() {
        let options = JobOptions::new(PathBuf::from("out.mp3"));
        assert_eq!(options.max_chunk_chars, 4500);
        assert_eq!(options.max_retries, 2);
        assert_eq!(options.pages, PageRange::ALL);
    }
}
