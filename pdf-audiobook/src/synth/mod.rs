//! Chunk-by-chunk speech synthesis with retry and provider fallback.
//!
//! Chunks are synthesized strictly in order, one in-flight call at a time.
//! Transient failures retry against the same provider a bounded number of
//! times; permanent failures fall over to the next provider in the chain.
//! One chunk exhausting the whole chain fails the job.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};
use tts_client::{SpeechProvider, SpeechRequest, TtsError, VoiceProfile};

use crate::audio::AudioSegment;
use crate::error::PipelineError;
use crate::text::Chunk;

/// Retries per provider on transient errors before falling over.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Where a chunk stands in the synthesis lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkState {
    Pending,
    InFlight {
        provider: &'static str,
        attempt: u32,
    },
    Retrying {
        provider: &'static str,
        attempt: u32,
    },
    FailedOver {
        provider: &'static str,
    },
    Succeeded,
    PermanentlyFailed,
}

/// Drives the provider chain over an ordered chunk sequence.
pub struct Synthesizer<'a> {
    chain: &'a [Box<dyn SpeechProvider>],
    voice: VoiceProfile,
    voice_id: Option<String>,
    max_retries: u32,
    states: Vec<ChunkState>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(chain: &'a [Box<dyn SpeechProvider>], voice: VoiceProfile) -> Self {
        Self {
            chain,
            voice,
            voice_id: None,
            max_retries: DEFAULT_MAX_RETRIES,
            states: Vec::new(),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Pin an explicit provider voice id instead of the accent/gender map.
    pub fn with_voice_id(mut self, voice_id: Option<String>) -> Self {
        self.voice_id = voice_id;
        self
    }

    /// Per-chunk states, indexed by chunk index.
    pub fn states(&self) -> &[ChunkState] {
        &self.states
    }

    /// Synthesize every chunk in order, reporting progress after each one.
    ///
    /// The returned segments are ordered by chunk index. The cancel flag is
    /// honored between chunks; an in-flight call is never interrupted.
    pub async fn run<F>(
        &mut self,
        chunks: &[Chunk],
        cancel: &AtomicBool,
        mut on_progress: F,
    ) -> Result<Vec<AudioSegment>, PipelineError>
    where
        F: FnMut(usize, usize),
    {
        if self.chain.is_empty() {
            return Err(PipelineError::Synthesis(TtsError::ProviderUnavailable(
                "no speech providers configured".to_string(),
            )));
        }

        self.states = vec![ChunkState::Pending; chunks.len()];
        let total = chunks.len();
        let mut segments = Vec::with_capacity(total);

        on_progress(0, total);
        for chunk in chunks {
            if cancel.load(Ordering::SeqCst) {
                return Err(PipelineError::Cancelled);
            }
            let segment = self.synthesize_chunk(chunk).await?;
            segments.push(segment);
            on_progress(segments.len(), total);
        }

        Ok(segments)
    }

    /// Walk the provider chain for one chunk.
    async fn synthesize_chunk(&mut self, chunk: &Chunk) -> Result<AudioSegment, PipelineError> {
        let chain = self.chain;
        let mut last_error: Option<TtsError> = None;

        for (position, provider) in chain.iter().enumerate() {
            if position > 0 {
                warn!(
                    "chunk {}: falling back to {}",
                    chunk.index,
                    provider.name()
                );
                self.states[chunk.index] = ChunkState::FailedOver {
                    provider: provider.name(),
                };
            }

            if chunk.char_count > provider.max_input_chars() {
                warn!(
                    "chunk {} ({} chars) exceeds the {} input limit of {}",
                    chunk.index,
                    chunk.char_count,
                    provider.name(),
                    provider.max_input_chars()
                );
                last_error = Some(TtsError::InputTooLong {
                    length: chunk.char_count,
                    limit: provider.max_input_chars(),
                });
                continue;
            }

            if !provider.supports_gender_selection() {
                debug!(
                    "{} selects voices by accent only; requested gender is ignored",
                    provider.name()
                );
            }

            match self.try_provider(chunk, provider.as_ref()).await {
                Ok(segment) => {
                    self.states[chunk.index] = ChunkState::Succeeded;
                    return Ok(segment);
                }
                Err(e) => {
                    warn!("chunk {}: {} failed: {}", chunk.index, provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        self.states[chunk.index] = ChunkState::PermanentlyFailed;
        Err(PipelineError::AllProvidersFailed {
            chunk_index: chunk.index,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no providers attempted".to_string()),
        })
    }

    /// One provider, with bounded retries on transient errors.
    async fn try_provider(
        &mut self,
        chunk: &Chunk,
        provider: &dyn SpeechProvider,
    ) -> Result<AudioSegment, TtsError> {
        let mut attempt = 0;
        loop {
            self.states[chunk.index] = ChunkState::InFlight {
                provider: provider.name(),
                attempt,
            };

            let request = SpeechRequest {
                text: chunk.text.clone(),
                voice: self.voice,
                voice_id: self.voice_id.clone(),
            };

            match provider.synthesize(request).await {
                Ok(audio) => return Ok(AudioSegment::new(chunk.index, audio)),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!(
                        "chunk {}: {} transient failure, retry {} of {}: {}",
                        chunk.index,
                        provider.name(),
                        attempt,
                        self.max_retries,
                        e
                    );
                    self.states[chunk.index] = ChunkState::Retrying {
                        provider: provider.name(),
                        attempt,
                    };
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tts_client::MockProvider;

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, t.to_string()))
            .collect()
    }

    fn boxed(providers: Vec<MockProvider>) -> Vec<Box<dyn SpeechProvider>> {
        providers
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn SpeechProvider>)
            .collect()
    }

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[tokio::test]
    async fn test_all_chunks_succeed_in_order() {
        let chain = boxed(vec![MockProvider::always_succeeds(b"audio")]);
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default());

        let chunks = chunks(&["one", "two", "three"]);
        let segments = synth.run(&chunks, &no_cancel(), |_, _| {}).await.unwrap();

        assert_eq!(segments.len(), 3);
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.chunk_index, i);
        }
        assert!(synth.states().iter().all(|s| *s == ChunkState::Succeeded));
    }

    #[tokio::test]
    async fn test_progress_reported_per_chunk() {
        let chain = boxed(vec![MockProvider::always_succeeds(b"audio")]);
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default());

        let mut reports = Vec::new();
        let chunks = chunks(&["one", "two"]);
        synth
            .run(&chunks, &no_cancel(), |done, total| reports.push((done, total)))
            .await
            .unwrap();

        assert_eq!(reports, vec![(0, 2), (1, 2), (2, 2)]);
    }

    #[tokio::test]
    async fn test_transient_error_retries_same_provider() {
        let flaky = MockProvider::fails_then_succeeds(
            2,
            TtsError::ServerOverloaded {
                message: "busy".to_string(),
            },
            b"audio",
        );
        let chain = boxed(vec![flaky]);
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default());

        // Succeeds only if both transient failures were retried on the
        // sole provider; there is no fallback in this chain.
        let chunks = chunks(&["one"]);
        let segments = synth.run(&chunks, &no_cancel(), |_, _| {}).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(synth.states()[0], ChunkState::Succeeded);
    }

    #[tokio::test]
    async fn test_permanent_error_skips_retries() {
        let bad_key = MockProvider::always_fails(TtsError::ApiError {
            message: "subscription key rejected".to_string(),
            status_code: Some(401),
        });
        let fallback = MockProvider::always_succeeds(b"fallback-audio").with_name("fallback");
        let chain = boxed(vec![bad_key, fallback]);
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default());

        let chunks = chunks(&["one"]);
        let segments = synth.run(&chunks, &no_cancel(), |_, _| {}).await.unwrap();
        assert_eq!(segments[0].audio, b"fallback-audio");
        assert_eq!(synth.states()[0], ChunkState::Succeeded);
    }

    #[tokio::test]
    async fn test_transient_exhaustion_falls_over() {
        let always_busy = MockProvider::always_fails(TtsError::RateLimited { retry_after: None });
        let fallback = MockProvider::always_succeeds(b"fallback-audio").with_name("fallback");
        let chain = boxed(vec![always_busy, fallback]);
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default()).with_max_retries(2);

        let chunks = chunks(&["one"]);
        let segments = synth.run(&chunks, &no_cancel(), |_, _| {}).await.unwrap();
        assert_eq!(segments[0].audio, b"fallback-audio");
    }

    #[tokio::test]
    async fn test_all_providers_failing_fails_the_job() {
        let first = MockProvider::always_fails(TtsError::ApiError {
            message: "rejected".to_string(),
            status_code: Some(403),
        });
        let second = MockProvider::always_fails(TtsError::ProviderUnavailable(
            "espeak-ng not found".to_string(),
        ));
        let chain = boxed(vec![first, second]);
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default());

        let chunks = chunks(&["one", "two"]);
        let err = synth
            .run(&chunks, &no_cancel(), |_, _| {})
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "all_providers_failed");
        assert_eq!(synth.states()[0], ChunkState::PermanentlyFailed);
        // later chunks never started
        assert_eq!(synth.states()[1], ChunkState::Pending);
    }

    #[tokio::test]
    async fn test_over_limit_chunk_falls_through_to_larger_provider() {
        let small = MockProvider::always_succeeds(b"small").with_max_input_chars(3);
        let large = MockProvider::always_succeeds(b"large").with_name("large");
        let chain = boxed(vec![small, large]);
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default());

        let chunks = chunks(&["longer than three"]);
        let segments = synth.run(&chunks, &no_cancel(), |_, _| {}).await.unwrap();
        assert_eq!(segments[0].audio, b"large");
    }

    #[tokio::test]
    async fn test_empty_chain_is_rejected() {
        let chain: Vec<Box<dyn SpeechProvider>> = Vec::new();
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default());
        let chunks = chunks(&["one"]);
        let err = synth
            .run(&chunks, &no_cancel(), |_, _| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "synthesis");
    }

    #[tokio::test]
    async fn test_cancellation_between_chunks() {
        let chain = boxed(vec![MockProvider::always_succeeds(b"audio")]);
        let mut synth = Synthesizer::new(&chain, VoiceProfile::default());

        let cancel = AtomicBool::new(true);
        let chunks = chunks(&["one", "two"]);
        let err = synth.run(&chunks, &cancel, |_, _| {}).await.unwrap_err();
        assert_eq!(err.kind(), "cancelled");
    }
}
