//! Mock speech provider for testing
//!
//! Provides a configurable mock provider that can simulate various behaviors
//! like failures, retries, and successful responses.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, TtsError};
use crate::provider::{AudioEncoding, SpeechProvider, SpeechRequest, SynthesizedAudio};

/// A mock provider for testing retry and fallback behavior
pub struct MockProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<TtsError>>,
    /// Audio bytes to return on success
    success_audio: Vec<u8>,
    /// Provider name for display
    name: &'static str,
    /// Input limit reported to callers
    max_input_chars: usize,
    /// Whether the mock claims gender selection
    supports_gender: bool,
}

impl MockProvider {
    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: TtsError, audio: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            success_audio: audio.to_vec(),
            name: "mock",
            max_input_chars: usize::MAX,
            supports_gender: true,
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: TtsError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            success_audio: Vec::new(),
            name: "mock",
            max_input_chars: usize::MAX,
            supports_gender: true,
        }
    }

    /// Create a provider that always succeeds
    pub fn always_succeeds(audio: &[u8]) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            success_audio: audio.to_vec(),
            name: "mock",
            max_input_chars: usize::MAX,
            supports_gender: true,
        }
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Set a custom provider name (useful for testing fallback scenarios)
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Set the reported input limit
    pub fn with_max_input_chars(mut self, limit: usize) -> Self {
        self.max_input_chars = limit;
        self
    }

    /// Make the mock an accent-only provider
    pub fn without_gender_selection(mut self) -> Self {
        self.supports_gender = false;
        self
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SynthesizedAudio> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        let fail_count = self.fail_count.load(Ordering::SeqCst);

        if call_num < fail_count {
            // Should fail on this call
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                // Clone the error for returning
                return Err(clone_error(err));
            }
        }

        // Success
        Ok(SynthesizedAudio {
            audio: self.success_audio.clone(),
            encoding: AudioEncoding::Mp3,
            voice_id: request
                .voice_id
                .unwrap_or_else(|| format!("mock-{}", request.voice)),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn supports_gender_selection(&self) -> bool {
        self.supports_gender
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a TtsError (needed because TtsError doesn't implement Clone)
fn clone_error(err: &TtsError) -> TtsError {
    match err {
        TtsError::MissingApiKey { provider, env_var } => TtsError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        TtsError::ProviderUnavailable(s) => TtsError::ProviderUnavailable(s.clone()),
        TtsError::RateLimited { retry_after } => TtsError::RateLimited {
            retry_after: *retry_after,
        },
        TtsError::ServerOverloaded { message } => TtsError::ServerOverloaded {
            message: message.clone(),
        },
        TtsError::Timeout(s) => TtsError::Timeout(s.clone()),
        TtsError::ApiError {
            message,
            status_code,
        } => TtsError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        TtsError::UnsupportedVoice { provider, voice } => TtsError::UnsupportedVoice {
            provider: provider.clone(),
            voice: voice.clone(),
        },
        TtsError::InputTooLong { length, limit } => TtsError::InputTooLong {
            length: *length,
            limit: *limit,
        },
        TtsError::ConfigError(s) => TtsError::ConfigError(s.clone()),
        // For Io and Toml errors, we create a generic error since they can't be cloned
        TtsError::Io(_) => TtsError::ConfigError("IO error (mock)".to_string()),
        TtsError::TomlParse(_) => TtsError::ConfigError("TOML parse error (mock)".to_string()),
        TtsError::TomlSerialize(_) => {
            TtsError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::VoiceProfile;

    fn request() -> SpeechRequest {
        SpeechRequest::new("test", VoiceProfile::default())
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = MockProvider::always_succeeds(b"audio");
        let result = provider.synthesize(request()).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().audio, b"audio");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(TtsError::ServerOverloaded {
            message: "overloaded".to_string(),
        });

        for _ in 0..3 {
            let result = provider.synthesize(request()).await;
            assert!(result.is_err());
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let provider = MockProvider::fails_then_succeeds(
            2,
            TtsError::ServerOverloaded {
                message: "overloaded".to_string(),
            },
            b"audio",
        );

        // First two calls fail
        assert!(provider.synthesize(request()).await.is_err());
        assert!(provider.synthesize(request()).await.is_err());

        // Third call succeeds
        let result = provider.synthesize(request()).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().audio, b"audio");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_voice_id_override_is_echoed() {
        let provider = MockProvider::always_succeeds(b"audio");
        let mut request = request();
        request.voice_id = Some("en-GB-RyanNeural".to_string());
        let result = provider.synthesize(request).await.unwrap();
        assert_eq!(result.voice_id, "en-GB-RyanNeural");
    }

    #[tokio::test]
    async fn test_builder_overrides() {
        let provider = MockProvider::always_succeeds(b"audio")
            .with_name("fallback")
            .with_max_input_chars(100)
            .without_gender_selection();

        assert_eq!(provider.name(), "fallback");
        assert_eq!(provider.max_input_chars(), 100);
        assert!(!provider.supports_gender_selection());
    }
}
