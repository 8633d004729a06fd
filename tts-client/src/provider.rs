use async_trait::async_trait;

use crate::error::Result;
use crate::voice::VoiceProfile;

/// Request to send to a speech provider
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: VoiceProfile,
    /// Explicit provider voice id, bypassing the accent/gender mapping
    pub voice_id: Option<String>,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, voice: VoiceProfile) -> Self {
        Self {
            text: text.into(),
            voice,
            voice_id: None,
        }
    }
}

/// Audio produced for one request
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// Encoded audio bytes
    pub audio: Vec<u8>,
    pub encoding: AudioEncoding,
    /// Provider-specific voice id that was used
    pub voice_id: String,
}

/// Container format of synthesized audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    Mp3,
    Wav,
}

impl AudioEncoding {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

/// Trait for speech synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize one piece of text into audio
    async fn synthesize(&self, request: SpeechRequest) -> Result<SynthesizedAudio>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Hard per-request input limit in characters. Callers must not submit
    /// longer text.
    fn max_input_chars(&self) -> usize;

    /// Whether the provider honors `VoiceProfile::gender`. Accent-only
    /// backends return false and ignore the gender.
    fn supports_gender_selection(&self) -> bool {
        true
    }

    /// Check if the provider is usable (API key set, binary installed, etc.)
    fn is_available(&self) -> Result<()>;
}
