//! Google Cloud TTS provider
//!
//! Direct HTTP implementation of the `text:synthesize` REST endpoint.
//! Audio comes back base64-encoded in a JSON envelope.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::map_request_error;
use crate::error::{Result, TtsError};
use crate::provider::{AudioEncoding, SpeechProvider, SpeechRequest, SynthesizedAudio};
use crate::voice::{Accent, Gender, VoiceProfile};

const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Documented per-request input limit of the synthesize endpoint.
const MAX_INPUT_CHARS: usize = 5_000;

/// Provider for the Google Cloud Text-to-Speech REST API
pub struct GoogleProvider {
    api_key: String,
    client: Client,
}

impl GoogleProvider {
    /// Create a new Google Cloud TTS provider
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TtsError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { api_key, client })
    }

    /// Neural2 voice name for an accent/gender pair
    pub fn voice_id(voice: VoiceProfile) -> &'static str {
        match (voice.accent, voice.gender) {
            (Accent::British, Gender::Male) => "en-GB-Neural2-B",
            (Accent::British, Gender::Female) => "en-GB-Neural2-A",
            (Accent::American, Gender::Male) => "en-US-Neural2-D",
            (Accent::American, Gender::Female) => "en-US-Neural2-F",
        }
    }
}

// Google TTS API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: SynthesizeAudioConfig<'a>,
}

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeAudioConfig<'a> {
    audio_encoding: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
impl SpeechProvider for GoogleProvider {
    async fn synthesize(&self, request: SpeechRequest) -> Result<SynthesizedAudio> {
        let length = request.text.chars().count();
        if length > MAX_INPUT_CHARS {
            return Err(TtsError::InputTooLong {
                length,
                limit: MAX_INPUT_CHARS,
            });
        }

        let voice_id = request
            .voice_id
            .as_deref()
            .unwrap_or_else(|| Self::voice_id(request.voice));
        let api_request = SynthesizeRequest {
            input: TextInput {
                text: &request.text,
            },
            voice: VoiceSelection {
                language_code: request.voice.accent.language_tag(),
                name: voice_id,
            },
            audio_config: SynthesizeAudioConfig {
                audio_encoding: "MP3",
            },
        };

        let response = self
            .client
            .post(GOOGLE_TTS_URL)
            .query(&[("key", &self.api_key)])
            .json(&api_request)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            return Err(match status.as_u16() {
                429 => TtsError::RateLimited { retry_after: None },
                503 => TtsError::ServerOverloaded { message },
                code => TtsError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let api_response: SynthesizeResponse =
            response.json().await.map_err(|e| TtsError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        let audio = BASE64
            .decode(&api_response.audio_content)
            .map_err(|e| TtsError::ApiError {
                message: format!("Failed to decode audio payload: {}", e),
                status_code: None,
            })?;

        if audio.is_empty() {
            return Err(TtsError::ApiError {
                message: "empty audio response".to_string(),
                status_code: None,
            });
        }

        Ok(SynthesizedAudio {
            audio,
            encoding: AudioEncoding::Mp3,
            voice_id: voice_id.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "Google Cloud TTS"
    }

    fn max_input_chars(&self) -> usize {
        MAX_INPUT_CHARS
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_map() {
        let voice = VoiceProfile::new(Accent::British, Gender::Male);
        assert_eq!(GoogleProvider::voice_id(voice), "en-GB-Neural2-B");

        let voice = VoiceProfile::new(Accent::American, Gender::Female);
        assert_eq!(GoogleProvider::voice_id(voice), "en-US-Neural2-F");
    }

    #[test]
    fn test_request_serialization() {
        let api_request = SynthesizeRequest {
            input: TextInput { text: "Hello" },
            voice: VoiceSelection {
                language_code: "en-GB",
                name: "en-GB-Neural2-A",
            },
            audio_config: SynthesizeAudioConfig {
                audio_encoding: "MP3",
            },
        };
        let json = serde_json::to_string(&api_request).unwrap();
        assert!(json.contains("\"languageCode\":\"en-GB\""));
        assert!(json.contains("\"audioEncoding\":\"MP3\""));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"audioContent":"aGVsbG8=","audioConfig":{}}"#;
        let response: SynthesizeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(BASE64.decode(&response.audio_content).unwrap(), b"hello");
    }
}
