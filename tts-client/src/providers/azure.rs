//! Azure Speech provider
//!
//! Direct HTTP implementation of the Azure Cognitive Services TTS REST API.
//! One SSML request per text chunk, MP3 audio in the response body.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::map_request_error;
use crate::error::{Result, TtsError};
use crate::provider::{AudioEncoding, SpeechProvider, SpeechRequest, SynthesizedAudio};
use crate::voice::{Accent, Gender, VoiceProfile};

const DEFAULT_REGION: &str = "eastus";
const OUTPUT_FORMAT: &str = "audio-24khz-96kbitrate-mono-mp3";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Hard per-request ceiling. The service accepts more, but chunking should
/// stay well below it anyway.
const MAX_INPUT_CHARS: usize = 9_000;

/// Provider for the Azure Speech REST API
pub struct AzureProvider {
    api_key: String,
    region: String,
    client: Client,
}

impl AzureProvider {
    /// Create a new Azure Speech provider
    pub fn new(api_key: String, region: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TtsError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            region: region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }

    /// Neural voice id for an accent/gender pair
    pub fn voice_id(voice: VoiceProfile) -> &'static str {
        match (voice.accent, voice.gender) {
            (Accent::British, Gender::Male) => "en-GB-RyanNeural",
            (Accent::British, Gender::Female) => "en-GB-SoniaNeural",
            (Accent::American, Gender::Male) => "en-US-GuyNeural",
            (Accent::American, Gender::Female) => "en-US-JennyNeural",
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn build_ssml(voice_id: &str, lang: &str, text: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        lang,
        voice_id,
        escape_xml(text)
    )
}

#[async_trait]
impl SpeechProvider for AzureProvider {
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
        let body = build_ssml(voice_id, request.voice.accent.language_tag(), &request.text);

        let response = self
            .client
            .post(self.endpoint())
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", OUTPUT_FORMAT)
            .header("User-Agent", "pdf-audio")
            .body(body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let message = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => TtsError::RateLimited { retry_after },
                503 => TtsError::ServerOverloaded { message },
                401 | 403 => TtsError::ApiError {
                    message: format!("subscription key rejected: {}", message),
                    status_code: Some(status.as_u16()),
                },
                code => TtsError::ApiError {
                    message,
                    status_code: Some(code),
                },
            });
        }

        let audio = response.bytes().await.map_err(map_request_error)?.to_vec();
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
        "Azure Speech"
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
        let voice = VoiceProfile::new(Accent::British, Gender::Female);
        assert_eq!(AzureProvider::voice_id(voice), "en-GB-SoniaNeural");

        let voice = VoiceProfile::new(Accent::American, Gender::Male);
        assert_eq!(AzureProvider::voice_id(voice), "en-US-GuyNeural");
    }

    #[test]
    fn test_ssml_escapes_markup() {
        let ssml = build_ssml("en-GB-SoniaNeural", "en-GB", "AT&T <rates> 'up'");
        assert!(ssml.contains("AT&amp;T &lt;rates&gt; &apos;up&apos;"));
        assert!(ssml.starts_with("<speak version='1.0' xml:lang='en-GB'>"));
    }

    #[test]
    fn test_default_region_endpoint() {
        let provider = AzureProvider::new("key".to_string(), None).unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://eastus.tts.speech.microsoft.com/cognitiveservices/v1"
        );

        let provider = AzureProvider::new("key".to_string(), Some("uksouth".to_string())).unwrap();
        assert!(provider.endpoint().starts_with("https://uksouth."));
    }
}
