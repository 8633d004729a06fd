//! eSpeak NG fallback provider
//!
//! Synthesizes locally through the `espeak-ng` binary. No credentials, no
//! network, coarser voice control: the voice is selected by accent only.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Result, TtsError};
use crate::provider::{AudioEncoding, SpeechProvider, SpeechRequest, SynthesizedAudio};
use crate::voice::{Accent, VoiceProfile};

const DEFAULT_COMMAND: &str = "espeak-ng";

/// eSpeak synthesizes locally; the ceiling only guards runaway memory use.
const MAX_INPUT_CHARS: usize = 100_000;

/// Provider that shells out to eSpeak NG
pub struct EspeakProvider {
    command: PathBuf,
}

impl EspeakProvider {
    /// Create a new eSpeak provider, optionally with an explicit binary path
    pub fn new(command: Option<PathBuf>) -> Self {
        Self {
            command: command.unwrap_or_else(|| PathBuf::from(DEFAULT_COMMAND)),
        }
    }

    /// eSpeak voice for an accent. Gender is not selectable.
    pub fn voice_id(voice: VoiceProfile) -> &'static str {
        match voice.accent {
            Accent::British => "en-gb",
            Accent::American => "en-us",
        }
    }
}

#[async_trait]
impl SpeechProvider for EspeakProvider {
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

        // Text goes over stdin; WAV audio comes back on stdout.
        let mut child = Command::new(&self.command)
            .args(["-v", voice_id, "--stdout", "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TtsError::ProviderUnavailable(format!(
                    "{} not found on PATH",
                    self.command.display()
                )),
                _ => TtsError::Io(e),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TtsError::ProviderUnavailable("failed to open espeak stdin".into()))?;
        stdin.write_all(request.text.as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::ProviderUnavailable(format!(
                "{} failed: {}",
                self.command.display(),
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(TtsError::ProviderUnavailable(format!(
                "{} produced no audio",
                self.command.display()
            )));
        }

        Ok(SynthesizedAudio {
            audio: output.stdout,
            encoding: AudioEncoding::Wav,
            voice_id: voice_id.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "eSpeak NG"
    }

    fn max_input_chars(&self) -> usize {
        MAX_INPUT_CHARS
    }

    fn supports_gender_selection(&self) -> bool {
        false
    }

    fn is_available(&self) -> Result<()> {
        which::which(&self.command).map(|_| ()).map_err(|_| {
            TtsError::ProviderUnavailable(format!(
                "{} not found on PATH; install espeak-ng for offline synthesis",
                self.command.display()
            ))
        })
    }
}
