//! Speech provider implementations

mod azure;
mod espeak;
mod google;
pub mod mock;

pub use azure::AzureProvider;
pub use espeak::EspeakProvider;
pub use google::GoogleProvider;
pub use mock::MockProvider;

use crate::config::{Config, ProviderConfig};
use crate::error::{Result, TtsError};
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Azure,
    Google,
    Espeak,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "azure" | "azure-speech" | "azurespeech" => Ok(Self::Azure),
            "google" | "google-tts" | "gcloud" => Ok(Self::Google),
            "espeak" | "espeak-ng" | "local" => Ok(Self::Espeak),
            _ => Err(TtsError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            Self::Azure => Some("AZURE_SPEECH_KEY"),
            Self::Google => Some("GOOGLE_TTS_API_KEY"),
            Self::Espeak => None,
        }
    }
}

/// Create a provider instance from a kind and optional config
pub fn get_provider(
    kind: ProviderKind,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn SpeechProvider>> {
    match kind {
        ProviderKind::Azure => {
            let api_key = get_api_key(provider_config, "AZURE_SPEECH_KEY", "Azure Speech")?;
            let region = provider_config.and_then(|c| c.region.clone());
            Ok(Box::new(AzureProvider::new(api_key, region)?))
        }
        ProviderKind::Google => {
            let api_key = get_api_key(provider_config, "GOOGLE_TTS_API_KEY", "Google Cloud TTS")?;
            Ok(Box::new(GoogleProvider::new(api_key)?))
        }
        ProviderKind::Espeak => {
            let command = provider_config.and_then(|c| c.command.clone());
            Ok(Box::new(EspeakProvider::new(command)))
        }
    }
}

/// A preference-ordered chain of usable providers.
pub struct ProviderChain {
    /// Providers in fallback order
    pub providers: Vec<Box<dyn SpeechProvider>>,
    /// Requested providers that could not be used, with the reason
    pub skipped: Vec<(String, TtsError)>,
}

/// Build a provider chain from a preference-ordered list of names.
///
/// Providers whose prerequisites are unmet (missing key, missing binary)
/// are collected in `skipped` rather than aborting the whole chain; the
/// caller decides whether an empty chain is fatal.
pub fn build_chain(names: &[String], config: &Config) -> ProviderChain {
    let mut chain = ProviderChain {
        providers: Vec::new(),
        skipped: Vec::new(),
    };

    for name in names {
        let kind = match ProviderKind::from_str(name) {
            Ok(kind) => kind,
            Err(e) => {
                chain.skipped.push((name.clone(), e));
                continue;
            }
        };

        let provider = match get_provider(kind, config.get_provider_config(name)) {
            Ok(provider) => provider,
            Err(e) => {
                chain.skipped.push((name.clone(), e));
                continue;
            }
        };

        if let Err(e) = provider.is_available() {
            chain.skipped.push((name.clone(), e));
            continue;
        }

        chain.providers.push(provider);
    }

    chain
}

/// Get API key from config or environment variable
fn get_api_key(
    config: Option<&ProviderConfig>,
    env_var: &str,
    provider_name: &str,
) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(env_var).map_err(|_| TtsError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}

/// Map a reqwest transport error onto the taxonomy.
pub(crate) fn map_request_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() || e.is_connect() {
        TtsError::Timeout(e.to_string())
    } else {
        TtsError::ApiError {
            message: format!("Request failed: {}", e),
            status_code: None,
        }
    }
}
