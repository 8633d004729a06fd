use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error(
        "API key not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded (HTTP 503): {message}")]
    ServerOverloaded { message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Voice '{voice}' is not supported by {provider}")]
    UnsupportedVoice { provider: String, voice: String },

    #[error("Input of {length} characters exceeds the {limit} character limit")]
    InputTooLong { length: usize, limit: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl TtsError {
    /// Whether retrying the same provider may succeed.
    ///
    /// Rate limits, overload and timeouts are worth retrying; bad
    /// credentials, unsupported voices and over-limit input are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::ServerOverloaded { .. } | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => matches!(status_code, Some(c) if *c >= 500),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(TtsError::RateLimited { retry_after: None }.is_transient());
        assert!(
            TtsError::ServerOverloaded {
                message: "busy".to_string()
            }
            .is_transient()
        );
        assert!(TtsError::Timeout("connect".to_string()).is_transient());
        assert!(
            TtsError::ApiError {
                message: "gateway".to_string(),
                status_code: Some(502)
            }
            .is_transient()
        );
    }

    #[test]
    fn test_permanent_errors() {
        assert!(
            !TtsError::MissingApiKey {
                provider: "Azure Speech".to_string(),
                env_var: "AZURE_SPEECH_KEY".to_string()
            }
            .is_transient()
        );
        assert!(
            !TtsError::ApiError {
                message: "forbidden".to_string(),
                status_code: Some(403)
            }
            .is_transient()
        );
        assert!(
            !TtsError::InputTooLong {
                length: 6000,
                limit: 5000
            }
            .is_transient()
        );
        assert!(!TtsError::ProviderUnavailable("espeak-ng".to_string()).is_transient());
    }
}
