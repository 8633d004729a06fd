//! Shared text-to-speech client library for the pdf-audiobook workspace
//!
//! Provides a unified interface over multiple speech synthesis backends:
//! - Azure Speech (REST, neural voices)
//! - Google Cloud TTS (REST)
//! - eSpeak NG (local subprocess, no credentials)

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod voice;

pub use config::{Config, ProviderConfig};
pub use error::{Result, TtsError};
pub use provider::{AudioEncoding, SpeechProvider, SpeechRequest, SynthesizedAudio};
pub use providers::{MockProvider, ProviderChain, ProviderKind, build_chain, get_provider};
pub use voice::{Accent, Gender, VoiceProfile};
