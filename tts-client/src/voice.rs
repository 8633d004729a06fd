//! Voice selection shared by all speech providers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TtsError};

/// English accent of the narration voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    British,
    American,
}

impl Accent {
    /// BCP-47 language tag used by the cloud providers.
    pub fn language_tag(&self) -> &'static str {
        match self {
            Self::British => "en-GB",
            Self::American => "en-US",
        }
    }
}

/// Gender of the narration voice.
///
/// Providers without gender selection ignore this and honor only the accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Accent and gender pair selected once per conversion and passed by value
/// to every synthesis call. Each provider maps it to its own voice id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub accent: Accent,
    pub gender: Gender,
}

impl VoiceProfile {
    pub const fn new(accent: Accent, gender: Gender) -> Self {
        Self { accent, gender }
    }

    /// Parse a voice spec like "british-female", "us male" or "uk-m".
    pub fn parse(s: &str) -> Result<Self> {
        let spec = s.to_lowercase();
        let parts: Vec<&str> = spec
            .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();

        let mut accent = None;
        let mut gender = None;
        for part in &parts {
            match *part {
                "british" | "uk" | "gb" => accent = Some(Accent::British),
                "american" | "us" => accent = Some(Accent::American),
                "male" | "m" => gender = Some(Gender::Male),
                "female" | "f" => gender = Some(Gender::Female),
                _ => {
                    return Err(TtsError::ConfigError(format!(
                        "unknown voice spec '{}': expected accent (british/american) and gender (male/female)",
                        s
                    )));
                }
            }
        }

        match (accent, gender) {
            (Some(accent), Some(gender)) => Ok(Self { accent, gender }),
            _ => Err(TtsError::ConfigError(format!(
                "incomplete voice spec '{}': expected accent (british/american) and gender (male/female)",
                s
            ))),
        }
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self::new(Accent::British, Gender::Female)
    }
}

impl fmt::Display for VoiceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accent = match self.accent {
            Accent::British => "British",
            Accent::American => "American",
        };
        let gender = match self.gender {
            Gender::Male => "Male",
            Gender::Female => "Female",
        };
        write!(f, "{} {}", accent, gender)
    }
}
