//! Supported interface languages
//!
//! The UI switches between five languages. Each one maps to a BCP-47
//! `ll-CC` tag used to configure both the recognizer and the synthesizer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// An interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    De,
    Mr,
    Hi,
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl Language {
    /// All supported languages, in selector order
    pub const ALL: [Language; 5] = [
        Language::En,
        Language::Es,
        Language::De,
        Language::Mr,
        Language::Hi,
    ];

    /// Look up a language by its two-letter code. Region suffixes such as
    /// `hi-IN` are accepted.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            "de" => Some(Self::De),
            "mr" => Some(Self::Mr),
            "hi" => Some(Self::Hi),
            _ => None,
        }
    }

    /// Two-letter code
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::De => "de",
            Self::Mr => "mr",
            Self::Hi => "hi",
        }
    }

    /// `ll-CC` tag handed to the platform recognizer and synthesizer
    pub fn tag(&self) -> &'static str {
        match self {
            Self::En => "en-US",
            Self::Es => "es-ES",
            Self::De => "de-DE",
            Self::Mr => "mr-IN",
            Self::Hi => "hi-IN",
        }
    }

    /// Name of the language in the language itself
    pub fn native_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Español",
            Self::De => "Deutsch",
            Self::Mr => "मराठी",
            Self::Hi => "हिन्दी",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| ConfigError::UnknownLanguage(s.to_string()))
    }
}
