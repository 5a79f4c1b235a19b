use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A voice supported by the OpenAI speech endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Voice not supported: {input}. Valid voices are: {}", Voice::valid_list())]
pub struct UnsupportedVoice {
    pub input: String,
}

impl Voice {
    pub const ALL: [Voice; 6] = [
        Voice::Alloy,
        Voice::Echo,
        Voice::Fable,
        Voice::Onyx,
        Voice::Nova,
        Voice::Shimmer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Onyx => "onyx",
            Voice::Nova => "nova",
            Voice::Shimmer => "shimmer",
        }
    }

    /// Comma separated list used in validation messages
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = UnsupportedVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == normalized)
            .ok_or_else(|| UnsupportedVoice {
                input: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Nova".parse::<Voice>().unwrap(), Voice::Nova);
        assert_eq!("SHIMMER".parse::<Voice>().unwrap(), Voice::Shimmer);
        assert_eq!(" echo ".parse::<Voice>().unwrap(), Voice::Echo);
    }

    #[test]
    fn test_every_voice_round_trips_through_its_name() {
        for voice in Voice::ALL {
            assert_eq!(voice.to_string().parse::<Voice>().unwrap(), voice);
        }
    }

    #[test]
    fn test_unknown_voice_lists_valid_set() {
        for bad in ["", "robot", "alloy2", "ash", "nova shimmer"] {
            let err = bad.parse::<Voice>().unwrap_err();
            let message = err.to_string();
            assert!(message.starts_with(&format!("Voice not supported: {}.", bad)));
            assert!(message.ends_with("Valid voices are: alloy, echo, fable, onyx, nova, shimmer"));
        }
    }
}
