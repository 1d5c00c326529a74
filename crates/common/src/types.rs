use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A named region of the realm the viewer is conceptually standing in.
///
/// The set is closed: every location the overlay can hold is listed in
/// [`Location::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Location {
    #[default]
    MirrorVoid,
    WhisperingGrass,
    ErodedRuins,
}

impl Location {
    /// Every location, in declaration order.
    pub const ALL: [Location; 3] = [
        Location::MirrorVoid,
        Location::WhisperingGrass,
        Location::ErodedRuins,
    ];

    /// Display name shown in the overlay and embedded in prompts.
    pub fn name(self) -> &'static str {
        match self {
            Self::MirrorVoid => "Mirror Void (Salt Lake)",
            Self::WhisperingGrass => "Whispering Grass (Endless Plains)",
            Self::ErodedRuins => "Eroded Tech (Megastructure Ruins)",
        }
    }

    /// Short identifier accepted on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::MirrorVoid => "mirror-void",
            Self::WhisperingGrass => "whispering-grass",
            Self::ErodedRuins => "eroded-ruins",
        }
    }

    /// Map any index onto the closed set (wraps around).
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no known location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown location '{0}' (expected one of: mirror-void, whispering-grass, eroded-ruins)")]
pub struct LocationParseError(pub String);

impl FromStr for Location {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|loc| {
                loc.slug().eq_ignore_ascii_case(trimmed) || loc.name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| LocationParseError(trimmed.to_string()))
    }
}

/// Unique, time-ordered identifier for a whisper entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WhisperId(pub Uuid);

impl WhisperId {
    /// UUIDv7: derived from the current time, monotonic within the process.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// First eight hex digits, for compact log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for WhisperId {
    fn default() -> Self {
        Self::new()
    }
}

/// One settled whisper: the text the wind spoke, where, and when.
///
/// Entries are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhisperEntry {
    pub id: WhisperId,
    pub text: String,
    pub location: Location,
    pub created_at: DateTime<Utc>,
}

impl WhisperEntry {
    /// Stamp a new entry with a fresh id and the current time.
    pub fn new(text: impl Into<String>, location: Location) -> Self {
        Self {
            id: WhisperId::new(),
            text: text.into(),
            location,
            created_at: Utc::now(),
        }
    }
}

/// Which branch of a whisper request produced the entry text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhisperOutcome {
    /// The service answered with non-empty text.
    Spoken,
    /// The service answered, but with no text.
    Silent,
    /// The request failed; the text is a fallback.
    Lost,
}
