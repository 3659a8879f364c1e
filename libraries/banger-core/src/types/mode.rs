/// Playback mode and catalog query types
use serde::{Deserialize, Serialize};

/// Repeat mode for the play queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at the end of the queue
    #[default]
    Off,
    /// Wrap around the whole queue
    All,
    /// Loop the current track
    One,
}

impl RepeatMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Some(Self::Off),
            "all" => Some(Self::All),
            "one" => Some(Self::One),
            _ => None,
        }
    }

    /// Next mode in the Off -> All -> One -> Off cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl std::fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side ordering understood by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOrder {
    /// Most played of all time
    Popularity,
    /// Most recently released first
    Newest,
}

impl CatalogOrder {
    /// Wire value for the `order` query parameter
    #[must_use]
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Popularity => "popularity_total",
            Self::Newest => "releasedate_desc",
        }
    }
}

/// Browse request: either a genre/mood tag or a server ordering
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrowseQuery {
    Tag(String),
    Order(CatalogOrder),
}

impl BrowseQuery {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }
}
