use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Metadata stored alongside each vector in the index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PassageMetadata {
    pub title: String,
    pub author: String,
    pub year: String,
    pub month: String,
    pub url: String,
    /// In-page fragment for the passage, when the source has one
    #[serde(default)]
    pub anchor: Option<String>,
    pub text: String,
}

impl PassageMetadata {
    /// Source URL with the anchor appended as a fragment, if there is one.
    pub fn link(&self) -> String {
        match self.anchor.as_deref() {
            Some(anchor) if !anchor.is_empty() => format!("{}#{}", self.url, anchor),
            _ => self.url.clone(),
        }
    }
}

/// One hit returned by the vector index, ranked best-first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassageMatch {
    pub id: i64,
    #[serde(default)]
    pub score: f32,
    pub metadata: PassageMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: String,
    pub month: String,
    pub url: String,
    pub text: String,
}

impl From<&PassageMatch> for SearchResult {
    fn from(m: &PassageMatch) -> Self {
        Self {
            id: m.id,
            title: m.metadata.title.clone(),
            author: m.metadata.author.clone(),
            year: m.metadata.year.clone(),
            month: m.metadata.month.clone(),
            url: m.metadata.link(),
            text: m.metadata.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub q: String,
    pub session: u32,
    pub answer: String,
    pub results: Vec<SearchResult>,
}

/// Thumbs up or down on a search result. Encoded on the wire as `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Up,
    Down,
}

impl Rating {
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl TryFrom<i64> for Rating {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            _ => Err(format!("Invalid rating: {} (expected 1 or -1)", value)),
        }
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid rating: {}", s))?;
        Self::try_from(value)
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

// Query strings deliver every value as text, so accept both forms.
impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        let rating = match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Rating::try_from(v),
            Raw::Text(s) => s.parse(),
        };
        rating.map_err(serde::de::Error::custom)
    }
}

/// Parameters of `POST /rate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateParams {
    pub session: u32,
    pub user: String,
    pub result: i64,
    pub rating: Rating,
}
