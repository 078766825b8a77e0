use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-session sequence number tagging each submitted search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a result set is laid out for display.
///
/// Toggling cycles `Grouped -> PriceAsc -> PriceDesc -> Grouped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Grouped,
    PriceAsc,
    PriceDesc,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [SortMode::Grouped, SortMode::PriceAsc, SortMode::PriceDesc];

    pub fn next(self) -> Self {
        Self::from_index((self.index() + 1) % Self::ALL.len())
    }

    pub fn index(self) -> usize {
        match self {
            SortMode::Grouped => 0,
            SortMode::PriceAsc => 1,
            SortMode::PriceDesc => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Grouped => "By store",
            SortMode::PriceAsc => "Price: Low to High",
            SortMode::PriceDesc => "Price: High to Low",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "0" | "grouped" | "store" | "stores" => Some(SortMode::Grouped),
            "1" | "asc" | "price_asc" | "price-asc" => Some(SortMode::PriceAsc),
            "2" | "desc" | "price_desc" | "price-desc" => Some(SortMode::PriceDesc),
            _ => None,
        }
    }
}
