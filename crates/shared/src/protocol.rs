use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ResponseValidationError;

/// Sentinel the backend uses for "no search performed yet".
pub const UNSEARCHED_RESULT_COUNT: i64 = -1;

/// Body of the aggregated search call.
///
/// Once received it is never mutated; a new submission yields a new value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(
        rename = "n_results",
        alias = "resultCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub result_count: Option<i64>,
    #[serde(default)]
    pub content: Vec<StoreBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreBlock {
    pub store: String,
    pub results: Vec<ResultItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub name: String,
    pub price: f64,
    pub link: String,
}

impl SearchResponse {
    pub fn new(result_count: i64, content: Vec<StoreBlock>) -> Self {
        Self {
            result_count: Some(result_count),
            content,
        }
    }

    pub fn unsearched() -> Self {
        Self {
            result_count: Some(UNSEARCHED_RESULT_COUNT),
            content: Vec::new(),
        }
    }

    /// `n_results` of `-1` marks a placeholder body returned before any search ran.
    pub fn is_unsearched(&self) -> bool {
        self.result_count == Some(UNSEARCHED_RESULT_COUNT)
    }

    /// True when the backend reported nothing to show: count absent or zero.
    pub fn has_no_results(&self) -> bool {
        matches!(self.result_count, None | Some(0))
    }

    pub fn item_count(&self) -> usize {
        self.content.iter().map(|block| block.results.len()).sum()
    }

    pub fn stores(&self) -> impl Iterator<Item = &str> {
        self.content.iter().map(|block| block.store.as_str())
    }

    pub fn validate(&self) -> Result<(), ResponseValidationError> {
        let mut seen = HashSet::with_capacity(self.content.len());
        for block in &self.content {
            if !seen.insert(block.store.as_str()) {
                return Err(ResponseValidationError::DuplicateStore {
                    store: block.store.clone(),
                });
            }
            for item in &block.results {
                if !item.price.is_finite() || item.price < 0.0 {
                    return Err(ResponseValidationError::InvalidPrice {
                        store: block.store.clone(),
                        name: item.name.clone(),
                        price: item.price,
                    });
                }
            }
        }

        let items = self.item_count();
        match self.result_count {
            Some(count) if count > 0 && items == 0 => {
                Err(ResponseValidationError::MissingContent { result_count: count })
            }
            Some(0) if items > 0 => Err(ResponseValidationError::UnexpectedContent { items }),
            _ => Ok(()),
        }
    }
}

impl StoreBlock {
    pub fn new(store: impl Into<String>, results: Vec<ResultItem>) -> Self {
        Self {
            store: store.into(),
            results,
        }
    }
}

impl ResultItem {
    pub fn new(name: impl Into<String>, price: f64, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            link: link.into(),
        }
    }
}
