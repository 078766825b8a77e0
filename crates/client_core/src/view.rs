//! Pure transform from a held result set and sort mode to display rows.

use shared::{
    domain::SortMode,
    protocol::{ResultItem, SearchResponse, StoreBlock},
};

pub const NO_RESULTS_MESSAGE: &str =
    "Sorry, no results were returned from the server. Try another search string.";
pub const EMPTY_STORE_PLACEHOLDER: &str = "No matching products found.";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewModel<'a> {
    /// Nothing held yet, or the backend sent its "no search performed" sentinel.
    NotSearched,
    NoResults,
    /// One labeled table per store, in backend order.
    Grouped(Vec<StoreView<'a>>),
    /// A single unlabeled table across all stores.
    Sorted(Vec<&'a ResultItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreView<'a> {
    pub store: &'a str,
    pub rows: StoreRows<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreRows<'a> {
    Items(&'a [ResultItem]),
    Placeholder,
}

impl<'a> StoreView<'a> {
    fn from_block(block: &'a StoreBlock) -> Self {
        let rows = if block.results.is_empty() {
            StoreRows::Placeholder
        } else {
            StoreRows::Items(&block.results)
        };
        Self {
            store: &block.store,
            rows,
        }
    }
}

impl ViewModel<'_> {
    /// Number of product rows the view would display.
    pub fn row_count(&self) -> usize {
        match self {
            ViewModel::NotSearched | ViewModel::NoResults => 0,
            ViewModel::Grouped(stores) => stores
                .iter()
                .map(|store| match store.rows {
                    StoreRows::Items(items) => items.len(),
                    StoreRows::Placeholder => 0,
                })
                .sum(),
            ViewModel::Sorted(items) => items.len(),
        }
    }
}

pub fn render(response: &SearchResponse, sort_mode: SortMode) -> ViewModel<'_> {
    if response.is_unsearched() {
        return ViewModel::NotSearched;
    }
    if response.has_no_results() {
        return ViewModel::NoResults;
    }

    match sort_mode {
        SortMode::Grouped => {
            ViewModel::Grouped(response.content.iter().map(StoreView::from_block).collect())
        }
        SortMode::PriceAsc => {
            let mut items = flatten(response);
            items.sort_by(|a, b| a.price.total_cmp(&b.price));
            ViewModel::Sorted(items)
        }
        SortMode::PriceDesc => {
            let mut items = flatten(response);
            items.sort_by(|a, b| b.price.total_cmp(&a.price));
            ViewModel::Sorted(items)
        }
    }
}

pub fn render_session(response: Option<&SearchResponse>, sort_mode: SortMode) -> ViewModel<'_> {
    match response {
        Some(response) => render(response, sort_mode),
        None => ViewModel::NotSearched,
    }
}

// Store order, then within-store order. `sort_by` is stable, so equal prices keep this order.
fn flatten(response: &SearchResponse) -> Vec<&ResultItem> {
    response
        .content
        .iter()
        .flat_map(|block| block.results.iter())
        .collect()
}
