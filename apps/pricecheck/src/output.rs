//! Plain-text rendering of a session view for the terminal.

use std::io::{self, Write};

use client_core::{
    view::{EMPTY_STORE_PLACEHOLDER, NO_RESULTS_MESSAGE},
    StoreRows, ViewModel,
};
use shared::{domain::SortMode, protocol::ResultItem};

const MAX_NAME_WIDTH: usize = 60;

pub fn format_price(price: f64) -> String {
    format!("₹{price}")
}

pub fn write_view(
    out: &mut impl Write,
    view: &ViewModel<'_>,
    sort_mode: SortMode,
) -> io::Result<()> {
    match view {
        ViewModel::NotSearched => Ok(()),
        ViewModel::NoResults => writeln!(out, "{NO_RESULTS_MESSAGE}"),
        ViewModel::Grouped(stores) => {
            for (idx, store) in stores.iter().enumerate() {
                if idx > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "== {} ==", store.store)?;
                match store.rows {
                    StoreRows::Items(items) => write_table(out, items.iter())?,
                    StoreRows::Placeholder => writeln!(out, "{EMPTY_STORE_PLACEHOLDER}")?,
                }
            }
            Ok(())
        }
        ViewModel::Sorted(items) => {
            writeln!(out, "Sorted by: {}", sort_mode.label())?;
            write_table(out, items.iter().copied())
        }
    }
}

fn write_table<'a>(
    out: &mut impl Write,
    items: impl Iterator<Item = &'a ResultItem> + Clone,
) -> io::Result<()> {
    let name_width = items
        .clone()
        .map(|item| truncate_name(&item.name).chars().count())
        .max()
        .unwrap_or(0)
        .max("Product".len());
    let price_width = items
        .clone()
        .map(|item| format_price(item.price).chars().count())
        .max()
        .unwrap_or(0)
        .max("Price".len());

    writeln!(
        out,
        "{:<name_width$}  {:>price_width$}  Link",
        "Product", "Price"
    )?;
    for item in items {
        writeln!(
            out,
            "{:<name_width$}  {:>price_width$}  {}",
            truncate_name(&item.name),
            format_price(item.price),
            item.link
        )?;
    }
    Ok(())
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_WIDTH {
        return name.to_string();
    }
    let mut truncated: String = name.chars().take(MAX_NAME_WIDTH - 1).collect();
    truncated.push('…');
    truncated
}
