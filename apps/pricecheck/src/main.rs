use std::{io::Write, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{HttpBackendOptions, HttpSearchBackend, QueryEncoding, SearchSession};
use shared::domain::SortMode;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod output;

use config::{load_settings, normalize_base_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "pricecheck", about = "Compare product prices across stores")]
struct Args {
    /// Search backend base url; overrides pricecheck.toml and the environment.
    #[arg(long)]
    base_url: Option<String>,
    /// grouped, asc or desc.
    #[arg(long, default_value = "grouped", value_parser = parse_sort_mode)]
    sort: SortMode,
    /// Send the query unescaped as `<base>/<query>`.
    #[arg(long)]
    raw_query: bool,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(required = true)]
    query: Vec<String>,
}

fn parse_sort_mode(raw: &str) -> std::result::Result<SortMode, String> {
    SortMode::parse(raw).ok_or_else(|| format!("unknown sort mode '{raw}' (grouped, asc, desc)"))
}

fn apply_args(mut settings: Settings, args: &Args) -> Settings {
    if let Some(base_url) = &args.base_url {
        settings.base_url = normalize_base_url(base_url);
    }
    if args.raw_query {
        settings.query_encoding = QueryEncoding::Raw;
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout_secs = (secs > 0).then_some(secs);
    }
    settings
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = apply_args(load_settings(), &args);
    info!(base_url = %settings.base_url, encoding = ?settings.query_encoding, "using search backend");

    let backend = HttpSearchBackend::new(
        settings.base_url.as_str(),
        HttpBackendOptions {
            query_encoding: settings.query_encoding,
            timeout: settings.request_timeout_secs.map(Duration::from_secs),
        },
    )
    .with_context(|| format!("invalid search backend url '{}'", settings.base_url))?;

    let mut session = SearchSession::new(Arc::new(backend));
    while session.state().sort_mode() != args.sort {
        session.toggle_sort_mode();
    }

    let query = args.query.join(" ");
    let Some(outcome) = session.search(query.as_str()).await.cloned() else {
        bail!("search for '{query}' was not submitted");
    };
    if let Some(error) = outcome.error() {
        return Err(error.clone()).context(format!("search for '{query}' failed"));
    }

    let mut stdout = std::io::stdout().lock();
    output::write_view(&mut stdout, &session.view(), session.state().sort_mode())?;
    stdout.flush()?;
    Ok(())
}
