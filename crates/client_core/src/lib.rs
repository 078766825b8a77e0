use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::SearchResponse;
use tracing::{debug, warn};
use url::Url;

pub mod error;
pub mod session;
pub mod view;

pub use error::{RetrievalError, RetrievalErrorCategory};
pub use session::{
    SearchCommand, SearchSession, SessionEvent, SessionState, SubmissionOutcome, Transition,
};
pub use view::{render, render_session, StoreRows, StoreView, ViewModel};

/// The one retrieval call a session issues per submission.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse, RetrievalError>;
}

/// How the submitted text is placed into the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryEncoding {
    /// Percent-encode the whole query as a single path segment.
    #[default]
    PathSegment,
    /// Concatenate `<base>/<query>` verbatim; slashes and `?` keep their URL meaning.
    Raw,
}

#[derive(Debug, Clone, Default)]
pub struct HttpBackendOptions {
    pub query_encoding: QueryEncoding,
    pub timeout: Option<Duration>,
}

pub struct HttpSearchBackend {
    http: Client,
    base_url: String,
    query_encoding: QueryEncoding,
}

impl HttpSearchBackend {
    pub fn new(
        base_url: impl Into<String>,
        options: HttpBackendOptions,
    ) -> Result<Self, RetrievalError> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| RetrievalError::Transport(err.to_string()))?;
        Self::with_client(http, base_url, options.query_encoding)
    }

    pub fn with_client(
        http: Client,
        base_url: impl Into<String>,
        query_encoding: QueryEncoding,
    ) -> Result<Self, RetrievalError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)?;
        if parsed.cannot_be_a_base() {
            return Err(RetrievalError::InvalidUrl(format!(
                "{base_url} cannot be used as a base url"
            )));
        }
        Ok(Self {
            http,
            base_url,
            query_encoding,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn search_url(&self, query: &str) -> Result<Url, RetrievalError> {
        match self.query_encoding {
            QueryEncoding::PathSegment => {
                let mut url = Url::parse(&self.base_url)?;
                url.path_segments_mut()
                    .map_err(|()| {
                        RetrievalError::InvalidUrl(format!(
                            "{} cannot be used as a base url",
                            self.base_url
                        ))
                    })?
                    .pop_if_empty()
                    .push(query);
                Ok(url)
            }
            QueryEncoding::Raw => Ok(Url::parse(&format!("{}/{}", self.base_url, query))?),
        }
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str) -> Result<SearchResponse, RetrievalError> {
        let url = self.search_url(query)?;
        debug!(%url, "sending search request");

        let res = self.http.get(url).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "search backend rejected request");
            return Err(RetrievalError::from_status(status.as_u16(), &body));
        }

        let response: SearchResponse = serde_json::from_str(&body)?;
        response.validate()?;
        Ok(response)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
