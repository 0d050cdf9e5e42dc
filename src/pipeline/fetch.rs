//! Markup fetch: talk to a MediaWiki action API.
//!
//! Four read-only queries cover everything the pipeline needs: a title
//! search, the raw wikitext of the latest revision, the rendered HTML (for
//! the image manifest) and the plain-text introduction. Each request is a
//! single GET with `format=json&formatversion=2`; responses are decoded into
//! small serde structs and the interesting field is picked out by a pure
//! function so the decoding can be tested without a network.

use crate::config::ConversionConfig;
use crate::error::Wiki2TexError;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// A MediaWiki action API client.
#[derive(Debug, Clone)]
pub struct WikiClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout_secs: u64,
}

impl WikiClient {
    pub fn new(config: &ConversionConfig) -> Result<Self, Wiki2TexError> {
        let endpoint = Url::parse(&config.api_endpoint).map_err(|e| {
            Wiki2TexError::InvalidConfig(format!(
                "api_endpoint '{}' is not a valid URL: {e}",
                config.api_endpoint
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Wiki2TexError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            timeout_secs: config.fetch_timeout_secs,
        })
    }

    /// Build the request URL for `params`, adding the JSON format flags.
    pub fn request_url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("formatversion", "2")
            .extend_pairs(params);
        url
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, Wiki2TexError> {
        let url = self.request_url(params);
        debug!("GET {}", url);

        let failed = |reason: String| Wiki2TexError::FetchFailed {
            url: url.to_string(),
            reason,
        };
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                Wiki2TexError::FetchTimeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                failed(e.to_string())
            }
        };

        let response = self.http.get(url.clone()).send().await.map_err(classify)?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }
        response.json::<T>().await.map_err(classify)
    }

    /// Resolve `query` to the title of the best-matching page.
    pub async fn search_title(&self, query: &str) -> Result<String, Wiki2TexError> {
        let resp: QueryResponse = self
            .get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "1"),
            ])
            .await?;
        let title = first_search_hit(resp, query)?;
        info!("Resolved '{}' to '{}'", query, title);
        Ok(title)
    }

    /// Raw wikitext of the latest revision. Empty when the page has none.
    pub async fn fetch_raw_markup(&self, title: &str) -> Result<String, Wiki2TexError> {
        let resp: QueryResponse = self
            .get(&[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        let markup = page_markup(resp, title)?;
        debug!("Fetched {} bytes of markup for '{}'", markup.len(), title);
        Ok(markup)
    }

    /// Rendered HTML of the page body.
    pub async fn fetch_rendered_html(&self, title: &str) -> Result<String, Wiki2TexError> {
        let resp: ParseResponse = self
            .get(&[
                ("action", "parse"),
                ("prop", "text"),
                ("redirects", "1"),
                ("page", title),
            ])
            .await?;
        parsed_html(resp, title)
    }

    /// Plain-text introduction, if the wiki has the TextExtracts extension.
    pub async fn fetch_summary(&self, title: &str) -> Result<Option<String>, Wiki2TexError> {
        let resp: QueryResponse = self
            .get(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        Ok(page_extract(resp))
    }
}

// ── Response shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    query: Option<Query>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
struct Query {
    #[serde(default)]
    search: Vec<SearchHit>,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    revisions: Vec<Revision>,
    #[serde(default)]
    extract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    #[serde(default)]
    slots: Option<Slots>,
    // Servers that ignore `rvslots` put the content on the revision itself.
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: Slot,
}

#[derive(Debug, Deserialize)]
struct Slot {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ParseResponse {
    #[serde(default)]
    parse: Option<Parsed>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Parsed {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

fn api_failure(err: ApiError) -> Wiki2TexError {
    Wiki2TexError::FetchFailed {
        url: "action API".to_string(),
        reason: format!("{}: {}", err.code, err.info),
    }
}

// ── Field extraction ─────────────────────────────────────────────────────────

fn first_search_hit(resp: QueryResponse, query: &str) -> Result<String, Wiki2TexError> {
    if let Some(err) = resp.error {
        return Err(api_failure(err));
    }
    resp.query
        .and_then(|q| q.search.into_iter().next())
        .map(|hit| hit.title)
        .ok_or_else(|| Wiki2TexError::NoSearchResults {
            query: query.to_string(),
        })
}

fn page_markup(resp: QueryResponse, title: &str) -> Result<String, Wiki2TexError> {
    if let Some(err) = resp.error {
        return Err(api_failure(err));
    }
    let not_found = || Wiki2TexError::PageNotFound {
        title: title.to_string(),
    };
    let page = resp
        .query
        .and_then(|q| q.pages.into_iter().next())
        .ok_or_else(not_found)?;
    if page.missing || page.invalid {
        return Err(not_found());
    }
    Ok(page
        .revisions
        .into_iter()
        .next()
        .and_then(|rev| rev.slots.and_then(|s| s.main.content).or(rev.content))
        .unwrap_or_default())
}

fn parsed_html(resp: ParseResponse, title: &str) -> Result<String, Wiki2TexError> {
    match (resp.parse, resp.error) {
        (Some(parsed), _) => Ok(parsed.text),
        (None, Some(err)) if err.code == "missingtitle" => Err(Wiki2TexError::PageNotFound {
            title: title.to_string(),
        }),
        (None, Some(err)) => Err(api_failure(err)),
        (None, None) => Err(Wiki2TexError::PageNotFound {
            title: title.to_string(),
        }),
    }
}

fn page_extract(resp: QueryResponse) -> Option<String> {
    resp.query
        .and_then(|q| q.pages.into_iter().next())
        .and_then(|p| p.extract)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WikiClient {
        WikiClient::new(&ConversionConfig::default()).unwrap()
    }

    fn query(json: &str) -> QueryResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn request_url_carries_format_flags_and_params() {
        let url = client().request_url(&[("action", "query"), ("titles", "Linear map")]);
        assert_eq!(url.host_str(), Some("en.wikipedia.org"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("format".into(), "json".into())));
        assert!(pairs.contains(&("formatversion".into(), "2".into())));
        assert!(pairs.contains(&("titles".into(), "Linear map".into())));
    }

    #[test]
    fn invalid_endpoint_is_a_config_error() {
        let mut config = ConversionConfig::default();
        config.api_endpoint = "not a url".into();
        assert!(matches!(
            WikiClient::new(&config),
            Err(Wiki2TexError::InvalidConfig(_))
        ));
    }

    #[test]
    fn search_picks_first_hit() {
        let resp = query(r#"{"query":{"search":[{"title":"Linear map"},{"title":"Linear form"}]}}"#);
        assert_eq!(first_search_hit(resp, "linear map").unwrap(), "Linear map");
    }

    #[test]
    fn empty_search_is_no_results() {
        let resp = query(r#"{"query":{"search":[]}}"#);
        assert!(matches!(
            first_search_hit(resp, "qqqzz"),
            Err(Wiki2TexError::NoSearchResults { .. })
        ));
    }

    #[test]
    fn markup_comes_from_main_slot() {
        let resp = query(
            r#"{"query":{"pages":[{"title":"T","revisions":[{"slots":{"main":{"content":"{{mvar|T}}"}}}]}]}}"#,
        );
        assert_eq!(page_markup(resp, "T").unwrap(), "{{mvar|T}}");
    }

    #[test]
    fn markup_falls_back_to_revision_content() {
        let resp = query(r#"{"query":{"pages":[{"title":"T","revisions":[{"content":"x"}]}]}}"#);
        assert_eq!(page_markup(resp, "T").unwrap(), "x");
    }

    #[test]
    fn missing_page_is_not_found() {
        let resp = query(r#"{"query":{"pages":[{"title":"Nope","missing":true}]}}"#);
        assert!(matches!(
            page_markup(resp, "Nope"),
            Err(Wiki2TexError::PageNotFound { .. })
        ));
    }

    #[test]
    fn page_without_revisions_is_empty() {
        let resp = query(r#"{"query":{"pages":[{"title":"T"}]}}"#);
        assert_eq!(page_markup(resp, "T").unwrap(), "");
    }

    #[test]
    fn api_error_is_fetch_failure() {
        let resp = query(r#"{"error":{"code":"badvalue","info":"nope"}}"#);
        match page_markup(resp, "T") {
            Err(Wiki2TexError::FetchFailed { reason, .. }) => assert!(reason.contains("badvalue")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parse_missing_title_is_not_found() {
        let resp: ParseResponse =
            serde_json::from_str(r#"{"error":{"code":"missingtitle","info":"x"}}"#).unwrap();
        assert!(matches!(
            parsed_html(resp, "T"),
            Err(Wiki2TexError::PageNotFound { .. })
        ));
        let resp: ParseResponse =
            serde_json::from_str(r#"{"parse":{"title":"T","text":"<p>hi</p>"}}"#).unwrap();
        assert_eq!(parsed_html(resp, "T").unwrap(), "<p>hi</p>");
    }

    #[test]
    fn blank_extract_is_none() {
        assert_eq!(
            page_extract(query(r#"{"query":{"pages":[{"extract":"A map."}]}}"#)),
            Some("A map.".to_string())
        );
        assert_eq!(page_extract(query(r#"{"query":{"pages":[{"extract":"  "}]}}"#)), None);
        assert_eq!(page_extract(query("{}")), None);
    }
}
