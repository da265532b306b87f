//! Site fetching for the crawl
//!
//! The pipeline only talks to the [`SiteFetcher`] trait. [`HttpFetcher`] is the
//! default implementation: a breadth-first walk over same-page links using
//! reqwest, paced by a rate limiter, writing every page it fetches into the
//! workspace directory.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use tracing::{Instrument, debug, debug_span, info, instrument, warn};
use url::Url;

use super::error::CrawlError;
use super::storage::Storage;
use super::url_filter::UrlFilter;
use super::{CrawlTarget, FetchReport, FetchedPage, LinkEdge};

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a fetcher needs for one crawl
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Where the crawl starts
    pub start: &'a CrawlTarget,

    /// Predicate every discovered link must pass before it is followed
    pub filter: &'a UrlFilter,

    /// Maximum link distance from the start page
    pub max_depth: u32,

    /// Maximum number of pages to write
    pub max_pages: u32,

    /// Minimum spacing between requests
    pub delay: Duration,

    /// Directory the raw HTML is written into
    pub workspace: &'a Path,
}

/// Fetches a site into a workspace directory
pub trait SiteFetcher {
    /// Crawl from `request.start`, writing each accepted page into
    /// `request.workspace` and reporting what was written.
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<FetchReport, CrawlError>;
}

/// Fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
    storage: Storage,
}

impl HttpFetcher {
    /// Create a fetcher that identifies itself with `user_agent`
    pub fn new(user_agent: &str) -> Result<Self, CrawlError> {
        let client = ReqwestClient::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            storage: Storage::new(),
        })
    }

    /// Fetch one page, returning the URL it was finally served from and its
    /// body if it is HTML
    async fn get_page(&self, url: &Url, filter: &UrlFilter) -> Result<(Url, String), CrawlError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;

        let final_url = without_fragment(response.url());
        if &final_url != url && !filter.accept_url(&final_url) {
            return Err(CrawlError::Other(format!(
                "redirected outside the crawl to {}",
                final_url
            )));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.contains("html") {
                return Err(CrawlError::Other(format!(
                    "not an HTML page ({})",
                    content_type
                )));
            }
        }

        Ok((final_url, response.text().await?))
    }
}

impl SiteFetcher for HttpFetcher {
    #[instrument(skip(self, request), fields(start = %request.start))]
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<FetchReport, CrawlError> {
        info!("Starting crawl for {}", request.start);

        let limiter: Option<DefaultDirectRateLimiter> =
            Quota::with_period(request.delay).map(|quota| RateLimiter::direct(quota));

        let mut report = FetchReport::default();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();

        let start = without_fragment(request.start.url());
        seen.insert(start.to_string());
        queue.push_back((start, 0u32));

        while let Some((url, depth)) = queue.pop_front() {
            if report.pages.len() >= request.max_pages as usize {
                info!("Reached page limit of {}", request.max_pages);
                break;
            }

            if let Some(limiter) = &limiter {
                limiter.until_ready().instrument(debug_span!("limiter")).await;
            }

            let (url, html) = match self.get_page(&url, request.filter).await {
                Ok((final_url, html)) if final_url != url => {
                    if !seen.insert(final_url.to_string()) {
                        debug!("{} redirected to already seen {}", url, final_url);
                        continue;
                    }
                    debug!("{} redirected to {}", url, final_url);
                    (final_url, html)
                }
                Ok(page) => page,
                Err(e) if depth == 0 => {
                    return Err(CrawlError::StartPage {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };

            let path = self
                .storage
                .workspace_path_for_url(request.filter.base_domain(), &url)?;
            let full_path = self.storage.resolve(request.workspace, &path)?;
            self.storage.write_text(&full_path, &html).await?;
            debug!("Fetched {} -> {}", url, path.display());

            report.pages.push(FetchedPage {
                url: url.to_string(),
                path,
                depth,
            });

            if depth >= request.max_depth {
                continue;
            }

            for link in discover_links(&url, &html)? {
                if !request.filter.accept_url(&link) {
                    debug!("Filtered out {}", link);
                    report.rejected += 1;
                    continue;
                }

                report.links.push(LinkEdge {
                    from: url.to_string(),
                    to: link.to_string(),
                });
                if seen.insert(link.to_string()) {
                    queue.push_back((link, depth + 1));
                }
            }
        }

        info!(
            "Crawl finished: {} pages fetched, {} links filtered out",
            report.pages.len(),
            report.rejected
        );
        Ok(report)
    }
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// Absolute URLs of the links on a page, in document order, without repeats
fn discover_links(page_url: &Url, html: &str) -> Result<Vec<Url>, CrawlError> {
    let selector = Selector::parse("a[href]")
        .map_err(|e| CrawlError::Other(format!("Failed to parse link selector: {}", e)))?;
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        match page_url.join(href) {
            Ok(link) => {
                let link = without_fragment(&link);
                if seen.insert(link.to_string()) {
                    links.push(link);
                }
            }
            Err(e) => debug!("Ignoring unparsable link '{}': {}", href, e),
        }
    }

    Ok(links)
}
