//! Apify tweet-scraper actor client.
//!
//! A fetch is three calls: start an actor run with the search input, poll the
//! run until it reaches a terminal status, then download the run's default
//! dataset. Items are normalized before they leave this module.
use crate::twitter::normalize::normalize;
use crate::twitter::types::NormalizedPost;
use promptlib_common::{PromptlibError, Result};
use promptlib_config::ScraperConfig;
use promptlib_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::time::Duration;
use time::{Date, OffsetDateTime};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const HTTP_RETRIES: usize = 2;
const DATASET_TIMEOUT: Duration = Duration::from_secs(120);
const TERMINAL_STATUSES: &[&str] = &["SUCCEEDED", "FAILED", "ABORTED", "TIMED-OUT"];

/// Inclusive-exclusive day window for the search operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub since: Date,
    pub until: Date,
}

impl SearchWindow {
    /// Search expression understood by the actor, e.g.
    /// `Seedance prompt since:2026-02-09 until:2026-02-10`.
    pub fn query(&self, term: &str) -> String {
        format!("{term} since:{} until:{}", self.since, self.until)
    }
}

/// Window ending `today` and starting `days` days earlier.
///
/// ```
/// use promptlib_social::twitter::search_window;
/// use time::macros::date;
///
/// let w = search_window(date!(2026 - 03 - 01), 2);
/// assert_eq!(w.query("Seedance prompt"), "Seedance prompt since:2026-02-27 until:2026-03-01");
/// ```
pub fn search_window(today: Date, days: u32) -> SearchWindow {
    let since = today
        .checked_sub(time::Duration::days(i64::from(days)))
        .unwrap_or(Date::MIN);
    SearchWindow {
        since,
        until: today,
    }
}

/// Window ending on the current UTC date.
pub fn search_window_from_now(days: u32) -> SearchWindow {
    search_window(OffsetDateTime::now_utc().date(), days)
}

/// Apify expects `user~actor` in URL paths.
pub fn actor_path(actor_id: &str) -> String {
    if actor_id.contains('~') {
        actor_id.to_string()
    } else {
        actor_id.replace('/', "~")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorInput {
    pub search_terms: Vec<String>,
    pub sort: String,
    pub max_items: u32,
    pub only_video: bool,
    pub include_search_terms: bool,
    pub only_quote: bool,
    pub only_twitter_blue: bool,
    pub only_verified_users: bool,
    pub only_image: bool,
}

impl ActorInput {
    pub fn latest_videos(query: String, max_items: u32) -> Self {
        Self {
            search_terms: vec![query],
            sort: "Latest".to_string(),
            max_items,
            only_video: true,
            include_search_terms: false,
            only_quote: false,
            only_twitter_blue: false,
            only_verified_users: false,
            only_image: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub default_dataset_id: String,
}

impl RunInfo {
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUSES.contains(&self.status.as_str())
    }

    pub fn succeeded(&self) -> bool {
        self.status == "SUCCEEDED"
    }
}

fn upstream(err: HttpError) -> PromptlibError {
    if err.is_rate_limited() {
        PromptlibError::RateLimited
    } else {
        PromptlibError::Upstream(err.to_string())
    }
}

#[derive(Clone)]
pub struct ApifyScraper {
    http: HttpClient,
    token: String,
    actor_id: String,
    poll_interval: Duration,
}

impl ApifyScraper {
    pub fn new(base_url: &str, token: String, actor_id: String) -> Result<Self> {
        let http = HttpClient::new(base_url)
            .map_err(upstream)?
            .with_timeout(HTTP_TIMEOUT)
            .with_retries(HTTP_RETRIES);
        Ok(Self {
            http,
            token,
            actor_id,
            poll_interval: Duration::from_secs(10),
        })
    }

    /// Build from configuration; a missing token is a configuration error.
    pub fn from_config(cfg: &ScraperConfig) -> Result<Self> {
        let token = cfg.resolved_token().ok_or_else(|| {
            PromptlibError::Config("APIFY_TOKEN is not set (scraper.token)".to_string())
        })?;
        Ok(Self::new(&cfg.base_url, token, cfg.actor_id.clone())?
            .with_poll_interval(Duration::from_secs(cfg.poll_interval_secs)))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Query {
                name: "token",
                value: Cow::Borrowed(&self.token),
            }),
            ..Default::default()
        }
    }

    /// Start an actor run. Not retried, so a flaky network cannot start two runs.
    pub async fn start_run(&self, input: &ActorInput) -> Result<RunInfo> {
        let path = format!("acts/{}/runs", actor_path(&self.actor_id));
        let env: Envelope<RunInfo> = self
            .http
            .post_json_opts(
                &path,
                input,
                RequestOpts {
                    retries: Some(0),
                    ..self.opts()
                },
            )
            .await
            .map_err(upstream)?;
        tracing::info!(
            run_id = %env.data.id,
            dataset_id = %env.data.default_dataset_id,
            "apify.run.started"
        );
        Ok(env.data)
    }

    /// Poll until the run reaches a terminal status. There is no overall cap.
    pub async fn wait_for_run(&self, run: &RunInfo) -> Result<RunInfo> {
        let path = format!("actor-runs/{}", run.id);
        loop {
            tokio::time::sleep(self.poll_interval).await;
            let env: Envelope<RunInfo> = self
                .http
                .get_json(&path, self.opts())
                .await
                .map_err(upstream)?;
            tracing::info!(run_id = %run.id, status = %env.data.status, "apify.run.status");
            if env.data.is_terminal() {
                return Ok(env.data);
            }
        }
    }

    /// Download every item of a dataset as raw JSON.
    pub async fn dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>> {
        let path = format!("datasets/{dataset_id}/items");
        let items: Vec<Value> = self
            .http
            .get_json(
                &path,
                RequestOpts {
                    timeout: Some(DATASET_TIMEOUT),
                    query: Some(vec![("format", Cow::Borrowed("json"))]),
                    ..self.opts()
                },
            )
            .await
            .map_err(upstream)?;
        tracing::info!(dataset_id, count = items.len(), "apify.dataset.downloaded");
        Ok(items)
    }

    /// Run the actor over `window` and return the normalized posts.
    ///
    /// Non-object items are skipped. A run that ends in any status other
    /// than `SUCCEEDED` is an upstream error.
    pub async fn fetch_posts(
        &self,
        window: &SearchWindow,
        term: &str,
        max_items: u32,
    ) -> Result<Vec<NormalizedPost>> {
        let query = window.query(term);
        tracing::info!(%query, max_items, "apify.fetch.start");

        let started = self
            .start_run(&ActorInput::latest_videos(query, max_items))
            .await?;
        let finished = self.wait_for_run(&started).await?;
        if !finished.succeeded() {
            return Err(PromptlibError::Upstream(format!(
                "actor run {} ended with status {}",
                finished.id, finished.status
            )));
        }

        let dataset_id = if finished.default_dataset_id.is_empty() {
            &started.default_dataset_id
        } else {
            &finished.default_dataset_id
        };
        let items = self.dataset_items(dataset_id).await?;
        let skipped = items.iter().filter(|v| !v.is_object()).count();
        if skipped > 0 {
            tracing::warn!(skipped, "apify.fetch.non_object_items");
        }
        Ok(items
            .iter()
            .filter_map(Value::as_object)
            .map(normalize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn actor_path_uses_tilde() {
        assert_eq!(actor_path("apidojo/tweet-scraper"), "apidojo~tweet-scraper");
        assert_eq!(actor_path("apidojo~tweet-scraper"), "apidojo~tweet-scraper");
    }

    #[test]
    fn window_spans_month_boundaries() {
        let w = search_window(date!(2026 - 03 - 01), 1);
        assert_eq!(w.since, date!(2026 - 02 - 28));
        assert_eq!(w.until, date!(2026 - 03 - 01));
        assert_eq!(w.since.to_string(), "2026-02-28");
    }

    #[test]
    fn actor_input_uses_camel_case_keys() {
        let input = ActorInput::latest_videos("Seedance prompt since:a until:b".into(), 50);
        let v = serde_json::to_value(&input).unwrap();
        assert_eq!(v["searchTerms"][0], "Seedance prompt since:a until:b");
        assert_eq!(v["maxItems"], 50);
        assert_eq!(v["onlyVideo"], true);
        assert_eq!(v["sort"], "Latest");
    }
}
