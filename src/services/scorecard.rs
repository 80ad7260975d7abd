use crate::config::AppConfig;
use crate::error::ReportError;
use crate::models::stats::{ReportStats, Scorecard};
use crate::utils::{score_color, vcs_repository_path_and_platform};
use futures::future::join_all;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::Value;
use std::future::Future;

const SCORECARD_VISUALIZER_URL: &str =
    "https://kooltheba.github.io/openssf-scorecard-api-visualizer/#/projects";

/// Anything able to resolve the OpenSSF score of an npm package.
pub trait ScorecardSource: Send + Sync {
    fn score(
        &self,
        package: &str,
        repository: Option<&str>,
    ) -> impl Future<Output = Result<f64, ReportError>> + Send;
}

/// Scorecard lookups against the OpenSSF API, resolving repositories through the npm registry.
#[derive(Debug, Clone)]
pub struct ScorecardClient {
    client: reqwest::Client,
    registry_url: String,
    api_url: String,
}

impl ScorecardClient {
    pub fn new(client: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            client,
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
            api_url: config.scorecard_api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn repository_from_registry(&self, package: &str) -> Result<String, ReportError> {
        let url = format!("{}/{package}", self.registry_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ReportError::Upstream(format!(
                "{} while fetching {package} metadata",
                response.status()
            )));
        }

        let metadata: Value = response.json().await?;

        // Handle repository field which can be a string or object
        let repository = match &metadata["repository"] {
            Value::String(url) => Some(url.clone()),
            Value::Object(repo_obj) => repo_obj
                .get("url")
                .and_then(|u| u.as_str())
                .map(|s| s.to_string()),
            _ => None,
        };

        repository.ok_or_else(|| {
            ReportError::Upstream(format!("{package} does not declare a repository"))
        })
    }
}

impl ScorecardSource for ScorecardClient {
    async fn score(&self, package: &str, repository: Option<&str>) -> Result<f64, ReportError> {
        let repository = match repository {
            Some(repository) => repository.to_string(),
            None => self.repository_from_registry(package).await?,
        };

        let (path, platform) = vcs_repository_path_and_platform(&repository).ok_or_else(|| {
            ReportError::Parse(format!("Unrecognized repository URL '{repository}'"))
        })?;

        let url = format!("{}/projects/{platform}/{path}", self.api_url);
        debug!("Fetching scorecard for {package}: {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ReportError::Upstream(format!(
                "{} while fetching scorecard of {package}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        body["score"]
            .as_f64()
            .ok_or_else(|| ReportError::Parse(format!("Scorecard of {package} has no score")))
    }
}

pub fn visualizer_url(repository: Option<&str>) -> String {
    match repository.and_then(vcs_repository_path_and_platform) {
        Some((path, platform)) => format!("{SCORECARD_VISUALIZER_URL}/{platform}/{path}"),
        None => "#".to_string(),
    }
}

/// Scorecards of every given package, looked up concurrently and kept in package order.
/// Failed lookups are logged and left out.
pub async fn collect_scorecards<S>(stats: &ReportStats, source: &S) -> IndexMap<String, Scorecard>
where
    S: ScorecardSource,
{
    let given: Vec<_> = stats.given_packages().collect();
    let lookups = given
        .iter()
        .map(|package| source.score(&package.full_name, package.repository_url()));
    let results = join_all(lookups).await;

    let mut scorecards = IndexMap::new();
    for (package, result) in given.into_iter().zip(results) {
        match result {
            Ok(score) => {
                info!("Scorecard for {}: {score}", package.full_name);
                scorecards.insert(
                    package.full_name.clone(),
                    Scorecard {
                        score,
                        color: score_color(score),
                        visualizer_url: visualizer_url(package.repository_url()),
                    },
                );
            }
            Err(e) => {
                warn!("Failed to fetch scorecard for {}: {e}", package.full_name);
            }
        }
    }

    scorecards
}
