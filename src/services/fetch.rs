use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::models::stats::ReportStats;
use crate::services::aggregator::aggregate;
use crate::services::repository::RepositoryFetcher;
use crate::services::scanner::{ScanInvoker, ScanTarget, Scanner};
use crate::services::scorecard::ScorecardSource;
use crate::utils::format_npm_packages;
use log::info;

/// Statistics of the configured npm packages and git repositories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedStats {
    pub npm: Option<ReportStats>,
    pub git: Option<ReportStats>,
}

/// Scans every configured npm package and git repository and aggregates each group.
pub async fn fetch_packages_and_repositories<S, C>(
    config: &ReportConfig,
    invoker: &ScanInvoker<S>,
    fetcher: &RepositoryFetcher,
    scorecards: &C,
) -> Result<FetchedStats, ReportError>
where
    S: Scanner,
    C: ScorecardSource,
{
    config.ensure_targets()?;

    let npm = if config.can_fetch_npm() {
        let packages = format_npm_packages(config.organization_prefix(), config.requested_packages());
        info!("[Fetcher: NPM] Fetching {} package(s) metadata", packages.len());

        let targets = packages.into_iter().map(ScanTarget::Package).collect();
        let payloads = invoker.scan_all(targets).await;
        Some(aggregate(&payloads, config, scorecards).await?)
    } else {
        None
    };

    let git = match config.git.as_ref().filter(|_| config.can_fetch_git()) {
        Some(git) => {
            info!("[Fetcher: GIT] Cloning {} repositories", git.repositories.len());
            let dirs = fetcher
                .clone_all(&git.organization_url, &git.repositories)
                .await;

            let targets = dirs.into_iter().map(ScanTarget::Directory).collect();
            let payloads = invoker.scan_all(targets).await;
            Some(aggregate(&payloads, config, scorecards).await?)
        }
        None => None,
    };

    Ok(FetchedStats { npm, git })
}
