use crate::error::ReportError;
use log::{info, warn};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Clones organization repositories with the local `git` client.
#[derive(Debug, Clone)]
pub struct RepositoryFetcher {
    clones_dir: PathBuf,
    token: Option<String>,
}

impl RepositoryFetcher {
    pub fn new(clones_dir: impl Into<PathBuf>, token: Option<String>) -> Self {
        Self {
            clones_dir: clones_dir.into(),
            token,
        }
    }

    /// `{organization_url}/{repository}.git`
    pub fn repository_url(organization_url: &str, repository: &str) -> String {
        format!("{}/{}.git", organization_url.trim_end_matches('/'), repository.trim())
    }

    /// Injects the access token as oauth2 credentials for https remotes.
    fn authenticated_url(&self, url: &str) -> String {
        match (&self.token, url.strip_prefix("https://")) {
            (Some(token), Some(rest)) => format!("https://oauth2:{token}@{rest}"),
            _ => url.to_string(),
        }
    }

    pub async fn clone_repository(
        &self,
        organization_url: &str,
        repository: &str,
    ) -> Result<PathBuf, ReportError> {
        let name = repository.trim();
        let dir = self.clones_dir.join(name);
        let url = Self::repository_url(organization_url, name);

        if dir.exists() {
            tokio::fs::remove_dir_all(&dir).await?;
        }
        tokio::fs::create_dir_all(&self.clones_dir).await?;

        info!("Cloning {url} into {}", dir.display());
        let output = Command::new("git")
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg(self.authenticated_url(&url))
            .arg(&dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ReportError::Git(format!("Unable to run git: {e}")))?;

        if !output.status.success() {
            // stderr may echo the remote URL, token included.
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = match &self.token {
                Some(token) => stderr.replace(token.as_str(), "***"),
                None => stderr.to_string(),
            };
            return Err(ReportError::Git(format!(
                "git clone {url} failed: {}",
                stderr.trim()
            )));
        }

        Ok(dir)
    }

    /// Clone every repository, skipping the ones that fail.
    pub async fn clone_all(&self, organization_url: &str, repositories: &[String]) -> Vec<PathBuf> {
        let handles: Vec<_> = repositories
            .iter()
            .map(|repository| {
                let fetcher = self.clone();
                let organization_url = organization_url.to_string();
                let repository = repository.clone();
                tokio::spawn(async move {
                    fetcher
                        .clone_repository(&organization_url, &repository)
                        .await
                        .map_err(|e| (repository, e))
                })
            })
            .collect();

        let mut dirs = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Ok(dir)) => dirs.push(dir),
                Ok(Err((repository, e))) => {
                    warn!("Skipping repository {repository}: {e}");
                }
                Err(e) => warn!("Clone task panicked: {e}"),
            }
        }
        dirs
    }

    /// Remove every clone. Missing directories are not an error.
    pub async fn cleanup(&self) -> Result<(), ReportError> {
        remove_dir_if_exists(&self.clones_dir).await
    }
}

pub(crate) async fn remove_dir_if_exists(dir: &Path) -> Result<(), ReportError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
