use crate::config::AppConfig;
use crate::error::ReportError;
use crate::models::payload::{Dependencies, ScannerOutput};
use log::{debug, info, warn};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// What to hand to the scanner: a registry package or an already cloned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    Package(String),
    Directory(PathBuf),
}

impl ScanTarget {
    /// Name the cached payload is stored under.
    pub fn cache_name(&self) -> String {
        match self {
            ScanTarget::Package(name) => name.clone(),
            ScanTarget::Directory(dir) => dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "repository".to_string()),
        }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanTarget::Package(name) => write!(f, "package {name}"),
            ScanTarget::Directory(dir) => write!(f, "directory {}", dir.display()),
        }
    }
}

pub trait Scanner: Send + Sync + 'static {
    fn scan(
        &self,
        target: &ScanTarget,
    ) -> impl Future<Output = Result<Dependencies, ReportError>> + Send;
}

/// Runs the `nsecure` command line and reads back the JSON it writes.
#[derive(Debug, Clone)]
pub struct ProcessScanner {
    program: String,
    depth: u32,
    work_dir: PathBuf,
}

impl ProcessScanner {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            program: config.scanner_bin.clone(),
            depth: config.scan_depth,
            work_dir: config.json_dir(),
        }
    }

    fn command(&self, target: &ScanTarget, output_name: &str) -> (Command, PathBuf) {
        let mut cmd = Command::new(&self.program);
        let run_dir = match target {
            ScanTarget::Package(name) => {
                cmd.arg("from").arg(name);
                self.work_dir.clone()
            }
            ScanTarget::Directory(dir) => {
                cmd.arg("cwd");
                dir.clone()
            }
        };

        cmd.arg("--depth")
            .arg(self.depth.to_string())
            .arg("--output")
            .arg(output_name)
            .current_dir(&run_dir)
            .kill_on_drop(true);

        (cmd, run_dir)
    }
}

impl Scanner for ProcessScanner {
    async fn scan(&self, target: &ScanTarget) -> Result<Dependencies, ReportError> {
        tokio::fs::create_dir_all(&self.work_dir).await?;

        let output_name = format!("nreport-{}", Uuid::new_v4());
        let (mut cmd, run_dir) = self.command(target, &output_name);

        debug!("Running {} for {target}", self.program);
        let output = cmd
            .output()
            .await
            .map_err(|e| ReportError::Scan(format!("Unable to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(ReportError::Scan(format!(
                "{} exited with {} for {target}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let result_path = run_dir.join(format!("{output_name}.json"));
        let content = tokio::fs::read_to_string(&result_path).await?;
        if let Err(e) = tokio::fs::remove_file(&result_path).await {
            warn!("Failed to remove scanner output {}: {e}", result_path.display());
        }

        let parsed: ScannerOutput = serde_json::from_str(&content)?;
        Ok(parsed.into_dependencies())
    }
}

/// Bounded front door to a [`Scanner`]. Failures never abort the batch.
pub struct ScanInvoker<S> {
    scanner: Arc<S>,
    gate: Arc<Semaphore>,
    cache_dir: PathBuf,
}

impl<S> Clone for ScanInvoker<S> {
    fn clone(&self) -> Self {
        Self {
            scanner: Arc::clone(&self.scanner),
            gate: Arc::clone(&self.gate),
            cache_dir: self.cache_dir.clone(),
        }
    }
}

impl<S: Scanner> ScanInvoker<S> {
    pub fn new(scanner: S, concurrency: usize, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            scanner: Arc::new(scanner),
            gate: Arc::new(Semaphore::new(concurrency.max(1))),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_path(&self, target: &ScanTarget) -> PathBuf {
        self.cache_dir.join(format!("{}.json", target.cache_name()))
    }

    async fn persist(&self, path: &Path, dependencies: &Dependencies) -> Result<(), ReportError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(dependencies)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Scan one target. Returns `None` when the scan failed.
    pub async fn scan(&self, target: &ScanTarget) -> Option<Dependencies> {
        // The permit is released on drop, whatever happens below.
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!("Scan gate closed before {target} could run: {e}");
                return None;
            }
        };

        match self.scanner.scan(target).await {
            Ok(dependencies) => {
                let path = self.cache_path(target);
                if let Err(e) = self.persist(&path, &dependencies).await {
                    warn!("Failed to cache scan of {target} at {}: {e}", path.display());
                }
                info!("Scanned {target}: {} dependencies", dependencies.len());
                Some(dependencies)
            }
            Err(e) => {
                warn!("Scan of {target} failed, excluding it from the report: {e}");
                None
            }
        }
    }

    /// Scan every target concurrently (bounded by the gate), keeping input order.
    pub async fn scan_all(&self, targets: Vec<ScanTarget>) -> Vec<Dependencies> {
        let handles: Vec<_> = targets
            .into_iter()
            .map(|target| {
                let invoker = self.clone();
                tokio::spawn(async move { invoker.scan(&target).await })
            })
            .collect();

        let mut payloads = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(Some(dependencies)) => payloads.push(dependencies),
                Ok(None) => {}
                Err(e) => warn!("Scan task panicked: {e}"),
            }
        }
        payloads
    }
}
