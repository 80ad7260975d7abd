use crate::error::ReportError;
use crate::models::{ChartDefinition, ChartName, ChartType};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".nodesecurerc";

/// Process-level settings read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub home_dir: PathBuf,
    pub scanner_bin: String,
    pub scan_depth: u32,
    pub scan_concurrency: usize,
    pub browser_bin: String,
    pub pdf_timeout_secs: u64,
    pub registry_url: String,
    pub scorecard_api_url: String,
    pub git_token: Option<String>,
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the HTTP API from a browser. Empty means none.
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            home_dir: default_home_dir(),
            scanner_bin: "nsecure".to_string(),
            scan_depth: 4,
            scan_concurrency: 2,
            browser_bin: "chromium".to_string(),
            pdf_timeout_secs: 20,
            registry_url: "https://registry.npmjs.org".to_string(),
            scorecard_api_url: "https://api.securityscorecards.dev".to_string(),
            git_token: None,
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec![],
        }
    }
}

fn default_home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir())
        .join(".nreport")
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let home_dir = env::var("NREPORT_HOME")
            .map(PathBuf::from)
            .unwrap_or(defaults.home_dir);

        let scanner_bin = env::var("NREPORT_SCANNER").unwrap_or(defaults.scanner_bin);

        let scan_depth = env::var("NREPORT_SCAN_DEPTH")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.scan_depth);

        // A zero-capacity gate would never admit a scan.
        let scan_concurrency = env::var("NREPORT_SCAN_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.scan_concurrency);

        let browser_bin = env::var("NREPORT_BROWSER").unwrap_or(defaults.browser_bin);

        let pdf_timeout_secs = env::var("NREPORT_PDF_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.pdf_timeout_secs);

        let registry_url = env::var("NREPORT_REGISTRY").unwrap_or(defaults.registry_url);
        let scorecard_api_url =
            env::var("NREPORT_SCORECARD_API").unwrap_or(defaults.scorecard_api_url);

        let git_token = env::var("GIT_TOKEN").ok().filter(|t| !t.is_empty());

        let host = env::var("NREPORT_HOST").unwrap_or(defaults.host);
        let port = env::var("NREPORT_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let allowed_origins = env::var("NREPORT_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.allowed_origins);

        info!("Configuration loaded:");
        info!("  Home Directory: {}", home_dir.display());
        info!("  Scanner: {scanner_bin} (depth {scan_depth}, concurrency {scan_concurrency})");
        info!("  Browser: {browser_bin} (timeout {pdf_timeout_secs}s)");
        info!("  Registry: {registry_url}");
        info!("  Scorecard API: {scorecard_api_url}");
        info!("  Git Token: {}", if git_token.is_some() { "set" } else { "unset" });
        info!("  Allowed Origins: {}", allowed_origins.join(", "));

        Self {
            home_dir,
            scanner_bin,
            scan_depth,
            scan_concurrency,
            browser_bin,
            pdf_timeout_secs,
            registry_url,
            scorecard_api_url,
            git_token,
            host,
            port,
            allowed_origins,
        }
    }

    pub fn json_dir(&self) -> PathBuf {
        self.home_dir.join("json")
    }

    pub fn clones_dir(&self) -> PathBuf {
        self.home_dir.join("clones")
    }

    /// Root of every report written on behalf of an HTTP caller.
    pub fn reports_dir(&self) -> PathBuf {
        self.home_dir.join("reports")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reporter {
    #[serde(alias = "HTML")]
    Html,
    #[serde(alias = "PDF")]
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NpmConfig {
    #[serde(default)]
    pub organization_prefix: Option<String>,
    #[serde(default)]
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitConfig {
    #[serde(default)]
    pub organization_url: String,
    #[serde(default)]
    pub repositories: Vec<String>,
}

/// The `report` section of the runtime configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub reporters: Vec<Reporter>,
    #[serde(default)]
    pub npm: Option<NpmConfig>,
    #[serde(default)]
    pub git: Option<GitConfig>,
    #[serde(default)]
    pub include_transitive_internal: bool,
    #[serde(default = "default_true")]
    pub show_flags: bool,
    #[serde(default)]
    pub charts: Vec<ChartDefinition>,
}

fn default_title() -> String {
    "Default report title".to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            logo_url: None,
            theme: default_theme(),
            reporters: vec![Reporter::Html, Reporter::Pdf],
            npm: Some(NpmConfig::default()),
            git: Some(GitConfig::default()),
            include_transitive_internal: false,
            show_flags: true,
            charts: vec![
                ChartDefinition::new(ChartName::Extensions, ChartType::Bar, "d3.interpolateRainbow"),
                ChartDefinition::new(ChartName::Licenses, ChartType::Bar, "d3.interpolateCool"),
                ChartDefinition::new(
                    ChartName::Warnings,
                    ChartType::HorizontalBar,
                    "d3.interpolateInferno",
                ),
                ChartDefinition::new(
                    ChartName::Flags,
                    ChartType::HorizontalBar,
                    "d3.interpolateSinebow",
                ),
            ],
        }
    }
}

impl ReportConfig {
    pub fn has_reporter(&self, reporter: Reporter) -> bool {
        self.reporters.contains(&reporter)
    }

    /// Configured organization prefix; an empty string counts as absent.
    pub fn organization_prefix(&self) -> Option<&str> {
        self.npm
            .as_ref()
            .and_then(|npm| npm.organization_prefix.as_deref())
            .filter(|prefix| !prefix.is_empty())
    }

    pub fn requested_packages(&self) -> &[String] {
        self.npm.as_ref().map_or(&[], |npm| npm.packages.as_slice())
    }

    pub fn can_fetch_npm(&self) -> bool {
        !self.requested_packages().is_empty()
    }

    pub fn can_fetch_git(&self) -> bool {
        self.git
            .as_ref()
            .is_some_and(|git| !git.repositories.is_empty())
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        if self.title.trim().is_empty() {
            return Err(ReportError::Config("The report title must not be empty".to_string()));
        }

        if self.reporters.is_empty() {
            return Err(ReportError::Config(
                "At least one reporter must be enabled (pdf or html)".to_string(),
            ));
        }

        for chart in &self.charts {
            if let Some(interpolation) = &chart.interpolation {
                if !is_interpolation_name(interpolation) {
                    return Err(ReportError::Config(format!(
                        "Invalid interpolation '{interpolation}' for chart {}",
                        chart.name.as_str()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Fails when there is nothing to fetch at all.
    pub fn ensure_targets(&self) -> Result<(), ReportError> {
        if !self.can_fetch_npm() && !self.can_fetch_git() {
            return Err(ReportError::Config(
                "No git repositories and no npm packages to fetch in the local configuration!"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Chart interpolations are injected verbatim into the report script.
fn is_interpolation_name(value: &str) -> bool {
    value
        .strip_prefix("d3.interpolate")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Content of the `.nodesecurerc` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_i18n")]
    pub i18n: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_registry")]
    pub registry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_i18n() -> String {
    "english".to_string()
}

fn default_strategy() -> String {
    "github-advisory".to_string()
}

fn default_registry() -> String {
    "https://registry.npmjs.org".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            i18n: default_i18n(),
            strategy: default_strategy(),
            registry: default_registry(),
            report: Some(ReportConfig::default()),
        }
    }
}

impl RuntimeConfig {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    pub fn read(dir: &Path) -> Result<Self, ReportError> {
        let path = Self::path_in(dir);
        if !path.exists() {
            return Err(ReportError::Config(format!(
                "There is no configuration file at '{}', please run `nreport init`",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        let config: RuntimeConfig = serde_json::from_str(&content).map_err(|e| {
            ReportError::Config(format!("Invalid configuration '{}': {e}", path.display()))
        })?;

        Ok(config)
    }

    /// Reads the configuration in `dir`, writing the default one first if missing.
    /// Returns whether the file was created.
    pub fn init(dir: &Path) -> Result<(Self, bool), ReportError> {
        let path = Self::path_in(dir);
        if path.exists() {
            let config = Self::read(dir)?;
            return Ok((config, false));
        }

        let config = Self::default();
        let content = serde_json::to_string_pretty(&config)?;
        std::fs::write(&path, content)?;
        info!("Created runtime configuration at {}", path.display());

        Ok((config, true))
    }

    /// The validated `report` section.
    pub fn report(&self) -> Result<&ReportConfig, ReportError> {
        let report = self
            .report
            .as_ref()
            .ok_or_else(|| ReportError::Config("A valid configuration is required".to_string()))?;
        report.validate()?;
        Ok(report)
    }
}
