use crate::config::{AppConfig, ReportConfig, RuntimeConfig};
use crate::error::ReportError;
use crate::services::html::HtmlReportData;
use crate::services::pdf::PdfReporter;
use crate::services::report::proceed;
use crate::services::{
    FetchedStats, ProcessScanner, RepositoryFetcher, ScanInvoker, ScorecardClient,
    fetch_packages_and_repositories,
};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

pub const REPORTS_DIR: &str = "reports";
pub const DEBUG_FILE_NAME: &str = "debug-pkg-repo.txt";

#[derive(Parser)]
#[command(name = "nreport", version, about = "Security report generator for npm packages and git repositories")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute report at the current working dir with current configuration
    #[command(visible_alias = "exec")]
    Execute {
        /// Dump the collected statistics to reports/debug-pkg-repo.txt
        #[arg(long, short)]
        debug: bool,
    },
    /// Initialize default report configuration
    #[command(visible_alias = "init")]
    Initialize,
    /// Serve the report API over HTTP
    Serve,
}

impl Cli {
    pub async fn run(self) -> Result<(), ReportError> {
        let cwd = std::env::current_dir()?;
        println!("\n > Executing nreport at: {}\n", cwd.display());

        match self.command {
            Commands::Execute { debug } => execute(&cwd, AppConfig::from_env(), debug).await,
            Commands::Initialize => initialize(&cwd),
            Commands::Serve => serve(AppConfig::from_env()).await,
        }
    }
}

pub fn initialize(dir: &Path) -> Result<(), ReportError> {
    let (config, created) = RuntimeConfig::init(dir).map_err(|e| {
        ReportError::Config(format!(
            "Unable to initialize the runtime configuration at '{}': {e}",
            dir.display()
        ))
    })?;
    config.report()?;

    if created {
        println!("Successfully generated the runtime configuration at current location");
    } else {
        println!("A runtime configuration already exists at current location");
    }
    Ok(())
}

pub async fn execute(cwd: &Path, app_config: AppConfig, debug: bool) -> Result<(), ReportError> {
    if debug {
        println!(" > Debug mode enabled \n");
    }

    let runtime = RuntimeConfig::read(cwd)?;
    let report = runtime.report()?;

    let reports_dir = cwd.join(REPORTS_DIR);
    for dir in [app_config.json_dir(), app_config.clones_dir(), reports_dir.clone()] {
        tokio::fs::create_dir_all(&dir).await?;
    }

    println!(">> title: {}", report.title);
    println!(
        ">> reporters: {}\n",
        report
            .reporters
            .iter()
            .map(|r| format!("{r:?}").to_lowercase())
            .collect::<Vec<_>>()
            .join(",")
    );

    let fetcher = RepositoryFetcher::new(app_config.clones_dir(), app_config.git_token.clone());
    let result = generate(report, &app_config, &fetcher, &reports_dir, debug).await;

    if let Err(e) = fetcher.cleanup().await {
        warn!("Unable to remove cloned repositories: {e}");
    }

    let written = result?;
    for path in &written {
        info!("Report saved at {}", path.display());
    }
    println!("\n>> Security report successfully generated! Enjoy.\n");
    Ok(())
}

async fn generate(
    report: &ReportConfig,
    app_config: &AppConfig,
    fetcher: &RepositoryFetcher,
    reports_dir: &Path,
    debug: bool,
) -> Result<Vec<PathBuf>, ReportError> {
    let invoker = ScanInvoker::new(
        ProcessScanner::new(app_config),
        app_config.scan_concurrency,
        app_config.json_dir(),
    );
    let scorecards = ScorecardClient::new(reqwest::Client::new(), app_config);

    let stats = fetch_packages_and_repositories(report, &invoker, fetcher, &scorecards).await?;
    if debug {
        write_debug_dump(&stats, reports_dir).await?;
    }

    let data = HtmlReportData {
        npm_stats: stats.npm.as_ref(),
        git_stats: stats.git.as_ref(),
    };
    proceed(data, report, &PdfReporter::new(app_config), reports_dir).await
}

async fn write_debug_dump(stats: &FetchedStats, reports_dir: &Path) -> Result<(), ReportError> {
    let path = reports_dir.join(DEBUG_FILE_NAME);
    tokio::fs::write(&path, format!("{stats:#?}")).await?;
    info!("Debug dump written to {}", path.display());
    Ok(())
}

async fn serve(app_config: AppConfig) -> Result<(), ReportError> {
    crate::create_rocket(app_config)?
        .launch()
        .await
        .map_err(|e| ReportError::Io(format!("Server failed: {e}")))?;
    Ok(())
}
