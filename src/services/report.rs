use crate::config::{AppConfig, ReportConfig, Reporter};
use crate::error::ReportError;
use crate::models::payload::Dependencies;
use crate::models::report::{ReportArtifact, ReportOptions};
use crate::models::stats::ReportStats;
use crate::services::aggregator::build_stats;
use crate::services::html::{HtmlReportData, HtmlReporter};
use crate::services::pdf::PdfReporter;
use crate::services::scorecard::{ScorecardSource, collect_scorecards};
use crate::utils::clean_report_name;
use log::{info, warn};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Directory receiving a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLocation {
    pub path: PathBuf,
    /// Created for this report only and removed once it is done.
    pub temporary: bool,
}

/// Explicit location first, then the working directory when anything is kept,
/// else a fresh temporary directory.
pub async fn report_location(
    config: &ReportConfig,
    options: &ReportOptions,
) -> Result<ReportLocation, ReportError> {
    if let Some(path) = &options.report_output_location {
        return Ok(ReportLocation {
            path: path.clone(),
            temporary: false,
        });
    }

    let persists_pdf = config.has_reporter(Reporter::Pdf) && options.save_pdf_on_disk;
    if persists_pdf || options.save_html_on_disk {
        return Ok(ReportLocation {
            path: std::env::current_dir()?,
            temporary: false,
        });
    }

    let path = std::env::temp_dir().join(format!("nreport-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&path).await?;

    Ok(ReportLocation {
        path,
        temporary: true,
    })
}

/// Resolves a caller supplied location under `root`. Only relative paths
/// without `..` are accepted; no location means `root` itself.
pub fn confine_location(root: &Path, requested: Option<&Path>) -> Result<PathBuf, ReportError> {
    let Some(requested) = requested else {
        return Ok(root.to_path_buf());
    };

    let relative = requested
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !relative {
        return Err(ReportError::Config(format!(
            "Report output location '{}' must be a relative path inside the reports directory",
            requested.display()
        )));
    }

    Ok(root.join(requested))
}

/// Programmatic report generation from already scanned dependencies.
pub struct ReportService<S> {
    pdf: PdfReporter,
    scorecards: S,
}

impl<S> ReportService<S>
where
    S: ScorecardSource,
{
    pub fn new(app_config: &AppConfig, scorecards: S) -> Self {
        Self {
            pdf: PdfReporter::new(app_config),
            scorecards,
        }
    }

    pub fn with_pdf_reporter(mut self, pdf: PdfReporter) -> Self {
        self.pdf = pdf;
        self
    }

    pub async fn report(
        &self,
        dependencies: &Dependencies,
        config: &ReportConfig,
        options: &ReportOptions,
    ) -> Result<ReportArtifact, ReportError> {
        config.validate()?;

        let mut stats = build_stats([dependencies], config);
        stats.scorecards = collect_scorecards(&stats, &self.scorecards).await;

        let location = report_location(config, options).await?;
        info!("Generating report in {}", location.path.display());

        let mut html_path = None;
        let result = self
            .render(&stats, config, options, &location.path, &mut html_path)
            .await;

        let keep_html = config.has_reporter(Reporter::Html) && options.save_html_on_disk;
        if let Some(path) = html_path.filter(|_| !keep_html) {
            remove_file(&path).await;
        }
        if location.temporary {
            if let Err(e) = tokio::fs::remove_dir_all(&location.path).await {
                warn!("Unable to remove {}: {e}", location.path.display());
            }
        }

        result
    }

    async fn render(
        &self,
        stats: &ReportStats,
        config: &ReportConfig,
        options: &ReportOptions,
        location: &Path,
        html_path: &mut Option<PathBuf>,
    ) -> Result<ReportArtifact, ReportError> {
        let data = HtmlReportData {
            npm_stats: Some(stats),
            git_stats: None,
        };
        let path = HtmlReporter::new(config).write(data, location).await?;
        *html_path = Some(path.clone());

        if config.has_reporter(Reporter::Pdf) {
            let name = clean_report_name(&config.title, Some(".pdf"));
            return self
                .pdf
                .write(&path, location, &name, options.save_pdf_on_disk)
                .await;
        }

        if options.save_html_on_disk {
            return Ok(ReportArtifact::File(path));
        }

        // The file is about to be removed, so hand the document back instead.
        let html = tokio::fs::read_to_string(&path).await?;
        Ok(ReportArtifact::Html(html))
    }
}

async fn remove_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Unable to remove {}: {e}", path.display()),
    }
}

/// Writes the HTML report, then the PDF when enabled, into `reports_dir`.
pub async fn proceed(
    data: HtmlReportData<'_>,
    config: &ReportConfig,
    pdf: &PdfReporter,
    reports_dir: &Path,
) -> Result<Vec<PathBuf>, ReportError> {
    info!("[Reporter: HTML] Building template and assets");
    let html_path = HtmlReporter::new(config).write(data, reports_dir).await?;
    let mut written = vec![html_path.clone()];

    if config.has_reporter(Reporter::Pdf) {
        info!("[Reporter: PDF] Converting HTML content to PDF");
        let name = clean_report_name(&config.title, Some(".pdf"));
        if let Some(path) = pdf
            .write(&html_path, reports_dir, &name, true)
            .await?
            .path()
        {
            written.push(path.clone());
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NpmConfig;
    use serde_json::json;

    struct NoScores;

    impl ScorecardSource for NoScores {
        async fn score(&self, package: &str, _repository: Option<&str>) -> Result<f64, ReportError> {
            Err(ReportError::Upstream(format!("no scorecard for {package}")))
        }
    }

    fn dependencies() -> Dependencies {
        serde_json::from_value(json!({
            "left-pad": {
                "metadata": { "maintainers": [{ "email": "a@x.com" }] },
                "versions": {
                    "1.0.0": {
                        "flags": [],
                        "size": 1024,
                        "composition": { "extensions": [".js"], "required_nodejs": [] },
                        "license": { "uniqueLicenseIds": ["MIT"] },
                        "warnings": []
                    }
                }
            }
        }))
        .unwrap()
    }

    fn html_only() -> ReportConfig {
        ReportConfig {
            title: "api report".to_string(),
            reporters: vec![Reporter::Html],
            npm: Some(NpmConfig {
                organization_prefix: None,
                packages: vec!["left-pad".to_string()],
            }),
            ..ReportConfig::default()
        }
    }

    #[tokio::test]
    async fn test_explicit_location_wins() {
        let options = ReportOptions {
            report_output_location: Some(PathBuf::from("/somewhere")),
            ..ReportOptions::default()
        };
        let location = report_location(&ReportConfig::default(), &options).await.unwrap();

        assert_eq!(location.path, PathBuf::from("/somewhere"));
        assert!(!location.temporary);
    }

    #[test]
    fn test_confine_location() {
        let root = Path::new("/srv/reports");

        assert_eq!(confine_location(root, None).unwrap(), root);
        assert_eq!(
            confine_location(root, Some(Path::new("team/weekly"))).unwrap(),
            PathBuf::from("/srv/reports/team/weekly")
        );
        for rejected in ["/etc", "../outside", "team/../../etc"] {
            let err = confine_location(root, Some(Path::new(rejected))).unwrap_err();
            assert!(matches!(err, ReportError::Config(_)), "{rejected} accepted");
        }
    }

    #[tokio::test]
    async fn test_unpersisted_report_uses_temporary_dir() {
        let location = report_location(&ReportConfig::default(), &ReportOptions::default())
            .await
            .unwrap();

        assert!(location.temporary);
        assert!(location.path.exists());
        tokio::fs::remove_dir_all(&location.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_saving_pdf_without_pdf_reporter_uses_temporary_dir() {
        let options = ReportOptions {
            save_pdf_on_disk: true,
            ..ReportOptions::default()
        };
        let location = report_location(&html_only(), &options).await.unwrap();

        assert!(location.temporary);
        tokio::fs::remove_dir_all(&location.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_html_only_report_is_returned_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions {
            report_output_location: Some(dir.path().to_path_buf()),
            ..ReportOptions::default()
        };

        let artifact = ReportService::new(&AppConfig::default(), NoScores)
            .report(&dependencies(), &html_only(), &options)
            .await
            .unwrap();

        match artifact {
            ReportArtifact::Html(html) => assert!(html.contains("<title>api report</title>")),
            other => panic!("unexpected artifact {other:?}"),
        }
        assert!(!dir.path().join("api report.html").exists());
    }

    #[tokio::test]
    async fn test_saved_html_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions {
            report_output_location: Some(dir.path().to_path_buf()),
            save_html_on_disk: true,
            ..ReportOptions::default()
        };

        let artifact = ReportService::new(&AppConfig::default(), NoScores)
            .report(&dependencies(), &html_only(), &options)
            .await
            .unwrap();

        let expected = dir.path().join("api report.html");
        assert_eq!(artifact, ReportArtifact::File(expected.clone()));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_no_reporter_is_rejected_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            reporters: vec![],
            ..html_only()
        };
        let options = ReportOptions {
            report_output_location: Some(dir.path().to_path_buf()),
            save_html_on_disk: true,
            ..ReportOptions::default()
        };

        let err = ReportService::new(&AppConfig::default(), NoScores)
            .report(&dependencies(), &config, &options)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("At least one reporter must be enabled"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_pdf_still_removes_html() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            reporters: vec![Reporter::Html, Reporter::Pdf],
            ..html_only()
        };
        let options = ReportOptions {
            report_output_location: Some(dir.path().to_path_buf()),
            ..ReportOptions::default()
        };
        let pdf = PdfReporter::new(&AppConfig {
            browser_bin: "nreport-missing-browser".to_string(),
            ..AppConfig::default()
        });

        let err = ReportService::new(&AppConfig::default(), NoScores)
            .with_pdf_reporter(pdf)
            .report(&dependencies(), &config, &options)
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Render(_)));
        assert!(!dir.path().join("api report.html").exists());
    }

    #[tokio::test]
    async fn test_proceed_writes_html_only_when_pdf_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = html_only();
        let stats = build_stats([&dependencies()], &config);

        let written = proceed(
            HtmlReportData {
                npm_stats: Some(&stats),
                git_stats: None,
            },
            &config,
            &PdfReporter::new(&AppConfig::default()),
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(written, vec![dir.path().join("api report.html")]);
    }
}
