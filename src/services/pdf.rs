use crate::config::AppConfig;
use crate::error::ReportError;
use crate::models::report::ReportArtifact;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Virtual time the page gets to load its scripts and draw charts before printing.
const RENDER_BUDGET_MS: u64 = 10_000;

/// Prints an HTML report to PDF with a headless Chromium-compatible browser.
#[derive(Debug, Clone)]
pub struct PdfReporter {
    browser_bin: String,
    timeout: Duration,
}

impl PdfReporter {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            browser_bin: config.browser_bin.clone(),
            timeout: Duration::from_secs(config.pdf_timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, html: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.browser_bin);
        command
            .arg("--headless")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--run-all-compositor-stages-before-draw")
            .arg(format!("--virtual-time-budget={RENDER_BUDGET_MS}"))
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg("--no-pdf-header-footer")
            .arg(format!("file://{}", html.display()))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Prints `html` to `output`, killing the browser when the timeout elapses.
    pub async fn print(&self, html: &Path, output: &Path) -> Result<(), ReportError> {
        let child = self
            .command(html, output)
            .spawn()
            .map_err(|e| ReportError::Render(format!("Unable to start {}: {e}", self.browser_bin)))?;

        // Dropping the future on timeout drops the child, which kills it.
        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                ReportError::Timeout(format!(
                    "PDF rendering did not finish within {}s",
                    self.timeout.as_secs()
                ))
            })?;

        let output_status = result?;
        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(ReportError::Render(format!(
                "{} exited with {}: {}",
                self.browser_bin,
                output_status.status,
                stderr.trim()
            )));
        }

        if !output.exists() {
            return Err(ReportError::Render(format!(
                "{} did not produce {}",
                self.browser_bin,
                output.display()
            )));
        }

        Ok(())
    }

    /// Renders `<location>/<name>` and either keeps it on disk or returns its bytes.
    pub async fn write(
        &self,
        html: &Path,
        location: &Path,
        name: &str,
        save_on_disk: bool,
    ) -> Result<ReportArtifact, ReportError> {
        tokio::fs::create_dir_all(location).await?;
        let output: PathBuf = location.join(name);

        self.print(html, &output).await?;
        info!("PDF report written to {}", output.display());

        if save_on_disk {
            return Ok(ReportArtifact::File(output));
        }

        let bytes = tokio::fs::read(&output).await?;
        if let Err(e) = tokio::fs::remove_file(&output).await {
            warn!("Unable to remove {}: {e}", output.display());
        }

        Ok(ReportArtifact::Pdf(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter(bin: &str) -> PdfReporter {
        PdfReporter::new(&AppConfig {
            browser_bin: bin.to_string(),
            ..AppConfig::default()
        })
    }

    #[test]
    fn test_command_line() {
        let command = reporter("chromium").command(Path::new("/tmp/r.html"), Path::new("/tmp/r.pdf"));
        let args: Vec<String> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(command.as_std().get_program(), "chromium");
        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"--print-to-pdf=/tmp/r.pdf".to_string()));
        assert!(args.contains(&"--virtual-time-budget=10000".to_string()));
        assert!(args.contains(&"--run-all-compositor-stages-before-draw".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("file:///tmp/r.html"));
    }

    #[test]
    fn test_timeout_defaults_to_config() {
        assert_eq!(reporter("chromium").timeout, Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_missing_browser_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = reporter("nreport-missing-browser")
            .print(&dir.path().join("r.html"), &dir.path().join("r.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Render(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_browser_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-browser.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let err = reporter(&script.to_string_lossy())
            .with_timeout(Duration::from_millis(200))
            .print(&dir.path().join("r.html"), &dir.path().join("r.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Timeout(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pdf_bytes_returned_when_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-browser.sh");
        // Writes the value of --print-to-pdf= as a tiny PDF.
        std::fs::write(
            &script,
            "#!/bin/sh\nfor a in \"$@\"; do case \"$a\" in --print-to-pdf=*) printf '%%PDF-1.4' > \"${a#--print-to-pdf=}\";; esac; done\n",
        )
        .unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let artifact = reporter(&script.to_string_lossy())
            .write(&dir.path().join("r.html"), dir.path(), "r.pdf", false)
            .await
            .unwrap();

        assert_eq!(artifact, ReportArtifact::Pdf(b"%PDF-1.4".to_vec()));
        assert!(!dir.path().join("r.pdf").exists());
    }
}
