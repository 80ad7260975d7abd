use crate::config::ReportConfig;
use crate::models::payload::Dependencies;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and what to persist when generating a report through the API.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportOptions {
    #[serde(default)]
    pub report_output_location: Option<PathBuf>,
    #[serde(default, rename = "savePDFOnDisk", alias = "savePdfOnDisk")]
    pub save_pdf_on_disk: bool,
    #[serde(default, rename = "saveHTMLOnDisk", alias = "saveHtmlOnDisk")]
    pub save_html_on_disk: bool,
}

/// The result of a report generation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportArtifact {
    /// A report persisted on disk.
    File(PathBuf),
    /// PDF bytes that were never written to their final location.
    Pdf(Vec<u8>),
    /// An HTML document that was not asked to be kept on disk.
    Html(String),
}

impl ReportArtifact {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ReportArtifact::File(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct ReportRequest {
    pub dependencies: Dependencies,
    pub config: ReportConfig,
    #[serde(default)]
    pub options: ReportOptions,
}

#[derive(Serialize, Debug)]
pub struct ReportPathResponse {
    pub path: String,
}
