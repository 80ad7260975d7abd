use crate::error::ReportError;
use crate::models::{ReportArtifact, ReportPathResponse, ReportRequest};
use crate::services::report::confine_location;
use crate::state::AppState;
use log::{debug, info};
use rocket::http::ContentType;
use rocket::response::content::RawHtml;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, State, get, post};

// Health check endpoint
#[get("/api/v1/health")]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok"
    }))
}

#[post("/api/v1/report", format = "json", data = "<request>")]
pub async fn generate_report(
    request: Json<ReportRequest>,
    state: &State<AppState>,
) -> Result<ReportArtifact, ReportError> {
    let request = request.into_inner();
    info!(
        "Report '{}' requested for {} package(s)",
        request.config.title,
        request.dependencies.len()
    );
    let mut options = request.options;
    options.report_output_location = Some(confine_location(
        &state.config.reports_dir(),
        options.report_output_location.as_deref(),
    )?);
    debug!("Report options: {options:?}");

    state
        .reports
        .report(&request.dependencies, &request.config, &options)
        .await
}

impl<'r> Responder<'r, 'static> for ReportArtifact {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        match self {
            ReportArtifact::Pdf(bytes) => (ContentType::PDF, bytes).respond_to(req),
            ReportArtifact::Html(html) => RawHtml(html).respond_to(req),
            ReportArtifact::File(path) => Json(ReportPathResponse {
                path: path.display().to_string(),
            })
            .respond_to(req),
        }
    }
}
