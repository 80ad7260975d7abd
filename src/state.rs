use crate::config::AppConfig;
use crate::services::{ReportService, ScorecardClient};

pub struct AppState {
    pub config: AppConfig,
    pub reports: ReportService<ScorecardClient>,
}

impl AppState {
    pub fn new(config: AppConfig, client: reqwest::Client) -> Self {
        let scorecards = ScorecardClient::new(client, &config);
        let reports = ReportService::new(&config, scorecards);
        Self { config, reports }
    }
}
