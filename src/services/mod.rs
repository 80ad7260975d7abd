pub mod aggregator;
pub mod charts;
pub mod fetch;
pub mod html;
pub mod pdf;
pub mod policy;
pub mod report;
pub mod repository;
pub mod scanner;
pub mod scorecard;

pub use aggregator::StatsAggregator;
pub use fetch::{FetchedStats, fetch_packages_and_repositories};
pub use html::{HtmlReportData, HtmlReporter};
pub use pdf::PdfReporter;
pub use report::ReportService;
pub use repository::RepositoryFetcher;
pub use scanner::{ProcessScanner, ScanInvoker, ScanTarget, Scanner};
pub use scorecard::{ScorecardClient, ScorecardSource};
