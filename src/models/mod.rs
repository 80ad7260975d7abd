// Re-export all models from their respective modules
pub mod chart;
pub mod flag;
pub mod payload;
pub mod report;
pub mod stats;

// Re-export commonly used models
pub use chart::*;
pub use flag::*;
pub use payload::*;
pub use report::*;
pub use stats::*;
