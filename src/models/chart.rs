use serde::{Deserialize, Serialize};

/// Statistics slices that can be charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartName {
    #[serde(alias = "extensions")]
    Extensions,
    #[serde(alias = "licenses")]
    Licenses,
    #[serde(alias = "warnings")]
    Warnings,
    #[serde(alias = "flags")]
    Flags,
    #[serde(alias = "authors")]
    Authors,
}

impl ChartName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartName::Extensions => "Extensions",
            ChartName::Licenses => "Licenses",
            ChartName::Warnings => "Warnings",
            ChartName::Flags => "Flags",
            ChartName::Authors => "Authors",
        }
    }

    /// Lowercase key used for canvas identifiers.
    pub fn key(&self) -> &'static str {
        match self {
            ChartName::Extensions => "extensions",
            ChartName::Licenses => "licenses",
            ChartName::Warnings => "warnings",
            ChartName::Flags => "flags",
            ChartName::Authors => "authors",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChartType {
    #[default]
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "horizontalBar")]
    HorizontalBar,
    #[serde(rename = "pie")]
    Pie,
    #[serde(rename = "doughnut")]
    Doughnut,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::HorizontalBar => "horizontalBar",
            ChartType::Pie => "pie",
            ChartType::Doughnut => "doughnut",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDefinition {
    pub name: ChartName,
    #[serde(default)]
    pub display: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation: Option<String>,
    #[serde(rename = "type", default)]
    pub chart_type: ChartType,
}

impl ChartDefinition {
    pub fn new(name: ChartName, chart_type: ChartType, interpolation: &str) -> Self {
        Self {
            name,
            display: true,
            interpolation: Some(interpolation.to_string()),
            chart_type,
        }
    }
}

/// Which statistics set a chart is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsSource {
    Npm,
    Git,
}

impl StatsSource {
    pub fn prefix(&self) -> &'static str {
        match self {
            StatsSource::Npm => "npm",
            StatsSource::Git => "git",
        }
    }
}

/// Everything the front-end needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartInstruction {
    pub canvas_id: String,
    pub title: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub interpolation: String,
    pub chart_type: ChartType,
}
