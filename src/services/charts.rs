use crate::models::chart::{ChartDefinition, ChartInstruction, ChartName, StatsSource};
use crate::models::stats::{Histogram, ReportStats};

const DEFAULT_INTERPOLATION: &str = "d3.interpolateCool";

fn histogram<'a>(stats: &'a ReportStats, name: ChartName) -> &'a Histogram {
    match name {
        ChartName::Extensions => &stats.extensions,
        ChartName::Licenses => &stats.licenses,
        ChartName::Warnings => &stats.warnings,
        ChartName::Flags => &stats.flags,
        ChartName::Authors => &stats.authors,
    }
}

fn instruction(
    source: StatsSource,
    stats: &ReportStats,
    chart: &ChartDefinition,
) -> ChartInstruction {
    let data = histogram(stats, chart.name);

    ChartInstruction {
        canvas_id: format!("{}_{}_canvas", source.prefix(), chart.name.key()),
        title: chart.name.as_str(),
        labels: data.labels(),
        values: data.values(),
        interpolation: chart
            .interpolation
            .clone()
            .unwrap_or_else(|| DEFAULT_INTERPOLATION.to_string()),
        chart_type: chart.chart_type,
    }
}

/// Chart instructions for every displayed chart, npm statistics first.
pub fn project(
    npm_stats: Option<&ReportStats>,
    git_stats: Option<&ReportStats>,
    charts: &[ChartDefinition],
) -> Vec<ChartInstruction> {
    let displayed: Vec<&ChartDefinition> = charts.iter().filter(|c| c.display).collect();

    [(StatsSource::Npm, npm_stats), (StatsSource::Git, git_stats)]
        .into_iter()
        .filter_map(|(source, stats)| stats.map(|stats| (source, stats)))
        .flat_map(|(source, stats)| {
            displayed
                .iter()
                .map(move |chart| instruction(source, stats, chart))
        })
        .collect()
}

impl ChartInstruction {
    /// The `createChart(...)` call drawing this chart in the report page.
    pub fn to_script(&self) -> String {
        // `<` is escaped so no label can close the surrounding script tag.
        let labels = serde_json::to_string(&self.labels)
            .unwrap_or_else(|_| "[]".to_string())
            .replace('<', "\\u003c");
        let values = self
            .values
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "\tcreateChart(\"{}\", \"{}\", {{ labels: {labels}, interpolate: {}, data: [{values}] }});",
            self.canvas_id,
            self.chart_type.as_str(),
            self.interpolation,
        )
    }
}

/// All chart calls wrapped in a `DOMContentLoaded` listener.
pub fn chart_script(instructions: &[ChartInstruction]) -> String {
    let calls = instructions
        .iter()
        .map(ChartInstruction::to_script)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<script>\ndocument.addEventListener(\"DOMContentLoaded\", () => {{\n{calls}\n}});\n</script>"
    )
}
