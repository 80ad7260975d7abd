use crate::assets;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::models::chart::{ChartInstruction, StatsSource};
use crate::models::stats::ReportStats;
use crate::services::charts;
use crate::utils::clean_report_name;
use chrono::Local;
use log::{debug, info};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%d %b %Y, %H:%M:%S";

/// Statistics rendered into one report.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReportData<'a> {
    pub npm_stats: Option<&'a ReportStats>,
    pub git_stats: Option<&'a ReportStats>,
}

pub struct HtmlReporter<'a> {
    config: &'a ReportConfig,
}

impl<'a> HtmlReporter<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    pub fn file_name(&self) -> String {
        clean_report_name(&self.config.title, Some(".html"))
    }

    /// Renders a self-contained HTML document.
    pub fn render(&self, data: HtmlReportData<'_>) -> Result<String, ReportError> {
        let instructions = charts::project(data.npm_stats, data.git_stats, &self.config.charts);
        debug!("Rendering {} chart(s)", instructions.len());

        let logo = self
            .config
            .logo_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| format!("<img src=\"{}\" alt=\"logo\">", escape_html(url)))
            .unwrap_or_default();

        let npm_section = data
            .npm_stats
            .map(|stats| section(StatsSource::Npm, stats, &instructions))
            .unwrap_or_default();
        let git_section = data
            .git_stats
            .map(|stats| section(StatsSource::Git, stats, &instructions))
            .unwrap_or_default();

        let title = escape_html(&self.config.title);
        let date = Local::now().format(DATE_FORMAT).to_string();
        let chart_script = charts::chart_script(&instructions);

        Ok(fill(
            assets::template()?,
            &[
                ("report_theme", assets::resolve_theme(&self.config.theme)),
                ("report_title", title.as_str()),
                ("report_logo", logo.as_str()),
                ("report_date", date.as_str()),
                ("style_css", assets::style()?),
                ("theme_css", assets::theme_style(&self.config.theme)?),
                ("main_js", assets::main_script()?),
                ("npm_section", npm_section.as_str()),
                ("git_section", git_section.as_str()),
                ("chart_script", chart_script.as_str()),
            ],
        ))
    }

    /// Renders and saves the report as `<location>/<title>.html`.
    pub async fn write(
        &self,
        data: HtmlReportData<'_>,
        location: &Path,
    ) -> Result<PathBuf, ReportError> {
        let html = self.render(data)?;
        tokio::fs::create_dir_all(location).await?;

        let path = location.join(self.file_name());
        tokio::fs::write(&path, html).await?;
        info!("HTML report written to {}", path.display());

        Ok(path)
    }
}

/// Replaces `{{key}}` markers in a single pass so inserted content is never re-expanded.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match values.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn link(url: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\">{}</a>",
        escape_html(url),
        escape_html(label)
    )
}

fn card(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(
        "<div class=\"card\"><span class=\"value\">{}</span>{}</div>",
        escape_html(value),
        escape_html(label)
    ));
}

fn section(source: StatsSource, stats: &ReportStats, instructions: &[ChartInstruction]) -> String {
    let heading = match source {
        StatsSource::Npm => "NPM Packages",
        StatsSource::Git => "Git Repositories",
    };

    let mut out = String::new();
    out.push_str(&format!("<section class=\"stats\" id=\"{}\">", source.prefix()));
    out.push_str(&format!("<h2>{heading}</h2>"));

    out.push_str("<div class=\"cards\">");
    card(&mut out, "Packages", &stats.packages_count.all.to_string());
    card(&mut out, "Internal", &stats.packages_count.internal.to_string());
    card(&mut out, "Third-party", &stats.packages_count.external.to_string());
    card(&mut out, "Total size", &stats.size.all);
    card(&mut out, "Internal size", &stats.size.internal);
    card(&mut out, "Third-party size", &stats.size.external);
    out.push_str("</div>");

    let prefix = format!("{}_", source.prefix());
    let canvases: Vec<&ChartInstruction> = instructions
        .iter()
        .filter(|i| i.canvas_id.starts_with(&prefix))
        .collect();
    if !canvases.is_empty() {
        out.push_str("<div class=\"charts\">");
        for chart in canvases {
            out.push_str(&format!(
                "<div class=\"chart\"><h3>{title}</h3><canvas id=\"{id}\" data-title=\"{title}\"></canvas></div>",
                id = chart.canvas_id,
                title = chart.title,
            ));
        }
        out.push_str("</div>");
    }

    scorecards(&mut out, stats);
    if stats.show_flags {
        flags(&mut out, stats);
    }
    transitive(&mut out, stats);
    builtins(&mut out, stats);
    authors(&mut out, stats);

    out.push_str("</section>");
    out
}

fn scorecards(out: &mut String, stats: &ReportStats) {
    if stats.scorecards.is_empty() {
        return;
    }

    out.push_str("<h3>Scorecards</h3><table><thead><tr><th>Package</th><th>Score</th></tr></thead><tbody>");
    for (name, scorecard) in &stats.scorecards {
        out.push_str(&format!(
            "<tr><td>{}</td><td><a class=\"score {}\" href=\"{}\" target=\"_blank\">{}</a></td></tr>",
            escape_html(name),
            scorecard.color,
            escape_html(&scorecard.visualizer_url),
            scorecard.score,
        ));
    }
    out.push_str("</tbody></table>");
}

fn flags(out: &mut String, stats: &ReportStats) {
    let flagged: Vec<_> = stats
        .packages
        .values()
        .filter(|pkg| !pkg.flags.is_empty())
        .collect();
    if flagged.is_empty() {
        return;
    }

    out.push_str("<h3>Flagged packages</h3><table><thead><tr><th>Package</th><th>Versions</th><th>Flags</th></tr></thead><tbody>");
    for pkg in flagged {
        let versions = pkg.versions.iter().cloned().collect::<Vec<_>>().join(", ");
        let emojis: String = pkg
            .flags
            .values()
            .map(|flag| {
                format!(
                    "<span class=\"flag\" title=\"{}: {}\">{}</span>",
                    flag.title,
                    escape_html(flag.tooltip_description),
                    flag.emoji
                )
            })
            .collect();
        let name = match pkg.links.as_ref().and_then(|l| l.npm.as_deref()) {
            Some(url) => link(url, &pkg.full_name),
            None => escape_html(&pkg.full_name),
        };
        out.push_str(&format!(
            "<tr><td>{name}</td><td>{}</td><td>{emojis}</td></tr>",
            escape_html(&versions)
        ));
    }
    out.push_str("</tbody></table>");
}

fn transitive(out: &mut String, stats: &ReportStats) {
    if stats.deps.transitive.is_empty() {
        return;
    }

    out.push_str("<h3>Packages with indirect dependencies</h3><ul class=\"inline\">");
    for (name, dependency) in &stats.deps.transitive {
        let target = dependency.links.as_ref().and_then(|l| {
            l.repository
                .as_deref()
                .or(l.homepage.as_deref())
                .or(l.npm.as_deref())
        });
        let item = match target {
            Some(url) => link(url, name),
            None => escape_html(name),
        };
        out.push_str(&format!("<li>{item}</li>"));
    }
    out.push_str("</ul>");
}

fn builtins(out: &mut String, stats: &ReportStats) {
    if stats.deps.node.is_empty() {
        return;
    }

    out.push_str("<h3>Node.js core modules</h3><ul class=\"inline\">");
    for (name, dependency) in &stats.deps.node {
        out.push_str(&format!("<li>{}</li>", link(&dependency.visualizer_url, name)));
    }
    out.push_str("</ul>");
}

fn authors(out: &mut String, stats: &ReportStats) {
    if stats.authors.is_empty() {
        return;
    }

    out.push_str("<h3>Authors</h3><ul class=\"inline\">");
    for (email, count) in stats.authors.iter() {
        out.push_str(&format!("<li>{} ({count})</li>", escape_html(email)));
    }
    out.push_str("</ul>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stats::{NodeDependency, PackageRecord, Scorecard};

    fn stats() -> ReportStats {
        let mut stats = ReportStats::new(true);
        stats.licenses.increment("MIT");
        stats.extensions.increment(".js");
        stats.authors.increment("a@x.com");
        stats.packages_count.all = 1;
        stats.packages_count.external = 1;
        stats.size.all = "1 KB".to_string();

        let mut pkg = PackageRecord::new("<evil>", true, true);
        pkg.versions.insert("1.0.0".to_string());
        if let Some(flag) = crate::models::flag::lookup_flag("hasScript") {
            pkg.flags.insert("hasScript".to_string(), *flag);
        }
        stats.packages.insert("<evil>".to_string(), pkg);

        stats.scorecards.insert(
            "<evil>".to_string(),
            Scorecard {
                score: 7.5,
                color: "blue",
                visualizer_url: "#".to_string(),
            },
        );
        stats.deps.node.insert(
            "fs".to_string(),
            NodeDependency {
                visualizer_url: "https://nodejs.org/dist/latest/docs/api/fs.html".to_string(),
            },
        );
        stats
    }

    #[test]
    fn test_fill_is_single_pass() {
        let out = fill("a {{x}} b {{y}} {{unknown}}", &[("x", "{{y}}"), ("y", "2")]);
        assert_eq!(out, "a {{y}} b 2 {{unknown}}");
    }

    #[test]
    fn test_fill_keeps_unterminated_marker() {
        assert_eq!(fill("a {{x", &[("x", "1")]), "a {{x");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_render_contains_sections_and_charts() {
        let config = ReportConfig {
            title: "Security <report>".to_string(),
            ..ReportConfig::default()
        };
        let stats = stats();
        let html = HtmlReporter::new(&config)
            .render(HtmlReportData {
                npm_stats: Some(&stats),
                git_stats: None,
            })
            .unwrap();

        assert!(html.contains("<title>Security &lt;report&gt;</title>"));
        assert!(html.contains("id=\"npm_licenses_canvas\""));
        assert!(!html.contains("git_licenses_canvas"));
        assert!(html.contains("createChart(\"npm_licenses_canvas\", \"bar\""));
        assert!(html.contains("DOMContentLoaded"));
        assert!(html.contains("&lt;evil&gt;"));
        assert!(!html.contains("<evil>"));
        assert!(html.contains("score blue"));
        assert!(html.contains("fs.html"));
        assert!(html.contains("Flagged packages"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_fragments_are_appended_in_order() {
        let stats = stats();
        let mut out = String::new();
        card(&mut out, "Packages", "1");
        builtins(&mut out, &stats);
        authors(&mut out, &stats);

        assert_eq!(
            out,
            "<div class=\"card\"><span class=\"value\">1</span>Packages</div>\
             <h3>Node.js core modules</h3><ul class=\"inline\">\
             <li><a href=\"https://nodejs.org/dist/latest/docs/api/fs.html\" target=\"_blank\">fs</a></li></ul>\
             <h3>Authors</h3><ul class=\"inline\"><li>a@x.com (1)</li></ul>"
        );
    }

    #[test]
    fn test_render_hides_flags_when_disabled() {
        let config = ReportConfig::default();
        let mut stats = stats();
        stats.show_flags = false;
        let html = HtmlReporter::new(&config)
            .render(HtmlReportData {
                npm_stats: Some(&stats),
                git_stats: None,
            })
            .unwrap();

        assert!(!html.contains("Flagged packages"));
    }

    #[tokio::test]
    async fn test_write_uses_clean_title() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            title: "weekly: report".to_string(),
            ..ReportConfig::default()
        };

        let path = HtmlReporter::new(&config)
            .write(HtmlReportData::default(), dir.path())
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("weekly! report.html"));
        assert!(path.exists());
    }
}
