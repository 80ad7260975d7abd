use crate::error::ReportError;
use include_dir::{Dir, include_dir};

// Report template, stylesheets and chart script, embedded at compile time
static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/public");

pub const DEFAULT_THEME: &str = "dark";

fn text(path: &str) -> Result<&'static str, ReportError> {
    let file = ASSETS
        .get_file(path)
        .ok_or_else(|| ReportError::Render(format!("Missing embedded asset '{path}'")))?;

    std::str::from_utf8(file.contents())
        .map_err(|e| ReportError::Render(format!("Embedded asset '{path}' is not UTF-8: {e}")))
}

pub fn template() -> Result<&'static str, ReportError> {
    text("views/template.html")
}

pub fn style() -> Result<&'static str, ReportError> {
    text("css/style.css")
}

pub fn main_script() -> Result<&'static str, ReportError> {
    text("scripts/main.js")
}

/// Names of the embedded themes.
pub fn themes() -> Vec<&'static str> {
    ASSETS
        .get_dir("css/themes")
        .map(|dir| {
            dir.files()
                .filter_map(|f| f.path().file_stem().and_then(|s| s.to_str()))
                .collect()
        })
        .unwrap_or_default()
}

/// Resolves a theme name, falling back to the default one when unknown.
pub fn resolve_theme(theme: &str) -> &'static str {
    themes()
        .into_iter()
        .find(|t| t.eq_ignore_ascii_case(theme))
        .unwrap_or(DEFAULT_THEME)
}

pub fn theme_style(theme: &str) -> Result<&'static str, ReportError> {
    text(&format!("css/themes/{}.css", resolve_theme(theme)))
}
