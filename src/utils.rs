//! Small helpers shared by the fetchers, the aggregator and the reporters.

const BYTE_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const MAX_FILENAME_LENGTH: usize = 100;

/// Human readable size in 1024 steps, with at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut exponent = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exponent < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }

    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');

    format!("{trimmed} {}", BYTE_UNITS[exponent])
}

/// Split `@scope/name` into `(Some("@scope"), "name")`.
pub fn split_package_with_org(package: &str) -> (Option<&str>, &str) {
    let mut parts = package.rsplit('/');
    let name = parts.next().unwrap_or(package);
    (parts.next(), name)
}

/// Prefix every package that does not already carry the organization prefix.
pub fn format_npm_packages(organization_prefix: Option<&str>, packages: &[String]) -> Vec<String> {
    match organization_prefix {
        None | Some("") => packages.to_vec(),
        Some(prefix) => packages
            .iter()
            .map(|pkg| {
                if pkg.starts_with(prefix) {
                    pkg.clone()
                } else {
                    format!("{prefix}/{pkg}")
                }
            })
            .collect(),
    }
}

/// Turn a report title into a safe file name, appending `extension` when missing.
pub fn clean_report_name(name: &str, extension: Option<&str>) -> String {
    let mut clean: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '!',
            c if c.is_control() => '!',
            c => c,
        })
        .collect();

    if clean.is_empty() || clean == "." || clean == ".." {
        clean = "!".to_string();
    }
    if clean.chars().count() > MAX_FILENAME_LENGTH {
        clean = clean.chars().take(MAX_FILENAME_LENGTH).collect();
    }

    match extension {
        Some(ext) if !clean.ends_with(ext) => format!("{clean}{ext}"),
        _ => clean,
    }
}

/// Removes git+ prefix and .git suffix, converts SSH URLs to HTTPS
pub fn clean_repository_url(url: &str) -> String {
    let mut cleaned = url.trim().to_string();

    if let Some(stripped) = cleaned.strip_prefix("git+") {
        cleaned = stripped.to_string();
    }

    if let Some(stripped) = cleaned.strip_suffix(".git") {
        cleaned = stripped.to_string();
    }

    if cleaned.starts_with("git@github.com:") {
        cleaned = cleaned.replace("git@github.com:", "https://github.com/");
    } else if cleaned.starts_with("git@gitlab.com:") {
        cleaned = cleaned.replace("git@gitlab.com:", "https://gitlab.com/");
    } else if cleaned.starts_with("git@bitbucket.org:") {
        cleaned = cleaned.replace("git@bitbucket.org:", "https://bitbucket.org/");
    }

    cleaned
}

/// `(repository path, host)` of a VCS URL such as `git+https://github.com/owner/repo.git`.
pub fn vcs_repository_path_and_platform(url: &str) -> Option<(String, String)> {
    let cleaned = clean_repository_url(url);
    let (_, rest) = cleaned.split_once("://")?;
    let (authority, path) = rest.split_once('/')?;

    // Drop any credentials and port from the authority.
    let host = authority.rsplit('@').next()?.split(':').next()?;
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    if host.is_empty() || path.is_empty() {
        return None;
    }

    Some((path.to_string(), host.to_string()))
}

/// Color bucket of an OpenSSF scorecard score.
pub fn score_color(score: f64) -> &'static str {
    if score < 4.0 {
        "red"
    } else if score < 6.5 {
        "orange"
    } else if score < 8.5 {
        "blue"
    } else {
        "green"
    }
}
