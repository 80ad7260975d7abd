//! Merges scanner payloads into a single [`ReportStats`].
//!
//! Every `(package, version)` pair contributes at most once per aggregation,
//! whatever the number of payloads it appears in. Packages are registered in
//! the order they are first met so repeated runs over the same inputs produce
//! identical output.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::models::flag::INDIRECT_DEPENDENCIES_FLAG;
use crate::models::payload::{Dependencies, Dependency, LicenseContribution, VersionDescriptor};
use crate::models::stats::{
    NodeDependency, PackageRecord, ReportStats, SizeSummary, TransitiveDependency, VersionInfo,
};
use crate::services::policy::{OrganizationPolicy, TransitivePolicy, wanted_flag};
use crate::services::scorecard::{ScorecardSource, collect_scorecards};
use crate::utils::format_bytes;
use log::debug;

const NODE_DOCS_URL: &str = "https://nodejs.org/dist/latest/docs/api";

#[derive(Debug, Default, Clone, Copy)]
struct ByteTotals {
    all: u64,
    internal: u64,
    external: u64,
}

#[derive(Debug)]
pub struct StatsAggregator {
    organization: OrganizationPolicy,
    transitive: TransitivePolicy,
    sizes: ByteTotals,
    stats: ReportStats,
}

impl StatsAggregator {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            organization: OrganizationPolicy::from_config(config),
            transitive: TransitivePolicy::from_config(config),
            sizes: ByteTotals::default(),
            stats: ReportStats::new(config.show_flags),
        }
    }

    pub fn merge(&mut self, dependencies: &Dependencies) {
        for (name, dependency) in dependencies {
            self.merge_dependency(name, dependency);
        }
    }

    fn merge_dependency(&mut self, name: &str, dependency: &Dependency) {
        if !self.stats.packages.contains_key(name) {
            self.register_package(name, dependency);
        }

        let is_third = self.stats.packages[name].is_third;
        for (version, descriptor) in &dependency.versions {
            if self.stats.packages[name].versions.contains(version) {
                debug!("Skipping already aggregated {name}@{version}");
                continue;
            }
            self.merge_version(name, version, descriptor, is_third);
        }
    }

    fn register_package(&mut self, name: &str, dependency: &Dependency) {
        let is_third = self.organization.is_third_party(name);
        let is_given = self.organization.is_given(name);
        if is_third {
            self.stats.packages_count.external += 1;
        }

        for email in dependency
            .metadata
            .maintainers
            .iter()
            .filter_map(|human| human.email.as_deref())
            .filter(|email| !email.is_empty())
        {
            self.stats.authors.increment(email);
        }

        self.stats
            .packages
            .insert(name.to_string(), PackageRecord::new(name, is_third, is_given));
    }

    fn merge_version(
        &mut self,
        name: &str,
        version: &str,
        descriptor: &VersionDescriptor,
        is_third: bool,
    ) {
        let stats = &mut self.stats;

        self.sizes.all += descriptor.size;
        if is_third {
            self.sizes.external += descriptor.size;
        } else {
            self.sizes.internal += descriptor.size;
        }

        for warning in &descriptor.warnings {
            stats.warnings.increment(&warning.kind);
        }

        for flag in &descriptor.flags {
            let Some(manifest) = wanted_flag(flag) else {
                continue;
            };
            stats.flags.increment(flag);
            if let Some(record) = stats.packages.get_mut(name) {
                record.flags.insert(flag.clone(), *manifest);
            }
        }

        for dep in &descriptor.composition.required_nodejs {
            let doc_name = dep.strip_prefix("node:").unwrap_or(dep);
            stats.deps.node.insert(
                dep.clone(),
                NodeDependency {
                    visualizer_url: format!("{NODE_DOCS_URL}/{doc_name}.html"),
                },
            );
        }

        for extension in descriptor.composition.extensions.iter().filter(|e| !e.is_empty()) {
            stats.extensions.increment(extension);
        }

        match descriptor.license_contribution() {
            LicenseContribution::Unknown => stats.licenses.increment("Unknown"),
            LicenseContribution::Ids(ids) => {
                for id in ids {
                    stats.licenses.increment(id);
                }
            }
            LicenseContribution::Nothing => {}
        }

        if let Some(email) = descriptor.author_email() {
            stats.authors.increment(email);
        }

        let has_indirect_dependencies = descriptor.has_flag(INDIRECT_DEPENDENCIES_FLAG);
        if self.transitive.should_record(has_indirect_dependencies, is_third) {
            stats.deps.transitive.insert(
                format!("{name}@{version}"),
                TransitiveDependency {
                    links: descriptor.links.clone(),
                },
            );
        }

        if let Some(record) = stats.packages.get_mut(name) {
            // Links are taken from the first recorded version only, even when it has none.
            if record.versions.is_empty() {
                record.links = descriptor.links.clone();
            }
            record.versions.insert(version.to_string());
            record.version_info.insert(
                version.to_string(),
                VersionInfo {
                    has_indirect_dependencies,
                },
            );
        }
    }

    /// Computes package counts and formats sizes.
    pub fn finish(self) -> ReportStats {
        let mut stats = self.stats;

        stats.packages_count.all = stats.packages.len();
        stats.packages_count.internal = stats.packages_count.all - stats.packages_count.external;
        stats.size = SizeSummary {
            all: format_bytes(self.sizes.all),
            internal: format_bytes(self.sizes.internal),
            external: format_bytes(self.sizes.external),
        };

        stats
    }
}

/// Merge and finalize without scorecard lookups.
pub fn build_stats<'a, I>(payloads: I, config: &ReportConfig) -> ReportStats
where
    I: IntoIterator<Item = &'a Dependencies>,
{
    let mut aggregator = StatsAggregator::new(config);
    for payload in payloads {
        aggregator.merge(payload);
    }
    aggregator.finish()
}

/// Full aggregation: merge every payload, then attach scorecards of the given packages.
pub async fn aggregate<S>(
    payloads: &[Dependencies],
    config: &ReportConfig,
    scorecards: &S,
) -> Result<ReportStats, ReportError>
where
    S: ScorecardSource,
{
    let mut stats = build_stats(payloads, config);
    stats.scorecards = collect_scorecards(&stats, scorecards).await;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NpmConfig;
    use serde_json::json;

    fn config(prefix: Option<&str>, packages: &[&str], include_internal: bool) -> ReportConfig {
        ReportConfig {
            npm: Some(NpmConfig {
                organization_prefix: prefix.map(str::to_string),
                packages: packages.iter().map(|p| p.to_string()).collect(),
            }),
            include_transitive_internal: include_internal,
            ..ReportConfig::default()
        }
    }

    fn payload(value: serde_json::Value) -> Dependencies {
        serde_json::from_value(value).expect("valid payload")
    }

    fn left_pad() -> Dependencies {
        payload(json!({
            "left-pad": {
                "metadata": { "maintainers": [{ "email": "a@x.com" }] },
                "versions": {
                    "1.0.0": {
                        "flags": ["hasIndirectDependencies"],
                        "size": 120,
                        "composition": { "required_nodejs": ["fs"], "extensions": [".js"] },
                        "license": { "uniqueLicenseIds": ["MIT"] },
                        "author": { "email": "a@x.com" },
                        "warnings": []
                    }
                }
            }
        }))
    }

    fn scoped() -> Dependencies {
        payload(json!({
            "@acme/core": {
                "metadata": { "maintainers": [{ "email": "dev@acme.io" }] },
                "versions": {
                    "2.0.0": {
                        "flags": ["hasIndirectDependencies", "hasScript", "isFunky"],
                        "size": 2048,
                        "composition": { "required_nodejs": ["node:http"], "extensions": [".js", "", ".json"] },
                        "license": "unknown-marker",
                        "warnings": [{ "kind": "unsafe-regex" }, { "kind": "encoded-literal" }],
                        "links": { "repository": "git+https://github.com/acme/core.git" }
                    },
                    "2.1.0": {
                        "flags": ["hasWarnings"],
                        "size": 1024,
                        "composition": { "required_nodejs": [], "extensions": [".js"] },
                        "license": { "uniqueLicenseIds": ["ISC"] },
                        "warnings": [{ "kind": "unsafe-regex" }],
                        "links": { "repository": "git+https://github.com/acme/core-next.git" }
                    }
                }
            },
            "left-pad": {
                "metadata": { "maintainers": [{ "email": "a@x.com" }] },
                "versions": {
                    "1.0.0": {
                        "flags": ["hasIndirectDependencies"],
                        "size": 120,
                        "composition": { "required_nodejs": ["fs"], "extensions": [".js"] },
                        "license": { "uniqueLicenseIds": ["MIT"] },
                        "author": { "email": "a@x.com" },
                        "warnings": []
                    },
                    "1.1.0": { "flags": [], "size": 130, "license": { "uniqueLicenseIds": ["MIT"] } }
                }
            }
        }))
    }

    #[test]
    fn test_end_to_end_example() {
        let stats = build_stats([&left_pad()], &config(None, &[], true));

        assert_eq!(stats.packages_count.all, 1);
        assert_eq!(stats.packages_count.internal, 0);
        assert_eq!(stats.packages_count.external, 1);
        assert_eq!(stats.licenses.get("Unknown"), 0);
        assert_eq!(stats.licenses.get("MIT"), 1);
        assert_eq!(stats.licenses.labels(), vec!["Unknown", "MIT"]);
        assert!(stats.deps.transitive.contains_key("left-pad@1.0.0"));
        assert_eq!(stats.size.all, "120 B");
        assert_eq!(stats.size.external, "120 B");
        assert_eq!(stats.size.internal, "0 B");
        // Listed maintainer and publishing author are distinct signals.
        assert_eq!(stats.authors.get("a@x.com"), 2);
        assert_eq!(
            stats.deps.node["fs"].visualizer_url,
            "https://nodejs.org/dist/latest/docs/api/fs.html"
        );
        assert_eq!(stats.extensions.get(".js"), 1);
        assert_eq!(stats.flags.get("hasIndirectDependencies"), 1);

        let record = &stats.packages["left-pad"];
        assert!(record.is_third);
        assert!(!record.is_given);
        assert!(record.version_info["1.0.0"].has_indirect_dependencies);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let config = config(Some("@acme"), &["core"], false);
        let once = build_stats([&scoped()], &config);

        let payload = scoped();
        let twice = build_stats([&payload, &payload], &config);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_order_independence() {
        let config = config(Some("@acme"), &[], false);
        let a = scoped();
        let b = left_pad();

        let ab = build_stats([&a, &b], &config);
        let ba = build_stats([&b, &a], &config);

        assert_eq!(ab.size, ba.size);
        assert_eq!(ab.packages_count, ba.packages_count);
        for (left, right) in [
            (&ab.licenses, &ba.licenses),
            (&ab.flags, &ba.flags),
            (&ab.warnings, &ba.warnings),
            (&ab.extensions, &ba.extensions),
            (&ab.authors, &ba.authors),
        ] {
            let mut left: Vec<_> = left.iter().collect();
            let mut right: Vec<_> = right.iter().collect();
            left.sort();
            right.sort();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_first_occurrence_wins_across_payloads() {
        let config = config(None, &[], true);
        let first = left_pad();
        let second = payload(json!({
            "left-pad": {
                "metadata": { "maintainers": [] },
                "versions": {
                    "1.0.0": { "flags": [], "size": 9999, "license": "raw" }
                }
            }
        }));

        let stats = build_stats([&first, &second], &config);
        assert_eq!(stats.size.all, "120 B");
        assert_eq!(stats.licenses.get("Unknown"), 0);
    }

    #[test]
    fn test_packages_count_conservation() {
        let config = config(Some("@acme"), &[], false);
        let stats = build_stats([&scoped(), &left_pad()], &config);

        assert_eq!(stats.packages_count.all, 2);
        assert_eq!(stats.packages_count.internal, 1);
        assert_eq!(stats.packages_count.external, 1);
        assert_eq!(
            stats.packages_count.all,
            stats.packages_count.internal + stats.packages_count.external
        );
        assert_eq!(stats.size.internal, "3 KB");
        assert_eq!(stats.size.external, "250 B");
    }

    #[test]
    fn test_unlisted_flags_are_dropped() {
        let stats = build_stats([&scoped()], &config(Some("@acme"), &[], true));

        assert!(!stats.flags.contains("isFunky"));
        assert_eq!(stats.flags.get("hasScript"), 1);
        assert_eq!(stats.flags.get("hasWarnings"), 1);

        let record = &stats.packages["@acme/core"];
        assert!(!record.flags.contains_key("isFunky"));
        assert_eq!(record.flags["hasScript"].emoji, "📦");
    }

    #[test]
    fn test_transitive_internal_suppression_toggle() {
        let excluded = build_stats([&scoped()], &config(Some("@acme"), &[], false));
        assert!(!excluded.deps.transitive.contains_key("@acme/core@2.0.0"));
        assert!(excluded.packages["@acme/core"].version_info["2.0.0"].has_indirect_dependencies);

        let included = build_stats([&scoped()], &config(Some("@acme"), &[], true));
        let entry = &included.deps.transitive["@acme/core@2.0.0"];
        assert_eq!(
            entry.links.as_ref().and_then(|l| l.repository.as_deref()),
            Some("git+https://github.com/acme/core.git")
        );
    }

    #[test]
    fn test_unknown_license_accounting() {
        let stats = build_stats([&scoped()], &config(Some("@acme"), &[], false));

        assert_eq!(stats.licenses.get("Unknown"), 1);
        assert_eq!(stats.licenses.get("ISC"), 1);
        assert_eq!(stats.licenses.get("MIT"), 2);
        assert_eq!(stats.licenses.len(), 3);
    }

    #[test]
    fn test_histograms_and_node_dependencies() {
        let stats = build_stats([&scoped()], &config(Some("@acme"), &[], false));

        assert_eq!(stats.warnings.get("unsafe-regex"), 2);
        assert_eq!(stats.warnings.get("encoded-literal"), 1);
        assert_eq!(stats.extensions.get(".js"), 3);
        assert_eq!(stats.extensions.get(".json"), 1);
        assert!(!stats.extensions.contains(""));
        assert_eq!(
            stats.deps.node["node:http"].visualizer_url,
            "https://nodejs.org/dist/latest/docs/api/http.html"
        );
        assert_eq!(stats.authors.get("dev@acme.io"), 1);
    }

    #[test]
    fn test_links_cached_from_first_version() {
        let stats = build_stats([&scoped()], &config(Some("@acme"), &["core"], false));
        let record = &stats.packages["@acme/core"];

        assert_eq!(record.repository_url(), Some("git+https://github.com/acme/core.git"));
        assert!(record.is_given);
        assert!(!record.is_third);
        assert_eq!(
            record.versions.iter().collect::<Vec<_>>(),
            vec!["2.0.0", "2.1.0"]
        );
    }

    #[test]
    fn test_links_not_taken_from_later_versions() {
        let dependencies: Dependencies = serde_json::from_str(
            r#"{
                "late-links": {
                    "metadata": { "maintainers": [] },
                    "versions": {
                        "1.0.0": { "size": 1 },
                        "1.1.0": { "size": 1, "links": { "repository": "https://github.com/x/later" } }
                    }
                }
            }"#,
        )
        .expect("valid payload");

        let stats = build_stats([&dependencies], &config(None, &["late-links"], false));
        let record = &stats.packages["late-links"];

        assert!(record.links.is_none());
        assert_eq!(record.repository_url(), None);
        assert_eq!(record.versions.iter().collect::<Vec<_>>(), vec!["1.0.0", "1.1.0"]);
    }

    #[test]
    fn test_packages_keep_payload_order() {
        let dependencies = payload(json!({
            "zeta": { "metadata": { "maintainers": [] }, "versions": { "1.0.0": {} } },
            "alpha": { "metadata": { "maintainers": [] }, "versions": { "1.0.0": {} } },
            "mid": { "metadata": { "maintainers": [] }, "versions": { "1.0.0": {} } }
        }));

        let stats = build_stats([&dependencies], &config(None, &[], false));

        let names: Vec<_> = stats.packages.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_show_flags_follows_config() {
        let config = ReportConfig {
            show_flags: false,
            ..ReportConfig::default()
        };
        let stats = build_stats(std::iter::empty(), &config);
        assert!(!stats.show_flags);
        assert_eq!(stats.packages_count.all, 0);
        assert_eq!(stats.size.all, "0 B");
    }
}
