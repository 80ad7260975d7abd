use crate::models::flag::FlagDescriptor;
use crate::models::payload::Links;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Insertion-ordered occurrence counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Histogram(IndexMap<String, u64>);

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Histogram with the given buckets pre-seeded at zero.
    pub fn with_buckets(buckets: &[&str]) -> Self {
        Self(buckets.iter().map(|b| (b.to_string(), 0)).collect())
    }

    pub fn increment(&mut self, key: &str) {
        match self.0.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.0.insert(key.to_string(), 1);
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<u64> {
        self.0.values().copied().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SizeSummary {
    pub all: String,
    pub internal: String,
    pub external: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PackagesCount {
    pub all: usize,
    pub internal: usize,
    pub external: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransitiveDependency {
    pub links: Option<Links>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDependency {
    pub visualizer_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DependencyStats {
    pub transitive: IndexMap<String, TransitiveDependency>,
    pub node: IndexMap<String, NodeDependency>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub has_indirect_dependencies: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub is_third: bool,
    pub versions: IndexSet<String>,
    pub full_name: String,
    pub is_given: bool,
    pub flags: IndexMap<String, FlagDescriptor>,
    #[serde(flatten)]
    pub version_info: IndexMap<String, VersionInfo>,
    pub links: Option<Links>,
}

impl PackageRecord {
    pub fn new(full_name: &str, is_third: bool, is_given: bool) -> Self {
        Self {
            is_third,
            versions: IndexSet::new(),
            full_name: full_name.to_string(),
            is_given,
            flags: IndexMap::new(),
            version_info: IndexMap::new(),
            links: None,
        }
    }

    pub fn repository_url(&self) -> Option<&str> {
        self.links.as_ref().and_then(|l| l.repository.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub score: f64,
    pub color: &'static str,
    pub visualizer_url: String,
}

/// Aggregated statistics for one set of scanned packages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub size: SizeSummary,
    pub deps: DependencyStats,
    pub licenses: Histogram,
    pub flags: Histogram,
    pub extensions: Histogram,
    pub warnings: Histogram,
    pub authors: Histogram,
    pub packages: IndexMap<String, PackageRecord>,
    #[serde(rename = "packages_count")]
    pub packages_count: PackagesCount,
    pub scorecards: IndexMap<String, Scorecard>,
    pub show_flags: bool,
}

impl ReportStats {
    pub fn new(show_flags: bool) -> Self {
        Self {
            size: SizeSummary::default(),
            deps: DependencyStats::default(),
            licenses: Histogram::with_buckets(&["Unknown"]),
            flags: Histogram::new(),
            extensions: Histogram::new(),
            warnings: Histogram::new(),
            authors: Histogram::new(),
            packages: IndexMap::new(),
            packages_count: PackagesCount::default(),
            scorecards: IndexMap::new(),
            show_flags,
        }
    }

    pub fn given_packages(&self) -> impl Iterator<Item = &PackageRecord> {
        self.packages.values().filter(|pkg| pkg.is_given)
    }
}
