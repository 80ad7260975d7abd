use crate::config::ReportConfig;
use crate::models::flag::{FlagDescriptor, lookup_flag};
use crate::utils::split_package_with_org;

/// Classifies package names against the configured npm organization.
#[derive(Debug, Clone)]
pub struct OrganizationPolicy {
    prefix: Option<String>,
    requested: Vec<String>,
}

impl OrganizationPolicy {
    pub fn new(prefix: Option<&str>, requested: &[String]) -> Self {
        let prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);

        // Requested packages may be written with or without the scope.
        let requested = requested
            .iter()
            .map(|pkg| match &prefix {
                Some(prefix) => pkg
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_prefix('/'))
                    .unwrap_or(pkg)
                    .to_string(),
                None => pkg.clone(),
            })
            .collect();

        Self { prefix, requested }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.organization_prefix(), config.requested_packages())
    }

    /// Without an organization prefix every package is third-party.
    pub fn is_third_party(&self, name: &str) -> bool {
        match &self.prefix {
            None => true,
            Some(prefix) => !name
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/')),
        }
    }

    /// A package is given when the user asked for it explicitly, under the
    /// configured organization and no other.
    pub fn is_given(&self, name: &str) -> bool {
        let (org, short_name) = split_package_with_org(name);
        org == self.prefix.as_deref() && self.requested.iter().any(|pkg| pkg == short_name)
    }
}

/// Decides whether a package version lands in the transitive dependency set.
#[derive(Debug, Clone, Copy)]
pub struct TransitivePolicy {
    include_internal: bool,
}

impl TransitivePolicy {
    pub fn new(include_internal: bool) -> Self {
        Self { include_internal }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.include_transitive_internal)
    }

    pub fn should_record(&self, has_indirect_dependencies: bool, is_third_party: bool) -> bool {
        has_indirect_dependencies && (is_third_party || self.include_internal)
    }
}

/// Only flags of the manifest are reported.
pub fn wanted_flag(flag: &str) -> Option<&'static FlagDescriptor> {
    lookup_flag(flag)
}
