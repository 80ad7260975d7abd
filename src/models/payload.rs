//! Shapes of the dependency payloads produced by the external scanner.
//!
//! Only the fields the report consumes are modelled; everything else in the
//! scanner output is ignored during deserialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Package name to descriptor, in the order the scanner emitted them.
pub type Dependencies = IndexMap<String, Dependency>;

/// A full scanner result file. Older scanner versions wrote the bare
/// dependencies mapping instead.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ScannerOutput {
    Wrapped { dependencies: Dependencies },
    Bare(Dependencies),
}

impl ScannerOutput {
    pub fn into_dependencies(self) -> Dependencies {
        match self {
            ScannerOutput::Wrapped { dependencies } => dependencies,
            ScannerOutput::Bare(dependencies) => dependencies,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Dependency {
    #[serde(default)]
    pub metadata: DependencyMetadata,
    #[serde(default)]
    pub versions: IndexMap<String, VersionDescriptor>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct DependencyMetadata {
    #[serde(default)]
    pub maintainers: Vec<Person>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct VersionDescriptor {
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub composition: Composition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(
        rename = "uniqueLicenseIds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unique_license_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Person>,
    #[serde(default)]
    pub warnings: Vec<Warning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Composition {
    #[serde(default, alias = "required_builtin")]
    pub required_nodejs: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// License information is either a raw, unparsed string or the parsed result.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum License {
    Raw(String),
    Parsed {
        #[serde(rename = "uniqueLicenseIds", default)]
        unique_license_ids: Vec<String>,
    },
}

/// What a version contributes to the license histogram.
#[derive(Debug, PartialEq)]
pub enum LicenseContribution<'a> {
    Unknown,
    Ids(&'a [String]),
    Nothing,
}

impl VersionDescriptor {
    pub fn license_contribution(&self) -> LicenseContribution<'_> {
        match (&self.license, &self.unique_license_ids) {
            (Some(License::Raw(_)), _) => LicenseContribution::Unknown,
            (Some(License::Parsed { unique_license_ids }), _) => {
                LicenseContribution::Ids(unique_license_ids)
            }
            (None, Some(ids)) => LicenseContribution::Ids(ids),
            (None, None) => LicenseContribution::Nothing,
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn author_email(&self) -> Option<&str> {
        self.author
            .as_ref()
            .and_then(|author| author.email.as_deref())
            .filter(|email| !email.is_empty())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Links {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl Links {
    pub fn is_empty(&self) -> bool {
        self.npm.is_none() && self.homepage.is_none() && self.repository.is_none()
    }
}
