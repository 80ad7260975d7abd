use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDescriptor {
    pub emoji: &'static str,
    pub title: &'static str,
    pub tooltip_description: &'static str,
}

const fn flag(
    emoji: &'static str,
    title: &'static str,
    tooltip_description: &'static str,
) -> FlagDescriptor {
    FlagDescriptor {
        emoji,
        title,
        tooltip_description,
    }
}

pub const INDIRECT_DEPENDENCIES_FLAG: &str = "hasIndirectDependencies";

/// Scanner flags worth reporting. Anything else is noise and is dropped.
pub const FLAG_MANIFEST: &[FlagDescriptor] = &[
    flag("🌍", "hasExternalCapacity", "The package uses at least one Node.js core dependency capable to establish communication outside of localhost"),
    flag("🚧", "hasWarnings", "The AST analysis has detected warnings (suspect import, unsafe regex ..)"),
    flag("🐲", "hasNativeCode", "The package uses and runs C++ or Rust N-API code"),
    flag("💎", "hasCustomResolver", "The package has dependencies who do not resolve on a registry (git, file, ssh etc..)"),
    flag("📜", "hasNoLicense", "The package does not have a license"),
    flag("📚", "hasMultipleLicenses", "The package has licenses in multiple locations (files or manifest)"),
    flag("🔬", "hasMinifiedCode", "The package has minified and/or uglified files"),
    flag("⛔️", "isDeprecated", "The package has been deprecated on NPM"),
    flag("👥", "hasManyPublishers", "The package has several publishers"),
    flag("📦", "hasScript", "The package has `post` and/or `pre` (un)install npm script"),
    flag("🌲", "hasIndirectDependencies", "The package has indirect dependencies"),
    flag("☁️", "isGit", "The package (project) is a git repository"),
    flag("🚨", "hasVulnerabilities", "The package has one or many vulnerabilities"),
    flag("👀", "hasMissingOrUnusedDependency", "A dependency is missing in package.json or a dependency is installed but never used"),
    flag("💀", "isDead", "The dependency has not received update from at least one year"),
    flag("⚔️", "hasBannedFile", "The project has at least one sensitive file"),
    flag("⌚️", "isOutdated", "The current package version is not equal to the package latest version"),
    flag("🎭", "hasDuplicate", "The package is also used somewhere else in the dependency tree but with a different version"),
];

pub fn lookup_flag(name: &str) -> Option<&'static FlagDescriptor> {
    FLAG_MANIFEST.iter().find(|f| f.title == name)
}
