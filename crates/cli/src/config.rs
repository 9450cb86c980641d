//! Taxonomy file loading.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use scholaris_auth::{PolicyConfig, TaxonomyConfig};

/// On-disk layout: the taxonomy tables at top level plus an optional
/// `[policy]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(flatten)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl FileConfig {
    pub fn school_defaults() -> Self {
        Self {
            taxonomy: TaxonomyConfig::school_defaults(),
            policy: PolicyConfig::default(),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse taxonomy file")
    }
}

/// Load the taxonomy from `path`, or the built-in school defaults.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        tracing::debug!("no taxonomy file given, using school defaults");
        return Ok(FileConfig::school_defaults());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = FileConfig::parse(&text).with_context(|| format!("in {}", path.display()))?;
    tracing::info!(path = %path.display(), modules = config.taxonomy.modules.len(), "loaded taxonomy file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholaris_auth::{Grant, PermissionSlug, RoleId, TaxonomyGenerator};

    const SAMPLE: &str = r#"
global_role = "owner"

[[modules]]
name = "student"
description = "Student records"
extra_actions = ["promote"]

[[modules]]
name = "fee"

[[modules]]
name = "user"
extra_actions = ["change_role", "change_status", "reset_password", "resend_invitation", "impersonate"]

[[roles]]
id = "owner"
display_name = "Owner"
grants = ["*"]
system = true

[[roles]]
id = "bursar"
display_name = "Bursar"
grants = ["fee.*", "student.view"]
accessible_modules = ["fee", "student"]

[policy]
allow_global_peer_deletion = true
resend_invitation_roles = ["bursar"]
"#;

    #[test]
    fn parses_tables_and_policy() {
        let config = FileConfig::parse(SAMPLE).unwrap();

        assert_eq!(config.taxonomy.global_role, RoleId::new("owner"));
        assert_eq!(config.taxonomy.modules.len(), 3);
        assert_eq!(config.taxonomy.modules[0].extra_actions, vec!["promote".to_string()]);
        assert!(config.taxonomy.modules[1].description.is_empty());

        let bursar = &config.taxonomy.roles[1];
        assert_eq!(bursar.grants, vec![Grant::module("fee"), Grant::exact(PermissionSlug::of("student", "view"))]);
        assert!(!bursar.system);

        assert!(config.policy.allow_global_peer_deletion);
        assert!(config.policy.resend_invitation_roles.contains(&RoleId::new("bursar")));
        assert_eq!(config.policy.target_module, "user");
    }

    #[test]
    fn parsed_file_generates_a_taxonomy() {
        let config = FileConfig::parse(SAMPLE).unwrap();
        let taxonomy = TaxonomyGenerator::generate(&config.taxonomy).unwrap();

        assert!(taxonomy.catalog().exists("student.promote"));
        assert!(taxonomy.catalog().exists("fee.manage"));
        assert_eq!(taxonomy.roles().count(), 2);
        assert!(crate::commands::Workspace::build(&config).is_ok());
    }

    #[test]
    fn policy_table_is_optional() {
        let text = r#"
global_role = "owner"

[[modules]]
name = "fee"

[[roles]]
id = "owner"
display_name = "Owner"
grants = ["*"]
system = true
"#;
        let config = FileConfig::parse(text).unwrap();
        assert_eq!(config.policy, PolicyConfig::default());
    }

    #[test]
    fn malformed_grant_is_rejected() {
        let text = r#"
global_role = "owner"

[[modules]]
name = "fee"

[[roles]]
id = "owner"
display_name = "Owner"
grants = ["fee."]
"#;
        assert!(FileConfig::parse(text).is_err());
    }

    #[test]
    fn missing_path_falls_back_to_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.taxonomy, TaxonomyConfig::school_defaults());
    }
}
