use std::borrow::{Borrow, Cow};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use scholaris_core::{DomainError, validate_identifier};

/// Actions every module receives, in catalog order.
pub const CRUD_ACTIONS: [&str; 6] = ["view", "create", "edit", "update", "delete", "manage"];

/// Permission identifier of the form `"module.action"`.
///
/// Slugs order and compare as their text, so sets of slugs can be probed with a
/// plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionSlug(Cow<'static, str>);

impl PermissionSlug {
    /// Build a slug from already validated parts.
    pub fn of(module: &str, action: &str) -> Self {
        Self(Cow::Owned(format!("{module}.{action}")))
    }

    /// Parse and validate `"module.action"`.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let Some((module, action)) = value.split_once('.') else {
            return Err(DomainError::validation(format!(
                "permission '{value}' must have the form module.action"
            )));
        };
        validate_identifier("module", module)?;
        validate_identifier("action", action)?;
        Ok(Self(Cow::Owned(value.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn module(&self) -> &str {
        self.split().0
    }

    pub fn action(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        self.0.split_once('.').unwrap_or((&self.0, ""))
    }
}

impl core::fmt::Display for PermissionSlug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for PermissionSlug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for PermissionSlug {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PermissionSlug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PermissionSlug> for String {
    fn from(value: PermissionSlug) -> Self {
        value.0.into_owned()
    }
}

/// Whether a permission comes from the standard CRUD set or from the module's
/// own extension list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Crud,
    Specific,
}

impl Category {
    pub fn of_action(action: &str) -> Self {
        if CRUD_ACTIONS.contains(&action) {
            Category::Crud
        } else {
            Category::Specific
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crud => "crud",
            Category::Specific => "specific",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Catalog entry for a single permission (for display and audit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDefinition {
    pub slug: PermissionSlug,
    pub module: String,
    pub action: String,
    pub category: Category,
    pub display_name: String,
    pub description: String,
}

impl PermissionDefinition {
    pub(crate) fn new(module: &str, action: &str, module_description: &str) -> Self {
        let category = Category::of_action(action);
        let subject = if module_description.is_empty() {
            humanize(module).to_lowercase()
        } else {
            module_description.to_lowercase()
        };
        let description = match action {
            "view" => format!("View {subject}"),
            "create" => format!("Create {subject}"),
            "edit" => format!("Open {subject} for editing"),
            "update" => format!("Save changes to {subject}"),
            "delete" => format!("Delete {subject}"),
            "manage" => format!("Administer {subject}"),
            other => format!("{} ({subject})", humanize(other)),
        };

        Self {
            slug: PermissionSlug::of(module, action),
            module: module.to_string(),
            action: action.to_string(),
            category,
            display_name: format!("{} {}", humanize(action), humanize(module)),
            description,
        }
    }
}

/// `"view_grades"` -> `"View Grades"`.
fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_exposes_module_and_action() {
        let slug = PermissionSlug::parse("student.view_grades").unwrap();
        assert_eq!(slug.module(), "student");
        assert_eq!(slug.action(), "view_grades");
        assert_eq!(slug.to_string(), "student.view_grades");
    }

    #[test]
    fn slug_parse_rejects_malformed_text() {
        for bad in ["student", "student.", ".view", "student.*", "*", "a.b.c", "Student.view"] {
            assert!(PermissionSlug::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn slug_deserialization_validates() {
        let ok: PermissionSlug = serde_json::from_str("\"fee.collect\"").unwrap();
        assert_eq!(ok.as_str(), "fee.collect");
        assert!(serde_json::from_str::<PermissionSlug>("\"fee\"").is_err());
    }

    #[test]
    fn definition_carries_display_metadata() {
        let def = PermissionDefinition::new("student", "view_grades", "Student records");
        assert_eq!(def.category, Category::Specific);
        assert_eq!(def.display_name, "View Grades Student");
        assert_eq!(def.description, "View Grades (student records)");

        let crud = PermissionDefinition::new("fee", "delete", "");
        assert_eq!(crud.category, Category::Crud);
        assert_eq!(crud.description, "Delete fee");
    }
}
