//! Built-in school module table and role table.

use crate::grant::Grant;
use crate::permissions::PermissionSlug;
use crate::roles::RoleId;
use crate::taxonomy::{ModuleSpec, RoleSpec, TaxonomyConfig};

pub const SUPER_ADMIN: &str = "super_admin";
pub const SCHOOL_ADMIN: &str = "school_admin";
pub const TEACHER: &str = "teacher";
pub const STUDENT: &str = "student";
pub const PARENT: &str = "parent";
pub const HR: &str = "hr";
pub const ACCOUNTANT: &str = "accountant";
pub const LIBRARIAN: &str = "librarian";

/// (module, description, extra actions)
const MODULES: &[(&str, &str, &[&str])] = &[
    ("student", "Student records", &["promote", "transfer", "view_grades", "manage_attendance"]),
    ("teacher", "Teacher profiles", &["assign_subject", "assign_class"]),
    ("guardian", "Guardian profiles", &["link_student"]),
    ("class", "Classes", &["assign_teacher"]),
    ("section", "Class sections", &["assign_students"]),
    ("subject", "Subjects", &["assign_teacher"]),
    ("attendance", "Attendance registers", &["mark", "report"]),
    ("exam", "Examinations", &["schedule", "publish_results"]),
    ("grade", "Grades and marks", &["publish", "export"]),
    ("timetable", "Timetables", &["generate", "publish"]),
    ("fee", "Fees and invoices", &["collect", "refund", "generate_invoice", "apply_discount"]),
    ("payroll", "Payroll runs", &["process", "approve"]),
    ("employee", "Employee records", &["onboard", "terminate"]),
    ("library", "Library catalogue", &["issue", "receive"]),
    ("transport", "Transport routes", &["assign_route"]),
    ("hostel", "Hostel rooms", &["allocate_room"]),
    ("notice", "Notices", &["publish"]),
    ("report", "Reports", &["export"]),
    (
        "user",
        "User accounts",
        &["change_role", "change_status", "reset_password", "resend_invitation", "impersonate"],
    ),
    ("role", "Roles", &["assign"]),
    ("organization", "Organizations", &["switch"]),
    ("setting", "Settings", &[]),
];

/// Modules a school administrator gets wholesale.
const SCHOOL_ADMIN_MODULES: &[&str] = &[
    "student", "teacher", "guardian", "class", "section", "subject", "attendance", "exam", "grade",
    "timetable", "fee", "payroll", "employee", "library", "transport", "hostel", "notice", "report",
    "user", "setting",
];

impl TaxonomyConfig {
    /// The school-management taxonomy shipped with the service.
    pub fn school_defaults() -> Self {
        let modules = MODULES
            .iter()
            .map(|(name, description, extras)| {
                ModuleSpec::new(*name, *description).with_extra_actions(extras.iter().copied())
            })
            .collect();

        let mut school_admin_grants: Vec<Grant> =
            SCHOOL_ADMIN_MODULES.iter().map(|m| Grant::module(*m)).collect();
        school_admin_grants.extend(exact(&[("role", "view")]));

        let roles = vec![
            role(SUPER_ADMIN, "Super Admin", "Platform operator across every school")
                .grants(vec![Grant::AllAccess])
                .nav(&MODULES.iter().map(|(m, _, _)| *m).collect::<Vec<_>>())
                .system(),
            role(SCHOOL_ADMIN, "School Admin", "Administers a single school")
                .grants(school_admin_grants)
                .nav(SCHOOL_ADMIN_MODULES)
                .system(),
            role(TEACHER, "Teacher", "Teaching staff")
                .grants(exact(&[
                    ("student", "view"),
                    ("student", "view_grades"),
                    ("class", "view"),
                    ("section", "view"),
                    ("subject", "view"),
                    ("attendance", "view"),
                    ("attendance", "mark"),
                    ("exam", "view"),
                    ("grade", "view"),
                    ("grade", "create"),
                    ("grade", "edit"),
                    ("grade", "update"),
                    ("timetable", "view"),
                    ("notice", "view"),
                ]))
                .nav(&["student", "class", "attendance", "exam", "grade", "timetable", "notice"]),
            role(STUDENT, "Student", "Enrolled student")
                .grants(exact(&[
                    ("attendance", "view"),
                    ("exam", "view"),
                    ("grade", "view"),
                    ("timetable", "view"),
                    ("fee", "view"),
                    ("library", "view"),
                    ("notice", "view"),
                ]))
                .nav(&["attendance", "exam", "grade", "timetable", "fee", "library", "notice"]),
            role(PARENT, "Parent", "Guardian of one or more students")
                .grants(exact(&[
                    ("student", "view"),
                    ("student", "view_grades"),
                    ("attendance", "view"),
                    ("grade", "view"),
                    ("timetable", "view"),
                    ("fee", "view"),
                    ("notice", "view"),
                ]))
                .nav(&["student", "attendance", "grade", "fee", "notice"]),
            role(HR, "HR", "Human resources")
                .grants(
                    [Grant::module("employee"), Grant::module("teacher")]
                        .into_iter()
                        .chain(exact(&[("payroll", "view"), ("notice", "view")]))
                        .collect(),
                )
                .nav(&["employee", "teacher", "payroll", "notice"]),
            role(ACCOUNTANT, "Accountant", "Finance office")
                .grants(
                    [Grant::module("fee"), Grant::module("payroll")]
                        .into_iter()
                        .chain(exact(&[("student", "view"), ("report", "view"), ("report", "export")]))
                        .collect(),
                )
                .nav(&["fee", "payroll", "report"]),
            role(LIBRARIAN, "Librarian", "Library desk")
                .grants(
                    [Grant::module("library")]
                        .into_iter()
                        .chain(exact(&[("student", "view"), ("notice", "view")]))
                        .collect(),
                )
                .nav(&["library", "student", "notice"]),
        ];

        Self {
            global_role: RoleId::new(SUPER_ADMIN),
            modules,
            roles,
        }
    }
}

fn exact(pairs: &[(&str, &str)]) -> Vec<Grant> {
    pairs
        .iter()
        .map(|(module, action)| Grant::exact(PermissionSlug::of(module, action)))
        .collect()
}

fn role(id: &'static str, display_name: &str, description: &str) -> RoleSpec {
    RoleSpec {
        id: RoleId::new(id),
        display_name: display_name.to_string(),
        description: Some(description.to_string()),
        grants: Vec::new(),
        accessible_modules: Vec::new(),
        system: false,
    }
}

impl RoleSpec {
    fn grants(mut self, grants: Vec<Grant>) -> Self {
        self.grants = grants;
        self
    }

    fn nav(mut self, modules: &[&str]) -> Self {
        self.accessible_modules = modules.iter().map(|m| m.to_string()).collect();
        self
    }

    fn system(mut self) -> Self {
        self.system = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::TaxonomyGenerator;

    #[test]
    fn school_defaults_validate() {
        let taxonomy = TaxonomyGenerator::generate(&TaxonomyConfig::school_defaults()).unwrap();
        assert_eq!(taxonomy.catalog().modules().count(), MODULES.len());
        let extras: usize = MODULES.iter().map(|(_, _, e)| e.len()).sum();
        assert_eq!(taxonomy.catalog().len(), MODULES.len() * 6 + extras);
    }

    #[test]
    fn only_admin_roles_are_system() {
        let taxonomy = TaxonomyGenerator::generate(&TaxonomyConfig::school_defaults()).unwrap();
        let system: Vec<&str> = taxonomy
            .roles()
            .filter(|r| r.is_system)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(system, vec![SCHOOL_ADMIN, SUPER_ADMIN]);
    }

    #[test]
    fn school_admin_is_confined_below_organization_management() {
        let registry = TaxonomyGenerator::generate(&TaxonomyConfig::school_defaults())
            .unwrap()
            .into_registry();
        let admin = registry.role(&RoleId::new(SCHOOL_ADMIN)).unwrap();
        assert!(admin.holds("student.promote"));
        assert!(admin.holds("user.impersonate"));
        assert!(admin.holds("role.view"));
        assert!(!admin.holds("role.assign"));
        assert!(!admin.holds("organization.switch"));
    }
}
