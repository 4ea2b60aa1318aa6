//! Signup tracker: every profile with its role details

use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use crate::middleware::{Permission, RoleGuard};
use crate::models::{DetailedProfile, Profile, Role, RoleDetails};
use crate::store::StoreService;
use crate::utils::errors::{CampusError, Result};
use crate::utils::helpers::or_not_provided;
use super::scope::ViewScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerTab {
    #[default]
    All,
    Only(Role),
}

impl TrackerTab {
    pub const ALL: [TrackerTab; 4] = [
        TrackerTab::All,
        TrackerTab::Only(Role::Student),
        TrackerTab::Only(Role::Teacher),
        TrackerTab::Only(Role::Committee),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TrackerTab::All => "All Users",
            TrackerTab::Only(Role::Student) => "Students",
            TrackerTab::Only(Role::Teacher) => "Teachers",
            TrackerTab::Only(Role::Committee) => "Committee",
        }
    }

    pub fn matches(&self, profile: &Profile) -> bool {
        match self {
            TrackerTab::All => true,
            TrackerTab::Only(role) => profile.role.role() == Some(*role),
        }
    }

    pub fn empty_message(&self) -> String {
        match self {
            TrackerTab::All => "No users found.".to_string(),
            TrackerTab::Only(role) => format!("No {} users found.", role),
        }
    }
}

impl fmt::Display for TrackerTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerTab::All => f.write_str("all"),
            TrackerTab::Only(role) => fmt::Display::fmt(role, f),
        }
    }
}

impl FromStr for TrackerTab {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(TrackerTab::All)
        } else {
            s.parse::<Role>().map(TrackerTab::Only)
        }
    }
}

/// Human-readable lines for a profile's role extension
pub fn detail_lines(details: &RoleDetails) -> Vec<String> {
    match details {
        RoleDetails::Student(student) => vec![
            format!("Roll Number: {}", or_not_provided(student.roll_number.as_deref())),
            format!("Department: {}", or_not_provided(student.department.as_deref())),
            format!("Year: {}", or_not_provided(student.year_of_study)),
        ],
        RoleDetails::Teacher(teacher) => vec![
            format!("Employee ID: {}", or_not_provided(teacher.employee_id.as_deref())),
            format!("Department: {}", or_not_provided(teacher.department.as_deref())),
            format!("Specialization: {}", or_not_provided(teacher.specialization.as_deref())),
        ],
        RoleDetails::Committee(committee) => vec![
            format!("Committee: {}", or_not_provided(committee.committee_name.as_deref())),
            format!("Position: {}", or_not_provided(committee.position.as_deref())),
            format!(
                "Term: {}",
                match (committee.term_start, committee.term_end) {
                    (Some(start), Some(end)) => format!("{} to {}", start, end),
                    (Some(start), None) => format!("{} to present", start),
                    _ => "Not provided".to_string(),
                }
            ),
        ],
    }
}

#[derive(Debug)]
pub struct SignupTracker {
    store: StoreService,
    scope: ViewScope,
    users: Vec<DetailedProfile>,
    error: Option<String>,
    tab: TrackerTab,
}

impl SignupTracker {
    pub fn new(store: StoreService, viewer: &Profile, timeout: Duration) -> Result<Self> {
        RoleGuard::new(viewer).require(Permission::ViewSignupTracker)?;
        Ok(Self {
            store,
            scope: ViewScope::new(timeout),
            users: Vec::new(),
            error: None,
            tab: TrackerTab::All,
        })
    }

    /// Load all profiles; a failed listing is kept as an error message
    pub async fn load(&mut self) -> Result<()> {
        match self.scope.run(self.store.fetch_detailed_profiles()).await {
            Ok(users) => {
                info!(count = users.len(), "Signup tracker loaded");
                self.users = users;
                self.error = None;
            }
            Err(CampusError::Cancelled) => return Err(CampusError::Cancelled),
            Err(e) => {
                let message = e.user_message();
                self.error = Some(if message.is_empty() { "Failed to fetch profiles".to_string() } else { message });
            }
        }
        Ok(())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tab(&self) -> TrackerTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: TrackerTab) {
        self.tab = tab;
    }

    pub fn users(&self) -> &[DetailedProfile] {
        &self.users
    }

    pub fn filtered(&self) -> Vec<&DetailedProfile> {
        self.users.iter().filter(|u| self.tab.matches(&u.profile)).collect()
    }

    pub fn close(&self) {
        self.scope.close();
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "User Registration Tracker");
        if let Some(error) = &self.error {
            let _ = writeln!(out, "! {}", error);
        }
        let tabs: Vec<String> = TrackerTab::ALL
            .iter()
            .map(|tab| if *tab == self.tab { format!("[{}]", tab.label()) } else { tab.label().to_string() })
            .collect();
        let _ = writeln!(out, "{}\n", tabs.join("  "));

        let users = self.filtered();
        if users.is_empty() {
            let _ = writeln!(out, "{}", self.tab.empty_message());
            return out;
        }

        for user in users {
            let profile = &user.profile;
            let registered = profile
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let _ = writeln!(
                out,
                "{} | {} | {} | registered {}",
                profile.display_name(),
                profile.email,
                profile.role,
                registered
            );
            if let Some(details) = &user.details {
                for line in detail_lines(details) {
                    let _ = writeln!(out, "    {}", line);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;
    use crate::models::{CommitteeProfile, StudentProfile};

    #[test]
    fn test_tab_parsing_and_empty_message() {
        assert_eq!("all".parse::<TrackerTab>().unwrap(), TrackerTab::All);
        assert_eq!("Teacher".parse::<TrackerTab>().unwrap(), TrackerTab::Only(Role::Teacher));
        assert!("staff".parse::<TrackerTab>().is_err());

        assert_eq!(TrackerTab::All.empty_message(), "No users found.");
        assert_eq!(TrackerTab::Only(Role::Committee).empty_message(), "No committee users found.");
    }

    #[test]
    fn test_detail_lines_fill_missing_values() {
        let student = RoleDetails::Student(StudentProfile {
            id: Uuid::nil(),
            roll_number: Some("CS-042".to_string()),
            department: None,
            year_of_study: Some(2),
            semester: None,
            cgpa: None,
        });
        assert_eq!(
            detail_lines(&student),
            vec!["Roll Number: CS-042", "Department: Not provided", "Year: 2"]
        );

        let committee = RoleDetails::Committee(CommitteeProfile {
            id: Uuid::nil(),
            committee_name: Some("Cultural".to_string()),
            position: None,
            responsibilities: None,
            term_start: NaiveDate::from_ymd_opt(2024, 6, 1),
            term_end: NaiveDate::from_ymd_opt(2025, 5, 31),
        });
        assert_eq!(detail_lines(&committee)[2], "Term: 2024-06-01 to 2025-05-31");
    }
}
