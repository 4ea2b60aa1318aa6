//! User profile model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use crate::utils::errors::CampusError;

/// Application role; selects the dashboard and the permission set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Committee,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Teacher, Role::Committee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Committee => "committee",
        }
    }

    /// Heading shown above the role's dashboard
    pub fn dashboard_title(&self) -> &'static str {
        match self {
            Role::Student => "Student Dashboard",
            Role::Teacher => "Teacher Dashboard",
            Role::Committee => "Committee Dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "committee" => Ok(Role::Committee),
            other => Err(CampusError::InvalidInput(format!("Unknown role: {}", other))),
        }
    }
}

/// Role column as stored remotely; rows written by other clients may carry
/// a value this application does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleTag {
    Known(Role),
    Unknown(String),
}

impl RoleTag {
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleTag::Known(role) => Some(*role),
            RoleTag::Unknown(_) => None,
        }
    }
}

impl From<String> for RoleTag {
    fn from(raw: String) -> Self {
        match raw.parse::<Role>() {
            Ok(role) => RoleTag::Known(role),
            Err(_) => RoleTag::Unknown(raw),
        }
    }
}

impl From<RoleTag> for String {
    fn from(tag: RoleTag) -> Self {
        match tag {
            RoleTag::Known(role) => role.as_str().to_string(),
            RoleTag::Unknown(raw) => raw,
        }
    }
}

impl From<Role> for RoleTag {
    fn from(role: Role) -> Self {
        RoleTag::Known(role)
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleTag::Known(role) => fmt::Display::fmt(role, f),
            RoleTag::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Row of the `users` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: RoleTag,
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfileRequest {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bio.is_none()
            && self.phone.is_none()
            && self.branch.is_none()
            && self.year.is_none()
            && self.roll_number.is_none()
    }
}

/// Row of `student_profiles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: Uuid,
    pub roll_number: Option<String>,
    pub department: Option<String>,
    pub year_of_study: Option<i32>,
    #[serde(default)]
    pub semester: Option<i32>,
    #[serde(default)]
    pub cgpa: Option<f64>,
}

/// Row of `teacher_profiles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub id: Uuid,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    pub specialization: Option<String>,
    #[serde(default)]
    pub joining_date: Option<NaiveDate>,
}

/// Row of `committee_profiles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeProfile {
    pub id: Uuid,
    pub committee_name: Option<String>,
    pub position: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<String>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
}

/// Role-specific extension of a profile
#[derive(Debug, Clone, PartialEq)]
pub enum RoleDetails {
    Student(StudentProfile),
    Teacher(TeacherProfile),
    Committee(CommitteeProfile),
}

/// Profile joined with its role extension, as listed by the signup tracker
#[derive(Debug, Clone, PartialEq)]
pub struct DetailedProfile {
    pub profile: Profile,
    pub details: Option<RoleDetails>,
}
