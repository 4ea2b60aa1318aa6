//! Role extension profile repository

use uuid::Uuid;
use crate::models::user::{CommitteeProfile, Profile, Role, RoleDetails, StudentProfile, TeacherProfile};
use crate::store::connection::RemoteClient;
use crate::store::query::RowQuery;
use crate::utils::errors::Result;

#[derive(Clone, Debug)]
pub struct RoleProfileRepository {
    client: RemoteClient,
}

impl RoleProfileRepository {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    pub async fn find_student(&self, id: Uuid) -> Result<Option<StudentProfile>> {
        self.client.select_one(RowQuery::table("student_profiles").eq("id", id)).await
    }

    pub async fn find_teacher(&self, id: Uuid) -> Result<Option<TeacherProfile>> {
        self.client.select_one(RowQuery::table("teacher_profiles").eq("id", id)).await
    }

    pub async fn find_committee(&self, id: Uuid) -> Result<Option<CommitteeProfile>> {
        self.client.select_one(RowQuery::table("committee_profiles").eq("id", id)).await
    }

    /// Extension row matching the profile's role; unknown roles have none
    pub async fn details_for(&self, profile: &Profile) -> Result<Option<RoleDetails>> {
        let details = match profile.role.role() {
            Some(Role::Student) => self.find_student(profile.id).await?.map(RoleDetails::Student),
            Some(Role::Teacher) => self.find_teacher(profile.id).await?.map(RoleDetails::Teacher),
            Some(Role::Committee) => self.find_committee(profile.id).await?.map(RoleDetails::Committee),
            None => None,
        };
        Ok(details)
    }
}
