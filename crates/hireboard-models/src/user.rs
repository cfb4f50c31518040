//! User account models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifact::ArtifactRef;
use crate::company::CompanyId;
use crate::job::JobId;

/// Unique identifier for a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Account role. One role per account; no hierarchy between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Job seeker: browses, searches, and applies to postings.
    Seeker,
    /// Recruiter: registers companies and manages postings/applicants.
    Recruiter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seeker => "seeker",
            Role::Recruiter => "recruiter",
        }
    }

    /// Parse from a request field. Returns `None` for anything outside the
    /// closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "seeker" => Some(Role::Seeker),
            "recruiter" => Some(Role::Recruiter),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Seeker-facing profile data embedded in the account document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    /// Stored resume; inherited by new applications when no upload is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ArtifactRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_original_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<ArtifactRef>,
}

/// A user account document.
///
/// `password_hash` is persisted to the store but must never reach an API
/// response; handlers build their own response views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(rename = "_id")]
    pub id: UserId,

    pub full_name: String,

    /// Unique across all accounts (enforced by a store index).
    pub email: String,

    pub phone: String,

    pub password_hash: String,

    pub role: Role,

    #[serde(default)]
    pub profile: Profile,

    /// Companies owned by this account (recruiters only in practice).
    #[serde(default)]
    pub company_ids: Vec<CompanyId>,

    #[serde(default)]
    pub saved_job_ids: Vec<JobId>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// True if the account owns the given company.
    pub fn owns_company(&self, company_id: &CompanyId) -> bool {
        self.company_ids.contains(company_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_closed() {
        assert_eq!(Role::parse("seeker"), Some(Role::Seeker));
        assert_eq!(Role::parse("Recruiter"), Some(Role::Recruiter));
        assert_eq!(Role::parse(" recruiter "), Some(Role::Recruiter));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Seeker).unwrap(), "\"seeker\"");
        let parsed: Role = serde_json::from_str("\"recruiter\"").unwrap();
        assert_eq!(parsed, Role::Recruiter);
    }
}
