//! Application models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::artifact::ArtifactRef;
use crate::job::JobId;
use crate::user::UserId;

/// Unique identifier for an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
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

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ApplicationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApplicationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Application status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Parse a status update. Anything outside the three-state set is
    /// rejected at the boundary.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(ApplicationStatus::Pending),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A seeker's submission against a posting.
///
/// Unique on `(job_id, applicant_id)`, enforced by a compound store index.
/// The resume ref is copied at creation time and does not track later
/// profile changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: ApplicationId,

    pub job_id: JobId,

    pub applicant_id: UserId,

    pub cover_letter: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ArtifactRef>,

    #[serde(default)]
    pub status: ApplicationStatus,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_closed() {
        assert_eq!(
            ApplicationStatus::parse("pending"),
            Some(ApplicationStatus::Pending)
        );
        assert_eq!(
            ApplicationStatus::parse("Accepted"),
            Some(ApplicationStatus::Accepted)
        );
        assert_eq!(
            ApplicationStatus::parse(" rejected "),
            Some(ApplicationStatus::Rejected)
        );
        assert_eq!(ApplicationStatus::parse("shortlisted"), None);
        assert_eq!(ApplicationStatus::parse(""), None);
    }

    #[test]
    fn status_defaults_to_pending() {
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::Pending);
    }
}
