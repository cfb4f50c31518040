//! Job posting models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::company::CompanyId;
use crate::user::UserId;

/// Unique identifier for a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
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

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Employment type for a posting. Closed set; search matches with set
/// membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    #[serde(rename = "Contract")]
    Contract,
    #[serde(rename = "Internship")]
    Internship,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
        }
    }

    /// Tolerant parse for filter input: case-insensitive, accepts spaces or
    /// hyphens ("full time", "Full-Time", "FULLTIME").
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "fulltime" => Some(JobType::FullTime),
            "parttime" => Some(JobType::PartTime),
            "contract" => Some(JobType::Contract),
            "internship" => Some(JobType::Internship),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job posting document. Owned by exactly one company.
///
/// Applications are not denormalized here; they are queried from the
/// `applications` collection by `job_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: JobId,

    pub title: String,

    pub description: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    pub location: String,

    /// Annual salary, inclusive bound for range filtering.
    pub salary: i64,

    pub job_type: JobType,

    /// Number of open positions.
    pub positions: u32,

    pub company_id: CompanyId,

    pub created_by: UserId,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_type_parse_is_tolerant() {
        assert_eq!(JobType::parse("Full-time"), Some(JobType::FullTime));
        assert_eq!(JobType::parse("full time"), Some(JobType::FullTime));
        assert_eq!(JobType::parse("FULLTIME"), Some(JobType::FullTime));
        assert_eq!(JobType::parse("Part Time"), Some(JobType::PartTime));
        assert_eq!(JobType::parse(" internship "), Some(JobType::Internship));
        assert_eq!(JobType::parse("freelance"), None);
        assert_eq!(JobType::parse(""), None);
    }

    #[test]
    fn job_type_serde_round_trip() {
        let json = serde_json::to_string(&JobType::FullTime).unwrap();
        assert_eq!(json, "\"Full-time\"");
        let back: JobType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, JobType::FullTime);
    }
}
