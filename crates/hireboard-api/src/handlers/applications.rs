//! Application handlers: the apply workflow and review.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use hireboard_models::{
    Application, ApplicationId, ApplicationStatus, ArtifactRef, Company, Job, JobId, Role,
    UserAccount, UserId,
};
use hireboard_store::{
    ApplicationRepository, CompanyRepository, JobRepository, UserRepository,
};

use crate::auth::{authorize, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::uploads::{read_file_field, read_text_field, UploadedFile, RESUME_CONTENT_TYPES};

/// Posting summary embedded in a seeker's application list.
#[derive(Debug, Serialize)]
pub struct AppliedJobInfo {
    pub title: String,
    pub location: String,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<ArtifactRef>,
}

/// Applicant summary embedded in a recruiter's per-posting list.
#[derive(Debug, Serialize)]
pub struct ApplicantInfo {
    pub full_name: String,
    pub email: String,
}

/// Application view. The optional embeds are filled per endpoint.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub applicant_id: UserId,
    pub cover_letter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ArtifactRef>,
    pub status: ApplicationStatus,
    pub created_at: String,
    pub updated_at: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<AppliedJobInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant: Option<ApplicantInfo>,
}

impl ApplicationView {
    fn new(application: Application) -> Self {
        Self {
            id: application.id,
            job_id: application.job_id,
            applicant_id: application.applicant_id,
            cover_letter: application.cover_letter,
            resume: application.resume,
            status: application.status,
            created_at: application.created_at.to_rfc3339(),
            updated_at: application.updated_at.to_rfc3339(),
            job: None,
            applicant: None,
        }
    }

    fn with_job(mut self, job: Option<&Job>, company: Option<&Company>) -> Self {
        self.job = job.map(|j| AppliedJobInfo {
            title: j.title.clone(),
            location: j.location.clone(),
            company_name: company.map(|c| c.name.clone()).unwrap_or_default(),
            company_logo: company.and_then(|c| c.logo.clone()),
        });
        self
    }

    fn with_applicant(mut self, applicant: Option<&UserAccount>) -> Self {
        self.applicant = applicant.map(|u| ApplicantInfo {
            full_name: u.full_name.clone(),
            email: u.email.clone(),
        });
        self
    }
}

/// Resume resolution order: explicit upload wins over the stored profile
/// resume; absence of both is allowed. The chosen ref is copied onto the
/// application and does not track later profile changes.
fn resolve_resume(
    uploaded: Option<ArtifactRef>,
    profile_resume: Option<&ArtifactRef>,
) -> Option<ArtifactRef> {
    uploaded.or_else(|| profile_resume.cloned())
}

/// Parsed apply form. The resume file is buffered here, not uploaded; no
/// object-store write happens until every workflow precondition has passed,
/// so a rejected request cannot orphan an artifact.
#[derive(Debug, Default)]
struct ApplyForm {
    job_id: Option<JobId>,
    cover_letter: Option<String>,
    resume: Option<UploadedFile>,
}

impl ApplyForm {
    fn into_parts(self) -> Result<(JobId, String, Option<UploadedFile>), ApiError> {
        let job_id = self
            .job_id
            .ok_or_else(|| ApiError::validation("job_id is required"))?;
        let cover_letter = self
            .cover_letter
            .ok_or_else(|| ApiError::validation("cover_letter is required"))?;
        Ok((job_id, cover_letter, self.resume))
    }
}

/// Submit an application (multipart). Seekers only.
///
/// Text fields: `job_id`, `cover_letter`. File field: `resume` (PDF,
/// optional). One application per posting per applicant.
pub async fn apply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<ApplicationView>>)> {
    authorize(user.role, &[Role::Seeker])?;

    let mut form = ApplyForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("job_id") => {
                let raw = read_text_field(field).await?;
                if raw.trim().is_empty() {
                    return Err(ApiError::validation("job_id must not be empty"));
                }
                form.job_id = Some(JobId::from_string(raw.trim().to_string()));
            }
            Some("cover_letter") => form.cover_letter = Some(read_text_field(field).await?),
            Some("resume") => {
                form.resume = Some(read_file_field(field, RESUME_CONTENT_TYPES).await?);
            }
            _ => continue,
        }
    }

    let (job_id, cover_letter, resume_file) = form.into_parts()?;

    let jobs = JobRepository::new(state.store.clone());
    if jobs.get(&job_id).await?.is_none() {
        return Err(ApiError::not_found("Job not found"));
    }

    let applications = ApplicationRepository::new(state.store.clone());

    // Friendly pre-check; the unique (job_id, applicant_id) index still
    // rejects the losing concurrent submit, surfacing as Conflict.
    if applications.exists(&job_id, &user.id).await? {
        return Err(ApiError::conflict("You have already applied to this job"));
    }

    let uploaded = match resume_file {
        Some(file) => Some(
            state
                .storage
                .upload_artifact(file.bytes, "resumes", &file.content_type)
                .await?,
        ),
        None => None,
    };
    let resume = resolve_resume(uploaded, user.profile.resume.as_ref());

    let now = Utc::now();
    let application = Application {
        id: ApplicationId::new(),
        job_id,
        applicant_id: user.id.clone(),
        cover_letter,
        resume,
        status: ApplicationStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    applications.create(&application).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Application submitted",
            ApplicationView::new(application),
        )),
    ))
}

/// The seeker's own applications, newest first, with posting summaries.
pub async fn my_applications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<ApplicationView>>>> {
    authorize(user.role, &[Role::Seeker])?;

    let applications = ApplicationRepository::new(state.store.clone())
        .list_by_applicant(&user.id)
        .await?;

    let mut job_ids: Vec<JobId> = applications.iter().map(|a| a.job_id.clone()).collect();
    job_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    job_ids.dedup();

    let jobs = JobRepository::new(state.store.clone())
        .get_many(&job_ids)
        .await?;
    let jobs_by_id: HashMap<&str, &Job> = jobs.iter().map(|j| (j.id.as_str(), j)).collect();

    let mut company_ids: Vec<_> = jobs.iter().map(|j| j.company_id.clone()).collect();
    company_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    company_ids.dedup();

    let companies = CompanyRepository::new(state.store.clone())
        .get_many(&company_ids)
        .await?;
    let companies_by_id: HashMap<&str, &Company> =
        companies.iter().map(|c| (c.id.as_str(), c)).collect();

    let views = applications
        .into_iter()
        .map(|application| {
            let job = jobs_by_id.get(application.job_id.as_str()).copied();
            let company =
                job.and_then(|j| companies_by_id.get(j.company_id.as_str()).copied());
            ApplicationView::new(application).with_job(job, company)
        })
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

/// Applications received for one posting. Recruiter owner only.
pub async fn applications_for_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<ApplicationView>>>> {
    authorize(user.role, &[Role::Recruiter])?;

    let job_id = JobId::from_string(job_id);

    // Existence before ownership.
    let job = JobRepository::new(state.store.clone())
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !user.owns_company(&job.company_id) {
        return Err(ApiError::forbidden("You do not own this job posting"));
    }

    let applications = ApplicationRepository::new(state.store.clone())
        .list_by_job(&job_id)
        .await?;

    let mut applicant_ids: Vec<UserId> =
        applications.iter().map(|a| a.applicant_id.clone()).collect();
    applicant_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    applicant_ids.dedup();

    let applicants = UserRepository::new(state.store.clone())
        .get_many(&applicant_ids)
        .await?;
    let applicants_by_id: HashMap<&str, &UserAccount> =
        applicants.iter().map(|u| (u.id.as_str(), u)).collect();

    let views = applications
        .into_iter()
        .map(|application| {
            let applicant = applicants_by_id
                .get(application.applicant_id.as_str())
                .copied();
            ApplicationView::new(application).with_applicant(applicant)
        })
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

/// Get one application. Visible to its applicant or a recruiter owning the
/// posting.
pub async fn get_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(application_id): Path<String>,
) -> ApiResult<Json<ApiResponse<ApplicationView>>> {
    let application = ApplicationRepository::new(state.store.clone())
        .get(&ApplicationId::from_string(application_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    let is_applicant = application.applicant_id == user.id;
    let owns_posting = if user.role == Role::Recruiter {
        JobRepository::new(state.store.clone())
            .get(&application.job_id)
            .await?
            .map(|job| user.owns_company(&job.company_id))
            .unwrap_or(false)
    } else {
        false
    };

    if !is_applicant && !owns_posting {
        return Err(ApiError::forbidden(
            "You are not allowed to view this application",
        ));
    }

    Ok(Json(ApiResponse::ok(ApplicationView::new(application))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Set an application's review status. Recruiter owning the posting only;
/// the new status must be one of the three known states.
pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(application_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<ApplicationView>>> {
    let status = ApplicationStatus::parse(&request.status).ok_or_else(|| {
        ApiError::validation(format!("Unknown application status '{}'", request.status))
    })?;

    authorize(user.role, &[Role::Recruiter])?;

    let application_id = ApplicationId::from_string(application_id);
    let applications = ApplicationRepository::new(state.store.clone());

    let application = applications
        .get(&application_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    let job = JobRepository::new(state.store.clone())
        .get(&application.job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !user.owns_company(&job.company_id) {
        return Err(ApiError::forbidden("You do not own this job posting"));
    }

    let updated = applications
        .update_status(&application_id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    Ok(Json(ApiResponse::ok_with_message(
        "Application status updated",
        ApplicationView::new(updated),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploaded_resume_wins_over_profile_resume() {
        let uploaded = ArtifactRef::new("resumes/new", "https://cdn/resumes/new");
        let stored = ArtifactRef::new("resumes/old", "https://cdn/resumes/old");

        let chosen = resolve_resume(Some(uploaded.clone()), Some(&stored));
        assert_eq!(chosen, Some(uploaded));
    }

    #[test]
    fn profile_resume_is_the_fallback() {
        let stored = ArtifactRef::new("resumes/old", "https://cdn/resumes/old");
        assert_eq!(resolve_resume(None, Some(&stored)), Some(stored));
        assert_eq!(resolve_resume(None, None), None);
    }

    #[test]
    fn apply_form_rejects_missing_required_fields() {
        let err = ApplyForm {
            cover_letter: Some("hello".to_string()),
            ..ApplyForm::default()
        }
        .into_parts()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = ApplyForm {
            job_id: Some(JobId::from_string("j-1")),
            ..ApplyForm::default()
        }
        .into_parts()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn apply_form_hands_back_the_buffered_resume_unuploaded() {
        let form = ApplyForm {
            job_id: Some(JobId::from_string("j-1")),
            cover_letter: Some("hello".to_string()),
            resume: Some(UploadedFile {
                bytes: vec![0x25, 0x50, 0x44, 0x46],
                content_type: "application/pdf".to_string(),
                file_name: Some("cv.pdf".to_string()),
            }),
        };

        let (job_id, cover_letter, resume) = form.into_parts().unwrap();
        assert_eq!(job_id.as_str(), "j-1");
        assert_eq!(cover_letter, "hello");

        // Still raw bytes at this point; the object-store write comes after
        // the posting-existence and duplicate checks.
        let file = resume.unwrap();
        assert_eq!(file.bytes, vec![0x25, 0x50, 0x44, 0x46]);
        assert_eq!(file.content_type, "application/pdf");
    }

    #[test]
    fn view_embeds_are_absent_from_json_when_unset() {
        let now = Utc::now();
        let application = Application {
            id: ApplicationId::from_string("a-1"),
            job_id: JobId::from_string("j-1"),
            applicant_id: UserId::from_string("u-1"),
            cover_letter: "hello".to_string(),
            resume: None,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let rendered = serde_json::to_value(ApplicationView::new(application)).unwrap();
        assert!(rendered.get("job").is_none());
        assert!(rendered.get("applicant").is_none());
        assert_eq!(rendered["status"], "pending");
    }
}
