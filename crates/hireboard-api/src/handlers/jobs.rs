//! Job posting handlers: listing, search, and recruiter management.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use hireboard_models::{ArtifactRef, Company, CompanyId, Job, JobId, JobType, Role, UserId};
use hireboard_store::{
    ApplicationRepository, CompanyRepository, JobFilters, JobPatch, JobRepository, PageRequest,
};

use crate::auth::{authorize, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// A posting denormalized with its company's name and logo.
#[derive(Debug, Serialize)]
pub struct JobListingView {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub salary: i64,
    pub job_type: JobType,
    pub positions: u32,
    pub company_id: CompanyId,
    pub created_by: UserId,
    pub created_at: String,

    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<ArtifactRef>,
}

impl JobListingView {
    fn new(job: Job, company: Option<&Company>) -> Self {
        Self {
            id: job.id,
            title: job.title,
            description: job.description,
            requirements: job.requirements,
            location: job.location,
            salary: job.salary,
            job_type: job.job_type,
            positions: job.positions,
            company_id: job.company_id,
            created_by: job.created_by,
            created_at: job.created_at.to_rfc3339(),
            company_name: company.map(|c| c.name.clone()).unwrap_or_default(),
            company_logo: company.and_then(|c| c.logo.clone()),
        }
    }
}

/// Batch-fetch the companies referenced by a set of postings.
async fn companies_for(state: &AppState, jobs: &[Job]) -> ApiResult<Vec<Company>> {
    let mut ids: Vec<CompanyId> = jobs.iter().map(|j| j.company_id.clone()).collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();

    Ok(CompanyRepository::new(state.store.clone())
        .get_many(&ids)
        .await?)
}

/// Read-only join: batch-fetch the postings' companies and map in code.
async fn denormalize(state: &AppState, jobs: Vec<Job>) -> ApiResult<Vec<JobListingView>> {
    let companies = companies_for(state, &jobs).await?;
    let by_id: HashMap<&str, &Company> =
        companies.iter().map(|c| (c.id.as_str(), c)).collect();

    Ok(jobs
        .into_iter()
        .map(|job| {
            let company = by_id.get(job.company_id.as_str()).copied();
            JobListingView::new(job, company)
        })
        .collect())
}

/// Raw query parameters. Parsed explicitly so malformed values become
/// `Validation` instead of a silent default.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub title: Option<String>,
    pub location: Option<String>,
    /// Comma-separated job types.
    pub job_type: Option<String>,
    pub min_salary: Option<String>,
    pub max_salary: Option<String>,
    /// RFC 3339 instant or `YYYY-MM-DD`.
    pub start_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn parse_u32(value: &str, name: &str) -> Result<u32, ApiError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ApiError::validation(format!("{} must be a positive integer", name)))
}

fn parse_i64(value: &str, name: &str) -> Result<i64, ApiError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::validation(format!("{} must be an integer", name)))
}

fn parse_start_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value.trim()) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
        }
    }
    Err(ApiError::validation(
        "start_date must be RFC 3339 or YYYY-MM-DD",
    ))
}

/// Translate raw parameters into filters plus a normalized page request.
fn parse_filters(params: &SearchParams) -> Result<(JobFilters, PageRequest), ApiError> {
    let mut filters = JobFilters::default();

    if let Some(title) = params.title.as_deref().map(str::trim) {
        if !title.is_empty() {
            filters.title = Some(title.to_string());
        }
    }
    if let Some(location) = params.location.as_deref().map(str::trim) {
        if !location.is_empty() {
            filters.location = Some(location.to_string());
        }
    }

    if let Some(raw) = params.job_type.as_deref() {
        for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let job_type = JobType::parse(part)
                .ok_or_else(|| ApiError::validation(format!("Unknown job type '{}'", part)))?;
            if !filters.job_types.contains(&job_type) {
                filters.job_types.push(job_type);
            }
        }
    }

    if let Some(raw) = params.min_salary.as_deref() {
        filters.min_salary = Some(parse_i64(raw, "min_salary")?);
    }
    if let Some(raw) = params.max_salary.as_deref() {
        filters.max_salary = Some(parse_i64(raw, "max_salary")?);
    }
    if let Some(raw) = params.start_date.as_deref() {
        filters.start_date = Some(parse_start_date(raw)?);
    }

    let page = params
        .page
        .as_deref()
        .map(|p| parse_u32(p, "page"))
        .transpose()?;
    let limit = params
        .limit
        .as_deref()
        .map(|l| parse_u32(l, "limit"))
        .transpose()?;

    Ok((filters, PageRequest::new(page, limit)))
}

async fn run_search(
    state: &AppState,
    filters: &JobFilters,
    request: PageRequest,
) -> ApiResult<Json<ApiResponse<Vec<JobListingView>>>> {
    let page = JobRepository::new(state.store.clone())
        .search(filters, request)
        .await?;

    let companies = companies_for(state, &page.items).await?;
    let by_id: HashMap<&str, &Company> =
        companies.iter().map(|c| (c.id.as_str(), c)).collect();

    let page = page.map(|job| {
        let company = by_id.get(job.company_id.as_str()).copied();
        JobListingView::new(job, company)
    });

    Ok(Json(ApiResponse::paged(page)))
}

/// Plain paged listing, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<ApiResponse<Vec<JobListingView>>>> {
    let page = params
        .page
        .as_deref()
        .map(|p| parse_u32(p, "page"))
        .transpose()?;
    let limit = params
        .limit
        .as_deref()
        .map(|l| parse_u32(l, "limit"))
        .transpose()?;

    run_search(&state, &JobFilters::default(), PageRequest::new(page, limit)).await
}

/// Filtered search. Same response shape as the plain listing.
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<ApiResponse<Vec<JobListingView>>>> {
    let (filters, request) = parse_filters(&params)?;
    run_search(&state, &filters, request).await
}

/// Get one posting with its company denormalized.
pub async fn job_details(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ApiResponse<JobListingView>>> {
    let job = JobRepository::new(state.store.clone())
        .get(&JobId::from_string(job_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let mut views = denormalize(&state, vec![job]).await?;
    let view = views.pop().ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(ApiResponse::ok(view)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[validate(length(min = 1, max = 200, message = "location must be 1-200 characters"))]
    pub location: String,

    #[validate(range(min = 0, message = "salary must not be negative"))]
    pub salary: i64,

    pub job_type: String,

    #[validate(range(min = 1, message = "positions must be at least 1"))]
    pub positions: u32,

    pub company_id: String,
}

/// Create a posting under a company the recruiter owns.
pub async fn create_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<JobListingView>>)> {
    authorize(user.role, &[Role::Recruiter])?;
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let job_type = JobType::parse(&request.job_type)
        .ok_or_else(|| ApiError::validation(format!("Unknown job type '{}'", request.job_type)))?;

    let company_id = CompanyId::from_string(request.company_id);
    let company = CompanyRepository::new(state.store.clone())
        .get(&company_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    if !user.owns_company(&company_id) {
        return Err(ApiError::forbidden("You do not own this company"));
    }

    let now = Utc::now();
    let job = Job {
        id: JobId::new(),
        title: request.title,
        description: request.description,
        requirements: request.requirements,
        location: request.location,
        salary: request.salary,
        job_type,
        positions: request.positions,
        company_id,
        created_by: user.id.clone(),
        created_at: now,
        updated_at: now,
    };

    JobRepository::new(state.store.clone()).create(&job).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Job posted",
            JobListingView::new(job, Some(&company)),
        )),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub location: Option<String>,
    pub salary: Option<i64>,
    pub job_type: Option<String>,
    pub positions: Option<u32>,
}

/// Update a posting. Owner only; existence is checked before ownership.
pub async fn update_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<String>,
    Json(request): Json<UpdateJobRequest>,
) -> ApiResult<Json<ApiResponse<JobListingView>>> {
    authorize(user.role, &[Role::Recruiter])?;

    let job_id = JobId::from_string(job_id);
    let jobs = JobRepository::new(state.store.clone());

    let job = jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !user.owns_company(&job.company_id) {
        return Err(ApiError::forbidden("You do not own this job posting"));
    }

    let job_type = request
        .job_type
        .as_deref()
        .map(|raw| {
            JobType::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("Unknown job type '{}'", raw)))
        })
        .transpose()?;

    if let Some(salary) = request.salary {
        if salary < 0 {
            return Err(ApiError::validation("salary must not be negative"));
        }
    }
    if request.positions == Some(0) {
        return Err(ApiError::validation("positions must be at least 1"));
    }

    let patch = JobPatch {
        title: request.title,
        description: request.description,
        requirements: request.requirements,
        location: request.location,
        salary: request.salary,
        job_type,
        positions: request.positions,
    };

    let updated = jobs
        .update(&job_id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let mut views = denormalize(&state, vec![updated]).await?;
    let view = views.pop().ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(ApiResponse::ok_with_message("Job updated", view)))
}

/// Delete a posting and cascade its applications. Owner only.
pub async fn delete_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    authorize(user.role, &[Role::Recruiter])?;

    let job_id = JobId::from_string(job_id);
    let jobs = JobRepository::new(state.store.clone());

    let job = jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !user.owns_company(&job.company_id) {
        return Err(ApiError::forbidden("You do not own this job posting"));
    }

    // Applications first, then the posting.
    ApplicationRepository::new(state.store.clone())
        .delete_by_job(&job_id)
        .await?;

    if !jobs.delete(&job_id).await? {
        return Err(ApiError::not_found("Job not found"));
    }

    Ok(Json(ApiResponse::message("Job deleted")))
}

/// All postings across the recruiter's companies, newest first.
pub async fn my_jobs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<JobListingView>>>> {
    authorize(user.role, &[Role::Recruiter])?;

    let jobs = JobRepository::new(state.store.clone())
        .list_by_companies(&user.company_ids)
        .await?;

    let views = denormalize(&state, jobs).await?;
    Ok(Json(ApiResponse::ok(views)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_params_mean_plain_listing_with_defaults() {
        let (filters, request) = parse_filters(&SearchParams::default()).unwrap();
        assert!(filters.is_empty());
        assert_eq!(request, PageRequest::new(None, None));
    }

    #[test]
    fn job_types_split_on_commas_and_dedupe() {
        let params = SearchParams {
            job_type: Some("Full-time, internship ,full time".to_string()),
            ..Default::default()
        };
        let (filters, _) = parse_filters(&params).unwrap();
        assert_eq!(filters.job_types, vec![JobType::FullTime, JobType::Internship]);
    }

    #[test]
    fn unknown_job_type_is_a_validation_error() {
        let params = SearchParams {
            job_type: Some("full-time,freelance".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            parse_filters(&params),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn malformed_numerics_are_validation_errors() {
        for (field, value) in [
            ("min_salary", "lots"),
            ("max_salary", "1e5"),
            ("page", "-1"),
            ("limit", "ten"),
        ] {
            let mut params = SearchParams::default();
            match field {
                "min_salary" => params.min_salary = Some(value.to_string()),
                "max_salary" => params.max_salary = Some(value.to_string()),
                "page" => params.page = Some(value.to_string()),
                _ => params.limit = Some(value.to_string()),
            }
            assert!(
                matches!(parse_filters(&params), Err(ApiError::Validation(_))),
                "{}={} should fail",
                field,
                value
            );
        }
    }

    #[test]
    fn start_date_accepts_rfc3339_and_plain_dates() {
        let params = SearchParams {
            start_date: Some("2024-06-01T12:30:00Z".to_string()),
            ..Default::default()
        };
        let (filters, _) = parse_filters(&params).unwrap();
        assert_eq!(
            filters.start_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap())
        );

        let params = SearchParams {
            start_date: Some("2024-06-01".to_string()),
            ..Default::default()
        };
        let (filters, _) = parse_filters(&params).unwrap();
        assert_eq!(
            filters.start_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );

        let params = SearchParams {
            start_date: Some("June 1st".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            parse_filters(&params),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn blank_text_filters_are_ignored() {
        let params = SearchParams {
            title: Some("  ".to_string()),
            location: Some("".to_string()),
            ..Default::default()
        };
        let (filters, _) = parse_filters(&params).unwrap();
        assert!(filters.is_empty());
    }
}
