//! Company handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::Validate;

use hireboard_models::{ArtifactRef, Company, CompanyId, Role, UserId};
use hireboard_store::{CompanyPatch, CompanyRepository, UserRepository};

use crate::auth::{authorize, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::uploads::{read_file_field, read_text_field, IMAGE_CONTENT_TYPES};

/// Company view returned to API clients.
#[derive(Debug, Serialize)]
pub struct CompanyView {
    pub id: CompanyId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<ArtifactRef>,
    pub owner_id: UserId,
    pub created_at: String,
}

impl From<&Company> for CompanyView {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id.clone(),
            name: company.name.clone(),
            description: company.description.clone(),
            website: company.website.clone(),
            location: company.location.clone(),
            logo: company.logo.clone(),
            owner_id: company.owner_id.clone(),
            created_at: company.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCompanyRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
}

/// Register a company. Recruiters only; names are globally unique.
pub async fn register_company(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<RegisterCompanyRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CompanyView>>)> {
    authorize(user.role, &[Role::Recruiter])?;
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let companies = CompanyRepository::new(state.store.clone());

    // Friendly pre-check; the unique index still rejects a concurrent racer.
    if companies.find_by_name(request.name.trim()).await?.is_some() {
        return Err(ApiError::conflict("Company name already registered"));
    }

    let now = Utc::now();
    let company = Company {
        id: CompanyId::new(),
        name: request.name.trim().to_string(),
        description: request.description,
        website: request.website,
        location: request.location,
        logo: None,
        owner_id: user.id.clone(),
        created_at: now,
        updated_at: now,
    };

    companies.create(&company).await?;

    // Ownership is a second write. If it fails, undo the insert so the
    // unique name is not left reserved by a company nobody can manage.
    if let Err(e) = UserRepository::new(state.store.clone())
        .push_company(&user.id, &company.id)
        .await
    {
        if let Err(rollback) = companies.delete(&company.id).await {
            warn!(
                "Failed to roll back company {} after ownership write error: {}",
                company.id, rollback
            );
        }
        return Err(e.into());
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Company registered",
            CompanyView::from(&company),
        )),
    ))
}

/// List the authenticated user's companies.
pub async fn my_companies(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<CompanyView>>>> {
    let companies = CompanyRepository::new(state.store.clone())
        .list_by_owner(&user.id)
        .await?;

    let views = companies.iter().map(CompanyView::from).collect();
    Ok(Json(ApiResponse::ok(views)))
}

/// Get one company by ID. Visible to any authenticated user.
pub async fn get_company(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(company_id): Path<String>,
) -> ApiResult<Json<ApiResponse<CompanyView>>> {
    let company = CompanyRepository::new(state.store.clone())
        .get(&CompanyId::from_string(company_id))
        .await?
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    Ok(Json(ApiResponse::ok(CompanyView::from(&company))))
}

/// Update a company (multipart). Owner only.
///
/// Text fields: `name`, `description`, `website`, `location`. File field:
/// `logo` (image); replacing the logo releases the previous object.
pub async fn update_company(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(company_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<ApiResponse<CompanyView>>> {
    authorize(user.role, &[Role::Recruiter])?;

    let company_id = CompanyId::from_string(company_id);
    let companies = CompanyRepository::new(state.store.clone());

    // Existence before ownership.
    let company = companies
        .get(&company_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    if !user.owns_company(&company_id) {
        return Err(ApiError::forbidden("You do not own this company"));
    }

    let mut patch = CompanyPatch::default();
    let mut replaced_logo: Option<ArtifactRef> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("name") => {
                let name = read_text_field(field).await?.trim().to_string();
                if name.is_empty() {
                    return Err(ApiError::validation("name must not be empty"));
                }
                patch.name = Some(name);
            }
            Some("description") => patch.description = Some(read_text_field(field).await?),
            Some("website") => patch.website = Some(read_text_field(field).await?),
            Some("location") => patch.location = Some(read_text_field(field).await?),
            Some("logo") => {
                let file = read_file_field(field, IMAGE_CONTENT_TYPES).await?;
                let artifact = state
                    .storage
                    .upload_artifact(file.bytes, "logos", &file.content_type)
                    .await?;
                replaced_logo = company.logo.clone();
                patch.logo = Some(artifact);
            }
            _ => continue,
        }
    }

    let updated = companies
        .update(&company_id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    if let Some(old) = replaced_logo {
        if let Err(e) = state.storage.delete_object(&old.public_id).await {
            warn!("Failed to release replaced logo {}: {}", old.public_id, e);
        }
    }

    Ok(Json(ApiResponse::ok_with_message(
        "Company updated",
        CompanyView::from(&updated),
    )))
}
