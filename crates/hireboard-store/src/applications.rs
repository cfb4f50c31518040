//! Application repository.

use bson::doc;
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use tracing::info;

use hireboard_models::{Application, ApplicationId, ApplicationStatus, JobId, UserId};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};

/// Repository for application documents.
pub struct ApplicationRepository {
    client: StoreClient,
}

impl ApplicationRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Insert a new application. The unique (job_id, applicant_id) index
    /// rejects a second application for the same posting, so a concurrent
    /// double-submit surfaces as [`StoreError::Duplicate`].
    pub async fn create(&self, application: &Application) -> StoreResult<()> {
        self.client
            .applications()
            .insert_one(application)
            .await
            .map_err(|e| StoreError::from_write(e, "already applied to this job"))?;
        info!(
            "Recorded application {} for job {}",
            application.id, application.job_id
        );
        Ok(())
    }

    pub async fn get(&self, id: &ApplicationId) -> StoreResult<Option<Application>> {
        let application = self
            .client
            .applications()
            .find_one(doc! { "_id": id.as_str() })
            .await?;
        Ok(application)
    }

    /// True when the applicant has already applied to the posting.
    pub async fn exists(&self, job_id: &JobId, applicant_id: &UserId) -> StoreResult<bool> {
        let found = self
            .client
            .applications()
            .find_one(doc! {
                "job_id": job_id.as_str(),
                "applicant_id": applicant_id.as_str(),
            })
            .await?;
        Ok(found.is_some())
    }

    /// All applications submitted by one applicant, newest first.
    pub async fn list_by_applicant(&self, applicant_id: &UserId) -> StoreResult<Vec<Application>> {
        let cursor = self
            .client
            .applications()
            .find(doc! { "applicant_id": applicant_id.as_str() })
            .sort(doc! { "created_at": -1, "_id": -1 })
            .await?;
        let applications = cursor.try_collect().await?;
        Ok(applications)
    }

    /// All applications received for one posting, newest first.
    pub async fn list_by_job(&self, job_id: &JobId) -> StoreResult<Vec<Application>> {
        let cursor = self
            .client
            .applications()
            .find(doc! { "job_id": job_id.as_str() })
            .sort(doc! { "created_at": -1, "_id": -1 })
            .await?;
        let applications = cursor.try_collect().await?;
        Ok(applications)
    }

    /// Set the review status, returning the updated application.
    pub async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> StoreResult<Option<Application>> {
        let updated = self
            .client
            .applications()
            .find_one_and_update(
                doc! { "_id": id.as_str() },
                doc! { "$set": {
                    "status": status.as_str(),
                    "updated_at": bson::DateTime::from_chrono(chrono::Utc::now()),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    /// Remove every application for a posting. Used when the posting itself
    /// is deleted; the posting must be removed after this cascade.
    pub async fn delete_by_job(&self, job_id: &JobId) -> StoreResult<u64> {
        let result = self
            .client
            .applications()
            .delete_many(doc! { "job_id": job_id.as_str() })
            .await?;
        if result.deleted_count > 0 {
            info!(
                "Cascade removed {} application(s) for job {}",
                result.deleted_count, job_id
            );
        }
        Ok(result.deleted_count)
    }
}
