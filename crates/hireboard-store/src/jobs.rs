//! Job posting repository.

use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use tracing::info;

use hireboard_models::{CompanyId, Job, JobId, JobType};

use crate::client::StoreClient;
use crate::error::StoreResult;
use crate::query::{JobFilters, Page, PageRequest};

/// Partial posting update. Only supplied fields are written.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub location: Option<String>,
    pub salary: Option<i64>,
    pub job_type: Option<JobType>,
    pub positions: Option<u32>,
}

impl JobPatch {
    fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(ref v) = self.title {
            set.insert("title", v);
        }
        if let Some(ref v) = self.description {
            set.insert("description", v);
        }
        if let Some(ref v) = self.requirements {
            set.insert("requirements", v);
        }
        if let Some(ref v) = self.location {
            set.insert("location", v);
        }
        if let Some(v) = self.salary {
            set.insert("salary", v);
        }
        if let Some(v) = self.job_type {
            set.insert("job_type", v.as_str());
        }
        if let Some(v) = self.positions {
            set.insert("positions", v);
        }
        set.insert(
            "updated_at",
            bson::DateTime::from_chrono(chrono::Utc::now()),
        );
        set
    }
}

/// Repository for job posting documents.
pub struct JobRepository {
    client: StoreClient,
}

impl JobRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, job: &Job) -> StoreResult<()> {
        self.client.jobs().insert_one(job).await?;
        info!("Created job posting: {} ({})", job.title, job.id);
        Ok(())
    }

    pub async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let job = self
            .client
            .jobs()
            .find_one(doc! { "_id": id.as_str() })
            .await?;
        Ok(job)
    }

    /// Execute a search: one conjunctive filter, newest first, skip/limit
    /// pagination, plus a total count ignoring pagination.
    ///
    /// An out-of-range page returns an empty page with correct metadata.
    pub async fn search(
        &self,
        filters: &JobFilters,
        request: PageRequest,
    ) -> StoreResult<Page<Job>> {
        let filter = filters.to_document();

        let total = self
            .client
            .jobs()
            .count_documents(filter.clone())
            .await?;

        let cursor = self
            .client
            .jobs()
            .find(filter)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .skip(request.skip())
            .limit(request.limit())
            .await?;
        let items: Vec<Job> = cursor.try_collect().await?;

        Ok(Page::new(items, total, request))
    }

    /// Batch fetch for read-only joins (application denormalization).
    pub async fn get_many(&self, ids: &[JobId]) -> StoreResult<Vec<Job>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_strings: Vec<Bson> = ids
            .iter()
            .map(|id| Bson::String(id.as_str().to_string()))
            .collect();
        let cursor = self
            .client
            .jobs()
            .find(doc! { "_id": { "$in": id_strings } })
            .await?;
        let jobs = cursor.try_collect().await?;
        Ok(jobs)
    }

    /// All postings owned by any of the given companies, newest first.
    pub async fn list_by_companies(&self, company_ids: &[CompanyId]) -> StoreResult<Vec<Job>> {
        if company_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Bson> = company_ids
            .iter()
            .map(|id| Bson::String(id.as_str().to_string()))
            .collect();
        let cursor = self
            .client
            .jobs()
            .find(doc! { "company_id": { "$in": ids } })
            .sort(doc! { "created_at": -1, "_id": -1 })
            .await?;
        let jobs = cursor.try_collect().await?;
        Ok(jobs)
    }

    /// Apply a partial update, returning the updated posting.
    pub async fn update(&self, id: &JobId, patch: JobPatch) -> StoreResult<Option<Job>> {
        let set = patch.to_set_document();
        let updated = self
            .client
            .jobs()
            .find_one_and_update(doc! { "_id": id.as_str() }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    /// Delete a posting. Application cascade is the caller's responsibility
    /// (delete applications first, then the posting).
    pub async fn delete(&self, id: &JobId) -> StoreResult<bool> {
        let result = self
            .client
            .jobs()
            .delete_one(doc! { "_id": id.as_str() })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
