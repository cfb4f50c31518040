//! Company repository.

use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use tracing::info;

use hireboard_models::{ArtifactRef, Company, CompanyId, UserId};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};

/// Partial company update. Only supplied fields are written.
#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub logo: Option<ArtifactRef>,
}

impl CompanyPatch {
    fn to_set_document(&self) -> StoreResult<Document> {
        let mut set = Document::new();
        if let Some(ref v) = self.name {
            set.insert("name", v);
        }
        if let Some(ref v) = self.description {
            set.insert("description", v);
        }
        if let Some(ref v) = self.website {
            set.insert("website", v);
        }
        if let Some(ref v) = self.location {
            set.insert("location", v);
        }
        if let Some(ref v) = self.logo {
            set.insert(
                "logo",
                bson::to_bson(v).map_err(|e| StoreError::InvalidDocument(e.to_string()))?,
            );
        }
        set.insert(
            "updated_at",
            bson::DateTime::from_chrono(chrono::Utc::now()),
        );
        Ok(set)
    }
}

/// Repository for company documents.
pub struct CompanyRepository {
    client: StoreClient,
}

impl CompanyRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Insert a new company. Name uniqueness is enforced by the store index;
    /// a duplicate surfaces as [`StoreError::Duplicate`].
    pub async fn create(&self, company: &Company) -> StoreResult<()> {
        self.client
            .companies()
            .insert_one(company)
            .await
            .map_err(|e| StoreError::from_write(e, "company name already registered"))?;
        info!("Registered company: {} ({})", company.name, company.id);
        Ok(())
    }

    pub async fn get(&self, id: &CompanyId) -> StoreResult<Option<Company>> {
        let company = self
            .client
            .companies()
            .find_one(doc! { "_id": id.as_str() })
            .await?;
        Ok(company)
    }

    pub async fn find_by_name(&self, name: &str) -> StoreResult<Option<Company>> {
        let company = self
            .client
            .companies()
            .find_one(doc! { "name": name })
            .await?;
        Ok(company)
    }

    /// Batch fetch for read-only joins (listing denormalization).
    pub async fn get_many(&self, ids: &[CompanyId]) -> StoreResult<Vec<Company>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_strings: Vec<Bson> = ids
            .iter()
            .map(|id| Bson::String(id.as_str().to_string()))
            .collect();
        let cursor = self
            .client
            .companies()
            .find(doc! { "_id": { "$in": id_strings } })
            .await?;
        let companies = cursor.try_collect().await?;
        Ok(companies)
    }

    pub async fn list_by_owner(&self, owner_id: &UserId) -> StoreResult<Vec<Company>> {
        let cursor = self
            .client
            .companies()
            .find(doc! { "owner_id": owner_id.as_str() })
            .sort(doc! { "created_at": -1, "_id": -1 })
            .await?;
        let companies = cursor.try_collect().await?;
        Ok(companies)
    }

    /// Remove a company record, e.g. to undo a registration whose follow-up
    /// ownership write failed. Returns whether a record was removed.
    pub async fn delete(&self, id: &CompanyId) -> StoreResult<bool> {
        let result = self
            .client
            .companies()
            .delete_one(doc! { "_id": id.as_str() })
            .await?;
        Ok(result.deleted_count > 0)
    }

    /// Apply a partial update, returning the updated company.
    pub async fn update(
        &self,
        id: &CompanyId,
        patch: CompanyPatch,
    ) -> StoreResult<Option<Company>> {
        let set = patch.to_set_document()?;
        let updated = self
            .client
            .companies()
            .find_one_and_update(doc! { "_id": id.as_str() }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| StoreError::from_write(e, "company name already registered"))?;
        Ok(updated)
    }
}
