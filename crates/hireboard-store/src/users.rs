//! User account repository.

use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use tracing::info;

use hireboard_models::{ArtifactRef, CompanyId, UserAccount, UserId};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};

/// Partial profile update. Only supplied fields are written.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub resume: Option<ArtifactRef>,
    pub resume_original_name: Option<String>,
    pub photo: Option<ArtifactRef>,
}

impl ProfilePatch {
    fn to_set_document(&self) -> StoreResult<Document> {
        let mut set = Document::new();
        if let Some(ref v) = self.full_name {
            set.insert("full_name", v);
        }
        if let Some(ref v) = self.email {
            set.insert("email", v);
        }
        if let Some(ref v) = self.phone {
            set.insert("phone", v);
        }
        if let Some(ref v) = self.bio {
            set.insert("profile.bio", v);
        }
        if let Some(ref v) = self.skills {
            set.insert("profile.skills", v);
        }
        if let Some(ref v) = self.resume {
            set.insert(
                "profile.resume",
                bson::to_bson(v).map_err(|e| StoreError::InvalidDocument(e.to_string()))?,
            );
        }
        if let Some(ref v) = self.resume_original_name {
            set.insert("profile.resume_original_name", v);
        }
        if let Some(ref v) = self.photo {
            set.insert(
                "profile.photo",
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

/// Repository for user account documents.
pub struct UserRepository {
    client: StoreClient,
}

impl UserRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Insert a new account. A duplicate email is rejected by the unique
    /// index and surfaces as [`StoreError::Duplicate`].
    pub async fn create(&self, user: &UserAccount) -> StoreResult<()> {
        self.client
            .users()
            .insert_one(user)
            .await
            .map_err(|e| StoreError::from_write(e, "email already registered"))?;
        info!("Created user account: {}", user.id);
        Ok(())
    }

    pub async fn get(&self, id: &UserId) -> StoreResult<Option<UserAccount>> {
        let user = self
            .client
            .users()
            .find_one(doc! { "_id": id.as_str() })
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let user = self.client.users().find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    /// Batch fetch for read-only joins (applicant denormalization).
    pub async fn get_many(&self, ids: &[UserId]) -> StoreResult<Vec<UserAccount>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_strings: Vec<bson::Bson> = ids
            .iter()
            .map(|id| bson::Bson::String(id.as_str().to_string()))
            .collect();
        let cursor = self
            .client
            .users()
            .find(doc! { "_id": { "$in": id_strings } })
            .await?;
        let users = cursor.try_collect().await?;
        Ok(users)
    }

    /// Apply a partial profile update, returning the updated account.
    pub async fn update_profile(
        &self,
        id: &UserId,
        patch: ProfilePatch,
    ) -> StoreResult<Option<UserAccount>> {
        let set = patch.to_set_document()?;
        let updated = self
            .client
            .users()
            .find_one_and_update(doc! { "_id": id.as_str() }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| StoreError::from_write(e, "email already registered"))?;
        Ok(updated)
    }

    /// Record ownership of a newly registered company.
    pub async fn push_company(&self, id: &UserId, company_id: &CompanyId) -> StoreResult<()> {
        self.client
            .users()
            .update_one(
                doc! { "_id": id.as_str() },
                doc! {
                    "$addToSet": { "company_ids": company_id.as_str() },
                    "$set": { "updated_at": bson::DateTime::from_chrono(chrono::Utc::now()) },
                },
            )
            .await?;
        Ok(())
    }
}
