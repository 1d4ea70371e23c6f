use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::auth::hash_password;
use crate::database::models::USER;
use crate::database::schema::ID_FIELD;
use crate::database::{EntityStore, Page, QueryOptions, Record};
use crate::error::ApiError;
use crate::services::entity_service::{EntityService, ServiceResult};
use crate::services::search::UserSearch;

const EMAIL: &str = "email";
const PASSWORD: &str = "password";

/// Users on top of the generic entity service: unique email, hashed
/// passwords, lookup by email.
#[derive(Clone)]
pub struct UserService {
    inner: EntityService,
}

impl UserService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { inner: EntityService::new(&USER, store) }
    }

    pub async fn create_user(&self, body: Record) -> ServiceResult<Record> {
        if let Some(email) = body.get(EMAIL).and_then(Value::as_str) {
            if self.is_email_taken(email, None).await? {
                return Err(ApiError::bad_request("Email already taken"));
            }
        }
        // Validate the plain-text password before it is replaced by its hash
        USER.prepare(body.clone())?;
        let body = with_hashed_password(body)?;

        let user = self.inner.create(body).await?;
        info!(id = ?user.get(ID_FIELD), "user created");
        Ok(user)
    }

    pub async fn query_users(&self, filter: Value, options: &QueryOptions) -> ServiceResult<Page> {
        self.inner.query(filter, options).await
    }

    pub async fn get_user_by_id(&self, id: &str) -> ServiceResult<Option<Record>> {
        self.inner.get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<Record>> {
        let email = email.trim().to_lowercase();
        Ok(self.inner.repository().find_one(json!({ EMAIL: email })).await?)
    }

    pub async fn search_users(&self, search: &UserSearch) -> ServiceResult<Vec<Record>> {
        self.inner.search(search.to_filter()).await
    }

    pub async fn update_user_by_id(&self, id: &str, mut patch: Record) -> ServiceResult<Record> {
        let current = self.inner.get_by_id_or_404(id).await?;

        if let Some(email) = patch.get(EMAIL).and_then(Value::as_str) {
            if self.is_email_taken(email, Some(id)).await? {
                return Err(ApiError::bad_request("Email already taken"));
            }
        }
        if patch.contains_key(PASSWORD) {
            let mut candidate = current;
            candidate.extend(patch.clone());
            USER.prepare(candidate)?;
            patch = with_hashed_password(patch)?;
        }

        self.inner.update_by_id(id, patch).await
    }

    pub async fn delete_user_by_id(&self, id: &str) -> ServiceResult<Record> {
        self.inner.delete_by_id(id).await
    }

    /// Whether another user (not `exclude_id`) already holds `email`.
    pub async fn is_email_taken(&self, email: &str, exclude_id: Option<&str>) -> ServiceResult<bool> {
        let email = email.trim().to_lowercase();
        let filter = match exclude_id {
            Some(id) => json!({ EMAIL: email, ID_FIELD: { "$ne": id } }),
            None => json!({ EMAIL: email }),
        };
        Ok(self.inner.repository().count(&filter).await? > 0)
    }
}

fn with_hashed_password(mut body: Record) -> ServiceResult<Record> {
    if let Some(Value::String(plain)) = body.get(PASSWORD) {
        let hash = hash_password(plain.trim())?;
        body.insert(PASSWORD.to_string(), Value::String(hash));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::database::MemoryStore;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    fn body(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn ada() -> Record {
        body(json!({
            "name": "Ada",
            "lastName": "Lovelace",
            "email": "Ada@Example.com",
            "password": "password1"
        }))
    }

    #[tokio::test]
    async fn stores_hashed_password_and_normalized_email() {
        let users = service();
        let user = users.create_user(ada()).await.unwrap();
        assert_eq!(user["email"], json!("ada@example.com"));
        assert_eq!(user["role"], json!("user"));
        assert_eq!(user["isEmailVerified"], json!(false));
        assert!(verify_password("password1", user["password"].as_str().unwrap()));

        let found = users.get_user_by_email(" ADA@example.com ").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let users = service();
        users.create_user(ada()).await.unwrap();
        let err = users.create_user(ada()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Email already taken");
    }

    #[tokio::test]
    async fn rejects_weak_password_before_hashing() {
        let users = service();
        let mut weak = ada();
        weak.insert("password".into(), json!("password"));
        let err = users.create_user(weak).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_json()["field_errors"]["password"].is_string());
    }

    #[tokio::test]
    async fn password_change_is_rehashed() {
        let users = service();
        let user = users.create_user(ada()).await.unwrap();
        let id = user["_id"].as_str().unwrap();

        let updated = users
            .update_user_by_id(id, body(json!({ "password": "newpassword2" })))
            .await
            .unwrap();
        let hash = updated["password"].as_str().unwrap();
        assert!(verify_password("newpassword2", hash));
        assert!(!verify_password("password1", hash));
    }

    #[tokio::test]
    async fn keeping_own_email_is_not_a_conflict() {
        let users = service();
        let user = users.create_user(ada()).await.unwrap();
        let id = user["_id"].as_str().unwrap();
        let updated = users
            .update_user_by_id(id, body(json!({ "email": "ada@example.com", "name": "Augusta" })))
            .await
            .unwrap();
        assert_eq!(updated["name"], json!("augusta"));
    }
}
