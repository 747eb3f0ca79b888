use crate::models::{Account, JobPosting};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{FindOneOptions, FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key")]
    Duplicate,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            StoreError::Duplicate
        } else {
            StoreError::Backend(anyhow::anyhow!(err.to_string()))
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Fails with `Duplicate` when the company email is
    /// already registered; the existing account is left untouched.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Earliest registered account with this phone number.
    async fn find_account_by_phone(&self, phone_no: &str) -> Result<Option<Account>, StoreError>;

    /// Replace the stored account only if its version is still `expected`.
    /// Returns false when another writer got there first.
    async fn replace_account_if_version(
        &self,
        expected: i64,
        account: &Account,
    ) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &JobPosting) -> Result<(), StoreError>;

    /// Postings by `account_id`, newest first.
    async fn list_jobs_by_account(&self, account_id: &str) -> Result<Vec<JobPosting>, StoreError>;
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            StoreError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        tracing::info!("Creating MongoDB indexes for employer-service");

        let email_index = IndexModel::builder()
            .keys(doc! { "company_email": 1 })
            .options(
                IndexOptions::builder()
                    .name("company_email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.accounts()
            .create_index(email_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create company_email index: {}", e);
                StoreError::from(e)
            })?;

        let phone_index = IndexModel::builder()
            .keys(doc! { "phone_no": 1, "created_utc": 1 })
            .options(
                IndexOptions::builder()
                    .name("phone_no_idx".to_string())
                    .build(),
            )
            .build();
        self.accounts()
            .create_index(phone_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create phone_no index: {}", e);
                StoreError::from(e)
            })?;

        let posted_by_index = IndexModel::builder()
            .keys(doc! { "posted_by": 1, "created_utc": -1 })
            .options(
                IndexOptions::builder()
                    .name("posted_by_idx".to_string())
                    .build(),
            )
            .build();
        self.jobs()
            .create_index(posted_by_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create posted_by index: {}", e);
                StoreError::from(e)
            })?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    fn accounts(&self) -> Collection<Account> {
        self.db.collection("accounts")
    }

    fn jobs(&self) -> Collection<JobPosting> {
        self.db.collection("jobs")
    }
}

#[async_trait]
impl AccountStore for MongoDb {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.accounts()
            .insert_one(account, None)
            .await
            .map_err(|e| {
                if !is_duplicate_key(&e) {
                    tracing::error!("Failed to insert account: {}", e);
                }
                StoreError::from(e)
            })?;
        Ok(())
    }

    async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .accounts()
            .find_one(doc! { "company_email": email }, None)
            .await?)
    }

    async fn find_account_by_phone(&self, phone_no: &str) -> Result<Option<Account>, StoreError> {
        let options = FindOneOptions::builder()
            .sort(doc! { "created_utc": 1 })
            .build();
        Ok(self
            .accounts()
            .find_one(doc! { "phone_no": phone_no }, options)
            .await?)
    }

    async fn replace_account_if_version(
        &self,
        expected: i64,
        account: &Account,
    ) -> Result<bool, StoreError> {
        let result = self
            .accounts()
            .replace_one(doc! { "_id": account.id.as_str(), "version": expected }, account, None)
            .await
            .map_err(|e| {
                tracing::error!(account_id = %account.id, "Failed to replace account: {}", e);
                StoreError::from(e)
            })?;
        Ok(result.matched_count == 1)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                StoreError::from(e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for MongoDb {
    async fn insert_job(&self, job: &JobPosting) -> Result<(), StoreError> {
        self.jobs().insert_one(job, None).await.map_err(|e| {
            tracing::error!("Failed to insert job posting: {}", e);
            StoreError::from(e)
        })?;
        Ok(())
    }

    async fn list_jobs_by_account(&self, account_id: &str) -> Result<Vec<JobPosting>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_utc": -1 })
            .build();
        let cursor = self
            .jobs()
            .find(doc! { "posted_by": account_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

/// Process-local store for tests and local runs without MongoDB.
#[derive(Default)]
pub struct InMemoryStore {
    accounts: Mutex<HashMap<String, Account>>,
    jobs: Mutex<Vec<JobPosting>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        if accounts
            .values()
            .any(|a| a.company_email == account.company_email)
        {
            return Err(StoreError::Duplicate);
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn find_account_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        Ok(accounts.get(id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        Ok(accounts
            .values()
            .find(|a| a.company_email == email)
            .cloned())
    }

    async fn find_account_by_phone(&self, phone_no: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        Ok(accounts
            .values()
            .filter(|a| a.phone_no == phone_no)
            .min_by_key(|a| a.created_utc)
            .cloned())
    }

    async fn replace_account_if_version(
        &self,
        expected: i64,
        account: &Account,
    ) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        match accounts.get_mut(&account.id) {
            Some(stored) if stored.version == expected => {
                *stored = account.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn insert_job(&self, job: &JobPosting) -> Result<(), StoreError> {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(job.clone());
        Ok(())
    }

    async fn list_jobs_by_account(&self, account_id: &str) -> Result<Vec<JobPosting>, StoreError> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let mut owned: Vec<JobPosting> = jobs
            .iter()
            .filter(|j| j.posted_by == account_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailChallenge, NewAccount};
    use chrono::{Duration, Utc};

    fn account(email: &str, phone: &str, now: chrono::DateTime<Utc>) -> Account {
        Account::new(
            NewAccount {
                name: "Asha Rao".to_string(),
                phone_no: phone.to_string(),
                company_name: "Acme Labs".to_string(),
                company_email: email.to_string(),
                employee_size: 10,
            },
            EmailChallenge::new("abc123".to_string(), now),
            now,
        )
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_overwrite() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let first = account("hr@acme.example", "+911111111111", now);
        store.insert_account(&first).await.unwrap();

        let second = account("hr@acme.example", "+912222222222", now);
        let err = store.insert_account(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));

        let stored = store
            .find_account_by_email("hr@acme.example")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(store.account_count(), 1);
    }

    #[tokio::test]
    async fn stale_version_is_not_written() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let mut acc = account("hr@acme.example", "+911111111111", now);
        store.insert_account(&acc).await.unwrap();

        let mut stale = acc.clone();
        let expected = acc.touch(now);
        assert!(store.replace_account_if_version(expected, &acc).await.unwrap());

        let expected = stale.touch(now);
        assert!(!store.replace_account_if_version(expected, &stale).await.unwrap());
    }

    #[tokio::test]
    async fn phone_lookup_returns_earliest_account() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let later = account("b@acme.example", "+911111111111", now + Duration::seconds(5));
        let earlier = account("a@acme.example", "+911111111111", now);
        store.insert_account(&later).await.unwrap();
        store.insert_account(&earlier).await.unwrap();

        let found = store
            .find_account_by_phone("+911111111111")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, earlier.id);
    }
}
