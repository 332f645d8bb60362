#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use domains::{
    DonationDraft, DonationId, IdentityProvider, Result, UserData, UserId, UserRepo,
    VerifiedIdentity,
};
use services::{Deps, DonationService, UserService};
use storage_adapters::{DocumentRepos, MemoryDocumentStore};

/// Accepts any credential as its own uid and remembers account deletions.
#[derive(Default)]
pub struct RecordingIdentity {
    pub deleted: Mutex<Vec<UserId>>,
}

#[async_trait]
impl IdentityProvider for RecordingIdentity {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity> {
        Ok(identity(credential))
    }

    async fn delete_account(&self, uid: &UserId) -> Result<()> {
        self.deleted.lock().unwrap().push(uid.clone());
        Ok(())
    }
}

pub fn identity(uid: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        uid: UserId::new(uid),
        display_name: format!("{uid} display"),
        email: format!("{uid}@example.com"),
        created_at: Utc::now(),
    }
}

pub fn draft(title: &str) -> DonationDraft {
    DonationDraft {
        title: title.into(),
        ..DonationDraft::default()
    }
}

pub struct Harness {
    pub store: Arc<MemoryDocumentStore>,
    pub repos: DocumentRepos,
    pub identity: Arc<RecordingIdentity>,
    pub donations: DonationService,
    pub users: UserService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let repos = DocumentRepos::new(store.clone());
        let identity = Arc::new(RecordingIdentity::default());
        let deps = Deps {
            donations: Arc::new(repos.clone()),
            users: Arc::new(repos.clone()),
            bans: Arc::new(repos.clone()),
            identity: identity.clone(),
        };
        Self {
            store,
            repos,
            identity,
            donations: DonationService::new(deps.clone()),
            users: UserService::new(deps),
        }
    }

    pub async fn register(&self, uid: &str) -> UserId {
        self.users.create_account(&identity(uid)).await.unwrap();
        UserId::new(uid)
    }

    /// Admin status has no API; it is written straight to the store.
    pub async fn seed_admin(&self, uid: &str) -> UserId {
        let mut record = UserData::from_identity(&identity(uid));
        record.admin = true;
        self.repos.create_user(&record).await.unwrap();
        record.uid
    }

    pub async fn post(&self, owner: &UserId, title: &str) -> DonationId {
        self.donations
            .create_donation(owner, draft(title))
            .await
            .unwrap()
    }

    pub async fn user(&self, uid: &UserId) -> Option<UserData> {
        self.repos.get_user(uid).await.unwrap()
    }
}
