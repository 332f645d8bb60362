//! # Document-backed repositories
//!
//! Implements the domain repository ports over any [`DocumentStore`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use domains::{
    AppError, BanList, BanRepo, Donation, DonationId, DonationRepo, Result, UserData, UserId,
    UserRepo,
};

use crate::document::{DocumentKey, DocumentStore, FieldValue, Fields};
use crate::schema::{self, DONATIONS};

#[derive(Clone)]
pub struct DocumentRepos {
    store: Arc<dyn DocumentStore>,
}

impl DocumentRepos {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn update_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: FieldValue,
    ) -> Result<()> {
        let mut fields = Fields::new();
        fields.insert(field.to_string(), value);
        self.store.update(key, fields).await?;
        Ok(())
    }
}

#[async_trait]
impl DonationRepo for DocumentRepos {
    fn allocate_id(&self) -> DonationId {
        DonationId::new(self.store.new_id())
    }

    async fn get_donation(&self, id: &DonationId) -> Result<Option<Donation>> {
        let key = schema::donation_key(id);
        match self.store.get(&key).await? {
            Some(fields) => Ok(Some(schema::decode_donation(&key, &fields)?)),
            None => Ok(None),
        }
    }

    async fn list_donations(&self) -> Result<Vec<Donation>> {
        let documents = self.store.list(DONATIONS).await?;
        let mut donations = Vec::with_capacity(documents.len());
        for doc in documents {
            donations.push(schema::decode_donation(&doc.key, &doc.fields)?);
        }
        Ok(donations)
    }

    async fn create_donation(&self, donation: &Donation) -> Result<()> {
        let key = schema::donation_key(&donation.id);
        self.store
            .create(&key, schema::encode_donation(donation))
            .await?;
        debug!(document = %key, "donation stored");
        Ok(())
    }

    async fn replace_donation(&self, donation: &Donation) -> Result<()> {
        let key = schema::donation_key(&donation.id);
        self.store
            .update(&key, schema::encode_donation(donation))
            .await?;
        Ok(())
    }

    async fn set_reports(&self, id: &DonationId, reports: &[UserId]) -> Result<()> {
        self.update_field(
            &schema::donation_key(id),
            "reports",
            schema::encode_reports(reports),
        )
        .await
    }

    async fn delete_donation(&self, id: &DonationId) -> Result<()> {
        self.store.delete(&schema::donation_key(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepo for DocumentRepos {
    async fn get_user(&self, uid: &UserId) -> Result<Option<UserData>> {
        let key = schema::user_key(uid);
        match self.store.get(&key).await? {
            Some(fields) => Ok(Some(schema::decode_user(&key, &fields)?)),
            None => Ok(None),
        }
    }

    async fn create_user(&self, user: &UserData) -> Result<()> {
        let key = schema::user_key(&user.uid);
        self.store
            .create(&key, schema::encode_user(user))
            .await
            .map_err(|err| match AppError::from(err) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("an account already exists for {}", user.uid))
                }
                other => other,
            })
    }

    async fn set_posts(&self, uid: &UserId, posts: &[DonationId]) -> Result<()> {
        self.update_field(&schema::user_key(uid), "posts", schema::encode_posts(posts))
            .await
    }

    async fn set_donations_made(&self, uid: &UserId, count: i64) -> Result<()> {
        self.update_field(
            &schema::user_key(uid),
            "donations_made",
            FieldValue::Integer(count),
        )
        .await
    }

    async fn delete_user(&self, uid: &UserId) -> Result<()> {
        self.store.delete(&schema::user_key(uid)).await?;
        Ok(())
    }
}

#[async_trait]
impl BanRepo for DocumentRepos {
    async fn load_bans(&self) -> Result<BanList> {
        let key = schema::bans_key();
        match self.store.get(&key).await? {
            Some(fields) => Ok(schema::decode_bans(&key, &fields)?),
            None => Ok(BanList::new()),
        }
    }

    /// Read-modify-write of the whole registry document.
    async fn add_ban(&self, uid: &UserId) -> Result<()> {
        let mut bans = self.load_bans().await?;
        if !bans.insert(uid.clone()) {
            return Ok(());
        }
        self.store
            .set(&schema::bans_key(), schema::encode_bans(&bans))
            .await?;
        Ok(())
    }
}
