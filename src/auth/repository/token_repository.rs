use std::sync::Arc;
use std::time::Duration;

use actix_web::rt::spawn;
use actix_web::rt::time::interval;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::shared::repository::RepositoryError;

/// A revoked refresh token, kept until the token would have expired anyway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistedToken {
  pub jti: String,
  pub user_id: String,
  #[serde(with = "chrono::serde::ts_seconds")]
  pub expires_at: DateTime<Utc>,
  pub blacklisted_at: DateTime<Utc>,
}

#[async_trait]
pub trait TokenBlacklist: Send + Sync {
  /// Returns `false` when the token was already blacklisted. Checking and
  /// inserting happen as one step so a refresh token can only be spent once.
  async fn blacklist(
    &self,
    token: BlacklistedToken,
  ) -> Result<bool, RepositoryError>;
  async fn is_blacklisted(&self, jti: &str) -> Result<bool, RepositoryError>;
  async fn purge_expired(
    &self,
    now: DateTime<Utc>,
  ) -> Result<u64, RepositoryError>;
}

/// Periodically drops entries whose tokens have expired.
pub fn spawn_purge_task(blacklist: Arc<dyn TokenBlacklist>, every: Duration) {
  spawn(async move {
    let mut interval = interval(every);
    loop {
      interval.tick().await;
      match blacklist.purge_expired(Utc::now()).await {
        Ok(purged) => debug!("Purged {} expired blacklist entries", purged),
        Err(err) => error!("Failed to purge token blacklist: {}", err),
      }
    }
  });
}

pub mod in_memory {
  use std::collections::HashMap;
  use std::sync::{Arc, RwLock};

  use async_trait::async_trait;
  use chrono::{DateTime, Utc};

  use super::{BlacklistedToken, TokenBlacklist};
  use crate::shared::repository::RepositoryError;

  #[derive(Default)]
  pub struct InMemoryTokenBlacklist {
    pub tokens: Arc<RwLock<HashMap<String, BlacklistedToken>>>,
  }

  impl InMemoryTokenBlacklist {
    pub fn new() -> Self {
      Self::default()
    }
  }

  #[async_trait]
  impl TokenBlacklist for InMemoryTokenBlacklist {
    async fn blacklist(
      &self,
      token: BlacklistedToken,
    ) -> Result<bool, RepositoryError> {
      let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
      if tokens.contains_key(&token.jti) {
        return Ok(false);
      }
      tokens.insert(token.jti.clone(), token);
      Ok(true)
    }

    async fn is_blacklisted(&self, jti: &str) -> Result<bool, RepositoryError> {
      let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
      Ok(tokens.contains_key(jti))
    }

    async fn purge_expired(
      &self,
      now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
      let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
      let before = tokens.len();
      tokens.retain(|_, token| token.expires_at > now);
      Ok((before - tokens.len()) as u64)
    }
  }
}

#[cfg(feature = "mongodb")]
pub mod mongo {
  use async_trait::async_trait;
  use chrono::{DateTime, Utc};
  use mongodb::bson::doc;

  use super::{BlacklistedToken, TokenBlacklist};
  use crate::shared::database::{map_write_error, MongoDatabase};
  use crate::shared::repository::RepositoryError;

  pub struct MongoTokenBlacklist {
    database: MongoDatabase,
  }

  impl MongoTokenBlacklist {
    pub fn new(database: MongoDatabase) -> Self {
      Self { database }
    }

    fn tokens(&self) -> mongodb::Collection<BlacklistedToken> {
      self.database.collection("token_blacklist")
    }
  }

  #[async_trait]
  impl TokenBlacklist for MongoTokenBlacklist {
    async fn blacklist(
      &self,
      token: BlacklistedToken,
    ) -> Result<bool, RepositoryError> {
      match self
        .tokens()
        .insert_one(token)
        .await
        .map_err(|error| map_write_error(error, "jti"))
      {
        Ok(_) => Ok(true),
        Err(RepositoryError::Conflict(_)) => Ok(false),
        Err(error) => Err(error),
      }
    }

    async fn is_blacklisted(&self, jti: &str) -> Result<bool, RepositoryError> {
      Ok(self.tokens().find_one(doc! { "jti": jti }).await?.is_some())
    }

    async fn purge_expired(
      &self,
      now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
      let result = self
        .tokens()
        .delete_many(doc! { "expires_at": { "$lte": now.timestamp() } })
        .await?;
      Ok(result.deleted_count)
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::in_memory::InMemoryTokenBlacklist;
  use super::*;

  fn token(jti: &str, expires_at: DateTime<Utc>) -> BlacklistedToken {
    BlacklistedToken {
      jti: jti.to_string(),
      user_id: String::from("user"),
      expires_at,
      blacklisted_at: Utc::now(),
    }
  }

  #[actix_web::test]
  async fn test_blacklist_is_single_use() {
    let blacklist = InMemoryTokenBlacklist::new();
    let expires_at = Utc::now() + Duration::days(1);

    assert!(blacklist.blacklist(token("a", expires_at)).await.unwrap());
    assert!(!blacklist.blacklist(token("a", expires_at)).await.unwrap());
    assert!(blacklist.is_blacklisted("a").await.unwrap());
    assert!(!blacklist.is_blacklisted("b").await.unwrap());
  }

  #[actix_web::test]
  async fn test_purge_drops_only_expired_entries() {
    let blacklist = InMemoryTokenBlacklist::new();
    let now = Utc::now();
    blacklist
      .blacklist(token("old", now - Duration::minutes(1)))
      .await
      .unwrap();
    blacklist
      .blacklist(token("fresh", now + Duration::minutes(1)))
      .await
      .unwrap();

    assert_eq!(blacklist.purge_expired(now).await.unwrap(), 1);
    assert!(!blacklist.is_blacklisted("old").await.unwrap());
    assert!(blacklist.is_blacklisted("fresh").await.unwrap());
  }
}
