use async_trait::async_trait;

use crate::profiles::model::profile::Profile;
use crate::shared::repository::RepositoryError;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
  async fn find_one(&self, id: &str) -> Result<Profile, RepositoryError>;
  async fn find_all(&self) -> Result<Vec<Profile>, RepositoryError>;
  async fn find_by_user(
    &self,
    user_id: &str,
  ) -> Result<Vec<Profile>, RepositoryError>;
  /// Fails with a conflict on `user_id` if the user already has a profile.
  async fn create(&self, profile: Profile) -> Result<(), RepositoryError>;
  async fn update(&self, profile: Profile) -> Result<(), RepositoryError>;
  async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
  async fn delete_by_user(&self, user_id: &str)
    -> Result<(), RepositoryError>;
  /// Forgets `user_id` as the creator of any record.
  async fn clear_creator(&self, user_id: &str)
    -> Result<(), RepositoryError>;
}

pub mod in_memory {
  use std::sync::{Arc, RwLock};

  use async_trait::async_trait;

  use super::ProfileRepository;
  use crate::profiles::model::profile::Profile;
  use crate::shared::repository::RepositoryError;

  #[derive(Default)]
  pub struct InMemoryProfileRepository {
    pub profiles: Arc<RwLock<Vec<Profile>>>,
  }

  impl InMemoryProfileRepository {
    pub fn new() -> Self {
      Self::default()
    }
  }

  #[async_trait]
  impl ProfileRepository for InMemoryProfileRepository {
    async fn find_one(&self, id: &str) -> Result<Profile, RepositoryError> {
      let profiles = self.profiles.read().unwrap_or_else(|e| e.into_inner());
      profiles
        .iter()
        .find(|profile| profile.id == id)
        .cloned()
        .ok_or(RepositoryError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<Profile>, RepositoryError> {
      Ok(self.profiles.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn find_by_user(
      &self,
      user_id: &str,
    ) -> Result<Vec<Profile>, RepositoryError> {
      let profiles = self.profiles.read().unwrap_or_else(|e| e.into_inner());
      Ok(
        profiles
          .iter()
          .filter(|profile| profile.user_id == user_id)
          .cloned()
          .collect(),
      )
    }

    async fn create(&self, profile: Profile) -> Result<(), RepositoryError> {
      let mut profiles =
        self.profiles.write().unwrap_or_else(|e| e.into_inner());
      if profiles
        .iter()
        .any(|existing| existing.user_id == profile.user_id)
      {
        return Err(RepositoryError::Conflict("user_id"));
      }
      profiles.push(profile);
      Ok(())
    }

    async fn update(&self, profile: Profile) -> Result<(), RepositoryError> {
      let mut profiles =
        self.profiles.write().unwrap_or_else(|e| e.into_inner());
      let existing = profiles
        .iter_mut()
        .find(|existing| existing.id == profile.id)
        .ok_or(RepositoryError::NotFound)?;
      *existing = profile;
      Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
      let mut profiles =
        self.profiles.write().unwrap_or_else(|e| e.into_inner());
      let before = profiles.len();
      profiles.retain(|profile| profile.id != id);
      if profiles.len() == before {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn delete_by_user(
      &self,
      user_id: &str,
    ) -> Result<(), RepositoryError> {
      let mut profiles =
        self.profiles.write().unwrap_or_else(|e| e.into_inner());
      profiles.retain(|profile| profile.user_id != user_id);
      Ok(())
    }

    async fn clear_creator(
      &self,
      user_id: &str,
    ) -> Result<(), RepositoryError> {
      let mut profiles =
        self.profiles.write().unwrap_or_else(|e| e.into_inner());
      profiles
        .iter_mut()
        .filter(|profile| profile.created_by.as_deref() == Some(user_id))
        .for_each(|profile| profile.created_by = None);
      Ok(())
    }
  }
}

#[cfg(feature = "mongodb")]
pub mod mongo {
  use async_trait::async_trait;
  use futures::TryStreamExt;
  use mongodb::bson::doc;

  use super::ProfileRepository;
  use crate::profiles::model::profile::Profile;
  use crate::shared::database::{map_write_error, MongoDatabase};
  use crate::shared::repository::RepositoryError;

  pub struct MongoProfileRepository {
    database: MongoDatabase,
  }

  impl MongoProfileRepository {
    pub fn new(database: MongoDatabase) -> Self {
      Self { database }
    }

    fn profiles(&self) -> mongodb::Collection<Profile> {
      self.database.collection("profiles")
    }
  }

  #[async_trait]
  impl ProfileRepository for MongoProfileRepository {
    async fn find_one(&self, id: &str) -> Result<Profile, RepositoryError> {
      self
        .profiles()
        .find_one(doc! { "id": id })
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<Profile>, RepositoryError> {
      Ok(self.profiles().find(doc! {}).await?.try_collect().await?)
    }

    async fn find_by_user(
      &self,
      user_id: &str,
    ) -> Result<Vec<Profile>, RepositoryError> {
      Ok(
        self
          .profiles()
          .find(doc! { "user_id": user_id })
          .await?
          .try_collect()
          .await?,
      )
    }

    async fn create(&self, profile: Profile) -> Result<(), RepositoryError> {
      self
        .profiles()
        .insert_one(profile)
        .await
        .map_err(|error| map_write_error(error, "user_id"))?;
      Ok(())
    }

    async fn update(&self, profile: Profile) -> Result<(), RepositoryError> {
      let result = self
        .profiles()
        .replace_one(doc! { "id": profile.id.as_str() }, profile)
        .await?;
      if result.matched_count == 0 {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
      let result = self.profiles().delete_one(doc! { "id": id }).await?;
      if result.deleted_count == 0 {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn delete_by_user(
      &self,
      user_id: &str,
    ) -> Result<(), RepositoryError> {
      self
        .profiles()
        .delete_many(doc! { "user_id": user_id })
        .await?;
      Ok(())
    }

    async fn clear_creator(
      &self,
      user_id: &str,
    ) -> Result<(), RepositoryError> {
      self
        .profiles()
        .update_many(
          doc! { "created_by": user_id },
          doc! { "$set": { "created_by": null } },
        )
        .await?;
      Ok(())
    }
  }
}
