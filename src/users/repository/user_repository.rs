use async_trait::async_trait;

use crate::shared::repository::RepositoryError;
use crate::users::model::user::User;

pub enum FindOneProperty<'a> {
  Id(&'a str),
  Email(&'a str),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
  async fn find_one(
    &self,
    property: FindOneProperty<'_>,
  ) -> Result<User, RepositoryError>;
  async fn find_all(&self) -> Result<Vec<User>, RepositoryError>;
  /// Fails with a conflict on `email` if the address is taken.
  async fn create(&self, user: User) -> Result<(), RepositoryError>;
  async fn update(&self, user: User) -> Result<(), RepositoryError>;
  async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
  /// Detaches every user from the given role.
  async fn clear_role(&self, role_id: &str) -> Result<(), RepositoryError>;
  /// Forgets `user_id` as the creator of any record.
  async fn clear_creator(&self, user_id: &str)
    -> Result<(), RepositoryError>;
}

// ### In-memory implementation ###

pub mod in_memory {
  use std::sync::{Arc, RwLock};

  use async_trait::async_trait;

  use super::{FindOneProperty, UserRepository};
  use crate::shared::repository::RepositoryError;
  use crate::users::model::user::User;

  #[derive(Default)]
  pub struct InMemoryUserRepository {
    pub users: Arc<RwLock<Vec<User>>>,
  }

  impl InMemoryUserRepository {
    pub fn new() -> Self {
      Self::default()
    }
  }

  #[async_trait]
  impl UserRepository for InMemoryUserRepository {
    async fn find_one(
      &self,
      property: FindOneProperty<'_>,
    ) -> Result<User, RepositoryError> {
      let users = self.users.read().unwrap_or_else(|e| e.into_inner());
      users
        .iter()
        .find(|user| match property {
          FindOneProperty::Id(id) => user.id == id,
          FindOneProperty::Email(email) => user.email == email,
        })
        .cloned()
        .ok_or(RepositoryError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
      Ok(self.users.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn create(&self, user: User) -> Result<(), RepositoryError> {
      let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
      if users.iter().any(|existing| existing.email == user.email) {
        return Err(RepositoryError::Conflict("email"));
      }
      users.push(user);
      Ok(())
    }

    async fn update(&self, user: User) -> Result<(), RepositoryError> {
      let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
      if users
        .iter()
        .any(|existing| existing.email == user.email && existing.id != user.id)
      {
        return Err(RepositoryError::Conflict("email"));
      }
      let existing = users
        .iter_mut()
        .find(|existing| existing.id == user.id)
        .ok_or(RepositoryError::NotFound)?;
      *existing = user;
      Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
      let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
      let before = users.len();
      users.retain(|user| user.id != id);
      if users.len() == before {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn clear_role(&self, role_id: &str) -> Result<(), RepositoryError> {
      let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
      users
        .iter_mut()
        .filter(|user| user.role_id.as_deref() == Some(role_id))
        .for_each(|user| user.role_id = None);
      Ok(())
    }

    async fn clear_creator(
      &self,
      user_id: &str,
    ) -> Result<(), RepositoryError> {
      let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
      users
        .iter_mut()
        .filter(|user| user.created_by.as_deref() == Some(user_id))
        .for_each(|user| user.created_by = None);
      Ok(())
    }
  }
}

// ### MongoDB implementation ###

#[cfg(feature = "mongodb")]
pub mod mongo {
  use async_trait::async_trait;
  use futures::TryStreamExt;
  use mongodb::bson::{doc, Document};

  use super::{FindOneProperty, UserRepository};
  use crate::shared::database::{map_write_error, MongoDatabase};
  use crate::shared::repository::RepositoryError;
  use crate::users::model::user::User;

  impl FindOneProperty<'_> {
    fn to_mongo_key_value(&self) -> Document {
      match self {
        FindOneProperty::Id(id) => doc! { "id": *id },
        FindOneProperty::Email(email) => doc! { "email": *email },
      }
    }
  }

  pub struct MongoUserRepository {
    database: MongoDatabase,
  }

  impl MongoUserRepository {
    pub fn new(database: MongoDatabase) -> Self {
      Self { database }
    }

    fn users(&self) -> mongodb::Collection<User> {
      self.database.collection("users")
    }
  }

  #[async_trait]
  impl UserRepository for MongoUserRepository {
    async fn find_one(
      &self,
      property: FindOneProperty<'_>,
    ) -> Result<User, RepositoryError> {
      self
        .users()
        .find_one(property.to_mongo_key_value())
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
      Ok(self.users().find(doc! {}).await?.try_collect().await?)
    }

    async fn create(&self, user: User) -> Result<(), RepositoryError> {
      self
        .users()
        .insert_one(user)
        .await
        .map_err(|error| map_write_error(error, "email"))?;
      Ok(())
    }

    async fn update(&self, user: User) -> Result<(), RepositoryError> {
      let result = self
        .users()
        .replace_one(doc! { "id": user.id.as_str() }, user)
        .await
        .map_err(|error| map_write_error(error, "email"))?;
      if result.matched_count == 0 {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
      let result = self.users().delete_one(doc! { "id": id }).await?;
      if result.deleted_count == 0 {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn clear_role(&self, role_id: &str) -> Result<(), RepositoryError> {
      self
        .users()
        .update_many(
          doc! { "role_id": role_id },
          doc! { "$set": { "role_id": null } },
        )
        .await?;
      Ok(())
    }

    async fn clear_creator(
      &self,
      user_id: &str,
    ) -> Result<(), RepositoryError> {
      self
        .users()
        .update_many(
          doc! { "created_by": user_id },
          doc! { "$set": { "created_by": null } },
        )
        .await?;
      Ok(())
    }
  }
}
