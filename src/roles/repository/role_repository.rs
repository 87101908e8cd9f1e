use async_trait::async_trait;

use crate::roles::model::role::Role;
use crate::shared::repository::RepositoryError;

#[async_trait]
pub trait RoleRepository: Send + Sync {
  async fn find_one(&self, id: &str) -> Result<Role, RepositoryError>;
  async fn find_all(&self) -> Result<Vec<Role>, RepositoryError>;
  /// Fails with a conflict on `name` if another role already uses it.
  async fn create(&self, role: Role) -> Result<(), RepositoryError>;
  async fn update(&self, role: Role) -> Result<(), RepositoryError>;
  async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
  /// Forgets `user_id` as the creator of any record.
  async fn clear_creator(&self, user_id: &str)
    -> Result<(), RepositoryError>;
}

pub mod in_memory {
  use std::sync::{Arc, RwLock};

  use async_trait::async_trait;

  use super::RoleRepository;
  use crate::roles::model::role::Role;
  use crate::shared::repository::RepositoryError;

  #[derive(Default)]
  pub struct InMemoryRoleRepository {
    pub roles: Arc<RwLock<Vec<Role>>>,
  }

  impl InMemoryRoleRepository {
    pub fn new() -> Self {
      Self::default()
    }
  }

  #[async_trait]
  impl RoleRepository for InMemoryRoleRepository {
    async fn find_one(&self, id: &str) -> Result<Role, RepositoryError> {
      let roles = self.roles.read().unwrap_or_else(|e| e.into_inner());
      roles
        .iter()
        .find(|role| role.id == id)
        .cloned()
        .ok_or(RepositoryError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<Role>, RepositoryError> {
      Ok(self.roles.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn create(&self, role: Role) -> Result<(), RepositoryError> {
      let mut roles = self.roles.write().unwrap_or_else(|e| e.into_inner());
      if roles.iter().any(|existing| existing.name == role.name) {
        return Err(RepositoryError::Conflict("name"));
      }
      roles.push(role);
      Ok(())
    }

    async fn update(&self, role: Role) -> Result<(), RepositoryError> {
      let mut roles = self.roles.write().unwrap_or_else(|e| e.into_inner());
      if roles
        .iter()
        .any(|existing| existing.name == role.name && existing.id != role.id)
      {
        return Err(RepositoryError::Conflict("name"));
      }
      let existing = roles
        .iter_mut()
        .find(|existing| existing.id == role.id)
        .ok_or(RepositoryError::NotFound)?;
      *existing = role;
      Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
      let mut roles = self.roles.write().unwrap_or_else(|e| e.into_inner());
      let before = roles.len();
      roles.retain(|role| role.id != id);
      if roles.len() == before {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn clear_creator(
      &self,
      user_id: &str,
    ) -> Result<(), RepositoryError> {
      let mut roles = self.roles.write().unwrap_or_else(|e| e.into_inner());
      roles
        .iter_mut()
        .filter(|role| role.created_by.as_deref() == Some(user_id))
        .for_each(|role| role.created_by = None);
      Ok(())
    }
  }
}

#[cfg(feature = "mongodb")]
pub mod mongo {
  use async_trait::async_trait;
  use futures::TryStreamExt;
  use mongodb::bson::doc;

  use super::RoleRepository;
  use crate::roles::model::role::Role;
  use crate::shared::database::{map_write_error, MongoDatabase};
  use crate::shared::repository::RepositoryError;

  pub struct MongoRoleRepository {
    database: MongoDatabase,
  }

  impl MongoRoleRepository {
    pub fn new(database: MongoDatabase) -> Self {
      Self { database }
    }

    fn roles(&self) -> mongodb::Collection<Role> {
      self.database.collection("roles")
    }
  }

  #[async_trait]
  impl RoleRepository for MongoRoleRepository {
    async fn find_one(&self, id: &str) -> Result<Role, RepositoryError> {
      self
        .roles()
        .find_one(doc! { "id": id })
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<Role>, RepositoryError> {
      Ok(self.roles().find(doc! {}).await?.try_collect().await?)
    }

    async fn create(&self, role: Role) -> Result<(), RepositoryError> {
      self
        .roles()
        .insert_one(role)
        .await
        .map_err(|error| map_write_error(error, "name"))?;
      Ok(())
    }

    async fn update(&self, role: Role) -> Result<(), RepositoryError> {
      let result = self
        .roles()
        .replace_one(doc! { "id": role.id.as_str() }, role)
        .await
        .map_err(|error| map_write_error(error, "name"))?;
      if result.matched_count == 0 {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
      let result = self.roles().delete_one(doc! { "id": id }).await?;
      if result.deleted_count == 0 {
        return Err(RepositoryError::NotFound);
      }
      Ok(())
    }

    async fn clear_creator(
      &self,
      user_id: &str,
    ) -> Result<(), RepositoryError> {
      self
        .roles()
        .update_many(
          doc! { "created_by": user_id },
          doc! { "$set": { "created_by": null } },
        )
        .await?;
      Ok(())
    }
  }
}
