use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use super::config::Config;
use super::repository::RepositoryError;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDatabase {
  pub mongo_client: Client,
  pub database_name: String,
}

impl MongoDatabase {
  pub async fn new(config: &Config) -> Result<Self, RepositoryError> {
    let mongo_client = Client::with_uri_str(&config.mongodb_uri).await?;
    let database = Self {
      mongo_client,
      database_name: config.mongodb_database.clone(),
    };
    database.create_indexes().await?;
    Ok(database)
  }

  pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
    self
      .mongo_client
      .database(&self.database_name)
      .collection(name)
  }

  async fn create_indexes(&self) -> Result<(), RepositoryError> {
    let unique = [
      ("users", doc! { "id": 1 }),
      ("users", doc! { "email": 1 }),
      ("roles", doc! { "id": 1 }),
      ("roles", doc! { "name": 1 }),
      ("profiles", doc! { "id": 1 }),
      ("profiles", doc! { "user_id": 1 }),
      ("token_blacklist", doc! { "jti": 1 }),
    ];
    for (collection, keys) in unique {
      let index = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build();
      self
        .collection::<Document>(collection)
        .create_index(index)
        .await?;
    }
    Ok(())
  }
}

/// Maps a duplicate key write failure onto a conflict on `field`.
pub fn map_write_error(
  error: mongodb::error::Error,
  field: &'static str,
) -> RepositoryError {
  match error.kind.as_ref() {
    ErrorKind::Write(WriteFailure::WriteError(write_error))
      if write_error.code == DUPLICATE_KEY =>
    {
      RepositoryError::Conflict(field)
    }
    _ => RepositoryError::Mongo(error),
  }
}
