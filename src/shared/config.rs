use std::env;
use std::str::FromStr;

use log::warn;
use thiserror::Error;

const DEV_JWT_SECRET: &str = "DEV_JWT_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("{0} must be greater than zero")]
  Zero(&'static str),
  #[error("SUPERUSER_EMAIL and SUPERUSER_PASSWORD must be set together")]
  PartialSuperuser,
}

#[derive(Clone, Debug)]
pub struct Config {
  pub host: String,
  pub jwt_secret: String,
  pub access_token_expiry: u64,
  pub refresh_token_expiry: u64,
  pub rotate_refresh_tokens: bool,
  pub hash_threads: u32,
  pub hash_cost: u32,
  pub rate_limit_per_second: u64,
  pub rate_limit_burst: u32,
  pub blacklist_purge_interval: u64,
  pub inference_url: String,
  pub inference_token: Option<String>,
  pub summarization_model: String,
  pub question_generation_model: String,
  pub superuser_email: Option<String>,
  pub superuser_password: Option<String>,
  #[cfg(feature = "mongodb")]
  pub mongodb_uri: String,
  #[cfg(feature = "mongodb")]
  pub mongodb_database: String,
}

impl Config {
  pub fn from_env() -> Self {
    dotenvy::dotenv().ok();

    Self {
      host: var_or("HOST", "0.0.0.0:3000".to_string()),
      jwt_secret: var_or("JWT_SECRET", DEV_JWT_SECRET.to_string()),
      access_token_expiry: var_or("ACCESS_TOKEN_EXPIRY_SECS", 15 * 60),
      refresh_token_expiry: var_or(
        "REFRESH_TOKEN_EXPIRY_SECS",
        7 * 24 * 60 * 60,
      ),
      rotate_refresh_tokens: var_or("ROTATE_REFRESH_TOKENS", true),
      hash_threads: var_or("HASH_THREADS", 4),
      hash_cost: var_or("HASH_COST", bcrypt::DEFAULT_COST),
      rate_limit_per_second: var_or("RATE_LIMIT_PER_SECOND", 2),
      rate_limit_burst: var_or("RATE_LIMIT_BURST", 5),
      blacklist_purge_interval: var_or("BLACKLIST_PURGE_SECS", 60 * 60),
      inference_url: var_or(
        "INFERENCE_URL",
        "https://api-inference.huggingface.co".to_string(),
      ),
      inference_token: env::var("INFERENCE_TOKEN").ok(),
      summarization_model: var_or(
        "SUMMARIZATION_MODEL",
        "facebook/bart-large-cnn".to_string(),
      ),
      question_generation_model: var_or(
        "QUESTION_GENERATION_MODEL",
        "valhalla/t5-base-qg-hl".to_string(),
      ),
      superuser_email: env::var("SUPERUSER_EMAIL").ok(),
      superuser_password: env::var("SUPERUSER_PASSWORD").ok(),
      #[cfg(feature = "mongodb")]
      mongodb_uri: var_or(
        "MONGODB_URI",
        "mongodb://localhost:27017".to_string(),
      ),
      #[cfg(feature = "mongodb")]
      mongodb_database: var_or("MONGODB_DATABASE", "accounts".to_string()),
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.jwt_secret == DEV_JWT_SECRET {
      warn!("Using the development JWT secret, set JWT_SECRET in production");
    }
    if self.access_token_expiry == 0 {
      return Err(ConfigError::Zero("ACCESS_TOKEN_EXPIRY_SECS"));
    }
    if self.refresh_token_expiry == 0 {
      return Err(ConfigError::Zero("REFRESH_TOKEN_EXPIRY_SECS"));
    }
    if self.hash_threads == 0 {
      return Err(ConfigError::Zero("HASH_THREADS"));
    }
    if self.rate_limit_per_second == 0 {
      return Err(ConfigError::Zero("RATE_LIMIT_PER_SECOND"));
    }
    if self.rate_limit_burst == 0 {
      return Err(ConfigError::Zero("RATE_LIMIT_BURST"));
    }
    if self.blacklist_purge_interval == 0 {
      return Err(ConfigError::Zero("BLACKLIST_PURGE_SECS"));
    }
    if self.superuser_email.is_some() != self.superuser_password.is_some() {
      return Err(ConfigError::PartialSuperuser);
    }
    Ok(())
  }
}

// Unparsable values fall back to the default with a warning.
fn var_or<T: FromStr>(key: &str, default: T) -> T {
  match env::var(key) {
    Ok(value) => value.parse().unwrap_or_else(|_| {
      warn!("Ignoring invalid value for {}: {:?}", key, value);
      default
    }),
    Err(_) => default,
  }
}
