use chrono::Utc;
use jsonwebtoken::{
  decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use nanoid::nanoid;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::shared::config::Config;
use crate::users::model::user::User;

#[derive(Debug, Error)]
pub enum TokenError {
  #[error("Token is invalid or expired: {0}")]
  Jwt(#[from] jsonwebtoken::errors::Error),
  #[error("Token has wrong type")]
  WrongType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
  Access,
  Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
  pub sub: String,
  pub email: String,
  pub is_staff: bool,
  pub token_type: TokenType,
  pub jti: String,
  pub iat: u64,
  pub exp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
  pub sub: String,
  pub token_type: TokenType,
  pub jti: String,
  pub iat: u64,
  pub exp: u64,
}

/// Only the discriminator, decoded first so a token of the other kind is
/// reported as such rather than as a missing claim.
#[derive(Deserialize)]
struct TokenKind {
  token_type: TokenType,
}

pub struct TokenPair {
  pub access: String,
  pub refresh: String,
}

pub fn issue_access_token(
  config: &Config,
  user: &User,
) -> Result<String, TokenError> {
  let now = Utc::now().timestamp() as u64;
  generate_jwt(
    config,
    &AccessTokenClaims {
      sub: user.id.clone(),
      email: user.email.clone(),
      is_staff: user.is_staff,
      token_type: TokenType::Access,
      jti: nanoid!(),
      iat: now,
      exp: now + config.access_token_expiry,
    },
  )
}

pub fn issue_refresh_token(
  config: &Config,
  user: &User,
) -> Result<String, TokenError> {
  let now = Utc::now().timestamp() as u64;
  generate_jwt(
    config,
    &RefreshTokenClaims {
      sub: user.id.clone(),
      token_type: TokenType::Refresh,
      jti: nanoid!(),
      iat: now,
      exp: now + config.refresh_token_expiry,
    },
  )
}

pub fn issue_token_pair(
  config: &Config,
  user: &User,
) -> Result<TokenPair, TokenError> {
  Ok(TokenPair {
    access: issue_access_token(config, user)?,
    refresh: issue_refresh_token(config, user)?,
  })
}

pub fn decode_access_token(
  config: &Config,
  token: &str,
) -> Result<AccessTokenClaims, TokenError> {
  decode_typed(config, token, TokenType::Access)
}

pub fn decode_refresh_token(
  config: &Config,
  token: &str,
) -> Result<RefreshTokenClaims, TokenError> {
  decode_typed(config, token, TokenType::Refresh)
}

fn decode_typed<T: DeserializeOwned>(
  config: &Config,
  token: &str,
  expected: TokenType,
) -> Result<T, TokenError> {
  let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
  let validation = Validation::new(Algorithm::HS256);

  let kind = decode::<TokenKind>(token, &key, &validation)?.claims;
  if kind.token_type != expected {
    return Err(TokenError::WrongType);
  }
  Ok(decode::<T>(token, &key, &validation)?.claims)
}

fn generate_jwt<T: Serialize>(
  config: &Config,
  claims: &T,
) -> Result<String, TokenError> {
  Ok(encode(
    &Header::new(Algorithm::HS256),
    claims,
    &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
  )?)
}
