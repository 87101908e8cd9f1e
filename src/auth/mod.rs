use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use dto::customer_dto::CustomerRegistrationDto;
use dto::login_dto::LoginDto;
use dto::register_dto::RegisterDto;
use dto::token_dto::RefreshTokenDto;
use log::{error, info, warn};
use repository::token_repository::BlacklistedToken;
use rto::login_rto::{DetailRto, LoginRto, TokenPairRto};
use token::{
  decode_refresh_token, issue_access_token, issue_refresh_token,
  issue_token_pair, RefreshTokenClaims,
};
use validator::Validate;

use crate::profiles::model::profile::Profile;
use crate::shared::http_error::{field_errors, ApiError, HttpError, HttpSuccess};
use crate::shared::repository::RepositoryError;
use crate::users::model::user::{normalize_email, User};
use crate::users::repository::user_repository::FindOneProperty;
use crate::users::rto::user_rto::UserRto;
use crate::AppState;

pub mod dto;
pub mod repository;
pub mod rto;
pub mod token;

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_TOKEN: &str = "Token is invalid or expired";
const BLACKLISTED_TOKEN: &str = "Token is blacklisted";

#[utoipa::path(
  post,
  path = "/accounts/register/",
  request_body = RegisterDto,
  responses(
    (status = 201, description = "User registered", body = LoginRto),
    (status = 400, description = "Validation failed", body = HttpError)
  )
)]
pub async fn register(
  data: web::Data<AppState>,
  dto: web::Json<RegisterDto>,
) -> Result<HttpResponse, ApiError> {
  let dto = dto.into_inner();
  validate_registration(&dto)?;
  let rto = create_account(&data, dto).await?;
  Ok(HttpSuccess::respond(
    StatusCode::CREATED,
    "User registered successfully",
    rto,
  ))
}

#[utoipa::path(
  post,
  path = "/authentication/customer/",
  request_body = CustomerRegistrationDto,
  responses(
    (status = 201, description = "Customer registered", body = LoginRto),
    (status = 400, description = "Validation failed", body = HttpError)
  )
)]
pub async fn register_customer(
  data: web::Data<AppState>,
  dto: web::Json<CustomerRegistrationDto>,
) -> Result<HttpResponse, ApiError> {
  let dto = dto.into_inner();
  let mut errors = match dto.user.validate() {
    Ok(()) => Default::default(),
    Err(errors) => field_errors(&errors, "user."),
  };
  if let Err(customer_errors) = dto.validate() {
    errors.extend(field_errors(&customer_errors, ""));
  }
  if !errors.is_empty() {
    return Err(ApiError::Validation(errors));
  }

  // The only field error left at this point belongs to the nested user.
  let rto = create_account(&data, dto.into()).await.map_err(|error| match error {
    ApiError::Validation(errors) => ApiError::Validation(
      errors
        .into_iter()
        .map(|(field, messages)| (format!("user.{}", field), messages))
        .collect(),
    ),
    other => other,
  })?;
  Ok(HttpSuccess::respond(
    StatusCode::CREATED,
    "Customer created successfully",
    rto,
  ))
}

/// Creates the user and, when given, its profile. A failed profile write
/// removes the user again.
async fn create_account(
  data: &AppState,
  dto: RegisterDto,
) -> Result<LoginRto, ApiError> {
  let email = normalize_email(&dto.email);
  match data
    .user_repository
    .find_one(FindOneProperty::Email(&email))
    .await
  {
    Ok(_) => return Err(email_taken()),
    Err(RepositoryError::NotFound) => {}
    Err(error) => return Err(error.into()),
  }

  let password_hash = data
    .hasher
    .hash_password(&dto.password)
    .await
    .map_err(|error| ApiError::Internal(error.to_string()))?;

  let user = User::new(email, dto.first_name, dto.last_name, password_hash);
  data
    .user_repository
    .create(user.clone())
    .await
    .map_err(|error| match error {
      RepositoryError::Conflict(_) => email_taken(),
      other => other.into(),
    })?;

  if let Some(profile_dto) = dto.profile {
    let profile = Profile::from(profile_dto, user.id.clone(), None);
    if let Err(error) = data.profile_repository.create(profile).await {
      if let Err(rollback) = data.user_repository.delete(&user.id).await {
        error!("Failed to roll back user {}: {}", user.id, rollback);
      }
      return Err(error.into());
    }
  }

  info!("Registered user {}", user.id);
  let tokens = issue_token_pair(&data.config, &user)
    .map_err(|error| ApiError::Internal(error.to_string()))?;

  Ok(LoginRto {
    access: tokens.access,
    refresh: tokens.refresh,
    user: UserRto::from(user),
  })
}

fn validate_registration(dto: &RegisterDto) -> Result<(), ApiError> {
  let mut errors = match dto.validate() {
    Ok(()) => Default::default(),
    Err(errors) => field_errors(&errors, ""),
  };
  if let Some(Err(profile_errors)) =
    dto.profile.as_ref().map(|profile| profile.validate())
  {
    errors.extend(field_errors(&profile_errors, "profile."));
  }
  if errors.is_empty() {
    Ok(())
  } else {
    Err(ApiError::Validation(errors))
  }
}

fn email_taken() -> ApiError {
  ApiError::field("email", "A user with this email already exists.")
}

#[utoipa::path(
  post,
  path = "/accounts/login/",
  request_body = LoginDto,
  responses(
    (status = 200, description = "Authenticated", body = LoginRto),
    (status = 400, description = "Validation failed", body = HttpError),
    (status = 401, description = "Invalid credentials", body = HttpError)
  )
)]
pub async fn login(
  data: web::Data<AppState>,
  dto: web::Json<LoginDto>,
) -> Result<HttpResponse, ApiError> {
  dto.validate()?;

  let email = normalize_email(&dto.email);
  let user = match data
    .user_repository
    .find_one(FindOneProperty::Email(&email))
    .await
  {
    Ok(user) => Some(user),
    Err(RepositoryError::NotFound) => None,
    Err(error) => return Err(error.into()),
  };

  // Unknown addresses are checked against a throwaway hash so the response
  // time does not reveal whether the account exists.
  let password_hash = user
    .as_ref()
    .map(|user| user.password_hash.as_str())
    .unwrap_or(data.dummy_hash.as_str());
  let verified = data
    .hasher
    .verify_password(&dto.password, password_hash)
    .await
    .unwrap_or_else(|error| {
      warn!("Password verification failed: {}", error);
      false
    });

  let user = match user {
    Some(user) if verified && user.is_active => user,
    _ => {
      warn!("Failed login attempt");
      return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }
  };

  info!("User {} logged in", user.id);
  let tokens = issue_token_pair(&data.config, &user)
    .map_err(|error| ApiError::Internal(error.to_string()))?;

  Ok(HttpSuccess::respond(
    StatusCode::OK,
    "Login successful",
    LoginRto {
      access: tokens.access,
      refresh: tokens.refresh,
      user: UserRto::from(user),
    },
  ))
}

#[utoipa::path(
  post,
  path = "/accounts/token/refresh/",
  request_body = RefreshTokenDto,
  responses(
    (status = 200, description = "New token pair", body = TokenPairRto),
    (status = 400, description = "Invalid or blacklisted token", body = HttpError)
  )
)]
pub async fn refresh_token(
  data: web::Data<AppState>,
  dto: web::Json<RefreshTokenDto>,
) -> Result<HttpResponse, ApiError> {
  let token = required_refresh_token(&dto)?;
  let claims = decode_refresh_token(&data.config, token)
    .map_err(|_| ApiError::BadRequest(INVALID_TOKEN.to_string()))?;

  let user = match data
    .user_repository
    .find_one(FindOneProperty::Id(&claims.sub))
    .await
  {
    Ok(user) if user.is_active => user,
    Ok(_) | Err(RepositoryError::NotFound) => {
      return Err(ApiError::BadRequest(INVALID_TOKEN.to_string()))
    }
    Err(error) => return Err(error.into()),
  };

  let refresh = if data.config.rotate_refresh_tokens {
    // Spending the presented token and checking it was unspent is a single
    // blacklist insert.
    if !data.token_blacklist.blacklist(blacklist_entry(&claims)).await? {
      return Err(ApiError::BadRequest(BLACKLISTED_TOKEN.to_string()));
    }
    issue_refresh_token(&data.config, &user)
      .map_err(|error| ApiError::Internal(error.to_string()))?
  } else {
    if data.token_blacklist.is_blacklisted(&claims.jti).await? {
      return Err(ApiError::BadRequest(BLACKLISTED_TOKEN.to_string()));
    }
    token.to_string()
  };

  let access = issue_access_token(&data.config, &user)
    .map_err(|error| ApiError::Internal(error.to_string()))?;

  Ok(HttpSuccess::respond(
    StatusCode::OK,
    "Token refreshed",
    TokenPairRto { access, refresh },
  ))
}

#[utoipa::path(
  post,
  path = "/accounts/logout/",
  request_body = RefreshTokenDto,
  responses(
    (status = 205, description = "Refresh token blacklisted", body = DetailRto),
    (status = 400, description = "Missing, invalid or blacklisted token", body = HttpError)
  )
)]
pub async fn logout(
  data: web::Data<AppState>,
  dto: web::Json<RefreshTokenDto>,
) -> Result<HttpResponse, ApiError> {
  let token = required_refresh_token(&dto)?;
  let claims = decode_refresh_token(&data.config, token)
    .map_err(|_| ApiError::BadRequest(INVALID_TOKEN.to_string()))?;

  if !data.token_blacklist.blacklist(blacklist_entry(&claims)).await? {
    return Err(ApiError::BadRequest(BLACKLISTED_TOKEN.to_string()));
  }

  info!("User {} logged out", claims.sub);
  Ok(HttpResponse::ResetContent().json(DetailRto {
    detail: String::from("Logout successful."),
  }))
}

fn required_refresh_token(dto: &RefreshTokenDto) -> Result<&str, ApiError> {
  dto
    .refresh
    .as_deref()
    .filter(|token| !token.is_empty())
    .ok_or_else(|| ApiError::BadRequest("Refresh token is required.".into()))
}

fn blacklist_entry(claims: &RefreshTokenClaims) -> BlacklistedToken {
  BlacklistedToken {
    jti: claims.jti.clone(),
    user_id: claims.sub.clone(),
    expires_at: DateTime::from_timestamp(claims.exp as i64, 0)
      .unwrap_or_else(Utc::now),
    blacklisted_at: Utc::now(),
  }
}

#[cfg(test)]
mod tests {
  use actix_web::http::StatusCode;
  use fake::{
    faker::internet::en::{Password, SafeEmail},
    Fake,
  };

  use super::*;
  use crate::helpers::tests::{
    parse_http_response, test_state, test_state_with_config,
  };
  use crate::profiles::dto::profile_dto::ProfileDto;
  use crate::shared::config::tests::test_config;
  use crate::shared::hash_worker::{HashWorkerError, MockHasher};

  fn register_dto() -> RegisterDto {
    RegisterDto {
      email: SafeEmail().fake(),
      first_name: String::from("Ada"),
      last_name: String::from("Lovelace"),
      password: Password(12..13).fake(),
      profile: None,
    }
  }

  async fn registered(
    data: &web::Data<AppState>,
    dto: RegisterDto,
  ) -> LoginRto {
    let response = register(data.clone(), web::Json(dto)).await;
    let envelope: HttpSuccess<LoginRto> =
      parse_http_response(response, StatusCode::CREATED).await;
    envelope.data
  }

  #[actix_web::test]
  async fn test_register_hashes_password_and_issues_tokens() {
    let data = test_state().await;
    let dto = register_dto();
    let password = dto.password.clone();

    let rto = registered(&data, dto).await;

    let stored = data
      .user_repository
      .find_one(FindOneProperty::Id(&rto.user.id))
      .await
      .unwrap();
    assert_ne!(stored.password_hash, password);
    assert!(!rto.access.is_empty());
    assert!(!rto.refresh.is_empty());
  }

  #[actix_web::test]
  async fn test_register_duplicate_email_fails_without_writes() {
    let data = test_state().await;
    let dto = register_dto();
    registered(&data, dto.clone()).await;

    // Same address with the domain in upper case normalizes to a duplicate.
    let (local, domain) = dto.email.split_once('@').unwrap();
    let mut duplicate = register_dto();
    duplicate.email = format!("{}@{}", local, domain.to_uppercase());
    let response = register(data.clone(), web::Json(duplicate)).await;
    let error: HttpError =
      parse_http_response(response, StatusCode::BAD_REQUEST).await;

    assert!(error.errors.unwrap().contains_key("email"));
    assert_eq!(data.user_repository.find_all().await.unwrap().len(), 1);
  }

  #[actix_web::test]
  async fn test_register_rejects_short_password() {
    let data = test_state().await;
    let mut dto = register_dto();
    dto.password = String::from("short");

    let response = register(data.clone(), web::Json(dto)).await;
    let error: HttpError =
      parse_http_response(response, StatusCode::BAD_REQUEST).await;

    assert!(error.errors.unwrap().contains_key("password"));
    assert!(data.user_repository.find_all().await.unwrap().is_empty());
  }

  #[actix_web::test]
  async fn test_register_with_profile_creates_linked_profile() {
    let data = test_state().await;
    let mut dto = register_dto();
    dto.profile = Some(ProfileDto {
      contact_number: String::from("+441234567"),
      ..Default::default()
    });

    let rto = registered(&data, dto).await;

    let profiles = data
      .profile_repository
      .find_by_user(&rto.user.id)
      .await
      .unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].contact_number, "+441234567");
  }

  #[actix_web::test]
  async fn test_register_invalid_profile_reports_prefixed_field() {
    let data = test_state().await;
    let mut dto = register_dto();
    dto.profile = Some(ProfileDto {
      contact_number: String::from("0123456789012345678"),
      ..Default::default()
    });

    let response = register(data.clone(), web::Json(dto)).await;
    let error: HttpError =
      parse_http_response(response, StatusCode::BAD_REQUEST).await;

    assert!(error.errors.unwrap().contains_key("profile.contact_number"));
    assert!(data.user_repository.find_all().await.unwrap().is_empty());
  }

  #[actix_web::test]
  async fn test_register_hash_failure_is_internal_error() {
    let mut hasher = MockHasher::new();
    hasher
      .expect_hash_password()
      .returning(|_| Err(HashWorkerError::Send));
    let data = crate::helpers::tests::test_state_with_hasher(hasher).await;

    let response = register(data.clone(), web::Json(register_dto())).await;
    let _: HttpError =
      parse_http_response(response, StatusCode::INTERNAL_SERVER_ERROR).await;
    assert!(data.user_repository.find_all().await.unwrap().is_empty());
  }

  #[actix_web::test]
  async fn test_login_success_and_uniform_failures() {
    let data = test_state().await;
    let dto = register_dto();
    registered(&data, dto.clone()).await;

    let response = login(
      data.clone(),
      web::Json(LoginDto {
        email: dto.email.clone(),
        password: dto.password.clone(),
      }),
    )
    .await;
    let envelope: HttpSuccess<LoginRto> =
      parse_http_response(response, StatusCode::OK).await;
    assert_eq!(envelope.data.user.email, dto.email);

    let wrong_password = login(
      data.clone(),
      web::Json(LoginDto {
        email: dto.email.clone(),
        password: String::from("wrong-password"),
      }),
    )
    .await;
    let wrong_password: HttpError =
      parse_http_response(wrong_password, StatusCode::UNAUTHORIZED).await;

    let unknown_email = login(
      data.clone(),
      web::Json(LoginDto {
        email: SafeEmail().fake(),
        password: dto.password.clone(),
      }),
    )
    .await;
    let unknown_email: HttpError =
      parse_http_response(unknown_email, StatusCode::UNAUTHORIZED).await;

    assert_eq!(wrong_password.message, unknown_email.message);
  }

  #[actix_web::test]
  async fn test_refresh_rotates_and_rejects_reuse() {
    let data = test_state().await;
    let rto = registered(&data, register_dto()).await;

    let response = refresh_token(
      data.clone(),
      web::Json(RefreshTokenDto {
        refresh: Some(rto.refresh.clone()),
      }),
    )
    .await;
    let envelope: HttpSuccess<TokenPairRto> =
      parse_http_response(response, StatusCode::OK).await;
    assert_ne!(envelope.data.refresh, rto.refresh);

    let reused = refresh_token(
      data.clone(),
      web::Json(RefreshTokenDto {
        refresh: Some(rto.refresh),
      }),
    )
    .await;
    let _: HttpError =
      parse_http_response(reused, StatusCode::BAD_REQUEST).await;
  }

  #[actix_web::test]
  async fn test_refresh_rejects_access_token() {
    let data = test_state().await;
    let rto = registered(&data, register_dto()).await;

    let response = refresh_token(
      data.clone(),
      web::Json(RefreshTokenDto {
        refresh: Some(rto.access),
      }),
    )
    .await;
    let error: HttpError =
      parse_http_response(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(error.message, INVALID_TOKEN);
  }

  #[actix_web::test]
  async fn test_logout_blacklists_refresh_token() {
    let data = test_state().await;
    let rto = registered(&data, register_dto()).await;

    let response = logout(
      data.clone(),
      web::Json(RefreshTokenDto {
        refresh: Some(rto.refresh.clone()),
      }),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::RESET_CONTENT);

    let after_logout = refresh_token(
      data.clone(),
      web::Json(RefreshTokenDto {
        refresh: Some(rto.refresh),
      }),
    )
    .await;
    let error: HttpError =
      parse_http_response(after_logout, StatusCode::BAD_REQUEST).await;
    assert_eq!(error.message, BLACKLISTED_TOKEN);
  }

  #[actix_web::test]
  async fn test_logout_requires_token() {
    let data = test_state().await;
    let response =
      logout(data.clone(), web::Json(RefreshTokenDto::default())).await;
    let error: HttpError =
      parse_http_response(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(error.message, "Refresh token is required.");
  }

  #[actix_web::test]
  async fn test_refresh_without_rotation_echoes_token() {
    let mut config = test_config();
    config.rotate_refresh_tokens = false;
    let data = test_state_with_config(config).await;
    let rto = registered(&data, register_dto()).await;

    for _ in 0..2 {
      let response = refresh_token(
        data.clone(),
        web::Json(RefreshTokenDto {
          refresh: Some(rto.refresh.clone()),
        }),
      )
      .await;
      let envelope: HttpSuccess<TokenPairRto> =
        parse_http_response(response, StatusCode::OK).await;
      assert_eq!(envelope.data.refresh, rto.refresh);
    }

    logout(
      data.clone(),
      web::Json(RefreshTokenDto {
        refresh: Some(rto.refresh.clone()),
      }),
    )
    .await
    .unwrap();
    let after_logout = refresh_token(
      data.clone(),
      web::Json(RefreshTokenDto {
        refresh: Some(rto.refresh),
      }),
    )
    .await;
    let error: HttpError =
      parse_http_response(after_logout, StatusCode::BAD_REQUEST).await;
    assert_eq!(error.message, BLACKLISTED_TOKEN);
  }

  #[actix_web::test]
  async fn test_inactive_user_cannot_login() {
    let data = test_state().await;
    let dto = register_dto();
    let rto = registered(&data, dto.clone()).await;

    let mut user = data
      .user_repository
      .find_one(FindOneProperty::Id(&rto.user.id))
      .await
      .unwrap();
    user.is_active = false;
    data.user_repository.update(user).await.unwrap();

    let response = login(
      data.clone(),
      web::Json(LoginDto {
        email: dto.email,
        password: dto.password,
      }),
    )
    .await;
    let error: HttpError =
      parse_http_response(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(error.message, INVALID_CREDENTIALS);
  }

  #[actix_web::test]
  async fn test_customer_with_taken_email_reports_nested_field() {
    let data = test_state().await;
    let existing = register_dto();
    registered(&data, existing.clone()).await;

    let response = register_customer(
      data.clone(),
      web::Json(CustomerRegistrationDto {
        user: existing,
        address: String::from("12 Analytical Row"),
        ..Default::default()
      }),
    )
    .await;
    let error: HttpError =
      parse_http_response(response, StatusCode::BAD_REQUEST).await;

    assert!(error.errors.unwrap().contains_key("user.email"));
    assert_eq!(data.user_repository.find_all().await.unwrap().len(), 1);
    assert!(data.profile_repository.find_all().await.unwrap().is_empty());
  }
}
