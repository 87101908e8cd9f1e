mod ai;
mod auth;
mod profiles;
mod roles;
mod shared;
mod users;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use actix_web_httpauth::middleware::HttpAuthentication;
use ai::model::{HuggingFaceModel, TextModel};
use auth::repository::token_repository::{spawn_purge_task, TokenBlacklist};
use log::info;
use nanoid::nanoid;
use profiles::repository::profile_repository::ProfileRepository;
use rayon::ThreadPoolBuilder;
use roles::repository::role_repository::RoleRepository;
use shared::api_doc::ApiDoc;
use shared::config::Config;
use shared::hash_worker::{HashWorker, Hasher};
use shared::http_error::json_error_handler;
use shared::logger::setup_logger;
use shared::middleware::bearer_middleware::bearer_validator;
use users::repository::user_repository::UserRepository;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};
use utoipa_swagger_ui::SwaggerUi;

pub struct AppState {
  pub user_repository: Arc<dyn UserRepository>,
  pub role_repository: Arc<dyn RoleRepository>,
  pub profile_repository: Arc<dyn ProfileRepository>,
  pub token_blacklist: Arc<dyn TokenBlacklist>,
  pub hasher: Arc<dyn Hasher>,
  pub text_model: Arc<dyn TextModel>,
  pub config: Config,
  /// Verified against when a login names an unknown email.
  pub dummy_hash: String,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  setup_logger();

  let config = Config::from_env();
  config
    .validate()
    .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error))?;

  let thread_pool = ThreadPoolBuilder::new()
    .num_threads(config.hash_threads as usize)
    .build()
    .map_err(io::Error::other)?;
  let hasher: Arc<dyn Hasher> = Arc::new(HashWorker::new(
    thread_pool,
    config.hash_threads,
    config.hash_cost,
  ));
  let dummy_hash = hasher
    .hash_password(&nanoid!())
    .await
    .map_err(io::Error::other)?;

  let text_model: Arc<dyn TextModel> =
    Arc::new(HuggingFaceModel::new(&config));
  let state = web::Data::new(
    build_state(config, hasher, text_model, dummy_hash).await?,
  );

  users::bootstrap_superuser(&state)
    .await
    .map_err(io::Error::other)?;
  spawn_purge_task(
    state.token_blacklist.clone(),
    Duration::from_secs(state.config.blacklist_purge_interval),
  );

  let server_address = state.config.host.clone();
  info!("Listening on http://{}", server_address);
  HttpServer::new(move || {
    App::new()
      .wrap(Logger::default())
      .configure(configure(state.clone()))
  })
  .bind(server_address)?
  .run()
  .await
}

#[cfg(not(feature = "mongodb"))]
async fn build_state(
  config: Config,
  hasher: Arc<dyn Hasher>,
  text_model: Arc<dyn TextModel>,
  dummy_hash: String,
) -> io::Result<AppState> {
  use auth::repository::token_repository::in_memory::InMemoryTokenBlacklist;
  use profiles::repository::profile_repository::in_memory::InMemoryProfileRepository;
  use roles::repository::role_repository::in_memory::InMemoryRoleRepository;
  use users::repository::user_repository::in_memory::InMemoryUserRepository;

  info!("Using in-memory storage");
  Ok(AppState {
    user_repository: Arc::new(InMemoryUserRepository::new()),
    role_repository: Arc::new(InMemoryRoleRepository::new()),
    profile_repository: Arc::new(InMemoryProfileRepository::new()),
    token_blacklist: Arc::new(InMemoryTokenBlacklist::new()),
    hasher,
    text_model,
    config,
    dummy_hash,
  })
}

#[cfg(feature = "mongodb")]
async fn build_state(
  config: Config,
  hasher: Arc<dyn Hasher>,
  text_model: Arc<dyn TextModel>,
  dummy_hash: String,
) -> io::Result<AppState> {
  use auth::repository::token_repository::mongo::MongoTokenBlacklist;
  use profiles::repository::profile_repository::mongo::MongoProfileRepository;
  use roles::repository::role_repository::mongo::MongoRoleRepository;
  use shared::database::MongoDatabase;
  use users::repository::user_repository::mongo::MongoUserRepository;

  let database = MongoDatabase::new(&config)
    .await
    .map_err(io::Error::other)?;
  info!("Using MongoDB database {}", database.database_name);
  Ok(AppState {
    user_repository: Arc::new(MongoUserRepository::new(database.clone())),
    role_repository: Arc::new(MongoRoleRepository::new(database.clone())),
    profile_repository: Arc::new(MongoProfileRepository::new(
      database.clone(),
    )),
    token_blacklist: Arc::new(MongoTokenBlacklist::new(database)),
    hasher,
    text_model,
    config,
    dummy_hash,
  })
}

// Function to initialize the App
fn configure(
  state: web::Data<AppState>,
) -> impl FnOnce(&mut web::ServiceConfig) {
  move |config: &mut web::ServiceConfig| {
    let limits = RateLimits {
      per_second: state.config.rate_limit_per_second,
      burst: state.config.rate_limit_burst,
    };

    config
      .app_data(state)
      .app_data(web::JsonConfig::default().error_handler(json_error_handler))
      .route("/health", web::get().to(shared::check_health))
      .service(
        SwaggerUi::new("/docs/swagger-ui/{_:.*}")
          .url("/schema/openapi.json", ApiDoc::openapi()),
      )
      .service(Scalar::with_url("/docs/scalar", ApiDoc::openapi()))
      .service(
        web::scope("/accounts")
          .configure(|scope| {
            credential_routes(scope, limits, "/token/refresh/", None)
          })
          .service(
            web::scope("/users")
              .wrap(HttpAuthentication::with_fn(bearer_validator))
              .route("/", web::get().to(users::list_users))
              .route("/me/", web::get().to(users::me))
              .service(
                web::resource("/{id}/")
                  .route(web::get().to(users::get_user))
                  .route(web::put().to(users::update_user))
                  .route(web::patch().to(users::update_user))
                  .route(web::delete().to(users::delete_user)),
              ),
          )
          .service(
            web::scope("/roles")
              .wrap(HttpAuthentication::with_fn(bearer_validator))
              .route("/", web::get().to(roles::list_roles))
              .route("/", web::post().to(roles::create_role))
              .service(
                web::resource("/{id}/")
                  .route(web::get().to(roles::get_role))
                  .route(web::put().to(roles::update_role))
                  .route(web::patch().to(roles::update_role))
                  .route(web::delete().to(roles::delete_role)),
              ),
          )
          .service(
            web::scope("/profiles")
              .wrap(HttpAuthentication::with_fn(bearer_validator))
              .route("/", web::get().to(profiles::list_profiles))
              .route("/", web::post().to(profiles::create_profile))
              .service(
                web::resource("/{id}/")
                  .route(web::get().to(profiles::get_profile))
                  .route(web::put().to(profiles::update_profile))
                  .route(web::patch().to(profiles::update_profile))
                  .route(web::delete().to(profiles::delete_profile)),
              ),
          ),
      )
      .service(web::scope("/authentication").configure(|scope| {
        credential_routes(scope, limits, "/refresh/", Some("/customer/"))
      }))
      .service(
        web::scope("/ai")
          .app_data(ai::json_config())
          .route("/summarize/", web::post().to(ai::summarize))
          .route(
            "/generate-questions/",
            web::post().to(ai::generate_questions),
          ),
      );
  }
}

#[derive(Clone, Copy)]
struct RateLimits {
  per_second: u64,
  burst: u32,
}

/// Public, rate limited registration and token endpoints.
fn credential_routes(
  config: &mut web::ServiceConfig,
  limits: RateLimits,
  refresh_path: &str,
  customer_path: Option<&str>,
) {
  // Allow bursts of up to `burst` requests per IP address and replenish
  // `per_second` elements per second
  let governor_config = GovernorConfigBuilder::default()
    .requests_per_second(limits.per_second)
    .burst_size(limits.burst)
    .finish()
    .unwrap_or_default();

  config
    .service(
      web::resource("/register/")
        .wrap(Governor::new(&governor_config))
        .route(web::post().to(auth::register)),
    )
    .service(
      web::resource("/login/")
        .wrap(Governor::new(&governor_config))
        .route(web::post().to(auth::login)),
    )
    .service(
      web::resource(refresh_path)
        .wrap(Governor::new(&governor_config))
        .route(web::post().to(auth::refresh_token)),
    )
    .service(
      web::resource("/logout/")
        .wrap(Governor::new(&governor_config))
        .route(web::post().to(auth::logout)),
    );

  if let Some(customer_path) = customer_path {
    config.service(
      web::resource(customer_path)
        .wrap(Governor::new(&governor_config))
        .route(web::post().to(auth::register_customer)),
    );
  }
}

#[cfg(test)]
mod tests {
  use std::net::SocketAddr;
  use std::str::FromStr;

  use actix_web::http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
  use actix_web::http::StatusCode;
  use actix_web::{test, App};
  use serde_json::{json, Value};

  use super::*;
  use crate::helpers::tests::test_state;
  use crate::users::repository::user_repository::FindOneProperty;

  fn post(uri: &str, body: Value) -> test::TestRequest {
    test::TestRequest::post()
      .uri(uri)
      .peer_addr(SocketAddr::from_str("127.0.0.1:12345").unwrap())
      .append_header((CONTENT_TYPE, HeaderValue::from_static("application/json")))
      .set_json(body)
  }

  fn get(uri: &str, token: &str) -> test::TestRequest {
    test::TestRequest::get()
      .uri(uri)
      .peer_addr(SocketAddr::from_str("127.0.0.1:12345").unwrap())
      .append_header((
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
      ))
  }

  fn register_body(email: &str) -> Value {
    json!({
      "email": email,
      "first_name": "Ada",
      "last_name": "Lovelace",
      "password": "analytical-engine",
      "profile": { "contact_number": "555-0100" }
    })
  }

  #[actix_rt::test]
  async fn test_register_login_refresh_and_logout() {
    let app =
      test::init_service(App::new().configure(configure(test_state().await)))
        .await;

    // 1) Register
    let response = test::call_service(
      &app,
      post("/accounts/register/", register_body("ada@Example.com")).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["data"]["user"]["email"], "ada@example.com");
    assert!(body["data"]["user"].get("password_hash").is_none());

    // 2) Login
    let response = test::call_service(
      &app,
      post(
        "/authentication/login/",
        json!({ "email": "ada@example.com", "password": "analytical-engine" }),
      )
      .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    let access = body["data"]["access"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh"].as_str().unwrap().to_string();

    // 3) The access token authenticates, the refresh token does not
    let response =
      test::call_service(&app, get("/accounts/users/me/", &access).to_request())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response =
      test::call_service(&app, get("/accounts/users/me/", &refresh).to_request())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // 4) Refresh rotates
    let response = test::call_service(
      &app,
      post("/accounts/token/refresh/", json!({ "refresh": refresh }))
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    let rotated = body["data"]["refresh"].as_str().unwrap().to_string();

    // 5) Logout, then the token is spent
    let response = test::call_service(
      &app,
      post("/accounts/logout/", json!({ "refresh": rotated })).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::RESET_CONTENT);

    let response = test::call_service(
      &app,
      post("/authentication/refresh/", json!({ "refresh": rotated }))
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  }

  #[actix_rt::test]
  async fn test_protected_routes_require_bearer() {
    let app =
      test::init_service(App::new().configure(configure(test_state().await)))
        .await;

    let request = test::TestRequest::get()
      .uri("/accounts/profiles/")
      .peer_addr(SocketAddr::from_str("127.0.0.1:12345").unwrap())
      .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
  }

  #[actix_rt::test]
  async fn test_non_admin_sees_only_own_profile() {
    let app =
      test::init_service(App::new().configure(configure(test_state().await)))
        .await;

    let mut tokens = Vec::new();
    for email in ["alice@example.com", "bob@example.com"] {
      let response = test::call_service(
        &app,
        post("/accounts/register/", register_body(email)).to_request(),
      )
      .await;
      assert_eq!(response.status(), StatusCode::CREATED);
      let body: Value = test::read_body_json(response).await;
      tokens.push((
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
        body["data"]["access"].as_str().unwrap().to_string(),
      ));
    }

    let (alice_id, alice_access) = &tokens[0];
    let response = test::call_service(
      &app,
      get("/accounts/profiles/", alice_access).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    let profiles = body["data"].as_array().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["user_id"], alice_id.as_str());

    let response =
      test::call_service(&app, get("/accounts/users/", alice_access).to_request())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
  }

  #[actix_rt::test]
  async fn test_malformed_bodies() {
    let app =
      test::init_service(App::new().configure(configure(test_state().await)))
        .await;

    let response = test::call_service(
      &app,
      post("/accounts/login/", json!({ "email": 42 })).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["status"], "error");

    let response = test::call_service(
      &app,
      post("/ai/summarize/", json!({ "text": "far too short", "ratio": "x" }))
        .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert!(body["error"]
      .as_str()
      .unwrap()
      .starts_with("Invalid request body"));
  }

  #[actix_rt::test]
  async fn test_summarize_short_text_is_rejected() {
    let app =
      test::init_service(App::new().configure(configure(test_state().await)))
        .await;

    let response = test::call_service(
      &app,
      post("/ai/summarize/", json!({ "text": "far too short" })).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Input text must be at least 20 words long.");
  }

  #[actix_rt::test]
  async fn test_health_and_schema() {
    let app =
      test::init_service(App::new().configure(configure(test_state().await)))
        .await;

    let request = test::TestRequest::get().uri("/health").to_request();
    assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

    let request = test::TestRequest::get()
      .uri("/schema/openapi.json")
      .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
  }

  #[actix_rt::test]
  async fn test_missing_required_field_is_a_field_error() {
    let app =
      test::init_service(App::new().configure(configure(test_state().await)))
        .await;

    let response = test::call_service(
      &app,
      post(
        "/accounts/register/",
        json!({
          "email": "ada@example.com",
          "first_name": "Ada",
          "last_name": "Lovelace"
        }),
      )
      .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["errors"]["password"].is_array());
  }

  #[actix_rt::test]
  async fn test_customer_registration_creates_user_and_profile() {
    let state = test_state().await;
    let app =
      test::init_service(App::new().configure(configure(state.clone()))).await;

    let response = test::call_service(
      &app,
      post(
        "/authentication/customer/",
        json!({
          "user": {
            "email": "grace@example.com",
            "first_name": "Grace",
            "last_name": "Hopper",
            "password": "compiler-pioneer"
          },
          "address": "1 Navy Yard",
          "phone_number": "555-0142",
          "date_of_birth": "1906-12-09"
        }),
      )
      .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Customer created successfully");
    let user_id = body["data"]["user"]["id"].as_str().unwrap();

    let profiles = state.profile_repository.find_by_user(user_id).await.unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].address, "1 Navy Yard");
    assert_eq!(profiles[0].contact_number, "555-0142");

    let response = test::call_service(
      &app,
      post(
        "/authentication/customer/",
        json!({ "user": { "email": "grace@example.com" }, "phone_number": "0123456789012345678" }),
      )
      .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert!(body["errors"]["user.password"].is_array());
    assert!(body["errors"]["phone_number"].is_array());
  }

  #[actix_rt::test]
  async fn test_bearer_rejects_inactive_and_deleted_users() {
    let state = test_state().await;
    let app =
      test::init_service(App::new().configure(configure(state.clone()))).await;

    let mut accounts = Vec::new();
    for email in ["carol@example.com", "dave@example.com"] {
      let response = test::call_service(
        &app,
        post("/accounts/register/", register_body(email)).to_request(),
      )
      .await;
      assert_eq!(response.status(), StatusCode::CREATED);
      let body: Value = test::read_body_json(response).await;
      accounts.push((
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
        body["data"]["access"].as_str().unwrap().to_string(),
      ));
    }
    let (carol_id, carol_access) = &accounts[0];
    let (dave_id, dave_access) = &accounts[1];

    let mut carol = state
      .user_repository
      .find_one(FindOneProperty::Id(carol_id))
      .await
      .unwrap();
    carol.is_active = false;
    state.user_repository.update(carol).await.unwrap();
    state.user_repository.delete(dave_id).await.unwrap();

    for access in [carol_access, dave_access] {
      let response =
        test::call_service(&app, get("/accounts/users/me/", access).to_request())
          .await;
      assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
      let body: Value = test::read_body_json(response).await;
      assert_eq!(body["status"], "error");
    }
  }
}
