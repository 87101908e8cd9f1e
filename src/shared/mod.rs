use actix_web::{HttpResponse, Responder};
use serde_json::json;

pub mod api_doc;
pub mod config;
#[cfg(feature = "mongodb")]
pub mod database;
pub mod hash_worker;
pub mod http_error;
pub mod logger;
pub mod middleware;
pub mod permissions;
pub mod repository;

#[utoipa::path(
  get,
  path = "/health",
  responses(
      (status = 200, description = "Check the service health")
  )
)]
pub async fn check_health() -> impl Responder {
  HttpResponse::Ok().json(json!({ "status": "ok" }))
}
