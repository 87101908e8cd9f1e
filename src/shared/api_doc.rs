use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::ai::dto::text_dto::{GenerateQuestionsDto, SummarizeDto};
use crate::ai::rto::inference_rto::{
  InferenceErrorRto, QuestionAnswer, QuestionsRto, SummaryRto,
};
use crate::auth::dto::customer_dto::CustomerRegistrationDto;
use crate::auth::dto::login_dto::LoginDto;
use crate::auth::dto::register_dto::RegisterDto;
use crate::auth::dto::token_dto::RefreshTokenDto;
use crate::auth::rto::login_rto::{DetailRto, LoginRto, TokenPairRto};
use crate::profiles::dto::profile_dto::{ProfileDto, UpdateProfileDto};
use crate::profiles::model::profile::Profile;
use crate::roles::dto::role_dto::{CreateRoleDto, UpdateRoleDto};
use crate::roles::model::role::Role;
use crate::shared::http_error::HttpError;
use crate::users::dto::update_user_dto::UpdateUserDto;
use crate::users::rto::user_rto::UserRto;

#[derive(OpenApi)]
#[openapi(
  info(title = "Taille accounts"),
  paths(
    crate::shared::check_health,
    crate::auth::register,
    crate::auth::register_customer,
    crate::auth::login,
    crate::auth::refresh_token,
    crate::auth::logout,
    crate::users::list_users,
    crate::users::me,
    crate::users::get_user,
    crate::users::update_user,
    crate::users::delete_user,
    crate::roles::list_roles,
    crate::roles::get_role,
    crate::roles::create_role,
    crate::roles::update_role,
    crate::roles::delete_role,
    crate::profiles::list_profiles,
    crate::profiles::create_profile,
    crate::profiles::get_profile,
    crate::profiles::update_profile,
    crate::profiles::delete_profile,
    crate::ai::summarize,
    crate::ai::generate_questions,
  ),
  components(schemas(
    HttpError,
    RegisterDto,
    CustomerRegistrationDto,
    LoginDto,
    RefreshTokenDto,
    LoginRto,
    TokenPairRto,
    DetailRto,
    UserRto,
    UpdateUserDto,
    Role,
    CreateRoleDto,
    UpdateRoleDto,
    Profile,
    ProfileDto,
    UpdateProfileDto,
    SummarizeDto,
    GenerateQuestionsDto,
    SummaryRto,
    QuestionsRto,
    QuestionAnswer,
    InferenceErrorRto,
  )),
  modifiers(&BearerSecurity)
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
  fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
    let components = openapi.components.get_or_insert_with(Default::default);
    components.add_security_scheme(
      "bearer",
      SecurityScheme::Http(
        HttpBuilder::new()
          .scheme(HttpAuthScheme::Bearer)
          .bearer_format("JWT")
          .build(),
      ),
    );
  }
}
