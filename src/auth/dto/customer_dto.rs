use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use validator_derive::Validate;

use super::register_dto::RegisterDto;
use crate::profiles::dto::profile_dto::ProfileDto;

/// A user together with the customer details kept on their profile.
#[derive(ToSchema, Debug, Clone, Default, Deserialize, Validate)]
pub struct CustomerRegistrationDto {
  /// `user.profile` is ignored; the customer fields below take its place.
  #[serde(default)]
  pub user: RegisterDto,
  #[validate(length(
    max = 255,
    message = "Ensure this field has no more than 255 characters."
  ))]
  #[serde(default)]
  pub address: String,
  #[validate(length(
    max = 15,
    message = "Ensure this field has no more than 15 characters."
  ))]
  #[serde(default)]
  pub phone_number: String,
  pub date_of_birth: Option<NaiveDate>,
}

impl From<CustomerRegistrationDto> for RegisterDto {
  fn from(dto: CustomerRegistrationDto) -> Self {
    RegisterDto {
      profile: Some(ProfileDto {
        date_of_birth: dto.date_of_birth,
        contact_number: dto.phone_number,
        address: dto.address,
        ..Default::default()
      }),
      ..dto.user
    }
  }
}
