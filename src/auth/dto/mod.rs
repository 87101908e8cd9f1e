pub mod customer_dto;
pub mod login_dto;
pub mod register_dto;
pub mod token_dto;
