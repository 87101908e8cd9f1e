pub mod update_user_dto;
