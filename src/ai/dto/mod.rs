pub mod text_dto;
