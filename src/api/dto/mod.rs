//! Data Transfer Objects for REST responses.

pub mod lobby_dto;

pub use lobby_dto::*;
