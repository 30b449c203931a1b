pub mod auth_dto;
pub mod booking_dto;
pub mod common_dto;
pub mod vehicle_dto;
