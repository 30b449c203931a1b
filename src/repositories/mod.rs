//! Repositorios de acceso a datos
//!
//! Cada repositorio encapsula las consultas SQL de su agregado sobre el
//! pool compartido de PostgreSQL.

pub mod booking_repository;
pub mod user_repository;
pub mod vehicle_repository;
