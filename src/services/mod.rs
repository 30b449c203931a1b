//! Services module
//!
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan operaciones que pueden involucrar múltiples
//! modelos o integraciones externas.

pub mod availability_service;
pub mod jwt_service;
pub mod payment_gateway;
pub mod payment_service;
pub mod pricing_service;
