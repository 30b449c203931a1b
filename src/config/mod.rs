//! Configuración del servicio
//!
//! Este módulo contiene la configuración de base de datos, variables de
//! entorno y la selección de pasarela de pagos.

pub mod database;
pub mod environment;

pub use environment::*;

