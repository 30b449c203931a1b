mod config;
mod state;
mod database;
mod services;
mod utils;
mod models;
mod middleware;
mod controllers;
mod repositories;
mod routes;
mod dto;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use config::environment::EnvironmentConfig;
use database::DatabaseConnection;
use middleware::cors::{cors_middleware, cors_middleware_with_origins};
use services::payment_gateway::gateway_from_config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Car Rental Reservations - API de reservas");
    info!("============================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new_default().await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    db_connection.run_migrations().await?;
    let pool = db_connection.pool().clone();

    // Pasarela de pagos según configuración (stripe o mock)
    let gateway = gateway_from_config(&config)?;
    info!("✅ Pasarela de pagos inicializada: {}", config.payment_gateway_provider);

    // CORS: permisivo en desarrollo, restringido a los orígenes
    // configurados en producción
    let cors = if config.is_production() {
        cors_middleware_with_origins(&config.cors_origins)
    } else {
        cors_middleware()
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app_state = AppState::new(pool, config, gateway);

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", routes::auth_routes::create_auth_router(app_state.clone()))
        .nest(
            "/api/vehicles",
            routes::vehicle_routes::create_vehicle_router(app_state.clone()),
        )
        .nest(
            "/api/bookings",
            routes::booking_routes::create_booking_router(app_state.clone()),
        )
        .layer(cors)
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🔐 Endpoints - Auth:");
    info!("   POST /api/auth/register - Registrar usuario");
    info!("   POST /api/auth/login - Login");
    info!("   POST /api/auth/refresh - Refrescar tokens");
    info!("   GET  /api/auth/me - Perfil actual");
    info!("   PUT  /api/auth/me - Actualizar perfil");
    info!("🚙 Endpoints - Vehicles:");
    info!("   POST /api/vehicles - Registrar vehículo");
    info!("   GET  /api/vehicles - Buscar en el catálogo");
    info!("   GET  /api/vehicles/mine - Mis vehículos");
    info!("   GET  /api/vehicles/:id - Obtener vehículo");
    info!("   PUT  /api/vehicles/:id - Actualizar vehículo");
    info!("   PATCH /api/vehicles/:id/status - Cambiar estado");
    info!("   DELETE /api/vehicles/:id - Eliminar vehículo");
    info!("   GET  /api/vehicles/:id/availability - Disponibilidad");
    info!("   GET  /api/vehicles/:id/reviews - Reseñas");
    info!("   POST /api/vehicles/:id/reviews - Publicar reseña");
    info!("📅 Endpoints - Bookings:");
    info!("   POST /api/bookings - Crear reserva");
    info!("   GET  /api/bookings - Mis reservas");
    info!("   GET  /api/bookings/check-availability - Disponibilidad");
    info!("   GET  /api/bookings/:id - Obtener reserva");
    info!("   PUT  /api/bookings/:id - Modificar reserva");
    info!("   POST /api/bookings/:id/confirm - Confirmar");
    info!("   POST /api/bookings/:id/cancel - Cancelar");
    info!("   POST /api/bookings/:id/start - Iniciar alquiler");
    info!("   POST /api/bookings/:id/complete - Completar alquiler");
    info!("   POST /api/bookings/:id/no-show - Marcar no-show");
    info!("   GET  /api/bookings/:id/payments - Pagos de la reserva");
    info!("   POST /api/bookings/:id/payments - Registrar pago");
    info!("   POST /api/bookings/:id/payments/process - Cargar por pasarela");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check del servicio
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "car-rental-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
