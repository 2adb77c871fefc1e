// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let room_routes = Router::new()
        .route("/room-types", get(handlers::rooms::list_room_types).post(handlers::rooms::create_room_type))
        .route(
            "/room-types/{id}",
            put(handlers::rooms::update_room_type).delete(handlers::rooms::delete_room_type),
        )
        .route("/rooms", get(handlers::rooms::list_rooms).post(handlers::rooms::create_room))
        .route("/rooms/refresh-status", post(handlers::rooms::refresh_room_status))
        .route(
            "/rooms/{id}",
            get(handlers::rooms::get_room)
                .put(handlers::rooms::update_room)
                .delete(handlers::rooms::delete_room),
        )
        .route("/rooms/{id}/occupancy", patch(handlers::rooms::set_room_occupancy))
        .route("/rooms/{id}/availability", get(handlers::rooms::check_availability));

    let booking_routes = Router::new()
        .route("/bookings/walk-in", post(handlers::bookings::create_walk_in))
        .route("/bookings/online", post(handlers::bookings::create_online))
        .route("/bookings/{id}", get(handlers::bookings::get_booking))
        .route("/bookings/{id}/cancel", post(handlers::bookings::cancel_booking))
        .route("/bookings/{id}/status", patch(handlers::bookings::update_booking_status))
        .route(
            "/bookings/{id}/services",
            get(handlers::billing::list_service_charges).post(handlers::billing::add_service_charge),
        )
        .route("/bookings/{id}/checkout", post(handlers::billing::checkout))
        .route("/bookings/{id}/pay", post(handlers::billing::pay_online))
        .route("/guests/{document_number}", get(handlers::bookings::find_guest));

    let billing_routes = Router::new()
        .route("/services", get(handlers::billing::list_services))
        .route("/invoices", get(handlers::billing::list_invoices))
        .route("/invoices/{id}/status", patch(handlers::billing::update_invoice_status));

    let group_routes = Router::new()
        .route("/groups", get(handlers::groups::list_groups).post(handlers::groups::save_group))
        .route("/groups/{id}/bookings", post(handlers::groups::assign_booking))
        .route("/groups/{id}/merge-bill", post(handlers::groups::merge_bill));

    let shift_routes = Router::new()
        .route("/shifts/start", post(handlers::shifts::start_shift))
        .route("/shifts/current", get(handlers::shifts::current_shift))
        .route("/shifts/available-staff", get(handlers::shifts::available_staff))
        .route("/shifts/end", post(handlers::shifts::end_shift))
        .route("/shifts/check-stuck", post(handlers::shifts::check_stuck_shifts));

    let notification_routes = Router::new()
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route("/notifications/{id}/read", post(handlers::notifications::mark_read));

    // Tudo em /api exige token válido
    let api_routes = Router::new()
        .merge(room_routes)
        .merge(booking_routes)
        .merge(billing_routes)
        .merge(group_routes)
        .merge(shift_routes)
        .merge(notification_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
