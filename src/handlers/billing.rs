// src/handlers/billing.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{
        clock::local_now,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, OnlineBooker, RequireRole, StaffDesk},
    },
    models::{
        booking::{PaymentStatus, Service, ServiceCharge},
        invoice::Invoice,
    },
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddServiceChargePayload {
    pub service_id: i32,
    #[validate(range(min = 1, max = 100, message = "Quantity must be between 1 and 100."))]
    #[schema(example = 2)]
    pub quantity: i32,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStatusPayload {
    pub payment_status: PaymentStatus,
}

// =============================================================================
//  SERVIÇOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Billing",
    responses(
        (status = 200, description = "Catálogo de serviços ativos", body = Vec<Service>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let services = app_state
        .billing_service
        .list_services()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(services)))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}/services",
    tag = "Billing",
    responses(
        (status = 200, description = "Serviços lançados na reserva", body = Vec<ServiceCharge>)
    ),
    params(("id" = i32, Path, description = "ID da reserva")),
    security(("api_jwt" = []))
)]
pub async fn list_service_charges(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let charges = app_state
        .billing_service
        .list_charges(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(charges)))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/services",
    tag = "Billing",
    request_body = AddServiceChargePayload,
    responses(
        (status = 201, description = "Serviço lançado", body = ServiceCharge),
        (status = 409, description = "Reserva não está em check-in")
    ),
    params(("id" = i32, Path, description = "ID da reserva")),
    security(("api_jwt" = []))
)]
pub async fn add_service_charge(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
    Path(id): Path<i32>,
    Json(payload): Json<AddServiceChargePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let charge = app_state
        .billing_service
        .add_service_charge(&app_state.db_pool, id, payload.service_id, payload.quantity, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(charge)))
}

// =============================================================================
//  FECHAMENTO
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/checkout",
    tag = "Billing",
    request_body = CheckoutPayload,
    responses(
        (status = 200, description = "Conta fechada; fatura emitida", body = Invoice),
        (status = 409, description = "Sem turno ativo ou reserva fora de check-in")
    ),
    params(("id" = i32, Path, description = "ID da reserva")),
    security(("api_jwt" = []))
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    locale: Locale,
    staff: RequireRole<StaffDesk>,
    Path(id): Path<i32>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let invoice = app_state
        .billing_service
        .checkout(&app_state.db_pool, id, staff.user().id, payload.note.as_deref(), local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(invoice)))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/pay",
    tag = "Billing",
    request_body = CheckoutPayload,
    responses(
        (status = 200, description = "Pagamento online registrado", body = Invoice),
        (status = 409, description = "Reserva já paga")
    ),
    params(("id" = i32, Path, description = "ID da reserva")),
    security(("api_jwt" = []))
)]
pub async fn pay_online(
    State(app_state): State<AppState>,
    locale: Locale,
    guest: RequireRole<OnlineBooker>,
    Path(id): Path<i32>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let invoice = app_state
        .billing_service
        .pay_online(&app_state.db_pool, id, guest.user(), payload.note.as_deref(), local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(invoice)))
}

// =============================================================================
//  FATURAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Billing",
    responses(
        (status = 200, description = "Faturas emitidas", body = Vec<Invoice>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .billing_service
        .list_invoices()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(invoices)))
}

#[utoipa::path(
    patch,
    path = "/api/invoices/{id}/status",
    tag = "Billing",
    request_body = InvoiceStatusPayload,
    responses(
        (status = 200, description = "Status de pagamento atualizado", body = Invoice),
        (status = 404, description = "Fatura não encontrada")
    ),
    params(("id" = i32, Path, description = "ID da fatura")),
    security(("api_jwt" = []))
)]
pub async fn update_invoice_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<i32>,
    Json(payload): Json<InvoiceStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .billing_service
        .update_invoice_status(&app_state.db_pool, id, payload.payment_status, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(invoice)))
}
