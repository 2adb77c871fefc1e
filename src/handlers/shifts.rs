// src/handlers/shifts.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        clock::local_now,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AdminOnly, RequireRole, StaffDesk},
    },
    models::{
        auth::StaffSummary,
        shift::{CurrentShiftView, Shift, ShiftEndOutcome},
    },
    services::shift_service::{ShiftEndRequest, StuckShiftReport},
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("The amount cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartShiftPayload {
    /// Troco recebido para abrir o caixa
    pub opening_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndShiftPayload {
    /// Só admin: encerrar o turno de outro funcionário
    pub staff_id: Option<i32>,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "1250000")]
    pub collected_total: Decimal,
    /// Valor repassado ao sucessor
    pub handoff_amount: Option<Decimal>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
    pub successor_id: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/shifts/start",
    tag = "Shifts",
    request_body = StartShiftPayload,
    responses(
        (status = 201, description = "Turno aberto", body = Shift),
        (status = 409, description = "Já existe turno ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_shift(
    State(app_state): State<AppState>,
    locale: Locale,
    staff: RequireRole<StaffDesk>,
    Json(payload): Json<StartShiftPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let shift = app_state
        .shift_service
        .start(&app_state.db_pool, staff.user().id, payload.opening_amount, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(shift)))
}

#[utoipa::path(
    get,
    path = "/api/shifts/current",
    tag = "Shifts",
    responses(
        (status = 200, description = "Turno ativo, horas trabalhadas e sucessores possíveis", body = CurrentShiftView),
        (status = 409, description = "Nenhum turno ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn current_shift(
    State(app_state): State<AppState>,
    locale: Locale,
    staff: RequireRole<StaffDesk>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .shift_service
        .current(&app_state.db_pool, staff.user().id, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(view)))
}

#[utoipa::path(
    get,
    path = "/api/shifts/available-staff",
    tag = "Shifts",
    responses(
        (status = 200, description = "Funcionários ativos que podem receber o turno", body = Vec<StaffSummary>)
    ),
    security(("api_jwt" = []))
)]
pub async fn available_staff(
    State(app_state): State<AppState>,
    locale: Locale,
    staff: RequireRole<StaffDesk>,
) -> Result<impl IntoResponse, ApiError> {
    let list = app_state
        .user_repo
        .list_available_staff(Some(staff.user().id))
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(list)))
}

#[utoipa::path(
    post,
    path = "/api/shifts/end",
    tag = "Shifts",
    request_body = EndShiftPayload,
    responses(
        (status = 200, description = "Turno encerrado ou repassado", body = ShiftEndOutcome),
        (status = 409, description = "Sem turno ativo ou sucessor inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn end_shift(
    State(app_state): State<AppState>,
    locale: Locale,
    staff: RequireRole<StaffDesk>,
    Json(payload): Json<EndShiftPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let request = ShiftEndRequest {
        staff_id: payload.staff_id,
        collected_total: payload.collected_total,
        handoff_amount: payload.handoff_amount,
        note: payload.note,
        successor_id: payload.successor_id,
    };

    let outcome = app_state
        .shift_service
        .end(&app_state.db_pool, staff.user(), request, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(outcome)))
}

// Varredura manual (também pode ser chamada por um agendador externo)
#[utoipa::path(
    post,
    path = "/api/shifts/check-stuck",
    tag = "Shifts",
    responses(
        (status = 200, description = "Turnos travados sinalizados", body = StuckShiftReport)
    ),
    security(("api_jwt" = []))
)]
pub async fn check_stuck_shifts(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .shift_service
        .check_stuck(&app_state.db_pool, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(report)))
}
