// src/handlers/rooms.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::validate_not_blank;

use crate::{
    common::{
        clock::local_now,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{AdminOnly, RequireRole, StaffDesk},
    },
    models::room::{Room, RoomDetail, RoomType},
    services::room_service::AvailabilityReport,
};

// ---
// Validação Customizada
// ---
fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("The rate must be greater than zero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomTypePayload {
    #[validate(
        length(min = 1, max = 50, message = "The name is required."),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "50000")]
    pub hourly_rate: Decimal,
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "300000")]
    pub daily_rate: Decimal,
    pub description: Option<String>,
}

// Campos ausentes mantêm o valor atual
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomTypePayload {
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub daily_rate: Option<Decimal>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomPayload {
    #[validate(
        length(min = 1, max = 10, message = "The room number is required."),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "101")]
    pub room_number: String,
    pub room_type_id: i32,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomPayload {
    #[validate(length(min = 1, max = 10), custom(function = "validate_not_blank"))]
    pub room_number: Option<String>,
    pub room_type_id: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomOccupancyPayload {
    pub in_use: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// Data de entrada (YYYY-MM-DD)
    pub check_in: NaiveDate,
    /// Data de saída (YYYY-MM-DD)
    pub check_out: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusRefresh {
    pub rooms_promoted: u64,
}

// =============================================================================
//  TIPOS DE QUARTO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/room-types",
    tag = "Rooms",
    responses(
        (status = 200, description = "Tipos de quarto e tarifas", body = Vec<RoomType>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_room_types(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let types = app_state
        .room_service
        .list_room_types()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(types)))
}

#[utoipa::path(
    post,
    path = "/api/room-types",
    tag = "Rooms",
    request_body = CreateRoomTypePayload,
    responses(
        (status = 201, description = "Tipo de quarto criado", body = RoomType),
        (status = 400, description = "Tarifas inválidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_room_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminOnly>,
    Json(payload): Json<CreateRoomTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let room_type = app_state
        .room_service
        .create_room_type(
            &app_state.db_pool,
            &payload.name,
            payload.hourly_rate,
            payload.daily_rate,
            payload.description.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(room_type)))
}

#[utoipa::path(
    put,
    path = "/api/room-types/{id}",
    tag = "Rooms",
    request_body = UpdateRoomTypePayload,
    responses(
        (status = 200, description = "Tipo de quarto atualizado", body = RoomType),
        (status = 404, description = "Tipo não encontrado")
    ),
    params(("id" = i32, Path, description = "ID do tipo de quarto")),
    security(("api_jwt" = []))
)]
pub async fn update_room_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoomTypePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let room_type = app_state
        .room_service
        .update_room_type(
            &app_state.db_pool,
            id,
            payload.name.as_deref(),
            payload.hourly_rate,
            payload.daily_rate,
            payload.description.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(room_type)))
}

#[utoipa::path(
    delete,
    path = "/api/room-types/{id}",
    tag = "Rooms",
    responses(
        (status = 204, description = "Tipo removido"),
        (status = 409, description = "Ainda existem quartos deste tipo")
    ),
    params(("id" = i32, Path, description = "ID do tipo de quarto")),
    security(("api_jwt" = []))
)]
pub async fn delete_room_type(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .room_service
        .delete_room_type(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  QUARTOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    responses(
        (status = 200, description = "Quartos com tipo e ocupação", body = Vec<RoomDetail>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_rooms(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let rooms = app_state
        .room_service
        .list_rooms()
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(rooms)))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    responses(
        (status = 200, description = "Quarto", body = RoomDetail),
        (status = 404, description = "Quarto não encontrado")
    ),
    params(("id" = i32, Path, description = "ID do quarto")),
    security(("api_jwt" = []))
)]
pub async fn get_room(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let room = app_state
        .room_service
        .get_room(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(room)))
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Rooms",
    request_body = CreateRoomPayload,
    responses(
        (status = 201, description = "Quarto criado", body = Room),
        (status = 409, description = "Número de quarto já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_room(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminOnly>,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let room = app_state
        .room_service
        .create_room(
            &app_state.db_pool,
            &payload.room_number,
            payload.room_type_id,
            payload.description.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    put,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    request_body = UpdateRoomPayload,
    responses(
        (status = 200, description = "Quarto atualizado", body = Room),
        (status = 404, description = "Quarto ou tipo não encontrado")
    ),
    params(("id" = i32, Path, description = "ID do quarto")),
    security(("api_jwt" = []))
)]
pub async fn update_room(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let room = app_state
        .room_service
        .update_room(
            &app_state.db_pool,
            id,
            payload.room_number.as_deref(),
            payload.room_type_id,
            payload.description.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(room)))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{id}",
    tag = "Rooms",
    responses(
        (status = 204, description = "Quarto removido"),
        (status = 409, description = "Quarto com reservas ativas")
    ),
    params(("id" = i32, Path, description = "ID do quarto")),
    security(("api_jwt" = []))
)]
pub async fn delete_room(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireRole<AdminOnly>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .room_service
        .delete_room(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/rooms/{id}/occupancy",
    tag = "Rooms",
    request_body = RoomOccupancyPayload,
    responses(
        (status = 200, description = "Ocupação ajustada", body = RoomDetail)
    ),
    params(("id" = i32, Path, description = "ID do quarto")),
    security(("api_jwt" = []))
)]
pub async fn set_room_occupancy(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
    Path(id): Path<i32>,
    Json(payload): Json<RoomOccupancyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let room = app_state
        .room_service
        .set_in_use(&app_state.db_pool, id, payload.in_use)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(room)))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}/availability",
    tag = "Rooms",
    params(
        ("id" = i32, Path, description = "ID do quarto"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Disponibilidade do quarto no período", body = AvailabilityReport),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn check_availability(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let today = local_now().date();

    let report = app_state
        .room_service
        .check_availability(&app_state.db_pool, id, query.check_in, query.check_out, today)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(report)))
}

// Promove a "ocupado" os quartos cuja entrada já chegou
#[utoipa::path(
    post,
    path = "/api/rooms/refresh-status",
    tag = "Rooms",
    responses(
        (status = 200, description = "Quantidade de quartos atualizados", body = RoomStatusRefresh)
    ),
    security(("api_jwt" = []))
)]
pub async fn refresh_room_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
) -> Result<impl IntoResponse, ApiError> {
    let today = local_now().date();

    let rooms_promoted = app_state
        .booking_service
        .refresh_room_status(&app_state.db_pool, today)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(RoomStatusRefresh { rooms_promoted })))
}
