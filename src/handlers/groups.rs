// src/handlers/groups.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::validate_not_blank;

use crate::{
    common::{
        clock::local_now,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{RequireRole, StaffDesk},
    },
    models::{
        booking::Booking,
        group::{GroupDetail, GroupSettlement},
    },
    services::group_service::GroupRequest,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupPayload {
    #[validate(
        length(min = 1, max = 100, message = "The group name is required."),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(
        length(min = 1, max = 100, message = "The representative name is required."),
        custom(function = "validate_not_blank")
    )]
    pub representative_name: String,
    #[validate(
        length(min = 1, max = 20, message = "The representative phone is required."),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "0901234567")]
    pub representative_phone: String,
    pub representative_user_id: Option<i32>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    #[serde(default)]
    pub room_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignBookingPayload {
    pub booking_id: i32,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeBillPayload {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/groups",
    tag = "Groups",
    responses(
        (status = 200, description = "Grupos com quartos e reservas", body = Vec<GroupDetail>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_groups(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = app_state
        .group_service
        .list(&app_state.db_pool)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(groups)))
}

// Mesmo nome de um grupo aberto = atualização
#[utoipa::path(
    post,
    path = "/api/groups",
    tag = "Groups",
    request_body = GroupPayload,
    responses(
        (status = 200, description = "Grupo criado ou atualizado", body = GroupDetail),
        (status = 404, description = "Quarto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_group(
    State(app_state): State<AppState>,
    locale: Locale,
    staff: RequireRole<StaffDesk>,
    Json(payload): Json<GroupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let request = GroupRequest {
        name: payload.name,
        representative_name: payload.representative_name,
        representative_phone: payload.representative_phone,
        representative_user_id: payload.representative_user_id,
        check_in_date: payload.check_in_date,
        check_out_date: payload.check_out_date,
        room_ids: payload.room_ids,
    };

    let group = app_state
        .group_service
        .create_or_update(&app_state.db_pool, staff.user().id, request, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(group)))
}

#[utoipa::path(
    post,
    path = "/api/groups/{id}/bookings",
    tag = "Groups",
    request_body = AssignBookingPayload,
    responses(
        (status = 200, description = "Reserva vinculada ao grupo", body = Booking),
        (status = 409, description = "Grupo fechado ou reserva fora de check-in")
    ),
    params(("id" = i32, Path, description = "ID do grupo")),
    security(("api_jwt" = []))
)]
pub async fn assign_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
    Path(id): Path<i32>,
    Json(payload): Json<AssignBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .group_service
        .assign_booking(&app_state.db_pool, payload.booking_id, id, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(booking)))
}

#[utoipa::path(
    post,
    path = "/api/groups/{id}/merge-bill",
    tag = "Groups",
    request_body = MergeBillPayload,
    responses(
        (status = 200, description = "Conta do grupo fechada; uma fatura por reserva", body = GroupSettlement),
        (status = 409, description = "Sem turno ativo ou membro fora de check-in")
    ),
    params(("id" = i32, Path, description = "ID do grupo")),
    security(("api_jwt" = []))
)]
pub async fn merge_bill(
    State(app_state): State<AppState>,
    locale: Locale,
    staff: RequireRole<StaffDesk>,
    Path(id): Path<i32>,
    Json(payload): Json<MergeBillPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let settlement = app_state
        .group_service
        .merge_bill(&app_state.db_pool, id, staff.user().id, payload.note.as_deref(), local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(settlement)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_payload_matches_column_limits() {
        let mut payload = GroupPayload {
            name: "Đoàn Hà Nội".into(),
            representative_name: "Hoàng Lan".into(),
            representative_phone: "0901234567".into(),
            representative_user_id: None,
            check_in_date: None,
            check_out_date: None,
            room_ids: vec![],
        };
        assert!(payload.validate().is_ok());

        payload.representative_phone = "0".repeat(21);
        assert!(payload.validate().is_err());

        payload.representative_phone = "0901234567".into();
        payload.name = "   ".into();
        assert!(payload.validate().is_err());
    }
}
