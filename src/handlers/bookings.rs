// src/handlers/bookings.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{OnlineBooker, RequireRole, StaffDesk},
    },
    models::{
        auth::Role,
        booking::{Booking, BookingDetail, BookingKind, BookingStatus},
        guest::{Guest, GuestInput},
    },
    services::booking_service::{OnlineBooking, WalkInBooking},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestPayload {
    #[validate(
        length(min = 1, max = 100, message = "The guest name is required."),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Nguyễn Văn An")]
    pub full_name: String,
    #[validate(
        length(min = 1, max = 20, message = "The document type is required."),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "CCCD")]
    pub document_type: String,
    #[validate(
        length(min = 1, max = 20, message = "The document number is required."),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "079201001234")]
    pub document_number: String,
    #[validate(length(max = 200))]
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub nationality: Option<String>,
}

impl GuestPayload {
    fn to_input(&self) -> GuestInput {
        GuestInput::normalized(
            &self.full_name,
            &self.document_type,
            &self.document_number,
            self.address.as_deref(),
            self.nationality.as_deref(),
        )
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalkInPayload {
    pub room_id: i32,
    pub kind: BookingKind,
    #[validate(nested)]
    pub guest: GuestPayload,
    /// Entrada futura (reserva por telefone). Vazio = agora.
    pub expected_check_in: Option<NaiveDate>,
    pub expected_check_out: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OnlineBookingPayload {
    pub room_id: i32,
    #[serde(default = "default_online_kind")]
    pub kind: BookingKind,
    #[validate(nested)]
    pub guest: GuestPayload,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

fn default_online_kind() -> BookingKind {
    BookingKind::Daily
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: BookingStatus,
}

// =============================================================================
//  CRIAÇÃO
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/bookings/walk-in",
    tag = "Bookings",
    request_body = WalkInPayload,
    responses(
        (status = 201, description = "Reserva de balcão criada", body = Booking),
        (status = 409, description = "Quarto ocupado ou período em conflito")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_walk_in(
    State(app_state): State<AppState>,
    locale: Locale,
    staff: RequireRole<StaffDesk>,
    Json(payload): Json<WalkInPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let request = WalkInBooking {
        room_id: payload.room_id,
        kind: payload.kind,
        guest: payload.guest.to_input(),
        expected_check_in: payload.expected_check_in,
        expected_check_out: payload.expected_check_out,
    };

    let booking = app_state
        .booking_service
        .create_walk_in(&app_state.db_pool, staff.user().id, request, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    post,
    path = "/api/bookings/online",
    tag = "Bookings",
    request_body = OnlineBookingPayload,
    responses(
        (status = 201, description = "Reserva online criada; confirmação enviada por e-mail", body = Booking),
        (status = 400, description = "Datas inválidas"),
        (status = 409, description = "Quarto indisponível no período")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_online(
    State(app_state): State<AppState>,
    locale: Locale,
    guest: RequireRole<OnlineBooker>,
    Json(payload): Json<OnlineBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let request = OnlineBooking {
        room_id: payload.room_id,
        kind: payload.kind,
        guest: payload.guest.to_input(),
        check_in: payload.check_in,
        check_out: payload.check_out,
    };

    let booking = app_state
        .booking_service
        .create_online(&app_state.db_pool, guest.user().id, request, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// =============================================================================
//  CONSULTA
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    responses(
        (status = 200, description = "Reserva com quarto e hóspede", body = BookingDetail),
        (status = 404, description = "Reserva não encontrada")
    ),
    params(("id" = i32, Path, description = "ID da reserva")),
    security(("api_jwt" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .booking_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    // Hóspede só enxerga as próprias reservas
    if user.0.role == Role::Guest && detail.booking.owner_user_id != Some(user.0.id) {
        return Err(AppError::ResourceNotFound("booking".to_string()).to_api_error(&locale));
    }

    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/guests/{document_number}",
    tag = "Bookings",
    responses(
        (status = 200, description = "Hóspede cadastrado", body = Guest),
        (status = 404, description = "Documento não encontrado")
    ),
    params(("document_number" = String, Path, description = "Número do documento")),
    security(("api_jwt" = []))
)]
pub async fn find_guest(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
    Path(document_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let guest = app_state
        .booking_service
        .find_guest(&document_number)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(guest)))
}

// =============================================================================
//  CICLO DE VIDA
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    tag = "Bookings",
    responses(
        (status = 200, description = "Reserva cancelada", body = Booking),
        (status = 409, description = "Reserva já cancelada ou encerrada")
    ),
    params(("id" = i32, Path, description = "ID da reserva")),
    security(("api_jwt" = []))
)]
pub async fn cancel_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .cancel(&app_state.db_pool, id, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(booking)))
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/status",
    tag = "Bookings",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Booking),
        (status = 409, description = "Transição inválida")
    ),
    params(("id" = i32, Path, description = "ID da reserva")),
    security(("api_jwt" = []))
)]
pub async fn update_booking_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _staff: RequireRole<StaffDesk>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .update_status(&app_state.db_pool, id, payload.status, local_now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(booking)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest() -> GuestPayload {
        GuestPayload {
            full_name: "Nguyễn Văn An".into(),
            document_type: "CCCD".into(),
            document_number: "079201001234".into(),
            address: Some("12 Lê Lợi, Huế".into()),
            nationality: Some("Việt Nam".into()),
        }
    }

    #[test]
    fn guest_fields_fit_their_columns() {
        assert!(guest().validate().is_ok());

        let mut long_document = guest();
        long_document.document_number = "9".repeat(45);
        assert!(long_document.validate().is_err());

        let mut long_type = guest();
        long_type.document_type = "X".repeat(25);
        assert!(long_type.validate().is_err());

        let mut long_address = guest();
        long_address.address = Some("a".repeat(500));
        assert!(long_address.validate().is_err());

        let mut long_nationality = guest();
        long_nationality.nationality = Some("n".repeat(51));
        assert!(long_nationality.validate().is_err());

        // Limite conta caracteres, não bytes
        let mut accented = guest();
        accented.full_name = "Đ".repeat(100);
        assert!(accented.validate().is_ok());
    }

    #[test]
    fn blank_guest_fields_are_rejected() {
        let blank = GuestPayload {
            full_name: "   ".into(),
            document_type: " ".into(),
            document_number: "\t".into(),
            address: None,
            nationality: None,
        };
        let errors = blank.validate().expect_err("blank payload");
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("document_type"));
        assert!(fields.contains_key("document_number"));
    }

    #[test]
    fn walk_in_validates_the_nested_guest() {
        let mut payload = WalkInPayload {
            room_id: 101,
            kind: BookingKind::Hourly,
            guest: guest(),
            expected_check_in: None,
            expected_check_out: None,
        };
        assert!(payload.validate().is_ok());

        payload.guest.document_number = "  ".into();
        assert!(payload.validate().is_err());
    }
}
