// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Erros de domínio. Os handlers convertem para `ApiError` com o idioma do cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Quarto indisponível")]
    RoomUnavailable,

    #[error("Conflito de reserva no quarto {room_number}")]
    BookingConflict { room_number: String },

    #[error("Reserva já cancelada")]
    AlreadyCancelled,

    #[error("Transição inválida: {0}")]
    InvalidTransition(String),

    #[error("Reserva já paga")]
    AlreadyPaid,

    #[error("Nenhum turno ativo")]
    NoActiveShift,

    #[error("Turno já ativo para o funcionário {0}")]
    ShiftAlreadyActive(i32),

    #[error("Sucessor inválido")]
    InvalidSuccessor,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Recurso em uso: {0}")]
    ResourceInUse(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Resposta de erro enviada ao cliente: sempre `success: false` + mensagem.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.error,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::RoomUnavailable
            | AppError::BookingConflict { .. }
            | AppError::AlreadyCancelled
            | AppError::InvalidTransition(_)
            | AppError::AlreadyPaid
            | AppError::NoActiveShift
            | AppError::ShiftAlreadyActive(_)
            | AppError::InvalidSuccessor
            | AppError::UniqueConstraintViolation(_)
            | AppError::ResourceInUse(_) => StatusCode::CONFLICT,
            AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    // Mensagem voltada ao cliente. Inglês por padrão, vietnamita quando pedido.
    fn client_message(&self, lang: &str) -> String {
        let vi = lang == "vi";
        match self {
            AppError::ValidationError(_) => pick(vi, "One or more fields are invalid.", "Một hoặc nhiều trường không hợp lệ."),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::RoomUnavailable => pick(vi, "The room is not available for the requested period.", "Phòng không còn trống trong thời gian yêu cầu."),
            AppError::BookingConflict { room_number } => if vi {
                format!("Phòng {room_number} đã có người đặt trong thời gian này.")
            } else {
                format!("Room {room_number} is already booked for this period.")
            },
            AppError::AlreadyCancelled => pick(vi, "The booking has already been cancelled.", "Đặt phòng đã bị hủy trước đó."),
            AppError::InvalidTransition(msg) => msg.clone(),
            AppError::AlreadyPaid => pick(vi, "The booking has already been paid.", "Đặt phòng đã được thanh toán."),
            AppError::NoActiveShift => pick(vi, "No active shift found.", "Không tìm thấy ca làm việc hiện tại."),
            AppError::ShiftAlreadyActive(_) => pick(vi, "The staff member already has an active shift.", "Nhân viên đã có ca làm việc đang hoạt động."),
            AppError::InvalidSuccessor => pick(vi, "Invalid successor.", "Người nhận ca không hợp lệ."),
            AppError::ResourceNotFound(what) => if vi {
                format!("Không tìm thấy: {what}.")
            } else {
                format!("Not found: {what}.")
            },
            AppError::UniqueConstraintViolation(what) => if vi {
                format!("Đã tồn tại: {what}.")
            } else {
                format!("Already exists: {what}.")
            },
            AppError::ResourceInUse(what) => if vi {
                format!("Đang được sử dụng: {what}.")
            } else {
                format!("Still in use: {what}.")
            },
            AppError::InvalidToken | AppError::JwtError(_) => pick(vi, "Invalid or missing authentication token.", "Mã xác thực không hợp lệ hoặc bị thiếu."),
            AppError::Forbidden => pick(vi, "You are not allowed to perform this action.", "Bạn không có quyền thực hiện thao tác này."),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => pick(vi, "An unexpected error occurred. Please try again.", "Đã xảy ra lỗi không mong muốn. Vui lòng thử lại."),
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        ApiError {
            status,
            error: self.client_message(&locale.0),
            details,
        }
    }
}

fn pick(vi: bool, en: &str, vi_text: &str) -> String {
    if vi { vi_text.to_string() } else { en.to_string() }
}

fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        details.insert(field.to_string(), json!(messages));
    }
    Value::Object(details)
}

// Sem idioma (ex.: middleware de autenticação) usamos o padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

// Mapeia violação de unicidade do Postgres para um conflito legível.
pub fn map_unique_violation(e: sqlx::Error, what: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(what.to_string());
        }
    }
    AppError::DatabaseError(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_rejections_are_conflicts() {
        assert_eq!(AppError::RoomUnavailable.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NoActiveShift.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::InvalidSuccessor.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ResourceNotFound("room".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("connection reset by peer"));
        let api = err.to_api_error(&Locale("en".into()));
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("connection reset"));
    }

    #[test]
    fn messages_follow_locale() {
        let err = AppError::BookingConflict { room_number: "101".into() };
        let en = err.to_api_error(&Locale("en".into()));
        let vi = err.to_api_error(&Locale("vi".into()));
        assert!(en.error.contains("Room 101"));
        assert!(vi.error.contains("Phòng 101"));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut e = validator::ValidationError::new("length");
        e.message = Some("required".into());
        errors.add("fullName", e);

        let api = AppError::ValidationError(errors).to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["fullName"][0], "required");
    }
}
