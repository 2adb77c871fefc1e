// src/models/invoice.rs

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::booking::PaymentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash, // Balcão
    Card, // Pagamento online do hóspede
}

// Fatura imutável: só o status de pagamento pode mudar depois de emitida
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i32,
    pub shift_id: Option<i32>,
    pub booking_id: Option<i32>,
    pub group_id: Option<i32>,
    pub issued_at: NaiveDateTime,
    #[schema(example = "190000.00")]
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub note: Option<String>,
}

// Fatura ainda não persistida
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub shift_id: Option<i32>,
    pub booking_id: i32,
    pub group_id: Option<i32>,
    pub issued_at: NaiveDateTime,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub note: Option<String>,
}
