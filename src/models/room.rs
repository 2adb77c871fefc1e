// src/models/room.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Standard")]
    pub name: String,
    #[schema(example = "50000.00")]
    pub hourly_rate: Decimal,
    #[schema(example = "300000.00")]
    pub daily_rate: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "101")]
    pub room_number: String,
    pub room_type_id: i32,
    /// Ocupado agora por uma reserva com check-in efetivo.
    pub in_use: bool,
    pub description: Option<String>,
}

// Quarto + tarifas do tipo (JOIN). Usado na listagem e na precificação.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    pub id: i32,
    pub room_number: String,
    pub room_type_id: i32,
    pub in_use: bool,
    pub description: Option<String>,
    pub type_name: String,
    pub hourly_rate: Decimal,
    pub daily_rate: Decimal,
}
