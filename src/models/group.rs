// src/models/group.rs

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::invoice::Invoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "group_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupStatus {
    Processing,
    Paid,
    Cancelled,
}

// Reserva em grupo: vários quartos fechados numa conta só
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupBooking {
    pub id: i32,
    #[schema(example = "Đoàn du lịch Hà Nội")]
    pub name: String,
    pub representative_name: String,
    pub representative_phone: String,
    pub staff_id: i32,
    pub representative_user_id: Option<i32>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    pub status: GroupStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: GroupBooking,
    pub room_ids: Vec<i32>,
    pub booking_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupSettlement {
    pub group_id: i32,
    #[schema(example = "1200000.00")]
    pub total: Decimal,
    pub invoices: Vec<Invoice>,
}
