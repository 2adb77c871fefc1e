// src/models/shift.rs

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::auth::StaffSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "shift_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "shift_action_kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftActionKind {
    Start,
    End,
    Handoff,
}

// Livro de turnos: cada linha é um turno de um funcionário
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: i32,
    pub staff_id: i32,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub status: ShiftStatus,
    /// Valor recebido do turno anterior na passagem.
    pub opening_amount: Option<Decimal>,
    /// Total declarado pelo funcionário ao encerrar.
    pub collected_total: Option<Decimal>,
    /// Soma das faturas pagas vinculadas ao turno.
    pub invoiced_total: Option<Decimal>,
    pub handoff_amount: Option<Decimal>,
    pub successor_id: Option<i32>,
    pub note: Option<String>,
}

// Registro de auditoria das operações de turno
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAction {
    pub id: i32,
    pub shift_id: i32,
    pub staff_id: i32,
    pub kind: ShiftActionKind,
    pub detail: Option<String>,
    pub occurred_at: NaiveDateTime,
}

// Visão do turno corrente para a tela de passagem
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentShiftView {
    pub shift: Shift,
    pub hours_worked: i64,
    #[schema(example = "1250000.00")]
    pub invoiced_total: Decimal,
    pub available_successors: Vec<StaffSummary>,
}

// Resultado do encerramento
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEndOutcome {
    pub ended_shift: Shift,
    pub successor_shift: Option<Shift>,
    pub message: String,
}
