// src/models/booking.rs

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::{
    common::clock::{end_of_day, start_of_day},
    models::auth::{Role, User},
};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    CheckedIn,
    CheckedOut,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tenancy_report_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenancyReportStatus {
    NotReported,
    Reported,
}

// Cobrança por hora ou por diária
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingKind {
    Hourly,
    Daily,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i32,
    pub room_id: i32,
    pub guest_id: i32,
    pub staff_id: i32,
    pub owner_user_id: Option<i32>,
    pub group_id: Option<i32>,
    pub discount_id: Option<i32>,
    pub kind: BookingKind,
    pub check_in_at: NaiveDateTime,
    pub expected_check_in: Option<NaiveDate>,
    pub expected_check_out: Option<NaiveDate>,
    pub check_out_at: Option<NaiveDateTime>,
    /// `None` é legado e vale como `CheckedIn`.
    pub status: Option<BookingStatus>,
    pub payment_status: PaymentStatus,
    pub tenancy_report_status: TenancyReportStatus,
    /// Horas ou diárias cobradas no fechamento.
    pub billed_units: Option<i32>,
    #[schema(example = "150000.00")]
    pub room_charge: Option<Decimal>,
    pub service_charge: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn effective_status(&self) -> BookingStatus {
        self.status.unwrap_or(BookingStatus::CheckedIn)
    }

    pub fn is_checked_in(&self) -> bool {
        self.effective_status() == BookingStatus::CheckedIn
    }

    // A reserva é a que ocupa o quarto hoje?
    pub fn is_occupying(&self, today: NaiveDate) -> bool {
        self.is_checked_in() && self.occupancy_start_date() <= today
    }

    /// Pagamento online: só o dono da reserva (ou um admin).
    pub fn can_be_paid_by(&self, user: &User) -> bool {
        user.role == Role::Admin || self.owner_user_id == Some(user.id)
    }

    pub fn occupancy_start_date(&self) -> NaiveDate {
        self.expected_check_in
            .unwrap_or_else(|| self.check_in_at.date())
    }
}

// Reserva com número do quarto e nome do hóspede (consulta)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub room_number: String,
    pub guest_name: String,
}

// Janela de ocupação de uma reserva existente (checagem de conflito)
#[derive(Debug, Clone, FromRow)]
pub struct BookingWindow {
    pub id: i32,
    pub check_in_at: NaiveDateTime,
    pub expected_check_out: Option<NaiveDate>,
    pub check_out_at: Option<NaiveDateTime>,
}

impl BookingWindow {
    /// Fim da ocupação: saída real, senão a prevista; `None` = em aberto.
    /// Saída prevista no dia da entrada ocupa até a meia-noite.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.check_out_at.or_else(|| {
            self.expected_check_out.map(|date| {
                if date <= self.check_in_at.date() {
                    end_of_day(self.check_in_at.date())
                } else {
                    start_of_day(date)
                }
            })
        })
    }
}

// --- Catálogo de serviços e lançamentos ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i32,
    #[schema(example = "Nước suối")]
    pub name: String,
    #[schema(example = "20000.00")]
    pub price: Decimal,
    pub is_active: bool,
}

// Linha de consumo: o preço unitário é congelado no momento do lançamento
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCharge {
    pub id: i32,
    pub booking_id: i32,
    pub service_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn sample_booking() -> Booking {
        let check_in = NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("valid date");
        Booking {
            id: 1,
            room_id: 101,
            guest_id: 1,
            staff_id: 2,
            owner_user_id: None,
            group_id: None,
            discount_id: None,
            kind: BookingKind::Hourly,
            check_in_at: check_in,
            expected_check_in: None,
            expected_check_out: None,
            check_out_at: None,
            status: None,
            payment_status: PaymentStatus::Unpaid,
            tenancy_report_status: TenancyReportStatus::NotReported,
            billed_units: None,
            room_charge: None,
            service_charge: None,
            discount_amount: None,
            created_at: check_in,
            updated_at: check_in,
        }
    }

    #[test]
    fn only_owner_or_admin_can_pay_online() {
        use crate::models::auth::UserStatus;

        let mut booking = sample_booking();
        booking.owner_user_id = Some(7);
        let user = |id, role| User {
            id,
            full_name: "Lê Văn Cường".into(),
            email: None,
            phone: None,
            role,
            status: UserStatus::Active,
            created_at: booking.created_at,
        };

        assert!(booking.can_be_paid_by(&user(7, Role::Guest)));
        assert!(booking.can_be_paid_by(&user(1, Role::Admin)));
        assert!(!booking.can_be_paid_by(&user(8, Role::Guest)));
    }

    #[test]
    fn legacy_null_status_counts_as_checked_in() {
        let booking = sample_booking();
        assert_eq!(booking.effective_status(), BookingStatus::CheckedIn);
        assert!(booking.is_checked_in());
    }

    #[test]
    fn future_reservation_does_not_occupy_today() {
        let mut booking = sample_booking();
        booking.expected_check_in = NaiveDate::from_ymd_opt(2025, 6, 5);
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        assert!(!booking.is_occupying(today));

        booking.expected_check_in = Some(today);
        assert!(booking.is_occupying(today));

        booking.status = Some(BookingStatus::Cancelled);
        assert!(!booking.is_occupying(today));
    }

    #[test]
    fn window_end_prefers_actual_check_out() {
        let planned = NaiveDate::from_ymd_opt(2025, 6, 3).expect("valid date");
        let actual = NaiveDate::from_ymd_opt(2025, 6, 2)
            .and_then(|d| d.and_hms_opt(11, 0, 0))
            .expect("valid date");
        let mut window = BookingWindow {
            id: 1,
            check_in_at: actual,
            expected_check_out: Some(planned),
            check_out_at: None,
        };
        assert_eq!(window.end(), planned.and_hms_opt(0, 0, 0));

        window.check_out_at = Some(actual);
        assert_eq!(window.end(), Some(actual));

        window.check_out_at = None;
        window.expected_check_out = None;
        assert_eq!(window.end(), None);
    }

    #[test]
    fn same_day_window_blocks_until_midnight() {
        let check_in = NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("valid date");
        let window = BookingWindow {
            id: 1,
            check_in_at: check_in,
            expected_check_out: Some(check_in.date()),
            check_out_at: None,
        };
        assert_eq!(window.end(), NaiveDate::from_ymd_opt(2025, 6, 2).and_then(|d| d.and_hms_opt(0, 0, 0)));
    }
}
