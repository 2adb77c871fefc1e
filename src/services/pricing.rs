// src/services/pricing.rs

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::models::{
    booking::{BookingKind, ServiceCharge},
    room::RoomDetail,
};

// Valores cobrados de uma estadia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayCharge {
    /// Horas (por hora) ou diárias (diária e grupo) cobradas.
    pub units: i32,
    pub room_charge: Decimal,
    pub service_charge: Decimal,
}

impl StayCharge {
    pub fn total(&self) -> Decimal {
        self.room_charge + self.service_charge
    }
}

/// Horas inteiras decorridas (truncadas), mínimo de 1.
pub fn billable_hours(check_in: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - check_in).num_hours().max(1)
}

/// Noites entre as datas do grupo, mínimo de 1.
pub fn group_nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(1)
}

pub fn service_total(lines: &[ServiceCharge]) -> Decimal {
    lines.iter().map(|line| line.line_total).sum()
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Conta individual: por hora = horas x tarifa horária; diária = tarifa diária cheia.
pub fn price_stay(
    kind: BookingKind,
    room: &RoomDetail,
    check_in: NaiveDateTime,
    now: NaiveDateTime,
    lines: &[ServiceCharge],
) -> StayCharge {
    let (units, room_charge) = match kind {
        BookingKind::Hourly => {
            let hours = billable_hours(check_in, now);
            (hours, room.hourly_rate * Decimal::from(hours))
        }
        BookingKind::Daily => (1, room.daily_rate),
    };

    StayCharge {
        units: clamp_units(units),
        room_charge,
        service_charge: service_total(lines),
    }
}

/// Membro de grupo: noites x tarifa diária, independente do tipo da reserva.
pub fn price_group_member(room: &RoomDetail, nights: i64, lines: &[ServiceCharge]) -> StayCharge {
    StayCharge {
        units: clamp_units(nights),
        room_charge: room.daily_rate * Decimal::from(nights),
        service_charge: service_total(lines),
    }
}

fn clamp_units(units: i64) -> i32 {
    i32::try_from(units).unwrap_or(i32::MAX)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn standard_room() -> RoomDetail {
        RoomDetail {
            id: 101,
            room_number: "101".into(),
            room_type_id: 1,
            in_use: true,
            description: None,
            type_name: "Standard".into(),
            hourly_rate: Decimal::from(50_000),
            daily_rate: Decimal::from(300_000),
        }
    }

    pub(crate) fn water_line(booking_id: i32, quantity: i32) -> ServiceCharge {
        let unit_price = Decimal::from(20_000);
        ServiceCharge {
            id: 1,
            booking_id,
            service_id: 1,
            quantity,
            unit_price,
            line_total: line_total(unit_price, quantity),
            created_at: NaiveDateTime::default(),
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid time")
    }

    #[test]
    fn hourly_stay_truncates_partial_hours() {
        // 10:00 -> 13:30 = 3 horas; 3 x 50.000 + 2 x 20.000
        let charge = price_stay(
            BookingKind::Hourly,
            &standard_room(),
            at(10, 0),
            at(13, 30),
            &[water_line(1, 2)],
        );
        assert_eq!(charge.units, 3);
        assert_eq!(charge.room_charge, Decimal::from(150_000));
        assert_eq!(charge.service_charge, Decimal::from(40_000));
        assert_eq!(charge.total(), Decimal::from(190_000));
    }

    #[test]
    fn short_stay_bills_at_least_one_hour() {
        let charge = price_stay(BookingKind::Hourly, &standard_room(), at(10, 0), at(10, 20), &[]);
        assert_eq!(charge.units, 1);
        assert_eq!(charge.room_charge, Decimal::from(50_000));

        // Check-in futuro (pagamento antecipado) também cobra 1 hora
        let early = price_stay(BookingKind::Hourly, &standard_room(), at(15, 0), at(10, 0), &[]);
        assert_eq!(early.units, 1);
    }

    #[test]
    fn daily_stay_is_flat() {
        let charge = price_stay(BookingKind::Daily, &standard_room(), at(1, 0), at(23, 0), &[]);
        assert_eq!(charge.room_charge, Decimal::from(300_000));
        assert_eq!(charge.total(), Decimal::from(300_000));
    }

    #[test]
    fn group_member_bills_nights_at_daily_rate() {
        let ci = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        let co = NaiveDate::from_ymd_opt(2025, 6, 4).expect("valid date");
        let nights = group_nights(ci, co);
        assert_eq!(nights, 3);

        let charge = price_group_member(&standard_room(), nights, &[water_line(1, 1)]);
        assert_eq!(charge.room_charge, Decimal::from(900_000));
        assert_eq!(charge.total(), Decimal::from(920_000));

        assert_eq!(group_nights(ci, ci), 1);
    }
}
