// src/services/availability_service.rs

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::PgConnection;

use crate::{
    common::{
        clock::{end_of_day, start_of_day},
        error::AppError,
    },
    db::{BookingRepository, RoomRepository},
    models::{
        booking::{BookingKind, BookingWindow},
        room::RoomDetail,
    },
};

// Período pedido para um quarto: [check_in, check_out)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRequest {
    pub check_in: NaiveDateTime,
    pub check_out: NaiveDateTime,
}

impl StayRequest {
    pub fn new(check_in: NaiveDateTime, check_out: NaiveDateTime) -> Result<Self, AppError> {
        if check_out <= check_in {
            return Err(AppError::InvalidInput(
                "check-out must be after check-in".to_string(),
            ));
        }
        Ok(Self { check_in, check_out })
    }

    /// Período de datas inteiras (reserva online).
    pub fn for_dates(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, AppError> {
        Self::new(start_of_day(check_in), start_of_day(check_out))
    }

    /// Walk-in sem saída prevista ocupa a menor unidade cobrável.
    /// Saída prevista no mesmo dia vale até o fim do dia (nunca menos que uma unidade).
    pub fn walk_in(
        start: NaiveDateTime,
        kind: BookingKind,
        expected_check_out: Option<NaiveDate>,
    ) -> Result<Self, AppError> {
        let min_end = start + min_unit(kind);
        let end = match expected_check_out {
            Some(date) if date == start.date() => end_of_day(date).max(min_end),
            Some(date) => start_of_day(date),
            None => min_end,
        };
        Self::new(start, end)
    }

    pub fn starts_on(&self, day: NaiveDate) -> bool {
        self.check_in.date() == day
    }
}

fn min_unit(kind: BookingKind) -> Duration {
    match kind {
        BookingKind::Hourly => Duration::hours(1),
        BookingKind::Daily => Duration::days(1),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    RoomNotFound,
    /// Quarto ocupado agora e o pedido começa hoje.
    Occupied,
    Overlap { booking_id: i32 },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn into_result(self, room_number: &str) -> Result<(), AppError> {
        match self {
            Availability::Available => Ok(()),
            Availability::RoomNotFound => Err(AppError::ResourceNotFound("room".to_string())),
            Availability::Occupied => Err(AppError::RoomUnavailable),
            Availability::Overlap { .. } => Err(AppError::BookingConflict {
                room_number: room_number.to_string(),
            }),
        }
    }
}

/// Regra de sobreposição: o pedido começa dentro da reserva, termina dentro dela
/// ou a engloba. Reserva sem fim conhecido bloqueia tudo a partir do seu início.
pub fn intervals_conflict(
    request: &StayRequest,
    existing_start: NaiveDateTime,
    existing_end: Option<NaiveDateTime>,
) -> bool {
    let (ci, co) = (request.check_in, request.check_out);
    match existing_end {
        None => co > existing_start,
        Some(eco) => {
            let eci = existing_start;
            (ci >= eci && ci < eco) || (co > eci && co <= eco) || (ci <= eci && co >= eco)
        }
    }
}

/// Avalia a disponibilidade a partir do estado já carregado.
pub fn evaluate(
    room: Option<&RoomDetail>,
    windows: &[BookingWindow],
    request: &StayRequest,
    today: NaiveDate,
) -> Availability {
    let Some(room) = room else {
        return Availability::RoomNotFound;
    };

    if room.in_use && request.starts_on(today) {
        return Availability::Occupied;
    }

    windows
        .iter()
        .find(|w| intervals_conflict(request, w.check_in_at, w.end()))
        .map(|w| Availability::Overlap { booking_id: w.id })
        .unwrap_or(Availability::Available)
}

#[derive(Clone)]
pub struct AvailabilityService {
    room_repo: RoomRepository,
    booking_repo: BookingRepository,
}

impl AvailabilityService {
    pub fn new(room_repo: RoomRepository, booking_repo: BookingRepository) -> Self {
        Self { room_repo, booking_repo }
    }

    /// Checagem usada dentro da transação de reserva (após o lock do quarto).
    pub async fn check(
        &self,
        conn: &mut PgConnection,
        room_id: i32,
        request: &StayRequest,
        today: NaiveDate,
    ) -> Result<(Option<RoomDetail>, Availability), AppError> {
        let room = self.room_repo.find_detail(&mut *conn, room_id).await?;
        let windows = match room {
            Some(_) => self.booking_repo.live_windows_for_room(&mut *conn, room_id).await?,
            None => Vec::new(),
        };

        let availability = evaluate(room.as_ref(), &windows, request, today);
        Ok((room, availability))
    }

    pub async fn is_available<'a, A>(
        &self,
        executor: A,
        room_id: i32,
        request: &StayRequest,
        today: NaiveDate,
    ) -> Result<bool, AppError>
    where
        A: sqlx::Acquire<'a, Database = sqlx::Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let (_, availability) = self.check(&mut *conn, room_id, request, today).await?;
        Ok(availability.is_available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).expect("valid date")
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, 0, 0).expect("valid time")
    }

    fn room(in_use: bool) -> RoomDetail {
        RoomDetail {
            id: 1,
            room_number: "101".into(),
            room_type_id: 1,
            in_use,
            description: None,
            type_name: "Standard".into(),
            hourly_rate: Decimal::from(50_000),
            daily_rate: Decimal::from(300_000),
        }
    }

    fn window(id: i32, start: NaiveDate, end: Option<NaiveDate>) -> BookingWindow {
        BookingWindow {
            id,
            check_in_at: start_of_day(start),
            expected_check_out: end,
            check_out_at: None,
        }
    }

    #[test]
    fn overlapping_dates_conflict() {
        // [06-01, 06-03) existente x [06-02, 06-05) pedido
        let existing = window(7, day(1), Some(day(3)));
        let request = StayRequest::for_dates(day(2), day(5)).expect("valid");
        let result = evaluate(Some(&room(false)), &[existing], &request, day(1));
        assert_eq!(result, Availability::Overlap { booking_id: 7 });
    }

    #[test]
    fn back_to_back_stays_do_not_conflict() {
        let existing = window(7, day(1), Some(day(3)));
        let request = StayRequest::for_dates(day(3), day(5)).expect("valid");
        assert!(evaluate(Some(&room(false)), &[existing.clone()], &request, day(1)).is_available());

        let before = StayRequest::for_dates(day(1), day(2)).expect("valid");
        let later = window(8, day(2), Some(day(4)));
        assert!(evaluate(Some(&room(false)), &[later], &before, day(1)).is_available());
    }

    #[test]
    fn enclosing_request_conflicts() {
        let request = StayRequest::for_dates(day(1), day(10)).expect("valid");
        assert!(intervals_conflict(&request, at(3, 0), Some(at(4, 0))));
    }

    #[test]
    fn open_ended_booking_blocks_everything_after_its_start() {
        let existing = window(9, day(2), None);
        let after = StayRequest::for_dates(day(20), day(21)).expect("valid");
        let before = StayRequest::for_dates(day(1), day(2)).expect("valid");

        assert!(!evaluate(Some(&room(false)), &[existing.clone()], &after, day(1)).is_available());
        assert!(evaluate(Some(&room(false)), &[existing], &before, day(1)).is_available());
    }

    #[test]
    fn occupied_room_rejects_same_day_but_not_future_requests() {
        let today = day(1);
        let same_day = StayRequest::walk_in(at(1, 14), BookingKind::Hourly, None).expect("valid");
        let future = StayRequest::for_dates(day(5), day(6)).expect("valid");

        assert_eq!(
            evaluate(Some(&room(true)), &[], &same_day, today),
            Availability::Occupied
        );
        assert!(evaluate(Some(&room(true)), &[], &future, today).is_available());
    }

    #[test]
    fn missing_room_is_reported() {
        let request = StayRequest::for_dates(day(2), day(3)).expect("valid");
        assert_eq!(evaluate(None, &[], &request, day(1)), Availability::RoomNotFound);
        assert!(!Availability::RoomNotFound.is_available());
    }

    #[test]
    fn actual_check_out_frees_the_rest_of_the_stay() {
        let mut existing = window(3, day(1), Some(day(5)));
        existing.check_out_at = Some(at(2, 11));
        let request = StayRequest::for_dates(day(3), day(4)).expect("valid");
        assert!(evaluate(Some(&room(false)), &[existing], &request, day(3)).is_available());
    }

    #[test]
    fn walk_in_without_check_out_spans_one_unit() {
        let hourly = StayRequest::walk_in(at(1, 10), BookingKind::Hourly, None).expect("valid");
        assert_eq!(hourly.check_out, at(1, 11));

        let daily = StayRequest::walk_in(at(1, 10), BookingKind::Daily, None).expect("valid");
        assert_eq!(daily.check_out, at(2, 10));

        assert!(StayRequest::walk_in(at(2, 10), BookingKind::Daily, Some(day(1))).is_err());
    }

    #[test]
    fn same_day_walk_in_runs_until_midnight() {
        let hourly = StayRequest::walk_in(at(1, 10), BookingKind::Hourly, Some(day(1))).expect("valid");
        assert_eq!(hourly.check_in, at(1, 10));
        assert_eq!(hourly.check_out, at(2, 0));

        let late = StayRequest::walk_in(at(1, 23) + Duration::minutes(30), BookingKind::Hourly, Some(day(1)))
            .expect("valid");
        assert_eq!(late.check_out, at(2, 0) + Duration::minutes(30));

        let daily = StayRequest::walk_in(at(1, 10), BookingKind::Daily, Some(day(1))).expect("valid");
        assert_eq!(daily.check_out, at(2, 10));
    }
}
