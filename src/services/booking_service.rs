// src/services/booking_service.rs

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Acquire, Postgres};

use crate::{
    common::{
        clock::start_of_day,
        db_utils::{lock_for_update, LockScope},
        error::AppError,
    },
    db::{
        booking_repo::NewBooking, BookingRepository, GuestRepository, RoomRepository,
        UserRepository,
    },
    models::{
        booking::{Booking, BookingDetail, BookingKind, BookingStatus},
        guest::{Guest, GuestInput},
    },
    services::{
        availability_service::{AvailabilityService, StayRequest},
        mail_service::{BookingConfirmation, MailService},
    },
};

// Reserva de balcão (walk-in) feita pela recepção
#[derive(Debug, Clone)]
pub struct WalkInBooking {
    pub room_id: i32,
    pub kind: BookingKind,
    pub guest: GuestInput,
    pub expected_check_in: Option<NaiveDate>,
    pub expected_check_out: Option<NaiveDate>,
}

// Reserva feita pelo próprio hóspede
#[derive(Debug, Clone)]
pub struct OnlineBooking {
    pub room_id: i32,
    pub kind: BookingKind,
    pub guest: GuestInput,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

// Efeito colateral de uma troca manual de status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub room_in_use: Option<bool>,
    pub stamp_check_out: Option<NaiveDateTime>,
}

/// Entrada planejada: agora, ou a meia-noite da data prevista se ela for futura.
pub fn walk_in_start(now: NaiveDateTime, expected_check_in: Option<NaiveDate>) -> NaiveDateTime {
    match expected_check_in {
        Some(date) if date > now.date() => start_of_day(date),
        _ => now,
    }
}

pub fn validate_online_dates(
    check_in: NaiveDate,
    check_out: NaiveDate,
    today: NaiveDate,
) -> Result<StayRequest, AppError> {
    if check_in < today {
        return Err(AppError::InvalidInput(
            "check-in date cannot be in the past".to_string(),
        ));
    }
    if check_out <= check_in {
        return Err(AppError::InvalidInput(
            "check-out date must be after check-in date".to_string(),
        ));
    }
    StayRequest::for_dates(check_in, check_out)
}

/// Cancelamento: devolve se o quarto deve ser liberado.
pub fn cancellation_releases_room(booking: &Booking, today: NaiveDate) -> Result<bool, AppError> {
    match booking.effective_status() {
        BookingStatus::Cancelled => Err(AppError::AlreadyCancelled),
        BookingStatus::CheckedOut => Err(AppError::InvalidTransition(
            "a checked-out booking cannot be cancelled".to_string(),
        )),
        BookingStatus::CheckedIn => Ok(booking.is_occupying(today)),
    }
}

pub fn status_change_effect(
    booking: &Booking,
    new_status: BookingStatus,
    now: NaiveDateTime,
) -> Result<StatusChange, AppError> {
    if booking.effective_status() == BookingStatus::Cancelled {
        return Err(AppError::InvalidTransition(
            "a cancelled booking cannot change status".to_string(),
        ));
    }

    // Reabrir exigiria nova checagem de disponibilidade e apagar a saída registrada
    if booking.effective_status() == BookingStatus::CheckedOut && new_status == BookingStatus::CheckedIn {
        return Err(AppError::InvalidTransition(
            "a checked-out booking cannot be checked in again".to_string(),
        ));
    }

    let today = now.date();
    let change = match new_status {
        BookingStatus::CheckedIn => StatusChange {
            room_in_use: (booking.occupancy_start_date() <= today).then_some(true),
            stamp_check_out: None,
        },
        BookingStatus::Cancelled => StatusChange {
            room_in_use: booking.is_occupying(today).then_some(false),
            stamp_check_out: None,
        },
        BookingStatus::CheckedOut => StatusChange {
            room_in_use: None,
            stamp_check_out: Some(now),
        },
    };
    Ok(change)
}

#[derive(Clone)]
pub struct BookingService {
    booking_repo: BookingRepository,
    room_repo: RoomRepository,
    guest_repo: GuestRepository,
    user_repo: UserRepository,
    availability: AvailabilityService,
    mail: MailService,
}

impl BookingService {
    pub fn new(
        booking_repo: BookingRepository,
        room_repo: RoomRepository,
        guest_repo: GuestRepository,
        user_repo: UserRepository,
        availability: AvailabilityService,
        mail: MailService,
    ) -> Self {
        Self { booking_repo, room_repo, guest_repo, user_repo, availability, mail }
    }

    pub async fn get(&self, booking_id: i32) -> Result<BookingDetail, AppError> {
        self.booking_repo
            .find_detail(booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".to_string()))
    }

    /// Hóspede já cadastrado, para preencher a ficha do balcão.
    pub async fn find_guest(&self, document_number: &str) -> Result<Guest, AppError> {
        self.guest_repo
            .find_by_document(document_number.trim())
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("guest".to_string()))
    }

    // --- WALK-IN (Balcão) ---
    pub async fn create_walk_in<'a, A>(
        &self,
        executor: A,
        staff_id: i32,
        request: WalkInBooking,
        now: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let today = now.date();
        let start = walk_in_start(now, request.expected_check_in);
        let stay = StayRequest::walk_in(start, request.kind, request.expected_check_out)?;

        let mut tx = executor.begin().await?;

        // Serializa reservas concorrentes do mesmo quarto
        lock_for_update(&mut *tx, LockScope::Room, request.room_id).await?;

        let (room, availability) = self
            .availability
            .check(&mut *tx, request.room_id, &stay, today)
            .await?;
        let room_number = room.map(|r| r.room_number).unwrap_or_default();
        availability.into_result(&room_number)?;

        let guest = self.guest_repo.upsert(&mut *tx, &request.guest).await?;

        let booking = self
            .booking_repo
            .insert(
                &mut *tx,
                &NewBooking {
                    room_id: request.room_id,
                    guest_id: guest.id,
                    staff_id,
                    owner_user_id: None,
                    kind: request.kind,
                    check_in_at: start,
                    expected_check_in: request.expected_check_in,
                    expected_check_out: request.expected_check_out,
                    created_at: now,
                },
            )
            .await?;

        if booking.is_occupying(today) {
            self.room_repo.set_in_use(&mut *tx, request.room_id, true).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "🛏️ Walk-in {} criado no quarto {} por funcionário {}",
            booking.id,
            room_number,
            staff_id
        );
        Ok(booking)
    }

    // --- ONLINE (Hóspede) ---
    pub async fn create_online<'a, A>(
        &self,
        executor: A,
        user_id: i32,
        request: OnlineBooking,
        now: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let today = now.date();
        let stay = validate_online_dates(request.check_in, request.check_out, today)?;

        let mut tx = executor.begin().await?;

        let user = self
            .user_repo
            .find_by_id(&mut *tx, user_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("user".to_string()))?;

        lock_for_update(&mut *tx, LockScope::Room, request.room_id).await?;

        let (room, availability) = self
            .availability
            .check(&mut *tx, request.room_id, &stay, today)
            .await?;
        let room_number = room.map(|r| r.room_number).unwrap_or_default();
        availability.into_result(&room_number)?;

        let guest = self.guest_repo.upsert(&mut *tx, &request.guest).await?;

        let booking = self
            .booking_repo
            .insert(
                &mut *tx,
                &NewBooking {
                    room_id: request.room_id,
                    guest_id: guest.id,
                    staff_id: user.id,
                    owner_user_id: Some(user.id),
                    kind: request.kind,
                    check_in_at: stay.check_in,
                    expected_check_in: Some(request.check_in),
                    expected_check_out: Some(request.check_out),
                    created_at: now,
                },
            )
            .await?;

        // Só ocupa o quarto se a entrada for hoje
        if request.check_in == today {
            self.room_repo.set_in_use(&mut *tx, request.room_id, true).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "🌐 Reserva online {} criada no quarto {} pelo usuário {}",
            booking.id,
            room_number,
            user.id
        );

        match user.email {
            Some(email) => self.mail.spawn_booking_confirmation(
                email,
                BookingConfirmation {
                    booking_id: booking.id,
                    guest_name: guest.full_name,
                    room_number,
                    check_in: request.check_in,
                    check_out: request.check_out,
                },
            ),
            None => tracing::warn!("Usuário {} sem e-mail; confirmação não enviada", user.id),
        }

        Ok(booking)
    }

    // --- CANCELAMENTO ---
    pub async fn cancel<'a, A>(&self, executor: A, booking_id: i32, now: NaiveDateTime) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let booking = self
            .booking_repo
            .find_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".to_string()))?;

        let release_room = cancellation_releases_room(&booking, now.date())?;

        let cancelled = self
            .booking_repo
            .update_status(&mut *tx, booking_id, BookingStatus::Cancelled, None, now)
            .await?;

        if release_room {
            self.room_repo.set_in_use(&mut *tx, booking.room_id, false).await?;
        }

        tx.commit().await?;

        tracing::info!("❌ Reserva {} cancelada", booking_id);
        Ok(cancelled)
    }

    // --- TROCA MANUAL DE STATUS (Admin) ---
    pub async fn update_status<'a, A>(
        &self,
        executor: A,
        booking_id: i32,
        new_status: BookingStatus,
        now: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let booking = self
            .booking_repo
            .find_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".to_string()))?;

        let change = status_change_effect(&booking, new_status, now)?;

        let updated = self
            .booking_repo
            .update_status(&mut *tx, booking_id, new_status, change.stamp_check_out, now)
            .await?;

        if let Some(in_use) = change.room_in_use {
            self.room_repo.set_in_use(&mut *tx, booking.room_id, in_use).await?;
        }

        tx.commit().await?;

        tracing::info!("🔄 Reserva {} agora está {:?}", booking_id, new_status);
        Ok(updated)
    }

    /// Ocupa os quartos cuja reserva em check-in já chegou à data de entrada.
    pub async fn refresh_room_status<'a, A>(&self, executor: A, today: NaiveDate) -> Result<u64, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let promoted = self.room_repo.promote_due_rooms(&mut *conn, today).await?;
        if promoted > 0 {
            tracing::info!("🏨 {} quarto(s) marcados como ocupados", promoted);
        }
        Ok(promoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::tests::sample_booking;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).expect("valid date")
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, 0, 0).expect("valid time")
    }

    #[test]
    fn online_dates_must_be_future_and_ordered() {
        let today = day(10);
        assert!(validate_online_dates(day(9), day(12), today).is_err());
        assert!(validate_online_dates(day(11), day(11), today).is_err());
        assert!(validate_online_dates(day(12), day(11), today).is_err());

        let stay = validate_online_dates(day(10), day(12), today).expect("valid");
        assert_eq!(stay.check_in, start_of_day(day(10)));
        assert_eq!(stay.check_out, start_of_day(day(12)));
    }

    #[test]
    fn walk_in_starts_now_unless_reserved_for_later() {
        let now = at(10, 14);
        assert_eq!(walk_in_start(now, None), now);
        assert_eq!(walk_in_start(now, Some(day(9))), now);
        assert_eq!(walk_in_start(now, Some(day(10))), now);
        assert_eq!(walk_in_start(now, Some(day(12))), start_of_day(day(12)));
    }

    #[test]
    fn cancelling_twice_is_rejected() {
        let mut booking = sample_booking();
        booking.status = Some(BookingStatus::Cancelled);
        assert!(matches!(
            cancellation_releases_room(&booking, day(1)),
            Err(AppError::AlreadyCancelled)
        ));
    }

    #[test]
    fn cancelling_the_occupying_booking_frees_the_room() {
        let booking = sample_booking();
        assert!(cancellation_releases_room(&booking, day(1)).expect("ok"));

        let mut future = sample_booking();
        future.expected_check_in = Some(day(20));
        assert!(!cancellation_releases_room(&future, day(1)).expect("ok"));
    }

    #[test]
    fn checked_out_booking_cannot_be_cancelled() {
        let mut booking = sample_booking();
        booking.status = Some(BookingStatus::CheckedOut);
        assert!(matches!(
            cancellation_releases_room(&booking, day(1)),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn manual_status_changes_follow_occupancy() {
        let booking = sample_booking();
        let now = at(1, 15);

        let check_in = status_change_effect(&booking, BookingStatus::CheckedIn, now).expect("ok");
        assert_eq!(check_in.room_in_use, Some(true));

        let cancel = status_change_effect(&booking, BookingStatus::Cancelled, now).expect("ok");
        assert_eq!(cancel.room_in_use, Some(false));

        let check_out = status_change_effect(&booking, BookingStatus::CheckedOut, now).expect("ok");
        assert_eq!(check_out.room_in_use, None);
        assert_eq!(check_out.stamp_check_out, Some(now));
    }

    #[test]
    fn cancelled_booking_is_terminal() {
        let mut booking = sample_booking();
        booking.status = Some(BookingStatus::Cancelled);
        let result = status_change_effect(&booking, BookingStatus::CheckedIn, at(1, 15));
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn checked_out_booking_cannot_be_reopened() {
        let mut booking = sample_booking();
        booking.status = Some(BookingStatus::CheckedOut);
        booking.check_out_at = Some(at(1, 13));

        let result = status_change_effect(&booking, BookingStatus::CheckedIn, at(1, 15));
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }
}
