// src/services/room_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Acquire, Postgres};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    db::{BookingRepository, RoomRepository},
    models::room::{Room, RoomDetail, RoomType},
    services::availability_service::{Availability, AvailabilityService, StayRequest},
};

// Resposta da consulta de disponibilidade
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub room_id: i32,
    pub room_number: Option<String>,
    pub available: bool,
    /// Reserva que conflita com o período, se houver.
    pub conflicting_booking_id: Option<i32>,
}

fn validate_rate(name: &str, rate: Option<Decimal>) -> Result<(), AppError> {
    match rate {
        Some(r) if r <= Decimal::ZERO => Err(AppError::InvalidInput(format!("{name} must be greater than zero"))),
        _ => Ok(()),
    }
}

/// Tarifas precisam ser positivas quando informadas.
pub fn validate_rates(hourly_rate: Option<Decimal>, daily_rate: Option<Decimal>) -> Result<(), AppError> {
    validate_rate("hourly rate", hourly_rate)?;
    validate_rate("daily rate", daily_rate)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct RoomService {
    room_repo: RoomRepository,
    booking_repo: BookingRepository,
    availability: AvailabilityService,
}

impl RoomService {
    pub fn new(room_repo: RoomRepository, booking_repo: BookingRepository, availability: AvailabilityService) -> Self {
        Self { room_repo, booking_repo, availability }
    }

    // =========================================================================
    //  TIPOS DE QUARTO
    // =========================================================================

    pub async fn list_room_types(&self) -> Result<Vec<RoomType>, AppError> {
        self.room_repo.list_room_types().await
    }

    pub async fn create_room_type<'a, A>(
        &self,
        executor: A,
        name: &str,
        hourly_rate: Decimal,
        daily_rate: Decimal,
        description: Option<&str>,
    ) -> Result<RoomType, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let name = non_blank(Some(name))
            .ok_or_else(|| AppError::InvalidInput("room type name is required".to_string()))?;
        validate_rates(Some(hourly_rate), Some(daily_rate))?;

        let mut conn = executor.acquire().await?;
        let room_type = self
            .room_repo
            .create_room_type(&mut *conn, name, hourly_rate, daily_rate, non_blank(description))
            .await?;

        tracing::info!("🏷️ Tipo de quarto '{}' criado", room_type.name);
        Ok(room_type)
    }

    pub async fn update_room_type<'a, A>(
        &self,
        executor: A,
        id: i32,
        name: Option<&str>,
        hourly_rate: Option<Decimal>,
        daily_rate: Option<Decimal>,
        description: Option<&str>,
    ) -> Result<RoomType, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        validate_rates(hourly_rate, daily_rate)?;

        let mut conn = executor.acquire().await?;
        self.room_repo
            .update_room_type(&mut *conn, id, non_blank(name), hourly_rate, daily_rate, non_blank(description))
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("room type".to_string()))
    }

    pub async fn delete_room_type<'a, A>(&self, executor: A, id: i32) -> Result<(), AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        if self.room_repo.count_rooms_of_type(&mut *tx, id).await? > 0 {
            return Err(AppError::ResourceInUse("room type has rooms".to_string()));
        }
        if !self.room_repo.delete_room_type(&mut *tx, id).await? {
            return Err(AppError::ResourceNotFound("room type".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  QUARTOS
    // =========================================================================

    pub async fn list_rooms(&self) -> Result<Vec<RoomDetail>, AppError> {
        self.room_repo.list_rooms().await
    }

    pub async fn get_room<'a, A>(&self, executor: A, id: i32) -> Result<RoomDetail, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        self.room_repo
            .find_detail(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("room".to_string()))
    }

    pub async fn create_room<'a, A>(
        &self,
        executor: A,
        room_number: &str,
        room_type_id: i32,
        description: Option<&str>,
    ) -> Result<Room, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let room_number = non_blank(Some(room_number))
            .ok_or_else(|| AppError::InvalidInput("room number is required".to_string()))?;

        let mut tx = executor.begin().await?;

        if self.room_repo.find_room_type(&mut *tx, room_type_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("room type".to_string()));
        }
        let room = self
            .room_repo
            .create_room(&mut *tx, room_number, room_type_id, non_blank(description))
            .await?;

        tx.commit().await?;

        tracing::info!("🚪 Quarto {} cadastrado", room.room_number);
        Ok(room)
    }

    pub async fn update_room<'a, A>(
        &self,
        executor: A,
        id: i32,
        room_number: Option<&str>,
        room_type_id: Option<i32>,
        description: Option<&str>,
    ) -> Result<Room, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        if let Some(type_id) = room_type_id {
            if self.room_repo.find_room_type(&mut *tx, type_id).await?.is_none() {
                return Err(AppError::ResourceNotFound("room type".to_string()));
            }
        }
        let room = self
            .room_repo
            .update_room(&mut *tx, id, non_blank(room_number), room_type_id, non_blank(description))
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("room".to_string()))?;

        tx.commit().await?;
        Ok(room)
    }

    /// Quarto com reservas vivas não pode ser removido.
    pub async fn delete_room<'a, A>(&self, executor: A, id: i32) -> Result<(), AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        if self.booking_repo.count_live_for_room(&mut *tx, id).await? > 0 {
            return Err(AppError::ResourceInUse("room has active bookings".to_string()));
        }
        if !self.room_repo.delete_room(&mut *tx, id).await? {
            return Err(AppError::ResourceNotFound("room".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Ajuste manual do indicador de ocupação.
    pub async fn set_in_use<'a, A>(&self, executor: A, id: i32, in_use: bool) -> Result<RoomDetail, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        if self.room_repo.find_detail(&mut *tx, id).await?.is_none() {
            return Err(AppError::ResourceNotFound("room".to_string()));
        }
        self.room_repo.set_in_use(&mut *tx, id, in_use).await?;
        let room = self
            .room_repo
            .find_detail(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("room".to_string()))?;

        tx.commit().await?;

        tracing::info!("🚪 Quarto {} marcado como in_use={}", room.room_number, in_use);
        Ok(room)
    }

    pub async fn check_availability<'a, A>(
        &self,
        executor: A,
        room_id: i32,
        check_in: NaiveDate,
        check_out: NaiveDate,
        today: NaiveDate,
    ) -> Result<AvailabilityReport, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let request = StayRequest::for_dates(check_in, check_out)?;
        let mut conn = executor.acquire().await?;

        let (room, availability) = self.availability.check(&mut *conn, room_id, &request, today).await?;
        let room = room.ok_or_else(|| AppError::ResourceNotFound("room".to_string()))?;

        Ok(AvailabilityReport {
            room_id,
            room_number: Some(room.room_number),
            available: availability.is_available(),
            conflicting_booking_id: match availability {
                Availability::Overlap { booking_id } => Some(booking_id),
                _ => None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_must_be_positive() {
        assert!(validate_rates(Some(Decimal::from(50_000)), Some(Decimal::from(300_000))).is_ok());
        assert!(validate_rates(None, None).is_ok());
        assert!(matches!(
            validate_rates(Some(Decimal::ZERO), None),
            Err(AppError::InvalidInput(_))
        ));
        assert!(validate_rates(None, Some(Decimal::from(-1))).is_err());
    }

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(non_blank(Some("  101 ")), Some("101"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
