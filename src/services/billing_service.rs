// src/services/billing_service.rs

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};

use crate::{
    common::error::AppError,
    db::{
        booking_repo::SettlementUpdate, BookingRepository, InvoiceRepository, RoomRepository,
        ServiceCatalogRepository, ShiftRepository,
    },
    models::{
        auth::User,
        booking::{Booking, BookingStatus, PaymentStatus, Service, ServiceCharge},
        invoice::{Invoice, NewInvoice, PaymentMethod},
        room::RoomDetail,
        shift::Shift,
    },
    services::pricing::{self, StayCharge},
};

pub const MAX_SERVICE_QUANTITY: i32 = 100;
const ONLINE_PAYMENT_NOTE: &str = "Online payment from guest";
const SUPPLEMENT_NOTE: &str = "Charges after online payment";

// Quem está fechando a conta
#[derive(Debug, Clone)]
pub enum CheckoutMode {
    /// Recepção: exige turno ativo, encerra a estadia e libera o quarto.
    Desk { shift: Option<Shift> },
    /// Hóspede pagando online: só quita, a estadia continua.
    Online,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPlan {
    /// `None` quando a reserva já estava paga (sem nova cobrança).
    pub charge: Option<StayCharge>,
    pub settlement: SettlementUpdate,
    pub invoice: Option<NewInvoice>,
    pub release_room: bool,
}

/// Calcula o fechamento sem tocar no banco.
pub fn plan_checkout(
    booking: &Booking,
    room: Option<&RoomDetail>,
    lines: &[ServiceCharge],
    mode: &CheckoutMode,
    note: Option<&str>,
    now: NaiveDateTime,
) -> Result<CheckoutPlan, AppError> {
    if !booking.is_checked_in() {
        return Err(AppError::InvalidTransition(
            "only checked-in bookings can be settled".to_string(),
        ));
    }
    let room = room.ok_or_else(|| AppError::ResourceNotFound("room or room type".to_string()))?;
    let already_paid = booking.payment_status == PaymentStatus::Paid;

    match mode {
        CheckoutMode::Desk { shift } => {
            let shift = shift.as_ref().ok_or(AppError::NoActiveShift)?;

            if already_paid {
                // Pago online antes: cobra só o que surgiu depois (horas extras, consumo)
                let charge = pricing::price_stay(booking.kind, room, booking.check_in_at, now, lines);
                let prepaid = booking.room_charge.unwrap_or(Decimal::ZERO)
                    + booking.service_charge.unwrap_or(Decimal::ZERO);
                let due = charge.total() - prepaid;

                if due <= Decimal::ZERO {
                    return Ok(CheckoutPlan {
                        charge: None,
                        settlement: SettlementUpdate {
                            check_out_at: Some(now),
                            billed_units: booking.billed_units.unwrap_or(0),
                            room_charge: booking.room_charge.unwrap_or(Decimal::ZERO),
                            service_charge: booking.service_charge.unwrap_or(Decimal::ZERO),
                            status: BookingStatus::CheckedOut,
                            payment_status: PaymentStatus::Paid,
                        },
                        invoice: None,
                        release_room: true,
                    });
                }

                return Ok(CheckoutPlan {
                    charge: Some(charge),
                    settlement: SettlementUpdate {
                        check_out_at: Some(now),
                        billed_units: charge.units,
                        room_charge: charge.room_charge,
                        service_charge: charge.service_charge,
                        status: BookingStatus::CheckedOut,
                        payment_status: PaymentStatus::Paid,
                    },
                    invoice: Some(NewInvoice {
                        shift_id: Some(shift.id),
                        booking_id: booking.id,
                        group_id: None,
                        issued_at: now,
                        total: due,
                        payment_method: PaymentMethod::Cash,
                        payment_status: PaymentStatus::Paid,
                        note: Some(note.unwrap_or(SUPPLEMENT_NOTE).to_string()),
                    }),
                    release_room: true,
                });
            }

            let charge = pricing::price_stay(booking.kind, room, booking.check_in_at, now, lines);
            Ok(CheckoutPlan {
                charge: Some(charge),
                settlement: SettlementUpdate {
                    check_out_at: Some(now),
                    billed_units: charge.units,
                    room_charge: charge.room_charge,
                    service_charge: charge.service_charge,
                    status: BookingStatus::CheckedOut,
                    payment_status: PaymentStatus::Paid,
                },
                invoice: Some(NewInvoice {
                    shift_id: Some(shift.id),
                    booking_id: booking.id,
                    group_id: None,
                    issued_at: now,
                    total: charge.total(),
                    payment_method: PaymentMethod::Cash,
                    payment_status: PaymentStatus::Paid,
                    note: note.map(str::to_string),
                }),
                release_room: true,
            })
        }
        CheckoutMode::Online => {
            if already_paid {
                return Err(AppError::AlreadyPaid);
            }

            let charge = pricing::price_stay(booking.kind, room, booking.check_in_at, now, lines);
            Ok(CheckoutPlan {
                charge: Some(charge),
                settlement: SettlementUpdate {
                    check_out_at: None,
                    billed_units: charge.units,
                    room_charge: charge.room_charge,
                    service_charge: charge.service_charge,
                    status: BookingStatus::CheckedIn,
                    payment_status: PaymentStatus::Paid,
                },
                invoice: Some(NewInvoice {
                    shift_id: None,
                    booking_id: booking.id,
                    group_id: None,
                    issued_at: now,
                    total: charge.total(),
                    payment_method: PaymentMethod::Card,
                    payment_status: PaymentStatus::Paid,
                    note: Some(note.unwrap_or(ONLINE_PAYMENT_NOTE).to_string()),
                }),
                release_room: false,
            })
        }
    }
}

/// Pagamento online: dono (ou admin) antes de qualquer regra de estado.
pub fn plan_online_payment(
    booking: &Booking,
    payer: &User,
    room: Option<&RoomDetail>,
    lines: &[ServiceCharge],
    note: Option<&str>,
    now: NaiveDateTime,
) -> Result<CheckoutPlan, AppError> {
    if !booking.can_be_paid_by(payer) {
        return Err(AppError::Forbidden);
    }
    plan_checkout(booking, room, lines, &CheckoutMode::Online, note, now)
}

pub fn validate_service_quantity(quantity: i32) -> Result<(), AppError> {
    if !(1..=MAX_SERVICE_QUANTITY).contains(&quantity) {
        return Err(AppError::InvalidInput(format!(
            "quantity must be between 1 and {MAX_SERVICE_QUANTITY}"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BillingService {
    booking_repo: BookingRepository,
    room_repo: RoomRepository,
    catalog_repo: ServiceCatalogRepository,
    invoice_repo: InvoiceRepository,
    shift_repo: ShiftRepository,
}

impl BillingService {
    pub fn new(
        booking_repo: BookingRepository,
        room_repo: RoomRepository,
        catalog_repo: ServiceCatalogRepository,
        invoice_repo: InvoiceRepository,
        shift_repo: ShiftRepository,
    ) -> Self {
        Self { booking_repo, room_repo, catalog_repo, invoice_repo, shift_repo }
    }

    // =========================================================================
    //  FECHAMENTO DE CONTA
    // =========================================================================

    /// Checkout na recepção. Para reserva pré-paga devolve a fatura já existente.
    pub async fn checkout<'a, A>(
        &self,
        executor: A,
        booking_id: i32,
        staff_id: i32,
        note: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Invoice, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let shift = self.shift_repo.find_active_for_staff(&mut *tx, staff_id).await?;
        let (booking, plan) = self
            .plan(&mut tx, booking_id, CheckoutMode::Desk { shift }, note, now)
            .await?;

        let invoice = self.apply_plan(&mut tx, &booking, &plan, now).await?;
        tx.commit().await?;

        tracing::info!(
            "💰 Checkout da reserva {} (quarto {}) total {}",
            booking.id,
            booking.room_id,
            invoice.total
        );
        Ok(invoice)
    }

    /// Pagamento online do hóspede: quita sem encerrar a estadia.
    pub async fn pay_online<'a, A>(
        &self,
        executor: A,
        booking_id: i32,
        payer: &User,
        note: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Invoice, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let booking = self.lock_booking(&mut tx, booking_id).await?;
        let room = self.room_repo.find_detail(&mut *tx, booking.room_id).await?;
        let lines = self.catalog_repo.charges_for_booking(&mut *tx, booking.id).await?;
        let plan = plan_online_payment(&booking, payer, room.as_ref(), &lines, note, now)?;

        let invoice = self.apply_plan(&mut tx, &booking, &plan, now).await?;
        tx.commit().await?;

        tracing::info!("💳 Pagamento online da reserva {} total {}", booking.id, invoice.total);
        Ok(invoice)
    }

    async fn plan(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking_id: i32,
        mode: CheckoutMode,
        note: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<(Booking, CheckoutPlan), AppError> {
        let booking = self.lock_booking(tx, booking_id).await?;
        let room = self.room_repo.find_detail(&mut **tx, booking.room_id).await?;
        let lines = self.catalog_repo.charges_for_booking(&mut **tx, booking.id).await?;

        let plan = plan_checkout(&booking, room.as_ref(), &lines, &mode, note, now)?;
        Ok((booking, plan))
    }

    async fn lock_booking(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking_id: i32,
    ) -> Result<Booking, AppError> {
        self.booking_repo
            .find_for_update(&mut **tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".to_string()))
    }

    async fn apply_plan(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        booking: &Booking,
        plan: &CheckoutPlan,
        now: NaiveDateTime,
    ) -> Result<Invoice, AppError> {
        self.booking_repo
            .apply_settlement(&mut **tx, booking.id, &plan.settlement, now)
            .await?;

        if plan.release_room {
            self.room_repo.set_in_use(&mut **tx, booking.room_id, false).await?;
        }

        match &plan.invoice {
            Some(new_invoice) => self.invoice_repo.insert(&mut **tx, new_invoice).await,
            None => self
                .invoice_repo
                .latest_for_booking(&mut **tx, booking.id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("invoice".to_string())),
        }
    }

    // =========================================================================
    //  SERVIÇOS CONSUMIDOS
    // =========================================================================

    pub async fn list_services(&self) -> Result<Vec<Service>, AppError> {
        self.catalog_repo.list_active().await
    }

    pub async fn list_charges<'a, A>(&self, executor: A, booking_id: i32) -> Result<Vec<ServiceCharge>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        self.booking_repo
            .find_by_id(&mut *conn, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".to_string()))?;
        self.catalog_repo.charges_for_booking(&mut *conn, booking_id).await
    }

    /// Lança consumo com o preço do catálogo congelado no momento.
    pub async fn add_service_charge<'a, A>(
        &self,
        executor: A,
        booking_id: i32,
        service_id: i32,
        quantity: i32,
        now: NaiveDateTime,
    ) -> Result<ServiceCharge, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        validate_service_quantity(quantity)?;

        let mut tx = executor.begin().await?;

        let booking = self
            .booking_repo
            .find_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".to_string()))?;
        if !booking.is_checked_in() {
            return Err(AppError::InvalidTransition(
                "services can only be added to checked-in bookings".to_string(),
            ));
        }

        let service = self
            .catalog_repo
            .find_service(&mut *tx, service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| AppError::ResourceNotFound("service".to_string()))?;

        let total = pricing::line_total(service.price, quantity);
        let charge = self
            .catalog_repo
            .insert_charge(&mut *tx, booking_id, service_id, quantity, service.price, total, now)
            .await?;

        tx.commit().await?;

        tracing::info!("🧾 {} x {} lançado na reserva {}", quantity, service.name, booking_id);
        Ok(charge)
    }

    // =========================================================================
    //  FATURAS
    // =========================================================================

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        self.invoice_repo.list().await
    }

    /// Atualiza o status de pagamento da fatura e espelha na reserva.
    pub async fn update_invoice_status<'a, A>(
        &self,
        executor: A,
        invoice_id: i32,
        status: PaymentStatus,
        now: NaiveDateTime,
    ) -> Result<Invoice, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let invoice = self
            .invoice_repo
            .update_status(&mut *tx, invoice_id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("invoice".to_string()))?;

        if let Some(booking_id) = invoice.booking_id {
            self.booking_repo
                .set_payment_status(&mut *tx, booking_id, status, now)
                .await?;
        }

        tx.commit().await?;
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::tests::sample_booking;
    use crate::models::shift::ShiftStatus;
    use crate::services::pricing::tests::{standard_room, water_line};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid time")
    }

    fn active_shift() -> Shift {
        Shift {
            id: 12,
            staff_id: 2,
            started_at: at(6, 0),
            ended_at: None,
            status: ShiftStatus::Active,
            opening_amount: None,
            collected_total: None,
            invoiced_total: None,
            handoff_amount: None,
            successor_id: None,
            note: None,
        }
    }

    #[test]
    fn desk_checkout_settles_and_frees_the_room() {
        // Quarto 101, por hora, 10:00 -> 13:30, 2 águas
        let booking = sample_booking();
        let plan = plan_checkout(
            &booking,
            Some(&standard_room()),
            &[water_line(booking.id, 2)],
            &CheckoutMode::Desk { shift: Some(active_shift()) },
            None,
            at(13, 30),
        )
        .expect("plan");

        assert_eq!(plan.settlement.status, BookingStatus::CheckedOut);
        assert_eq!(plan.settlement.payment_status, PaymentStatus::Paid);
        assert_eq!(plan.settlement.check_out_at, Some(at(13, 30)));
        assert_eq!(plan.settlement.billed_units, 3);
        assert!(plan.release_room);

        let invoice = plan.invoice.expect("invoice");
        assert_eq!(invoice.total, Decimal::from(190_000));
        assert_eq!(invoice.shift_id, Some(12));
        assert_eq!(invoice.payment_method, PaymentMethod::Cash);
        assert_eq!(invoice.booking_id, booking.id);
    }

    #[test]
    fn desk_checkout_requires_an_active_shift() {
        let result = plan_checkout(
            &sample_booking(),
            Some(&standard_room()),
            &[],
            &CheckoutMode::Desk { shift: None },
            None,
            at(13, 30),
        );
        assert!(matches!(result, Err(AppError::NoActiveShift)));
    }

    #[test]
    fn missing_room_type_blocks_checkout() {
        let result = plan_checkout(
            &sample_booking(),
            None,
            &[],
            &CheckoutMode::Desk { shift: Some(active_shift()) },
            None,
            at(13, 30),
        );
        assert!(matches!(result, Err(AppError::ResourceNotFound(_))));
    }

    #[test]
    fn only_checked_in_bookings_are_settled() {
        let mut booking = sample_booking();
        booking.status = Some(BookingStatus::CheckedOut);
        let result = plan_checkout(
            &booking,
            Some(&standard_room()),
            &[],
            &CheckoutMode::Online,
            None,
            at(13, 30),
        );
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn online_payment_keeps_the_stay_open() {
        let booking = sample_booking();
        let plan = plan_checkout(
            &booking,
            Some(&standard_room()),
            &[],
            &CheckoutMode::Online,
            None,
            at(12, 0),
        )
        .expect("plan");

        assert_eq!(plan.settlement.status, BookingStatus::CheckedIn);
        assert_eq!(plan.settlement.payment_status, PaymentStatus::Paid);
        assert_eq!(plan.settlement.check_out_at, None);
        assert!(!plan.release_room);

        let invoice = plan.invoice.expect("invoice");
        assert_eq!(invoice.shift_id, None);
        assert_eq!(invoice.payment_method, PaymentMethod::Card);
        assert_eq!(invoice.note.as_deref(), Some(ONLINE_PAYMENT_NOTE));
        assert_eq!(invoice.total, Decimal::from(100_000));
    }

    #[test]
    fn paying_twice_online_is_rejected() {
        let mut booking = sample_booking();
        booking.payment_status = PaymentStatus::Paid;
        let result = plan_checkout(
            &booking,
            Some(&standard_room()),
            &[],
            &CheckoutMode::Online,
            None,
            at(12, 0),
        );
        assert!(matches!(result, Err(AppError::AlreadyPaid)));
    }

    #[test]
    fn prepaid_desk_checkout_issues_no_new_invoice() {
        let mut booking = sample_booking();
        booking.payment_status = PaymentStatus::Paid;
        booking.room_charge = Some(Decimal::from(100_000));
        booking.billed_units = Some(2);

        let plan = plan_checkout(
            &booking,
            Some(&standard_room()),
            &[],
            &CheckoutMode::Desk { shift: Some(active_shift()) },
            None,
            at(12, 30),
        )
        .expect("plan");

        assert!(plan.invoice.is_none());
        assert!(plan.charge.is_none());
        assert_eq!(plan.settlement.status, BookingStatus::CheckedOut);
        assert_eq!(plan.settlement.room_charge, Decimal::from(100_000));
        assert!(plan.release_room);
    }

    #[test]
    fn charges_after_online_payment_are_billed_at_the_desk() {
        // Pagou 2 h online; saiu às 20:00 com 2 águas lançadas depois
        let mut booking = sample_booking();
        booking.payment_status = PaymentStatus::Paid;
        booking.room_charge = Some(Decimal::from(100_000));
        booking.service_charge = Some(Decimal::ZERO);
        booking.billed_units = Some(2);

        let plan = plan_checkout(
            &booking,
            Some(&standard_room()),
            &[water_line(booking.id, 2)],
            &CheckoutMode::Desk { shift: Some(active_shift()) },
            None,
            at(20, 0),
        )
        .expect("plan");

        assert_eq!(plan.settlement.billed_units, 10);
        assert_eq!(plan.settlement.room_charge, Decimal::from(500_000));
        assert_eq!(plan.settlement.service_charge, Decimal::from(40_000));
        assert_eq!(plan.charge.map(|c| c.total()), Some(Decimal::from(540_000)));

        let invoice = plan.invoice.expect("supplementary invoice");
        assert_eq!(invoice.total, Decimal::from(440_000));
        assert_eq!(invoice.shift_id, Some(12));
        assert_eq!(invoice.payment_method, PaymentMethod::Cash);
        assert_eq!(invoice.note.as_deref(), Some(SUPPLEMENT_NOTE));
    }

    #[test]
    fn strangers_learn_nothing_about_a_paid_booking() {
        use crate::models::auth::{Role, UserStatus};

        let mut booking = sample_booking();
        booking.owner_user_id = Some(7);
        booking.payment_status = PaymentStatus::Paid;
        let stranger = User {
            id: 8,
            full_name: "Phạm Thu Hà".into(),
            email: None,
            phone: None,
            role: Role::Guest,
            status: UserStatus::Active,
            created_at: booking.created_at,
        };

        let result =
            plan_online_payment(&booking, &stranger, Some(&standard_room()), &[], None, at(12, 0));
        assert!(matches!(result, Err(AppError::Forbidden)));

        let mut owner = stranger.clone();
        owner.id = 7;
        let result = plan_online_payment(&booking, &owner, Some(&standard_room()), &[], None, at(12, 0));
        assert!(matches!(result, Err(AppError::AlreadyPaid)));
    }

    #[test]
    fn service_quantity_is_bounded() {
        assert!(validate_service_quantity(0).is_err());
        assert!(validate_service_quantity(101).is_err());
        assert!(validate_service_quantity(1).is_ok());
        assert!(validate_service_quantity(100).is_ok());
    }
}
