// src/services/group_service.rs

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};

use crate::{
    common::error::AppError,
    db::{
        booking_repo::SettlementUpdate, group_repo::GroupFields, BookingRepository,
        GroupRepository, InvoiceRepository, RoomRepository, ServiceCatalogRepository,
        ShiftRepository,
    },
    models::{
        booking::{Booking, BookingStatus, PaymentStatus, ServiceCharge},
        group::{GroupBooking, GroupDetail, GroupSettlement, GroupStatus},
        invoice::{NewInvoice, PaymentMethod},
        room::RoomDetail,
        shift::Shift,
    },
    services::pricing,
};

// Dados de criação/atualização de um grupo
#[derive(Debug, Clone)]
pub struct GroupRequest {
    pub name: String,
    pub representative_name: String,
    pub representative_phone: String,
    pub representative_user_id: Option<i32>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    pub room_ids: Vec<i32>,
}

impl GroupRequest {
    /// Normaliza (trim) e valida os campos obrigatórios.
    pub fn into_fields(self) -> Result<(GroupFields, Vec<i32>), AppError> {
        let name = self.name.trim().to_string();
        let representative_name = self.representative_name.trim().to_string();
        let representative_phone = self.representative_phone.trim().to_string();

        if name.is_empty() || representative_name.is_empty() || representative_phone.is_empty() {
            return Err(AppError::InvalidInput(
                "group name, representative and phone are required".to_string(),
            ));
        }
        if let (Some(ci), Some(co)) = (self.check_in_date, self.check_out_date) {
            if co <= ci {
                return Err(AppError::InvalidInput(
                    "group check-out date must be after check-in date".to_string(),
                ));
            }
        }

        let mut room_ids = self.room_ids;
        room_ids.sort_unstable();
        room_ids.dedup();

        Ok((
            GroupFields {
                name,
                representative_name,
                representative_phone,
                representative_user_id: self.representative_user_id,
                check_in_date: self.check_in_date,
                check_out_date: self.check_out_date,
            },
            room_ids,
        ))
    }
}

// Reserva membro com o que é preciso para cobrá-la
#[derive(Debug, Clone)]
pub struct MemberBilling {
    pub booking: Booking,
    pub room: Option<RoomDetail>,
    pub lines: Vec<ServiceCharge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberSettlement {
    pub booking_id: i32,
    pub room_id: i32,
    pub settlement: SettlementUpdate,
    /// `None` quando o pagamento online já cobre a estadia.
    pub invoice: Option<NewInvoice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub members: Vec<MemberSettlement>,
    /// Reservas canceladas que só saem do grupo.
    pub detached: Vec<i32>,
    pub total: Decimal,
}

/// Planeja o fechamento conjunto. Qualquer membro sem quarto/tipo invalida tudo.
pub fn plan_group_merge(
    group: &GroupBooking,
    members: &[MemberBilling],
    shift: Option<&Shift>,
    note: Option<&str>,
    now: NaiveDateTime,
) -> Result<MergePlan, AppError> {
    if group.status != GroupStatus::Processing {
        return Err(AppError::InvalidTransition(
            "only groups in processing can be settled".to_string(),
        ));
    }

    let (cancelled, live): (Vec<&MemberBilling>, Vec<&MemberBilling>) = members
        .iter()
        .partition(|m| m.booking.effective_status() == BookingStatus::Cancelled);
    let detached: Vec<i32> = cancelled.iter().map(|m| m.booking.id).collect();
    if live.is_empty() {
        return Err(AppError::InvalidTransition(
            "the group has no checked-in bookings".to_string(),
        ));
    }
    if let Some(m) = live.iter().find(|m| !m.booking.is_checked_in()) {
        return Err(AppError::InvalidTransition(format!(
            "booking {} is not checked in",
            m.booking.id
        )));
    }

    let (Some(ci), Some(co)) = (group.check_in_date, group.check_out_date) else {
        return Err(AppError::InvalidInput(
            "group check-in and check-out dates are required".to_string(),
        ));
    };
    let shift = shift.ok_or(AppError::NoActiveShift)?;
    let nights = pricing::group_nights(ci, co);
    let note = note
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Group settlement: {}", group.name));

    let mut planned = Vec::with_capacity(live.len());
    let mut total = Decimal::ZERO;

    for member in live {
        let room = member.room.as_ref().ok_or_else(|| {
            AppError::ResourceNotFound(format!("room or room type of booking {}", member.booking.id))
        })?;
        let charge = pricing::price_group_member(room, nights, &member.lines);
        // Pago online antes: desconta o que já foi quitado
        let due = match member.booking.payment_status {
            PaymentStatus::Paid => {
                charge.total()
                    - member.booking.room_charge.unwrap_or(Decimal::ZERO)
                    - member.booking.service_charge.unwrap_or(Decimal::ZERO)
            }
            _ => charge.total(),
        };
        let invoice = (due > Decimal::ZERO).then(|| NewInvoice {
            shift_id: Some(shift.id),
            booking_id: member.booking.id,
            group_id: Some(group.id),
            issued_at: now,
            total: due,
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Paid,
            note: Some(note.clone()),
        });
        total += due.max(Decimal::ZERO);

        planned.push(MemberSettlement {
            booking_id: member.booking.id,
            room_id: member.booking.room_id,
            settlement: SettlementUpdate {
                check_out_at: Some(now),
                billed_units: charge.units,
                room_charge: charge.room_charge,
                service_charge: charge.service_charge,
                status: BookingStatus::CheckedOut,
                payment_status: PaymentStatus::Paid,
            },
            invoice,
        });
    }

    Ok(MergePlan { members: planned, detached, total })
}

#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    booking_repo: BookingRepository,
    room_repo: RoomRepository,
    catalog_repo: ServiceCatalogRepository,
    invoice_repo: InvoiceRepository,
    shift_repo: ShiftRepository,
}

impl GroupService {
    pub fn new(
        group_repo: GroupRepository,
        booking_repo: BookingRepository,
        room_repo: RoomRepository,
        catalog_repo: ServiceCatalogRepository,
        invoice_repo: InvoiceRepository,
        shift_repo: ShiftRepository,
    ) -> Self {
        Self { group_repo, booking_repo, room_repo, catalog_repo, invoice_repo, shift_repo }
    }

    pub async fn list<'a, A>(&self, executor: A) -> Result<Vec<GroupDetail>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let groups = self.group_repo.list().await?;
        let mut conn = executor.acquire().await?;

        let mut details = Vec::with_capacity(groups.len());
        for group in groups {
            let room_ids = self.group_repo.room_ids(&mut *conn, group.id).await?;
            let booking_ids = self.group_repo.booking_ids(&mut *conn, group.id).await?;
            details.push(GroupDetail { group, room_ids, booking_ids });
        }
        Ok(details)
    }

    /// Cria o grupo ou, se já existir um não cancelado com o mesmo nome, atualiza-o.
    pub async fn create_or_update<'a, A>(
        &self,
        executor: A,
        staff_id: i32,
        request: GroupRequest,
        now: NaiveDateTime,
    ) -> Result<GroupDetail, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let (fields, room_ids) = request.into_fields()?;

        let mut tx = executor.begin().await?;

        for room_id in &room_ids {
            if self.room_repo.find_detail(&mut *tx, *room_id).await?.is_none() {
                return Err(AppError::ResourceNotFound(format!("room {room_id}")));
            }
        }

        let group = match self.group_repo.find_open_by_name(&mut *tx, &fields.name).await? {
            Some(existing) => {
                let updated = self.group_repo.update_details(&mut *tx, existing.id, &fields).await?;
                self.group_repo.clear_rooms(&mut *tx, existing.id).await?;
                updated
            }
            None => self.group_repo.insert(&mut *tx, &fields, staff_id, now).await?,
        };
        self.group_repo.add_rooms(&mut *tx, group.id, &room_ids).await?;
        let booking_ids = self.group_repo.booking_ids(&mut *tx, group.id).await?;

        tx.commit().await?;

        tracing::info!("👥 Grupo '{}' ({}) salvo com {} quarto(s)", group.name, group.id, room_ids.len());
        Ok(GroupDetail { group, room_ids, booking_ids })
    }

    /// Vincula uma reserva em check-in a um grupo em andamento.
    pub async fn assign_booking<'a, A>(
        &self,
        executor: A,
        booking_id: i32,
        group_id: i32,
        now: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let group = self
            .group_repo
            .find_by_id(&mut *tx, group_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("group".to_string()))?;
        if group.status != GroupStatus::Processing {
            return Err(AppError::InvalidTransition(
                "bookings can only join groups in processing".to_string(),
            ));
        }

        let booking = self
            .booking_repo
            .find_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("booking".to_string()))?;
        if !booking.is_checked_in() {
            return Err(AppError::InvalidTransition(
                "only checked-in bookings can join a group".to_string(),
            ));
        }

        let updated = self.booking_repo.set_group(&mut *tx, booking_id, group_id, now).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Fecha a conta de todos os membros numa única transação.
    pub async fn merge_bill<'a, A>(
        &self,
        executor: A,
        group_id: i32,
        staff_id: i32,
        note: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<GroupSettlement, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let group = self
            .group_repo
            .find_by_id(&mut *tx, group_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("group".to_string()))?;

        let bookings = self.booking_repo.members_of_group(&mut *tx, group_id).await?;
        let mut members = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let room = self.room_repo.find_detail(&mut *tx, booking.room_id).await?;
            let lines = self.catalog_repo.charges_for_booking(&mut *tx, booking.id).await?;
            members.push(MemberBilling { booking, room, lines });
        }

        let shift = self.shift_repo.find_active_for_staff(&mut *tx, staff_id).await?;
        let plan = plan_group_merge(&group, &members, shift.as_ref(), note, now)?;

        let mut invoices = Vec::with_capacity(plan.members.len());
        for member in &plan.members {
            self.booking_repo
                .apply_settlement(&mut *tx, member.booking_id, &member.settlement, now)
                .await?;
            self.room_repo.set_in_use(&mut *tx, member.room_id, false).await?;
            if let Some(invoice) = &member.invoice {
                invoices.push(self.invoice_repo.insert(&mut *tx, invoice).await?);
            }
        }
        self.booking_repo.detach_from_group(&mut *tx, &plan.detached, now).await?;

        self.group_repo.clear_rooms(&mut *tx, group_id).await?;
        self.group_repo.set_status(&mut *tx, group_id, GroupStatus::Paid).await?;

        tx.commit().await?;

        tracing::info!(
            "👥💰 Grupo {} fechado: {} reserva(s), total {}",
            group_id,
            invoices.len(),
            plan.total
        );
        Ok(GroupSettlement { group_id, total: plan.total, invoices })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::tests::sample_booking;
    use crate::models::shift::ShiftStatus;
    use crate::services::pricing::tests::{standard_room, water_line};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).expect("valid date")
    }

    fn now() -> NaiveDateTime {
        day(4).and_hms_opt(11, 0, 0).expect("valid time")
    }

    fn group() -> GroupBooking {
        GroupBooking {
            id: 5,
            name: "Đoàn Hà Nội".into(),
            representative_name: "Hoàng Lan".into(),
            representative_phone: "0901234567".into(),
            staff_id: 2,
            representative_user_id: None,
            check_in_date: Some(day(1)),
            check_out_date: Some(day(4)),
            status: GroupStatus::Processing,
            created_at: now(),
        }
    }

    fn shift() -> Shift {
        Shift {
            id: 30,
            staff_id: 2,
            started_at: now(),
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

    fn member(id: i32, with_room: bool) -> MemberBilling {
        let mut booking = sample_booking();
        booking.id = id;
        booking.room_id = 100 + id;
        booking.group_id = Some(5);
        MemberBilling {
            booking,
            room: with_room.then(standard_room),
            lines: vec![water_line(id, 1)],
        }
    }

    #[test]
    fn merge_issues_one_invoice_per_member() {
        let members = vec![member(1, true), member(2, true)];
        let plan = plan_group_merge(&group(), &members, Some(&shift()), None, now()).expect("plan");

        assert_eq!(plan.members.len(), 2);
        // 3 noites x 300.000 + 20.000 por quarto
        assert_eq!(plan.total, Decimal::from(1_840_000));
        for m in &plan.members {
            assert_eq!(m.settlement.status, BookingStatus::CheckedOut);
            assert_eq!(m.settlement.billed_units, 3);
            let invoice = m.invoice.as_ref().expect("invoice");
            assert_eq!(invoice.group_id, Some(5));
            assert_eq!(invoice.shift_id, Some(30));
            assert_eq!(invoice.note.as_deref(), Some("Group settlement: Đoàn Hà Nội"));
        }

        let noted = plan_group_merge(&group(), &members, Some(&shift()), Some(" paid by agency "), now())
            .expect("plan");
        let invoice = noted.members[0].invoice.as_ref().expect("invoice");
        assert_eq!(invoice.note.as_deref(), Some("paid by agency"));
    }

    #[test]
    fn any_member_without_room_type_aborts_the_merge() {
        let members = vec![member(1, true), member(2, false)];
        let result = plan_group_merge(&group(), &members, Some(&shift()), None, now());
        assert!(matches!(result, Err(AppError::ResourceNotFound(_))));
    }

    #[test]
    fn merge_requires_checked_in_members() {
        let mut done = member(1, true);
        done.booking.status = Some(BookingStatus::CheckedOut);
        let result = plan_group_merge(&group(), &[done, member(2, true)], Some(&shift()), None, now());
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));

        let result = plan_group_merge(&group(), &[], Some(&shift()), None, now());
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn cancelled_members_are_skipped() {
        let mut cancelled = member(1, true);
        cancelled.booking.status = Some(BookingStatus::Cancelled);
        let plan = plan_group_merge(&group(), &[cancelled, member(2, true)], Some(&shift()), None, now())
            .expect("plan");
        assert_eq!(plan.members.len(), 1);
        assert_eq!(plan.members[0].booking_id, 2);
        assert_eq!(plan.detached, vec![1]);
    }

    #[test]
    fn prepaid_members_are_credited() {
        // Membro 1 pagou 300.000 online; membro 2 pagou tudo
        let mut partial = member(1, true);
        partial.booking.payment_status = PaymentStatus::Paid;
        partial.booking.room_charge = Some(Decimal::from(300_000));
        partial.booking.service_charge = Some(Decimal::ZERO);

        let mut settled = member(2, true);
        settled.booking.payment_status = PaymentStatus::Paid;
        settled.booking.room_charge = Some(Decimal::from(900_000));
        settled.booking.service_charge = Some(Decimal::from(20_000));

        let plan = plan_group_merge(&group(), &[partial, settled, member(3, true)], Some(&shift()), None, now())
            .expect("plan");

        let invoice = plan.members[0].invoice.as_ref().expect("balance invoice");
        assert_eq!(invoice.total, Decimal::from(620_000));
        assert!(plan.members[1].invoice.is_none());
        assert_eq!(plan.members[1].settlement.status, BookingStatus::CheckedOut);
        assert_eq!(plan.total, Decimal::from(620_000 + 920_000));
    }

    #[test]
    fn merge_needs_dates_and_a_shift() {
        let mut undated = group();
        undated.check_out_date = None;
        assert!(matches!(
            plan_group_merge(&undated, &[member(1, true)], Some(&shift()), None, now()),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            plan_group_merge(&group(), &[member(1, true)], None, None, now()),
            Err(AppError::NoActiveShift)
        ));
    }

    #[test]
    fn paid_group_cannot_be_settled_again() {
        let mut paid = group();
        paid.status = GroupStatus::Paid;
        assert!(matches!(
            plan_group_merge(&paid, &[member(1, true)], Some(&shift()), None, now()),
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[test]
    fn group_request_is_trimmed_and_validated() {
        let request = GroupRequest {
            name: "  Đoàn Huế ".into(),
            representative_name: " Lan ".into(),
            representative_phone: "0901".into(),
            representative_user_id: None,
            check_in_date: Some(day(1)),
            check_out_date: Some(day(3)),
            room_ids: vec![3, 1, 3],
        };
        let (fields, rooms) = request.clone().into_fields().expect("valid");
        assert_eq!(fields.name, "Đoàn Huế");
        assert_eq!(fields.representative_name, "Lan");
        assert_eq!(rooms, vec![1, 3]);

        let mut blank = request.clone();
        blank.representative_phone = "   ".into();
        assert!(blank.into_fields().is_err());

        let mut inverted = request;
        inverted.check_out_date = Some(day(1));
        assert!(inverted.into_fields().is_err());
    }
}
