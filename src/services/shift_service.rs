// src/services/shift_service.rs

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Acquire, Postgres};
use utoipa::ToSchema;

use crate::{
    common::{
        db_utils::{lock_for_update, LockScope},
        error::AppError,
    },
    db::{
        shift_repo::ShiftClosing, InvoiceRepository, NotificationRepository, ShiftRepository,
        UserRepository,
    },
    models::{
        auth::{Role, User},
        notification::{NotificationCategory, NotificationDraft},
        shift::{CurrentShiftView, Shift, ShiftActionKind, ShiftEndOutcome},
    },
};

// Pedido de encerramento de turno
#[derive(Debug, Clone)]
pub struct ShiftEndRequest {
    /// Admin pode encerrar o turno de outro funcionário.
    pub staff_id: Option<i32>,
    pub collected_total: Decimal,
    pub handoff_amount: Option<Decimal>,
    pub note: Option<String>,
    pub successor_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StuckShiftReport {
    pub stuck_shifts: usize,
    pub notifications_sent: usize,
}

pub fn validate_end_request(request: &ShiftEndRequest) -> Result<(), AppError> {
    if request.collected_total.is_sign_negative() {
        return Err(AppError::InvalidInput("collected total cannot be negative".to_string()));
    }
    if request.handoff_amount.is_some_and(|a| a.is_sign_negative()) {
        return Err(AppError::InvalidInput("handoff amount cannot be negative".to_string()));
    }
    if request.handoff_amount.is_some() && request.successor_id.is_none() {
        return Err(AppError::InvalidInput("handoff amount requires a successor".to_string()));
    }
    Ok(())
}

/// Só admin escolhe de quem é o turno; os demais encerram o próprio.
pub fn resolve_target_staff(actor: &User, requested: Option<i32>) -> i32 {
    match (actor.role, requested) {
        (Role::Admin, Some(staff_id)) => staff_id,
        _ => actor.id,
    }
}

/// Sucessor precisa existir, ser Staff/Admin ativo, não ser o próprio e estar sem turno.
pub fn check_successor(
    outgoing_staff_id: i32,
    successor: Option<&User>,
    successor_has_active_shift: bool,
) -> Result<(), AppError> {
    let successor = successor.ok_or(AppError::InvalidSuccessor)?;
    if successor.id == outgoing_staff_id || !successor.is_eligible_successor() {
        return Err(AppError::InvalidSuccessor);
    }
    if successor_has_active_shift {
        return Err(AppError::ShiftAlreadyActive(successor.id));
    }
    Ok(())
}

/// Avisos da passagem de turno: um para quem recebe, outro para quem sai.
pub fn handoff_notifications(
    outgoing: &User,
    successor: &User,
    amount: Decimal,
    now: NaiveDateTime,
) -> Vec<NotificationDraft> {
    let when = now.format("%d/%m/%Y %H:%M");
    vec![
        NotificationDraft {
            sender_id: Some(outgoing.id),
            recipient_id: successor.id,
            title: "Shift handoff".to_string(),
            body: format!(
                "{} handed the shift over to you at {} with {} in cash.",
                outgoing.full_name, when, amount
            ),
            category: NotificationCategory::Handoff,
        },
        NotificationDraft {
            sender_id: None,
            recipient_id: outgoing.id,
            title: "Shift handed off".to_string(),
            body: format!(
                "Your shift was handed over to {} at {} with {} in cash.",
                successor.full_name, when, amount
            ),
            category: NotificationCategory::Handoff,
        },
    ]
}

/// Avisos de turno travado: um por admin (enviado pelo dono do turno) + um ao dono.
pub fn stuck_shift_notifications(
    stuck: &[(Shift, String)],
    admins: &[User],
    now: NaiveDateTime,
) -> Vec<NotificationDraft> {
    let mut drafts = Vec::new();
    for (shift, staff_name) in stuck {
        let hours = (now - shift.started_at).num_hours();
        let started = shift.started_at.format("%d/%m/%Y %H:%M");

        for admin in admins {
            drafts.push(NotificationDraft {
                sender_id: Some(shift.staff_id),
                recipient_id: admin.id,
                title: "Stuck shift".to_string(),
                body: format!(
                    "Shift #{} of {} has been active since {} ({} hours).",
                    shift.id, staff_name, started, hours
                ),
                category: NotificationCategory::Warning,
            });
        }
        drafts.push(NotificationDraft {
            sender_id: None,
            recipient_id: shift.staff_id,
            title: "Stuck shift".to_string(),
            body: format!(
                "Your shift #{} has been active since {} ({} hours). Please end or hand it off.",
                shift.id, started, hours
            ),
            category: NotificationCategory::Warning,
        });
    }
    drafts
}

/// Texto de auditoria com a conferência de caixa.
pub fn audit_detail(note: Option<&str>, collected: Decimal, invoiced: Decimal) -> String {
    let mut detail = format!("collected {collected}, invoiced {invoiced}");
    if collected != invoiced {
        detail.push_str(&format!(" (difference {})", collected - invoiced));
    }
    if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
        detail.push_str(" | ");
        detail.push_str(note.trim());
    }
    detail
}

#[derive(Clone)]
pub struct ShiftService {
    shift_repo: ShiftRepository,
    user_repo: UserRepository,
    invoice_repo: InvoiceRepository,
    notification_repo: NotificationRepository,
    stuck_after: Duration,
}

impl ShiftService {
    pub fn new(
        shift_repo: ShiftRepository,
        user_repo: UserRepository,
        invoice_repo: InvoiceRepository,
        notification_repo: NotificationRepository,
        stuck_after_hours: i64,
    ) -> Self {
        Self {
            shift_repo,
            user_repo,
            invoice_repo,
            notification_repo,
            stuck_after: Duration::hours(stuck_after_hours),
        }
    }

    pub async fn start<'a, A>(
        &self,
        executor: A,
        staff_id: i32,
        opening_amount: Option<Decimal>,
        now: NaiveDateTime,
    ) -> Result<Shift, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        if opening_amount.is_some_and(|a| a.is_sign_negative()) {
            return Err(AppError::InvalidInput("opening amount cannot be negative".to_string()));
        }

        let mut tx = executor.begin().await?;
        lock_for_update(&mut *tx, LockScope::Staff, staff_id).await?;

        if self.shift_repo.find_active_for_staff(&mut *tx, staff_id).await?.is_some() {
            return Err(AppError::ShiftAlreadyActive(staff_id));
        }

        let shift = self.shift_repo.open(&mut *tx, staff_id, now, opening_amount).await?;
        self.shift_repo
            .record_action(&mut *tx, shift.id, staff_id, ShiftActionKind::Start, None, now)
            .await?;

        tx.commit().await?;

        tracing::info!("⏱️ Turno {} aberto para funcionário {}", shift.id, staff_id);
        Ok(shift)
    }

    pub async fn current<'a, A>(&self, executor: A, staff_id: i32, now: NaiveDateTime) -> Result<CurrentShiftView, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let shift = self
            .shift_repo
            .find_active_for_staff(&mut *conn, staff_id)
            .await?
            .ok_or(AppError::NoActiveShift)?;
        let invoiced_total = self.invoice_repo.paid_total_for_shift(&mut *conn, shift.id).await?;
        let available_successors = self.user_repo.list_available_staff(Some(staff_id)).await?;

        Ok(CurrentShiftView {
            hours_worked: (now - shift.started_at).num_hours().max(0),
            shift,
            invoiced_total,
            available_successors,
        })
    }

    /// Encerra o turno e, se houver sucessor, abre o turno dele com o valor repassado.
    pub async fn end<'a, A>(
        &self,
        executor: A,
        actor: &User,
        request: ShiftEndRequest,
        now: NaiveDateTime,
    ) -> Result<ShiftEndOutcome, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        validate_end_request(&request)?;
        let staff_id = resolve_target_staff(actor, request.staff_id);

        let mut tx = executor.begin().await?;

        // Ordem fixa de locks evita deadlock entre passagens cruzadas
        let mut to_lock = vec![staff_id];
        to_lock.extend(request.successor_id);
        to_lock.sort_unstable();
        to_lock.dedup();
        for id in to_lock {
            lock_for_update(&mut *tx, LockScope::Staff, id).await?;
        }

        let shift = self
            .shift_repo
            .find_active_for_staff(&mut *tx, staff_id)
            .await?
            .ok_or(AppError::NoActiveShift)?;

        let outgoing = self
            .user_repo
            .find_by_id(&mut *tx, staff_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("staff".to_string()))?;
        if !outgoing.is_active() {
            return Err(AppError::InvalidTransition("staff member is not active".to_string()));
        }

        let successor = match request.successor_id {
            Some(successor_id) => {
                let successor = self.user_repo.find_by_id(&mut *tx, successor_id).await?;
                let busy = self
                    .shift_repo
                    .find_active_for_staff(&mut *tx, successor_id)
                    .await?
                    .is_some();
                check_successor(staff_id, successor.as_ref(), busy)?;
                successor
            }
            None => None,
        };

        let invoiced_total = self.invoice_repo.paid_total_for_shift(&mut *tx, shift.id).await?;
        if invoiced_total != request.collected_total {
            tracing::warn!(
                "Turno {}: declarado {} x faturado {}",
                shift.id,
                request.collected_total,
                invoiced_total
            );
        }

        let handoff_amount = successor
            .as_ref()
            .map(|_| request.handoff_amount.unwrap_or(Decimal::ZERO));

        let ended_shift = self
            .shift_repo
            .close(
                &mut *tx,
                shift.id,
                &ShiftClosing {
                    ended_at: now,
                    collected_total: request.collected_total,
                    invoiced_total,
                    handoff_amount,
                    successor_id: successor.as_ref().map(|s| s.id),
                    note: request.note.clone(),
                },
            )
            .await?;

        let kind = if successor.is_some() { ShiftActionKind::Handoff } else { ShiftActionKind::End };
        let detail = audit_detail(request.note.as_deref(), request.collected_total, invoiced_total);
        self.shift_repo
            .record_action(&mut *tx, shift.id, actor.id, kind, Some(&detail), now)
            .await?;

        let successor_shift = match (&successor, handoff_amount) {
            (Some(successor), Some(amount)) => {
                let new_shift = self.shift_repo.open(&mut *tx, successor.id, now, Some(amount)).await?;
                self.shift_repo
                    .record_action(&mut *tx, new_shift.id, successor.id, ShiftActionKind::Start, None, now)
                    .await?;
                for draft in handoff_notifications(&outgoing, successor, amount, now) {
                    self.notification_repo.insert(&mut *tx, &draft, now).await?;
                }
                Some(new_shift)
            }
            _ => None,
        };

        tx.commit().await?;

        let message = match &successor {
            Some(s) => format!("Shift handed over to {}", s.full_name),
            None => "Shift ended".to_string(),
        };
        tracing::info!("⏹️ Turno {} encerrado ({})", ended_shift.id, message);

        Ok(ShiftEndOutcome { ended_shift, successor_shift, message })
    }

    /// Varredura de turnos ativos há mais tempo que o limite.
    pub async fn check_stuck<'a, A>(&self, executor: A, now: NaiveDateTime) -> Result<StuckShiftReport, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let shifts = self.shift_repo.find_started_before(now - self.stuck_after).await?;
        if shifts.is_empty() {
            return Ok(StuckShiftReport { stuck_shifts: 0, notifications_sent: 0 });
        }

        let mut tx = executor.begin().await?;

        let admins = self.user_repo.list_active_admins(&mut *tx).await?;
        let mut stuck = Vec::with_capacity(shifts.len());
        for shift in shifts {
            let name = self
                .user_repo
                .find_by_id(&mut *tx, shift.staff_id)
                .await?
                .map(|u| u.full_name)
                .unwrap_or_else(|| format!("staff #{}", shift.staff_id));
            stuck.push((shift, name));
        }

        let drafts = stuck_shift_notifications(&stuck, &admins, now);
        for draft in &drafts {
            self.notification_repo.insert(&mut *tx, draft, now).await?;
        }

        tx.commit().await?;

        tracing::warn!("⚠️ {} turno(s) travado(s), {} aviso(s) enviados", stuck.len(), drafts.len());
        Ok(StuckShiftReport { stuck_shifts: stuck.len(), notifications_sent: drafts.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::UserStatus, shift::ShiftStatus};
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .expect("valid time")
    }

    fn user(id: i32, role: Role, status: UserStatus) -> User {
        User {
            id,
            full_name: format!("User {id}"),
            email: None,
            phone: None,
            role,
            status,
            created_at: at(1, 0),
        }
    }

    fn request(successor_id: Option<i32>) -> ShiftEndRequest {
        ShiftEndRequest {
            staff_id: None,
            collected_total: Decimal::from(1_000_000),
            handoff_amount: successor_id.map(|_| Decimal::from(500_000)),
            note: None,
            successor_id,
        }
    }

    #[test]
    fn negative_totals_are_rejected() {
        let mut req = request(None);
        req.collected_total = Decimal::from(-1);
        assert!(matches!(validate_end_request(&req), Err(AppError::InvalidInput(_))));

        let mut req = request(Some(3));
        req.handoff_amount = Some(Decimal::from(-5));
        assert!(validate_end_request(&req).is_err());

        assert!(validate_end_request(&request(Some(3))).is_ok());
    }

    #[test]
    fn only_admins_may_end_someone_elses_shift() {
        let admin = user(1, Role::Admin, UserStatus::Active);
        let staff = user(2, Role::Staff, UserStatus::Active);
        assert_eq!(resolve_target_staff(&admin, Some(9)), 9);
        assert_eq!(resolve_target_staff(&admin, None), 1);
        assert_eq!(resolve_target_staff(&staff, Some(9)), 2);
    }

    #[test]
    fn inactive_successor_is_rejected() {
        let inactive = user(3, Role::Staff, UserStatus::Inactive);
        assert!(matches!(
            check_successor(2, Some(&inactive), false),
            Err(AppError::InvalidSuccessor)
        ));
    }

    #[test]
    fn successor_must_be_staff_other_than_self_and_free() {
        let guest = user(3, Role::Guest, UserStatus::Active);
        let colleague = user(4, Role::Staff, UserStatus::Active);

        assert!(check_successor(2, Some(&guest), false).is_err());
        assert!(check_successor(2, None, false).is_err());
        assert!(check_successor(4, Some(&colleague), false).is_err());
        assert!(matches!(
            check_successor(2, Some(&colleague), true),
            Err(AppError::ShiftAlreadyActive(4))
        ));
        assert!(check_successor(2, Some(&colleague), false).is_ok());
    }

    #[test]
    fn handoff_notifies_successor_and_outgoing_staff() {
        let outgoing = user(2, Role::Staff, UserStatus::Active);
        let successor = user(3, Role::Staff, UserStatus::Active);
        let drafts = handoff_notifications(&outgoing, &successor, Decimal::from(500_000), at(1, 22));

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].recipient_id, 3);
        assert_eq!(drafts[0].sender_id, Some(2));
        assert_eq!(drafts[1].recipient_id, 2);
        assert!(drafts.iter().all(|d| d.category == NotificationCategory::Handoff));
        assert!(drafts[0].body.contains("500000"));
    }

    #[test]
    fn stuck_shift_warns_every_admin_and_the_owner() {
        let shift = Shift {
            id: 8,
            staff_id: 2,
            started_at: at(1, 6),
            ended_at: None,
            status: ShiftStatus::Active,
            opening_amount: None,
            collected_total: None,
            invoiced_total: None,
            handoff_amount: None,
            successor_id: None,
            note: None,
        };
        let admins = vec![user(1, Role::Admin, UserStatus::Active), user(9, Role::Admin, UserStatus::Active)];
        let drafts = stuck_shift_notifications(&[(shift, "Bình".into())], &admins, at(2, 8));

        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].recipient_id, 1);
        assert_eq!(drafts[0].sender_id, Some(2));
        assert_eq!(drafts[1].recipient_id, 9);
        assert_eq!(drafts[2].recipient_id, 2);
        assert_eq!(drafts[2].sender_id, None);
        assert!(drafts[0].body.contains("26 hours"));
        assert!(drafts.iter().all(|d| d.category == NotificationCategory::Warning));
    }

    #[test]
    fn audit_detail_records_cash_difference() {
        let detail = audit_detail(Some(" drawer short "), Decimal::from(900), Decimal::from(1_000));
        assert!(detail.contains("difference -100"));
        assert!(detail.ends_with("drawer short"));

        let exact = audit_detail(None, Decimal::from(1_000), Decimal::from(1_000));
        assert!(!exact.contains("difference"));
    }
}
