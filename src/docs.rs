// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Rooms ---
        handlers::rooms::list_room_types,
        handlers::rooms::create_room_type,
        handlers::rooms::update_room_type,
        handlers::rooms::delete_room_type,
        handlers::rooms::list_rooms,
        handlers::rooms::get_room,
        handlers::rooms::create_room,
        handlers::rooms::update_room,
        handlers::rooms::delete_room,
        handlers::rooms::set_room_occupancy,
        handlers::rooms::check_availability,
        handlers::rooms::refresh_room_status,

        // --- Bookings ---
        handlers::bookings::create_walk_in,
        handlers::bookings::create_online,
        handlers::bookings::get_booking,
        handlers::bookings::find_guest,
        handlers::bookings::cancel_booking,
        handlers::bookings::update_booking_status,

        // --- Billing ---
        handlers::billing::list_services,
        handlers::billing::list_service_charges,
        handlers::billing::add_service_charge,
        handlers::billing::checkout,
        handlers::billing::pay_online,
        handlers::billing::list_invoices,
        handlers::billing::update_invoice_status,

        // --- Groups ---
        handlers::groups::list_groups,
        handlers::groups::save_group,
        handlers::groups::assign_booking,
        handlers::groups::merge_bill,

        // --- Shifts ---
        handlers::shifts::start_shift,
        handlers::shifts::current_shift,
        handlers::shifts::available_staff,
        handlers::shifts::end_shift,
        handlers::shifts::check_stuck_shifts,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_read,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::UserStatus,
            models::auth::User,
            models::auth::StaffSummary,

            // --- Rooms ---
            models::room::RoomType,
            models::room::Room,
            models::room::RoomDetail,
            services::room_service::AvailabilityReport,
            handlers::rooms::CreateRoomTypePayload,
            handlers::rooms::UpdateRoomTypePayload,
            handlers::rooms::CreateRoomPayload,
            handlers::rooms::UpdateRoomPayload,
            handlers::rooms::RoomOccupancyPayload,
            handlers::rooms::RoomStatusRefresh,

            // --- Bookings ---
            models::booking::BookingStatus,
            models::booking::PaymentStatus,
            models::booking::TenancyReportStatus,
            models::booking::BookingKind,
            models::booking::Booking,
            models::booking::BookingDetail,
            models::guest::Guest,
            handlers::bookings::GuestPayload,
            handlers::bookings::WalkInPayload,
            handlers::bookings::OnlineBookingPayload,
            handlers::bookings::UpdateStatusPayload,

            // --- Billing ---
            models::booking::Service,
            models::booking::ServiceCharge,
            models::invoice::PaymentMethod,
            models::invoice::Invoice,
            handlers::billing::AddServiceChargePayload,
            handlers::billing::CheckoutPayload,
            handlers::billing::InvoiceStatusPayload,

            // --- Groups ---
            models::group::GroupStatus,
            models::group::GroupBooking,
            models::group::GroupDetail,
            models::group::GroupSettlement,
            handlers::groups::GroupPayload,
            handlers::groups::AssignBookingPayload,
            handlers::groups::MergeBillPayload,

            // --- Shifts ---
            models::shift::ShiftStatus,
            models::shift::ShiftActionKind,
            models::shift::Shift,
            models::shift::CurrentShiftView,
            models::shift::ShiftEndOutcome,
            services::shift_service::StuckShiftReport,
            handlers::shifts::StartShiftPayload,
            handlers::shifts::EndShiftPayload,

            // --- Notifications ---
            models::notification::NotificationCategory,
            models::notification::ReadStatus,
            models::notification::Notification,
            models::notification::NotificationFeed,
            handlers::notifications::UnreadCount,
        )
    ),
    tags(
        (name = "Rooms", description = "Quartos, tarifas e disponibilidade"),
        (name = "Bookings", description = "Reservas de balcão e online"),
        (name = "Billing", description = "Serviços, fechamento de conta e faturas"),
        (name = "Groups", description = "Reservas em grupo e conta unificada"),
        (name = "Shifts", description = "Livro de turnos e passagem de caixa"),
        (name = "Notifications", description = "Avisos de passagem e turnos travados")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_core_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/bookings/walk-in",
            "/api/bookings/{id}/checkout",
            "/api/groups/{id}/merge-bill",
            "/api/shifts/end",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
