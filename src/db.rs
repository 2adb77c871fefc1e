pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod group_repo;
pub use group_repo::GroupRepository;
pub mod guest_repo;
pub use guest_repo::GuestRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod room_repo;
pub use room_repo::RoomRepository;
pub mod service_repo;
pub use service_repo::ServiceCatalogRepository;
pub mod shift_repo;
pub use shift_repo::ShiftRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
