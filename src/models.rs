pub mod auth;
pub mod booking;
pub mod group;
pub mod guest;
pub mod invoice;
pub mod notification;
pub mod room;
pub mod shift;
