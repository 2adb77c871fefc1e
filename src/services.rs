// src/services.rs

pub mod availability_service;
pub mod billing_service;
pub mod booking_service;
pub mod group_service;
pub mod mail_service;
pub mod notification_service;
pub mod pricing;
pub mod room_service;
pub mod shift_service;
