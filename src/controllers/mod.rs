pub mod admin_controller;
pub mod auth_controller;
pub mod booking_controller;
pub mod chat_controller;
pub mod vehicle_controller;
