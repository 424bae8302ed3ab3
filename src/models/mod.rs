pub mod auth;
pub mod booking;
pub mod geo_fence;
pub mod message;
pub mod user;
pub mod vehicle;
