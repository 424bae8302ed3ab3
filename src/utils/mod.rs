pub mod admin_seeder;
pub mod errors;
pub mod uploads;
