//! Módulo de base de datos
//!
//! Conexión a PostgreSQL y migraciones.

pub mod connection;

pub use connection::{create_pool, run_migrations};
