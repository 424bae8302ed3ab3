//! Módulo de configuración
//!
//! Contiene la configuración del entorno y de la aplicación.

pub mod environment;

pub use environment::EnvironmentConfig;
