//! Seeder del usuario administrador
//!
//! En el primer arranque crea la cuenta admin por defecto si no existe.

use sqlx::PgPool;
use tracing::{error, info};

use crate::repositories::user_repository::UserRepository;

const ADMIN_EMAIL: &str = "admin@gmail.com";
const ADMIN_PASSWORD: &str = "admin@123";

pub async fn seed_admin(pool: PgPool) {
    let repository = UserRepository::new(pool);

    match repository.email_exists(ADMIN_EMAIL).await {
        Ok(true) => {}
        Ok(false) => {
            let hash = match bcrypt::hash(ADMIN_PASSWORD, bcrypt::DEFAULT_COST) {
                Ok(hash) => hash,
                Err(e) => {
                    error!("❌ Error hasheando password del admin: {}", e);
                    return;
                }
            };

            match repository
                .create(
                    "System Admin".to_string(),
                    ADMIN_EMAIL.to_string(),
                    hash,
                    "admin",
                )
                .await
            {
                Ok(_) => info!("✅ Usuario admin creado"),
                Err(e) => error!("❌ Error creando usuario admin: {}", e),
            }
        }
        Err(e) => error!("❌ Error verificando usuario admin: {}", e),
    }
}
