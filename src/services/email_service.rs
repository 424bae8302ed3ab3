//! Despachador de notificaciones por correo
//!
//! Envíos transaccionales templados por tipo de evento: bienvenida,
//! reserva recibida, recibo de pago, cambio de estado y reset de password.
//! Siempre fire-and-forget: los controllers hacen tokio::spawn y nunca
//! esperan el resultado; los fallos se loguean y jamás se reintentan.

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

use crate::config::environment::{EnvironmentConfig, SmtpConfig};
use crate::models::booking::Booking;
use crate::models::user::User;
use crate::models::vehicle::Vehicle;

#[derive(Clone)]
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
    client_url: String,
}

impl EmailService {
    pub fn new(config: &EnvironmentConfig) -> Self {
        match &config.smtp {
            Some(smtp) => match Self::build_mailer(smtp) {
                Ok((mailer, from)) => Self {
                    mailer: Some(mailer),
                    from: Some(from),
                    client_url: config.client_url.clone(),
                },
                Err(e) => {
                    error!("❌ Error configurando SMTP, correos deshabilitados: {}", e);
                    Self::disabled(config)
                }
            },
            None => {
                warn!("⚠️ SMTP no configurado, el envío de correos queda deshabilitado");
                Self::disabled(config)
            }
        }
    }

    fn disabled(config: &EnvironmentConfig) -> Self {
        Self {
            mailer: None,
            from: None,
            client_url: config.client_url.clone(),
        }
    }

    fn build_mailer(
        smtp: &SmtpConfig,
    ) -> anyhow::Result<(AsyncSmtpTransport<Tokio1Executor>, Mailbox)> {
        let creds = Credentials::new(smtp.email.clone(), smtp.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
            .port(smtp.port)
            .credentials(creds)
            .build();

        let from: Mailbox = format!("{} <{}>", smtp.from_name, smtp.email).parse()?;

        Ok((mailer, from))
    }

    /// Envío base. Nunca propaga errores: el dispatcher no está en el
    /// camino crítico de ningún request.
    async fn send(&self, to: &str, subject: &str, html: String) {
        let (mailer, from) = match (&self.mailer, &self.from) {
            (Some(m), Some(f)) => (m, f),
            _ => {
                warn!("📭 Correo '{}' omitido: SMTP deshabilitado", subject);
                return;
            }
        };

        let to_mailbox: Mailbox = match to.parse() {
            Ok(mb) => mb,
            Err(e) => {
                error!("❌ Dirección de correo inválida '{}': {}", to, e);
                return;
            }
        };

        let email = match Message::builder()
            .from(from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
        {
            Ok(email) => email,
            Err(e) => {
                error!("❌ Error construyendo correo '{}': {}", subject, e);
                return;
            }
        };

        match mailer.send(email).await {
            Ok(_) => info!("📧 Correo enviado: {}", subject),
            Err(e) => error!("❌ Error enviando correo '{}': {}", subject, e),
        }
    }

    // --- Templates ---

    fn base_template(content: &str) -> String {
        format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 10px; background-color: #ffffff;">
    <div style="color: #333; line-height: 1.6;">
        {}
    </div>
    <div style="margin-top: 30px; border-top: 1px solid #eee; padding-top: 20px; text-align: center; color: #888; font-size: 12px;"><p>&copy; IntelliDrive Vehicle Rental. All rights reserved.</p></div>
</div>"#,
            content
        )
    }

    pub fn welcome_body(&self, user_name: &str) -> String {
        let content = format!(
            r#"<h2 style="color: #2563EB;">Welcome to IntelliDrive!</h2>
<p>Hi {},</p>
<p>Thank you for joining IntelliDrive - The smartest way to rent vehicles.</p>
<p>You can now browse our premium fleet, book rides, and track them in real-time.</p>
<p><strong>Get ready to hit the road!</strong></p>
<div style="text-align: center; margin-top: 20px;">
    <a href="{}/login" style="background-color: #2563EB; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; font-weight: bold;">Login Now</a>
</div>"#,
            user_name, self.client_url
        );
        Self::base_template(&content)
    }

    pub async fn send_welcome(&self, user: &User) {
        self.send(
            &user.email,
            "Welcome to IntelliDrive!",
            self.welcome_body(&user.name),
        )
        .await;
    }

    pub async fn send_booking_confirmation(&self, user: &User, booking: &Booking, vehicle: &Vehicle) {
        let content = format!(
            r#"<h2 style="color: #2563EB;">Booking Received</h2>
<p>Hi {},</p>
<p>We have received your booking request. Our team is reviewing it now.</p>
<div style="background-color: #f3f4f6; padding: 15px; border-radius: 8px; margin: 20px 0;">
    <h3>Booking Details</h3>
    <p><strong>Vehicle:</strong> {} {} ({})</p>
    <p><strong>Total Price:</strong> ${}</p>
    <p><strong>Dates:</strong> {} - {}</p>
</div>
<p>You will receive another email once your booking is confirmed.</p>"#,
            user.name,
            vehicle.make,
            vehicle.model,
            vehicle.license_plate,
            booking.total_price,
            booking.start_date.format("%Y-%m-%d"),
            booking.end_date.format("%Y-%m-%d"),
        );
        self.send(
            &user.email,
            "Booking Received - IntelliDrive",
            Self::base_template(&content),
        )
        .await;
    }

    pub fn status_update_body(
        &self,
        user_name: &str,
        booking_id: &str,
        vehicle_label: &str,
        status: &str,
    ) -> String {
        let (color, message) = match status {
            "confirmed" => (
                "#10B981",
                "Great news! Your booking has been confirmed. You can complete the payment in your dashboard.",
            ),
            "cancelled" => (
                "#EF4444",
                "We regret to inform you that your booking has been cancelled.",
            ),
            "completed" => (
                "#2563EB",
                "We hope you enjoyed your ride! Your trip is now marked as completed.",
            ),
            "active" => ("#F59E0B", "Your trip has started! Drive safely."),
            _ => ("#2563EB", ""),
        };

        let mut chars = status.chars();
        let title_status = match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };

        let content = format!(
            r#"<h2 style="color: {color};">Booking {title_status}</h2>
<p>Hi {user_name},</p>
<p>{message}</p>
<div style="background-color: #f3f4f6; padding: 15px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Vehicle:</strong> {vehicle_label}</p>
    <p><strong>Booking ID:</strong> {booking_id}</p>
</div>
<div style="text-align: center; margin-top: 20px;">
    <a href="{client_url}/dashboard" style="background-color: {color}; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; font-weight: bold;">View Booking</a>
</div>"#,
            color = color,
            title_status = title_status,
            user_name = user_name,
            message = message,
            vehicle_label = vehicle_label,
            booking_id = booking_id,
            client_url = self.client_url,
        );
        Self::base_template(&content)
    }

    pub async fn send_booking_status_update(
        &self,
        user: &User,
        booking: &Booking,
        vehicle: &Vehicle,
        status: &str,
    ) {
        let mut chars = status.chars();
        let title_status = match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        };

        let body = self.status_update_body(
            &user.name,
            &booking.id.to_string(),
            &format!("{} {}", vehicle.make, vehicle.model),
            status,
        );
        self.send(
            &user.email,
            &format!("Booking {} - IntelliDrive", title_status),
            body,
        )
        .await;
    }

    pub async fn send_payment_receipt(&self, user: &User, booking: &Booking, vehicle: &Vehicle) {
        let content = format!(
            r#"<h2 style="color: #10B981;">Payment Successful</h2>
<p>Hi {},</p>
<p>We received your payment of <strong>${}</strong>.</p>
<div style="background-color: #f3f4f6; padding: 15px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Transaction ID:</strong> TXN-{}</p>
    <p><strong>Vehicle:</strong> {} {}</p>
    <p><strong>Amount Paid:</strong> ${}</p>
</div>
<p>Thank you for choosing IntelliDrive!</p>"#,
            user.name,
            booking.total_price,
            booking.id.simple(),
            vehicle.make,
            vehicle.model,
            booking.total_price,
        );
        self.send(
            &user.email,
            "Payment Receipt - IntelliDrive",
            Self::base_template(&content),
        )
        .await;
    }

    pub fn password_reset_body(&self, user_name: &str, token: &str) -> String {
        let link = format!("{}/reset-password/{}", self.client_url, token);
        let content = format!(
            r#"<h2 style="color: #2563EB;">Password Reset Requested</h2>
<p>Hi {},</p>
<p>We received a request to reset your password. This link expires in 15 minutes.</p>
<div style="text-align: center; margin-top: 20px;">
    <a href="{}" style="background-color: #2563EB; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px; font-weight: bold;">Reset Password</a>
</div>
<p style="margin-top: 20px; color: #888;">If you did not request this, you can ignore this email.</p>"#,
            user_name, link
        );
        Self::base_template(&content)
    }

    pub async fn send_password_reset(&self, user: &User, token: &str) {
        self.send(
            &user.email,
            "Password Reset - IntelliDrive",
            self.password_reset_body(&user.name, token),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EmailService {
        EmailService {
            mailer: None,
            from: None,
            client_url: "http://localhost:5173".to_string(),
        }
    }

    #[test]
    fn test_welcome_body_contains_login_link() {
        let body = service().welcome_body("Jane");
        assert!(body.contains("Hi Jane"));
        assert!(body.contains("http://localhost:5173/login"));
    }

    #[test]
    fn test_status_update_body_per_status() {
        let svc = service();
        let confirmed = svc.status_update_body("Jane", "abc", "Toyota Corolla", "confirmed");
        assert!(confirmed.contains("Booking Confirmed"));
        assert!(confirmed.contains("#10B981"));

        let cancelled = svc.status_update_body("Jane", "abc", "Toyota Corolla", "cancelled");
        assert!(cancelled.contains("Booking Cancelled"));
        assert!(cancelled.contains("#EF4444"));
    }

    #[test]
    fn test_password_reset_body_contains_token_link() {
        let body = service().password_reset_body("Jane", "deadbeef");
        assert!(body.contains("/reset-password/deadbeef"));
    }

    #[tokio::test]
    async fn test_send_with_disabled_smtp_does_not_panic() {
        let svc = service();
        svc.send("user@example.com", "subject", "<p>hola</p>".to_string())
            .await;
    }
}
