// src/services/mail_service.rs

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// Transporte de e-mail. Em produção SMTP; sem configuração, só loga.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(&self, to: &str, subject: &str, html_body: String) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

pub struct SmtpMailer {
    settings: SmtpSettings,
    credentials: Credentials,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        let credentials = Credentials::new(settings.username.clone(), settings.password.clone());
        Self { settings, credentials }
    }

    fn build_transport(&self) -> anyhow::Result<AsyncSmtpTransport<Tokio1Executor>> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.server)
            .with_context(|| format!("SMTP relay error for {}", self.settings.server))?
            .port(self.settings.port)
            .credentials(self.credentials.clone())
            .build();
        Ok(transport)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, to: &str, subject: &str, html_body: String) -> anyhow::Result<()> {
        let from = format!("{} <{}>", self.settings.from_name, self.settings.from_email);
        let email = Message::builder()
            .from(from.parse::<Mailbox>().context("invalid from address")?)
            .to(to.parse::<Mailbox>().context("invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .context("failed to build email")?;

        let transport = self.build_transport()?;
        transport.send(email).await.context("SMTP send failed")?;

        Ok(())
    }
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_html(&self, to: &str, subject: &str, _html_body: String) -> anyhow::Result<()> {
        tracing::info!("📧 (SMTP não configurado) e-mail para {}: {}", to, subject);
        Ok(())
    }
}

// Dados do e-mail de confirmação de reserva online
#[derive(Debug, Clone)]
pub struct BookingConfirmation {
    pub booking_id: i32,
    pub guest_name: String,
    pub room_number: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl BookingConfirmation {
    pub fn subject(&self) -> String {
        format!("Booking confirmation #{}", self.booking_id)
    }

    pub fn html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Booking confirmation</title></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2563eb;">Thank you, {guest}!</h2>
        <p>Your booking <strong>#{id}</strong> is confirmed.</p>
        <ul>
            <li>Room: <strong>{room}</strong></li>
            <li>Check-in: {check_in}</li>
            <li>Check-out: {check_out}</li>
        </ul>
        <p style="color: #666; font-size: 14px;">Please bring your identity document at check-in.</p>
    </div>
</body>
</html>"#,
            guest = self.guest_name,
            id = self.booking_id,
            room = self.room_number,
            check_in = self.check_in.format("%d/%m/%Y"),
            check_out = self.check_out.format("%d/%m/%Y"),
        )
    }
}

#[derive(Clone)]
pub struct MailService {
    mailer: Arc<dyn Mailer>,
}

impl MailService {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Envio em segundo plano: falha só gera log, a reserva já está gravada.
    pub fn spawn_booking_confirmation(&self, to: String, confirmation: BookingConfirmation) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            let result = mailer
                .send_html(&to, &confirmation.subject(), confirmation.html())
                .await;
            match result {
                Ok(()) => tracing::info!("📧 Confirmação da reserva {} enviada", confirmation.booking_id),
                Err(e) => tracing::warn!(
                    "Falha ao enviar confirmação da reserva {}: {:#}",
                    confirmation.booking_id,
                    e
                ),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_html(&self, to: &str, subject: &str, _html_body: String) -> anyhow::Result<()> {
            self.sent
                .lock()
                .expect("lock")
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_html(&self, _to: &str, _subject: &str, _html_body: String) -> anyhow::Result<()> {
            anyhow::bail!("smtp down")
        }
    }

    fn confirmation() -> BookingConfirmation {
        BookingConfirmation {
            booking_id: 42,
            guest_name: "Phạm Minh Đức".into(),
            room_number: "205".into(),
            check_in: NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date"),
            check_out: NaiveDate::from_ymd_opt(2025, 6, 5).expect("valid date"),
        }
    }

    #[test]
    fn confirmation_mentions_room_and_dates() {
        let html = confirmation().html();
        assert!(html.contains("205"));
        assert!(html.contains("02/06/2025"));
        assert!(html.contains("05/06/2025"));
        assert_eq!(confirmation().subject(), "Booking confirmation #42");
    }

    #[tokio::test]
    async fn confirmation_is_sent_in_background() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = MailService::new(mailer.clone());

        service.spawn_booking_confirmation("guest@example.com".into(), confirmation());

        for _ in 0..50 {
            if !mailer.sent.lock().expect("lock").is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let sent = mailer.sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "guest@example.com");
    }

    #[tokio::test]
    async fn mail_failure_is_swallowed() {
        let service = MailService::new(Arc::new(FailingMailer));
        service.spawn_booking_confirmation("guest@example.com".into(), confirmation());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
