// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    db::{
        BookingRepository, GroupRepository, GuestRepository, InvoiceRepository,
        NotificationRepository, RoomRepository, ServiceCatalogRepository, ShiftRepository,
        UserRepository,
    },
    services::{
        availability_service::AvailabilityService,
        billing_service::BillingService,
        booking_service::BookingService,
        group_service::GroupService,
        mail_service::{LogMailer, MailService, Mailer, SmtpMailer, SmtpSettings},
        notification_service::NotificationService,
        room_service::RoomService,
        shift_service::ShiftService,
    },
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub stuck_shift_hours: i64,
    pub smtp: Option<SmtpSettings>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta as configurações a partir de qualquer fonte chave/valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} deve ser definida"));
        let parsed = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let bind_addr = parsed("BIND_ADDR", "0.0.0.0:3000");
        let db_max_connections = parsed("DB_MAX_CONNECTIONS", "5")
            .parse()
            .context("DB_MAX_CONNECTIONS inválido")?;
        let stuck_shift_hours = parsed("STUCK_SHIFT_HOURS", "24")
            .parse()
            .context("STUCK_SHIFT_HOURS inválido")?;

        // SMTP só é usado se servidor e credenciais estiverem presentes
        let smtp = match (lookup("SMTP_SERVER"), lookup("SMTP_USERNAME"), lookup("SMTP_PASSWORD")) {
            (Some(server), Some(username), Some(password)) => {
                let from_email = lookup("SMTP_FROM_EMAIL").unwrap_or_else(|| username.clone());
                Some(SmtpSettings {
                    server,
                    port: parsed("SMTP_PORT", "587").parse().context("SMTP_PORT inválido")?,
                    username,
                    password,
                    from_email,
                    from_name: parsed("SMTP_FROM_NAME", "Hotel"),
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
            stuck_shift_hours,
            smtp,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub user_repo: UserRepository,
    pub room_service: RoomService,
    pub booking_service: BookingService,
    pub billing_service: BillingService,
    pub group_service: GroupService,
    pub shift_service: ShiftService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let mailer: Arc<dyn Mailer> = match &settings.smtp {
            Some(smtp) => {
                tracing::info!("📧 SMTP configurado em {}:{}", smtp.server, smtp.port);
                Arc::new(SmtpMailer::new(smtp.clone()))
            }
            None => {
                tracing::warn!("SMTP não configurado; e-mails serão apenas registrados no log");
                Arc::new(LogMailer)
            }
        };

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let room_repo = RoomRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());
        let guest_repo = GuestRepository::new(db_pool.clone());
        let catalog_repo = ServiceCatalogRepository::new(db_pool.clone());
        let invoice_repo = InvoiceRepository::new(db_pool.clone());
        let shift_repo = ShiftRepository::new(db_pool.clone());
        let group_repo = GroupRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());

        let availability = AvailabilityService::new(room_repo.clone(), booking_repo.clone());

        let room_service = RoomService::new(room_repo.clone(), booking_repo.clone(), availability.clone());
        let booking_service = BookingService::new(
            booking_repo.clone(),
            room_repo.clone(),
            guest_repo,
            user_repo.clone(),
            availability,
            MailService::new(mailer),
        );
        let billing_service = BillingService::new(
            booking_repo.clone(),
            room_repo.clone(),
            catalog_repo.clone(),
            invoice_repo.clone(),
            shift_repo.clone(),
        );
        let group_service = GroupService::new(
            group_repo,
            booking_repo,
            room_repo,
            catalog_repo,
            invoice_repo.clone(),
            shift_repo.clone(),
        );
        let shift_service = ShiftService::new(
            shift_repo,
            user_repo.clone(),
            invoice_repo,
            notification_repo.clone(),
            settings.stuck_shift_hours,
        );
        let notification_service = NotificationService::new(notification_repo);

        Ok(Self {
            db_pool,
            jwt_secret: settings.jwt_secret.clone(),
            user_repo,
            room_service,
            booking_service,
            billing_service,
            group_service,
            shift_service,
            notification_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_are_missing() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/hotel"),
            ("JWT_SECRET", "segredo"),
        ]))
        .expect("settings");

        assert_eq!(settings.bind_addr, "0.0.0.0:3000");
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.stuck_shift_hours, 24);
        assert!(settings.smtp.is_none());
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Settings::from_lookup(lookup_from(&[("JWT_SECRET", "segredo")])).is_err());
    }

    #[test]
    fn smtp_is_enabled_with_server_and_credentials() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/hotel"),
            ("JWT_SECRET", "segredo"),
            ("STUCK_SHIFT_HOURS", "12"),
            ("SMTP_SERVER", "smtp.example.com"),
            ("SMTP_USERNAME", "reservas@example.com"),
            ("SMTP_PASSWORD", "senha"),
        ]))
        .expect("settings");

        assert_eq!(settings.stuck_shift_hours, 12);
        let smtp = settings.smtp.expect("smtp settings");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from_email, "reservas@example.com");
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(Settings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/hotel"),
            ("JWT_SECRET", "segredo"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]))
        .is_err());
    }
}
