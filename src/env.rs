use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Runtime settings read from the process environment after the env files are loaded.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub media_root: PathBuf,
    pub session_hours: i64,
    pub mail_from: String,
    pub smtp: Option<SmtpConfig>,
    pub admin: Option<AdminBootstrap>,
}

fn non_empty(key: &str) -> Option<String> {
    dotenvy::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let session_hours = match non_empty("SESSION_HOURS").map(|v| v.parse::<i64>()) {
            Some(Ok(hours)) if hours > 0 => hours,
            Some(_) => {
                warn!("Ignoring invalid SESSION_HOURS, using 24");
                24
            }
            None => 24,
        };

        let smtp = non_empty("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: non_empty("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(25),
            username: non_empty("SMTP_USERNAME"),
            password: non_empty("SMTP_PASSWORD"),
        });

        let admin = match (non_empty("ADMIN_USERNAME"), non_empty("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminBootstrap {
                email: non_empty("ADMIN_EMAIL").unwrap_or_default(),
                username,
                password,
            }),
            _ => None,
        };

        Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://fittrack.db?mode=rwc".to_string()),
            media_root: PathBuf::from(non_empty("MEDIA_ROOT").unwrap_or_else(|| "media".to_string())),
            session_hours,
            mail_from: non_empty("MAIL_FROM")
                .unwrap_or_else(|| "FitTrack <noreply@fittrack.local>".to_string()),
            smtp,
            admin,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            media_root: PathBuf::from("media"),
            session_hours: 24,
            mail_from: "FitTrack <noreply@fittrack.local>".to_string(),
            smtp: None,
            admin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_without_environment() {
        temp_env::with_vars_unset(
            [
                "DATABASE_URL",
                "MEDIA_ROOT",
                "SESSION_HOURS",
                "SMTP_HOST",
                "ADMIN_USERNAME",
                "ADMIN_PASSWORD",
            ],
            || {
                let config = AppConfig::from_env();
                assert_eq!(config.database_url, "sqlite://fittrack.db?mode=rwc");
                assert_eq!(config.media_root, PathBuf::from("media"));
                assert_eq!(config.session_hours, 24);
                assert!(config.smtp.is_none());
                assert!(config.admin.is_none());
            },
        );
    }

    #[test]
    #[serial]
    fn test_smtp_and_admin_from_environment() {
        temp_env::with_vars(
            [
                ("SMTP_HOST", Some("mail.example.com")),
                ("SMTP_PORT", Some("2525")),
                ("SMTP_USERNAME", Some("mailer")),
                ("SMTP_PASSWORD", None),
                ("ADMIN_USERNAME", Some("root")),
                ("ADMIN_PASSWORD", Some("hunter22")),
                ("ADMIN_EMAIL", Some("root@example.com")),
                ("SESSION_HOURS", Some("not-a-number")),
            ],
            || {
                let config = AppConfig::from_env();
                assert_eq!(
                    config.smtp,
                    Some(SmtpConfig {
                        host: "mail.example.com".to_string(),
                        port: 2525,
                        username: Some("mailer".to_string()),
                        password: None,
                    })
                );
                assert_eq!(
                    config.admin,
                    Some(AdminBootstrap {
                        username: "root".to_string(),
                        password: "hunter22".to_string(),
                        email: "root@example.com".to_string(),
                    })
                );
                assert_eq!(config.session_hours, 24);
            },
        );
    }
}
