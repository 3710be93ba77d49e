//! API server configuration.

use ticketgate_core::otp::PhoneOtpConfig;

/// Default code lifetime at the SMS provider.
const DEFAULT_SMS_OTP_TTL_SECS: u64 = 300;
const DEFAULT_SMS_OTP_TEMPLATE: &str = "Your verification code is $code";

/// Outbound mail API settings.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub from: String,
}

/// Configuration for the API server.
///
/// Token signing secrets are not part of it: they are resolved from the
/// environment each time a token is issued or verified.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3200").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Redis URL for the session cache. `None` falls back to the in-process cache.
    pub redis_url: Option<String>,
    /// `None` logs OTP mails instead of sending them.
    pub mail: Option<MailConfig>,
    /// `None` disables the phone OTP routes.
    pub phone_otp: Option<PhoneOtpConfig>,
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                         |
    /// |--------------------|-------------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:3200`                                |
    /// | `DATABASE_URL`     | `postgres://localhost:5432/ticketgate`          |
    /// | `REDIS_URL`        | unset (in-process cache)                        |
    /// | `MAIL_API_URL`     | unset (mail is logged)                          |
    /// | `MAIL_API_KEY`     | unset                                           |
    /// | `MAIL_FROM`        | `no-reply@ticketgate.local`                     |
    /// | `SMS_OTP_URL`      | unset (phone OTP disabled)                      |
    /// | `SMS_OTP_API_KEY`  | unset                                           |
    /// | `SMS_OTP_FROM`     | `Ticketgate`                                    |
    /// | `SMS_OTP_SENDER`   | `TICKETGATE`                                    |
    /// | `SMS_OTP_TEMPLATE` | `Your verification code is $code`               |
    /// | `SMS_OTP_TTL`      | `300`                                           |
    pub fn from_env() -> Self {
        let mail = var("MAIL_API_URL").map(|url| MailConfig {
            url,
            api_key: var("MAIL_API_KEY"),
            from: var("MAIL_FROM").unwrap_or_else(|| "no-reply@ticketgate.local".into()),
        });

        let phone_otp = var("SMS_OTP_URL").map(|base_url| PhoneOtpConfig {
            base_url,
            api_key: var("SMS_OTP_API_KEY"),
            from: var("SMS_OTP_FROM").unwrap_or_else(|| "Ticketgate".into()),
            sender: var("SMS_OTP_SENDER").unwrap_or_else(|| "TICKETGATE".into()),
            template: var("SMS_OTP_TEMPLATE").unwrap_or_else(|| DEFAULT_SMS_OTP_TEMPLATE.into()),
            ttl_secs: var("SMS_OTP_TTL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SMS_OTP_TTL_SECS),
        });

        Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3200".into()),
            pg_connection_url: var("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost:5432/ticketgate".into()),
            redis_url: var("REDIS_URL"),
            mail,
            phone_otp,
        }
    }
}
