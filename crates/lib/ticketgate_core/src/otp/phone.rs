//! SMS one-time codes, delegated to an external HTTP provider.
//!
//! The provider generates, stores and checks the code. This client only
//! marshals the two GET calls and maps failures onto [`AuthError`].

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::AuthError;
use crate::models::auth::{PhoneOtpChallenge, PhoneOtpVerification};

/// Accepted code lengths.
pub const PHONE_OTP_LENGTHS: std::ops::RangeInclusive<u8> = 4..=10;

/// Stored and looked-up form of a phone number: surrounding whitespace
/// removed, blank treated as absent.
pub(crate) fn normalize_phone(phone: &str) -> Option<String> {
    let phone = phone.trim();
    (!phone.is_empty()).then(|| phone.to_string())
}

/// Provider envelope: `{acknowledge, response: T | {errors}}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    acknowledge: bool,
    response: Option<Reply<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply<T> {
    Ok(T),
    Failed { errors: Value },
}

/// Provider connection settings.
#[derive(Debug, Clone)]
pub struct PhoneOtpConfig {
    /// Base URL, e.g. `https://sms.example.com/otp`.
    pub base_url: String,
    pub api_key: Option<String>,
    /// Application name shown in the message.
    pub from: String,
    /// Sender ID.
    pub sender: String,
    /// Message template; the provider substitutes the code.
    pub template: String,
    /// Code lifetime at the provider, in seconds.
    pub ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct PhoneOtpClient {
    client: reqwest::Client,
    config: PhoneOtpConfig,
}

impl PhoneOtpClient {
    pub fn new(config: PhoneOtpConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>, AuthError> {
        let mut req = self.client.get(self.url(endpoint)).query(query);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "sms provider unreachable");
            AuthError::OtpDelivery(format!("provider request failed: {e}"))
        })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        // Rejections may come back as 4xx with a parseable envelope.
        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                warn!(endpoint, %status, error = %e, "unexpected sms provider response");
                Err(AuthError::OtpDelivery(format!("provider HTTP {status}")))
            }
        }
    }

    /// Ask the provider to text a `length`-digit code to `phone`.
    pub async fn request_phone_otp(
        &self,
        phone: &str,
        length: u8,
    ) -> Result<PhoneOtpChallenge, AuthError> {
        if phone.trim().is_empty() {
            return Err(AuthError::validation("phone", "Phone number is required"));
        }
        if !PHONE_OTP_LENGTHS.contains(&length) {
            return Err(AuthError::validation(
                "length",
                format!(
                    "Code length must be between {} and {}",
                    PHONE_OTP_LENGTHS.start(),
                    PHONE_OTP_LENGTHS.end()
                ),
            ));
        }
        let query = [
            ("from", self.config.from.clone()),
            ("sender", self.config.sender.clone()),
            ("to", phone.to_string()),
            ("len", length.to_string()),
            ("t", self.config.template.clone()),
            ("ttl", self.config.ttl_secs.to_string()),
        ];
        let envelope = self.call::<PhoneOtpChallenge>("challenge", &query).await?;
        match (envelope.acknowledge, envelope.response) {
            (true, Some(Reply::Ok(challenge))) => {
                info!(phone, verification_id = %challenge.verification_id, "phone otp issued");
                Ok(challenge)
            }
            (_, Some(Reply::Failed { errors })) => {
                warn!(phone, %errors, "sms provider refused challenge");
                Err(AuthError::OtpDelivery(errors.to_string()))
            }
            _ => Err(AuthError::OtpDelivery("challenge not acknowledged".into())),
        }
    }

    /// Check `code` for the challenge `verification_id`.
    pub async fn verify_phone_otp(
        &self,
        phone: &str,
        code: &str,
        verification_id: &str,
    ) -> Result<PhoneOtpVerification, AuthError> {
        let query = [
            ("to", phone.to_string()),
            ("code", code.to_string()),
            ("vc", verification_id.to_string()),
        ];
        let envelope = self.call::<PhoneOtpVerification>("verify", &query).await?;
        match (envelope.acknowledge, envelope.response) {
            (true, Some(Reply::Ok(verified))) => {
                info!(phone, "phone otp verified");
                Ok(verified)
            }
            (_, Some(Reply::Failed { errors })) => {
                warn!(phone, %errors, "sms provider rejected code");
                Err(AuthError::OtpMismatch)
            }
            _ => Err(AuthError::OtpMismatch),
        }
    }
}
