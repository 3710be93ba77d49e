//! Email one-time codes, stored in the session cache under the lower-cased
//! address and consumed on first successful verification.

use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, rng};
use tracing::{info, warn};

use super::mailer::Mailer;
use crate::auth::AuthError;
use crate::cache::SessionCache;
use crate::models::auth::EmailOtpVerification;

/// Default lifetime of an email code: 1 hour.
pub const EMAIL_OTP_TTL: Duration = Duration::from_secs(3600);

const SUBJECT: &str = "Your verification code";

/// Uniform 6-digit code; leading zeros kept.
fn generate_code() -> String {
    format!("{:06}", rng().random_range(0..1_000_000u32))
}

pub(crate) fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::validation("email", "Invalid email address")),
    }
}

fn render_body(code: &str) -> String {
    format!(
        "<p>Your verification code is <strong>{code}</strong>.</p>\
         <p>It expires in one hour. If you did not ask for it, ignore this email.</p>"
    )
}

/// Sole writer of email OTP records.
#[derive(Clone)]
pub struct EmailOtpService {
    cache: Arc<dyn SessionCache>,
    mailer: Arc<dyn Mailer>,
    ttl: Duration,
}

impl EmailOtpService {
    pub fn new(cache: Arc<dyn SessionCache>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            cache,
            mailer,
            ttl: EMAIL_OTP_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Mail a fresh code to `email`, then cache it. A failed send leaves no
    /// verifiable record behind.
    pub async fn request_email_otp(&self, email: &str) -> Result<String, AuthError> {
        let key = normalize_email(email)?;
        let code = generate_code();

        self.mailer
            .send(&key, SUBJECT, &render_body(&code))
            .await
            .map_err(|e| {
                warn!(email = %key, error = %e, "otp mail failed");
                AuthError::OtpDelivery(e.to_string())
            })?;

        self.cache.put(&key, &code, self.ttl).await?;
        info!(email = %key, "email otp issued");
        Ok(code)
    }

    /// Check `code` against the cached one and consume it on match.
    pub async fn verify_email_otp(
        &self,
        email: &str,
        code: &str,
    ) -> Result<EmailOtpVerification, AuthError> {
        let key = normalize_email(email)?;
        let stored = self.cache.get(&key).await?.ok_or(AuthError::OtpNotFound)?;
        if stored != code {
            return Err(AuthError::OtpMismatch);
        }
        self.cache.delete(&key).await?;
        info!(email = %key, "email otp verified");
        Ok(EmailOtpVerification {
            email: key,
            code: stored,
            status: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::otp::mailer::MailError;

    /// Records every message instead of sending it.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, _subject: &str, html: &str) -> Result<(), MailError> {
            self.sent.lock().unwrap().push((to.to_string(), html.to_string()));
            Ok(())
        }
    }

    struct BrokenMailer;

    #[async_trait]
    impl Mailer for BrokenMailer {
        async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), MailError> {
            Err(MailError("smtp down".into()))
        }
    }

    fn service() -> (EmailOtpService, Arc<MemoryCache>, Arc<RecordingMailer>) {
        let cache = Arc::new(MemoryCache::new());
        let mailer = Arc::new(RecordingMailer::default());
        (
            EmailOtpService::new(cache.clone(), mailer.clone()),
            cache,
            mailer,
        )
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn code_is_mailed_and_cached_under_lowercase_address() {
        let (svc, cache, mailer) = service();
        let code = svc.request_email_otp("Ada@Example.COM").await.unwrap();

        assert_eq!(cache.get("ada@example.com").await.unwrap(), Some(code.clone()));
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ada@example.com");
        assert!(sent[0].1.contains(&code));
    }

    #[tokio::test]
    async fn code_is_single_use() {
        let (svc, _, _) = service();
        let code = svc.request_email_otp("a@b.com").await.unwrap();

        let ok = svc.verify_email_otp("a@b.com", &code).await.unwrap();
        assert_eq!(
            ok,
            EmailOtpVerification {
                email: "a@b.com".into(),
                code: code.clone(),
                status: true,
            }
        );
        let again = svc.verify_email_otp("a@b.com", &code).await.unwrap_err();
        assert!(matches!(again, AuthError::OtpNotFound));
    }

    #[tokio::test]
    async fn wrong_code_keeps_record() {
        let (svc, cache, _) = service();
        let code = svc.request_email_otp("a@b.com").await.unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let err = svc.verify_email_otp("a@b.com", wrong).await.unwrap_err();
        assert!(matches!(err, AuthError::OtpMismatch));
        assert_eq!(cache.get("a@b.com").await.unwrap(), Some(code.clone()));
        svc.verify_email_otp("A@B.com", &code).await.unwrap();
    }

    #[tokio::test]
    async fn failed_send_caches_nothing() {
        let cache = Arc::new(MemoryCache::new());
        let svc = EmailOtpService::new(cache.clone(), Arc::new(BrokenMailer));

        let err = svc.request_email_otp("a@b.com").await.unwrap_err();
        assert!(matches!(err, AuthError::OtpDelivery(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn never_requested_is_not_found() {
        let (svc, _, _) = service();
        let err = svc.verify_email_otp("x@y.com", "123456").await.unwrap_err();
        assert!(matches!(err, AuthError::OtpNotFound));
    }

    #[tokio::test]
    async fn expired_code_is_not_found() {
        let (svc, _, _) = service();
        let svc = svc.with_ttl(Duration::from_millis(10));
        let code = svc.request_email_otp("a@b.com").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let err = svc.verify_email_otp("a@b.com", &code).await.unwrap_err();
        assert!(matches!(err, AuthError::OtpNotFound));
    }

    #[tokio::test]
    async fn malformed_address_is_rejected() {
        let (svc, cache, _) = service();
        let err = svc.request_email_otp("not-an-email").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation { ref attr, .. } if attr == "email"));
        assert!(cache.is_empty());
    }
}
