//! One-time codes for identity verification.
//!
//! The email channel is implemented here on top of the session cache; the
//! phone channel is a thin client over an external SMS provider.

pub mod email;
pub mod mailer;
pub mod phone;

pub use email::EmailOtpService;
pub use mailer::{HttpMailer, LogMailer, MailError, Mailer};
pub use phone::{PhoneOtpClient, PhoneOtpConfig};
