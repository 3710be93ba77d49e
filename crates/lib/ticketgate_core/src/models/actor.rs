//! Actor domain models.
//!
//! Users and organizers share one record shape; the [`ActorType`] tag picks
//! which secrets sign their tokens and which store holds them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of principal authenticated by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    User,
    Organizer,
    /// Reserved: has signing secrets but no store binding.
    Admin,
}

/// Kind of signed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl ActorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorType::User => "user",
            ActorType::Organizer => "organizer",
            ActorType::Admin => "admin",
        }
    }

    /// Environment name of the signing secret, e.g. `ORGANIZER_REFRESH_SECRET`.
    pub fn secret_name(self, kind: TokenKind) -> String {
        format!(
            "{}_{}_SECRET",
            self.as_str().to_uppercase(),
            kind.as_str().to_uppercase()
        )
    }

    /// Every channel an actor of this type may be marked verified with.
    pub fn verification_channels(self) -> &'static [VerificationChannel] {
        use VerificationChannel::*;
        match self {
            ActorType::User => &[None, Email, Phone, Wallet],
            ActorType::Organizer => &[None, Email, Phone, Document],
            ActorType::Admin => &[None, Email],
        }
    }

    /// Channels that can be used to recover a password.
    pub fn recovery_channels(self) -> &'static [VerificationChannel] {
        use VerificationChannel::*;
        match self {
            ActorType::User | ActorType::Organizer => &[Email, Phone],
            ActorType::Admin => &[Email],
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ActorType::User),
            "organizer" => Ok(ActorType::Organizer),
            "admin" => Ok(ActorType::Admin),
            other => Err(format!("unknown actor type '{other}'")),
        }
    }
}

/// Identity channel an actor has proven. Only one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationChannel {
    #[default]
    None,
    Email,
    Phone,
    Wallet,
    Document,
}

impl VerificationChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationChannel::None => "none",
            VerificationChannel::Email => "email",
            VerificationChannel::Phone => "phone",
            VerificationChannel::Wallet => "wallet",
            VerificationChannel::Document => "document",
        }
    }
}

impl fmt::Display for VerificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(VerificationChannel::None),
            "email" => Ok(VerificationChannel::Email),
            "phone" => Ok(VerificationChannel::Phone),
            "wallet" => Ok(VerificationChannel::Wallet),
            "document" => Ok(VerificationChannel::Document),
            other => Err(format!("unknown verification channel '{other}'")),
        }
    }
}

/// Persisted actor. `password_hash` never leaves the process when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(default)]
    pub verified: VerificationChannel,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    /// Domain fields owned by the rest of the backend (name, avatar, ...).
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl ActorRecord {
    /// Value of the identifier that backs a verification channel.
    pub fn channel_value(&self, channel: VerificationChannel) -> Option<&str> {
        match channel {
            VerificationChannel::Email => self.email.as_deref(),
            VerificationChannel::Phone => self.phone.as_deref(),
            VerificationChannel::Wallet => self.wallet.as_deref(),
            VerificationChannel::Document => self.document.as_deref(),
            VerificationChannel::None => None,
        }
    }
}

/// Predicate for [`crate::store::ActorStore::find_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorFilter {
    /// Identifier column to match on.
    pub field: VerificationChannel,
    pub value: String,
    /// When set, the actor's `verified` must equal this channel.
    pub verified: Option<VerificationChannel>,
}

impl ActorFilter {
    pub fn by(field: VerificationChannel, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            verified: None,
        }
    }

    pub fn verified_via(mut self, channel: VerificationChannel) -> Self {
        self.verified = Some(channel);
        self
    }

    pub fn matches(&self, actor: &ActorRecord) -> bool {
        let value_ok = actor.channel_value(self.field) == Some(self.value.as_str());
        let verified_ok = self.verified.is_none_or(|v| actor.verified == v);
        value_ok && verified_ok
    }
}

/// Fields this subsystem is allowed to write back on an existing actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorUpdate {
    pub verified: Option<VerificationChannel>,
    pub password_hash: Option<String>,
}

/// Input for creating an actor at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewActor {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub wallet: Option<String>,
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub profile: Map<String, Value>,
}
