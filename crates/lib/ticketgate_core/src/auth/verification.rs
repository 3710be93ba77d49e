//! Verification gate and password recovery.
//!
//! An actor's `verified` field names the single channel it has proven.
//! Recovery is only allowed through that channel.

use tracing::info;

use super::AuthError;
use super::password::{hash_password, validate_password};
use super::session::AuthService;
use crate::models::actor::{ActorFilter, ActorRecord, ActorType, ActorUpdate, VerificationChannel};
use crate::otp::email::normalize_email;
use crate::otp::phone::normalize_phone;

/// Parse `key` and check it is one of `allowed`.
fn parse_channel(key: &str, allowed: &[VerificationChannel]) -> Result<VerificationChannel, AuthError> {
    key.parse::<VerificationChannel>()
        .ok()
        .filter(|c| allowed.contains(c))
        .ok_or_else(|| AuthError::InvalidVerificationKey(key.to_string()))
}

impl AuthService {
    /// Mark `actor_id` as verified through `channel`, replacing any earlier
    /// channel.
    ///
    /// No proof of the channel is checked here; callers are expected to have
    /// run the matching OTP (or wallet/document) check first.
    pub async fn apply_verification(
        &self,
        actor_type: ActorType,
        actor_id: &str,
        channel: &str,
    ) -> Result<ActorRecord, AuthError> {
        let channel = parse_channel(channel, actor_type.verification_channels())?;
        let store = self.stores().for_type(actor_type)?;

        let actor = store
            .update(
                actor_id,
                ActorUpdate {
                    verified: Some(channel),
                    password_hash: None,
                },
            )
            .await?
            .ok_or(AuthError::ActorNotFound)?;

        info!(actor_id, %actor_type, %channel, "verification applied");
        Ok(actor)
    }

    /// Reset the password of the actor whose `lookup_key` identifier equals
    /// `lookup_value` and whose verified channel is `lookup_key`.
    ///
    /// A wrong value and a wrong channel both yield [`AuthError::ActorNotFound`].
    pub async fn forgot_password(
        &self,
        lookup_key: &str,
        lookup_value: &str,
        new_password: &str,
        actor_type: ActorType,
    ) -> Result<(), AuthError> {
        let channel = parse_channel(lookup_key, actor_type.recovery_channels())?;
        validate_password(new_password)?;
        let store = self.stores().for_type(actor_type)?;

        let value = match channel {
            VerificationChannel::Email => {
                normalize_email(lookup_value).map_err(|_| AuthError::ActorNotFound)?
            }
            VerificationChannel::Phone => {
                normalize_phone(lookup_value).ok_or(AuthError::ActorNotFound)?
            }
            _ => lookup_value.trim().to_string(),
        };

        let actor = store
            .find_one(&ActorFilter::by(channel, value).verified_via(channel))
            .await?
            .ok_or(AuthError::ActorNotFound)?;

        let password_hash = hash_password(new_password)?;
        store
            .update(
                &actor.id,
                ActorUpdate {
                    verified: None,
                    password_hash: Some(password_hash),
                },
            )
            .await?
            .ok_or(AuthError::ActorNotFound)?;

        info!(actor_id = %actor.id, %actor_type, %channel, "password reset");
        Ok(())
    }
}
