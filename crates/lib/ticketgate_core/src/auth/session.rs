//! Sign-up, login, refresh and logout flows over any actor type.

use tracing::info;

use super::AuthError;
use super::jwt::{RESERVED_CLAIMS, TokenService};
use super::password::{hash_password, validate_password, verify_password};
use crate::models::actor::{ActorFilter, ActorRecord, ActorType, NewActor, VerificationChannel};
use crate::models::auth::TokenPair;
use crate::otp::email::normalize_email;
use crate::otp::phone::normalize_phone;
use crate::store::ActorStores;

/// Keys a sign-up profile may not carry; they belong to the record itself.
const RECORD_FIELDS: [&str; 8] = [
    "id", "email", "phone", "wallet", "document", "verified", "password", "type",
];

/// Actor authentication service: token service plus per-type stores.
#[derive(Clone)]
pub struct AuthService {
    tokens: TokenService,
    stores: ActorStores,
}

impl AuthService {
    pub fn new(tokens: TokenService, stores: ActorStores) -> Self {
        Self { tokens, stores }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub(crate) fn stores(&self) -> &ActorStores {
        &self.stores
    }

    /// Create an unverified actor and log it in.
    pub async fn register(
        &self,
        actor_type: ActorType,
        input: NewActor,
    ) -> Result<(ActorRecord, TokenPair), AuthError> {
        let store = self.stores.for_type(actor_type)?;
        let email = normalize_email(&input.email)?;
        validate_password(&input.password)?;

        if store
            .find_one(&ActorFilter::by(VerificationChannel::Email, &email))
            .await?
            .is_some()
        {
            return Err(AuthError::Conflict("Email already registered".into()));
        }

        let password_hash = hash_password(&input.password)?;
        let mut profile = input.profile;
        profile.retain(|k, _| {
            !RECORD_FIELDS.contains(&k.as_str()) && !RESERVED_CLAIMS.contains(&k.as_str())
        });
        let actor = store
            .insert(ActorRecord {
                id: String::new(),
                email: Some(email),
                phone: input.phone.as_deref().and_then(normalize_phone),
                wallet: input.wallet,
                document: input.document,
                verified: VerificationChannel::None,
                password_hash,
                profile,
            })
            .await?;
        info!(actor_id = %actor.id, %actor_type, "actor registered");

        let pair = self.tokens.issue_tokens(&actor, actor_type).await?;
        Ok((actor, pair))
    }

    /// Email + password login. Unknown email and wrong password fail alike.
    pub async fn login(
        &self,
        actor_type: ActorType,
        email: &str,
        password: &str,
    ) -> Result<(ActorRecord, TokenPair), AuthError> {
        let store = self.stores.for_type(actor_type)?;
        let email = normalize_email(email).map_err(|_| AuthError::CredentialError)?;

        let actor = store
            .find_one(&ActorFilter::by(VerificationChannel::Email, email))
            .await?
            .ok_or(AuthError::CredentialError)?;

        if !verify_password(password, &actor.password_hash) {
            return Err(AuthError::CredentialError);
        }

        let pair = self.tokens.issue_tokens(&actor, actor_type).await?;
        Ok((actor, pair))
    }

    /// Exchange the live refresh token for a new pair (rotation).
    pub async fn refresh(
        &self,
        actor_type: ActorType,
        refresh_token: &str,
    ) -> Result<TokenPair, AuthError> {
        let store = self.stores.for_type(actor_type)?;
        let claims = self.tokens.verify_refresh(refresh_token, actor_type).await?;

        // Reload so the new claims reflect the current record.
        let actor = store
            .find_by_id(&claims.id)
            .await?
            .ok_or(AuthError::InvalidToken { cache: false })?;

        self.tokens.issue_tokens(&actor, actor_type).await
    }

    /// End the actor's session. Outstanding access tokens run to expiry.
    pub async fn logout(&self, actor_id: &str) -> Result<(), AuthError> {
        self.tokens.revoke(actor_id).await
    }
}
