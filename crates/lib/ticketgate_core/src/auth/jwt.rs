//! JWT issuance and verification with a cache-backed single live session.
//!
//! Access tokens are stateless. A refresh token is honoured only while it is
//! the value stored under its actor's id in the [`SessionCache`]; issuing a
//! new pair overwrites that slot and so invalidates every earlier refresh
//! token for the actor.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::AuthError;
use super::secrets::{self, SecretProvider};
use crate::cache::SessionCache;
use crate::models::actor::{ActorRecord, ActorType, TokenKind};
use crate::models::auth::{ActorClaims, TokenPair};

/// Access token lifetime: 2 hours.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 2 * 60 * 60;

/// Refresh token lifetime: 2 weeks. Also the session TTL when a token's own
/// expiry cannot be read back.
pub const REFRESH_TOKEN_EXPIRY_SECS: i64 = 14 * 24 * 60 * 60;

/// Keys owned by the claim envelope; actor fields with these names are dropped.
/// Includes the registered JWT names the decoder validates on its own.
pub(crate) const RESERVED_CLAIMS: &[&str] = &[
    "id", "type", "exp", "iat", "jti", "password", "aud", "iss", "sub", "nbf",
];

/// Issues and verifies actor tokens. Sole writer of session records.
#[derive(Clone)]
pub struct TokenService {
    secrets: Arc<dyn SecretProvider>,
    cache: Arc<dyn SessionCache>,
}

impl TokenService {
    pub fn new(secrets: Arc<dyn SecretProvider>, cache: Arc<dyn SessionCache>) -> Self {
        Self { secrets, cache }
    }

    /// Mint an access/refresh pair for `actor` and make the refresh token the
    /// actor's only live session.
    pub async fn issue_tokens(
        &self,
        actor: &ActorRecord,
        actor_type: ActorType,
    ) -> Result<TokenPair, AuthError> {
        let access_secret = secrets::resolve(self.secrets.as_ref(), actor_type, TokenKind::Access)?;
        let refresh_secret =
            secrets::resolve(self.secrets.as_ref(), actor_type, TokenKind::Refresh)?;

        let access_claims = build_claims(actor, Some(actor_type), ACCESS_TOKEN_EXPIRY_SECS)?;
        let refresh_claims = build_claims(actor, None, REFRESH_TOKEN_EXPIRY_SECS)?;

        let access_token = sign(&access_claims, &access_secret)?;
        let refresh_token = sign(&refresh_claims, &refresh_secret)?;

        let ttl = session_ttl(&refresh_token);
        self.cache.delete(&actor.id).await?;
        self.cache.put(&actor.id, &refresh_token, ttl).await?;

        info!(actor_id = %actor.id, %actor_type, ttl_secs = ttl.as_secs(), "issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: ACCESS_TOKEN_EXPIRY_SECS,
        })
    }

    /// Verify an access token's signature and expiry. No cache lookup.
    pub fn verify_access(
        &self,
        token: &str,
        actor_type: ActorType,
    ) -> Result<ActorClaims, AuthError> {
        require_id(token)?;
        let secret = secrets::resolve(self.secrets.as_ref(), actor_type, TokenKind::Access)?;
        let claims = verify_signed(token, &secret)?;
        // Refresh tokens carry no type, so this also keeps them out when an
        // operator reuses one secret for both kinds.
        if claims.actor_type != Some(actor_type) {
            debug!(actor_id = %claims.id, "access token type mismatch");
            return Err(AuthError::InvalidToken { cache: false });
        }
        Ok(claims)
    }

    /// Verify a refresh token: it must be the actor's live session value, then
    /// carry a valid signature. Callers re-issue a pair from the result.
    pub async fn verify_refresh(
        &self,
        token: &str,
        actor_type: ActorType,
    ) -> Result<ActorClaims, AuthError> {
        let id = require_id(token)?;

        let live = match self.cache.get(&id).await {
            Ok(live) => live,
            Err(e) => {
                warn!(actor_id = %id, error = %e, "session lookup failed; rejecting refresh");
                None
            }
        };
        if live.as_deref() != Some(token) {
            debug!(actor_id = %id, "refresh token is not the live session");
            return Err(AuthError::InvalidToken { cache: true });
        }

        let secret = secrets::resolve(self.secrets.as_ref(), actor_type, TokenKind::Refresh)?;
        verify_signed(token, &secret)
    }

    /// Drop the actor's live session. Access tokens already handed out stay
    /// valid until they expire.
    pub async fn revoke(&self, actor_id: &str) -> Result<(), AuthError> {
        self.cache.delete(actor_id).await?;
        info!(actor_id, "session revoked");
        Ok(())
    }
}

/// Serialize `actor` (password excluded) into a claim set expiring in `lifetime_secs`.
fn build_claims(
    actor: &ActorRecord,
    actor_type: Option<ActorType>,
    lifetime_secs: i64,
) -> Result<ActorClaims, AuthError> {
    let fields = match serde_json::to_value(actor) {
        Ok(Value::Object(mut map)) => {
            for key in RESERVED_CLAIMS {
                map.remove(*key);
            }
            map
        }
        Ok(_) => return Err(AuthError::Internal("actor did not serialize to an object".into())),
        Err(e) => return Err(AuthError::Internal(format!("serialize actor: {e}"))),
    };
    let now = Utc::now();
    Ok(ActorClaims {
        id: actor.id.clone(),
        actor_type,
        exp: (now + Duration::seconds(lifetime_secs)).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
        fields,
    })
}

fn sign(claims: &ActorClaims, secret: &str) -> Result<String, AuthError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

fn verify_signed(token: &str, secret: &str) -> Result<ActorClaims, AuthError> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    decode::<ActorClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!(error = %e, "token rejected");
        AuthError::InvalidToken { cache: false }
    })
}

/// Read a token's payload without checking signature or expiry.
fn peek(token: &str) -> Result<Map<String, Value>, AuthError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|_| AuthError::MalformedToken)
}

/// The `id` claim of an unverified token; its absence means a malformed token.
fn require_id(token: &str) -> Result<String, AuthError> {
    match peek(token)?.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        _ => Err(AuthError::MalformedToken),
    }
}

/// Remaining lifetime of a freshly signed refresh token.
fn session_ttl(refresh_token: &str) -> StdDuration {
    let remaining = peek(refresh_token)
        .ok()
        .and_then(|claims| claims.get("exp").and_then(Value::as_i64))
        .map(|exp| exp - Utc::now().timestamp())
        .filter(|secs| *secs > 0)
        .unwrap_or(REFRESH_TOKEN_EXPIRY_SECS);
    StdDuration::from_secs(remaining as u64)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::{CacheError, MemoryCache};
    use crate::models::actor::VerificationChannel;

    struct DownCache;

    #[async_trait]
    impl SessionCache for DownCache {
        async fn put(&self, _: &str, _: &str, _: StdDuration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Timeout)
        }
        async fn delete(&self, _: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    fn secrets() -> Arc<dyn SecretProvider> {
        let map: HashMap<String, String> = [
            ("USER_ACCESS_SECRET", "user-access"),
            ("USER_REFRESH_SECRET", "user-refresh"),
            ("ORGANIZER_ACCESS_SECRET", "org-access"),
            ("ORGANIZER_REFRESH_SECRET", "org-refresh"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Arc::new(map)
    }

    fn service() -> (TokenService, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        (TokenService::new(secrets(), cache.clone()), cache)
    }

    fn actor() -> ActorRecord {
        let mut profile = Map::new();
        profile.insert("name".into(), Value::String("Grace".into()));
        ActorRecord {
            id: "actor-1".into(),
            email: Some("grace@example.com".into()),
            phone: None,
            wallet: None,
            document: None,
            verified: VerificationChannel::None,
            password_hash: "$2b$10$secret".into(),
            profile,
        }
    }

    #[tokio::test]
    async fn access_claims_carry_actor_fields_and_type() {
        let (svc, _) = service();
        let pair = svc.issue_tokens(&actor(), ActorType::User).await.unwrap();
        let claims = svc.verify_access(&pair.access_token, ActorType::User).unwrap();

        assert_eq!(claims.id, "actor-1");
        assert_eq!(claims.actor_type, Some(ActorType::User));
        assert_eq!(claims.fields["email"], "grace@example.com");
        assert_eq!(claims.fields["name"], "Grace");
        assert_eq!(claims.fields["verified"], "none");
        assert!(!claims.fields.contains_key("password_hash"));
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, ACCESS_TOKEN_EXPIRY_SECS);
    }

    #[tokio::test]
    async fn refresh_claims_omit_type() {
        let (svc, _) = service();
        let pair = svc.issue_tokens(&actor(), ActorType::User).await.unwrap();
        let claims = svc
            .verify_refresh(&pair.refresh_token, ActorType::User)
            .await
            .unwrap();
        assert_eq!(claims.actor_type, None);
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_EXPIRY_SECS);
    }

    #[tokio::test]
    async fn second_issue_invalidates_first_refresh_token() {
        let (svc, _) = service();
        let first = svc.issue_tokens(&actor(), ActorType::User).await.unwrap();
        let second = svc.issue_tokens(&actor(), ActorType::User).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        let err = svc
            .verify_refresh(&first.refresh_token, ActorType::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { cache: true }));
        svc.verify_refresh(&second.refresh_token, ActorType::User)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn session_slot_holds_refresh_token() {
        let (svc, cache) = service();
        let pair = svc.issue_tokens(&actor(), ActorType::User).await.unwrap();
        let stored = cache.get("actor-1").await.unwrap();
        assert_eq!(stored.as_deref(), Some(pair.refresh_token.as_str()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn organizer_token_is_rejected_as_user() {
        let (svc, _) = service();
        let pair = svc.issue_tokens(&actor(), ActorType::Organizer).await.unwrap();
        let err = svc
            .verify_access(&pair.access_token, ActorType::User)
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { cache: false }));
        svc.verify_access(&pair.access_token, ActorType::Organizer)
            .unwrap();
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let (svc, _) = service();
        let pair = svc.issue_tokens(&actor(), ActorType::User).await.unwrap();
        assert!(svc.verify_access(&pair.refresh_token, ActorType::User).is_err());
    }

    #[tokio::test]
    async fn refresh_token_rejected_as_access_under_shared_secret() {
        let map: HashMap<String, String> = HashMap::from([
            ("USER_ACCESS_SECRET".to_string(), "shared".to_string()),
            ("USER_REFRESH_SECRET".to_string(), "shared".to_string()),
        ]);
        let svc = TokenService::new(Arc::new(map), Arc::new(MemoryCache::new()));
        let pair = svc.issue_tokens(&actor(), ActorType::User).await.unwrap();

        let err = svc
            .verify_access(&pair.refresh_token, ActorType::User)
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { cache: false }));
        svc.verify_access(&pair.access_token, ActorType::User)
            .unwrap();
    }

    #[tokio::test]
    async fn registered_claim_names_in_profile_are_dropped() {
        let (svc, _) = service();
        let mut actor = actor();
        for key in ["aud", "iss", "sub", "nbf"] {
            actor.profile.insert(key.into(), Value::from("mobile"));
        }
        let pair = svc.issue_tokens(&actor, ActorType::User).await.unwrap();

        let claims = svc.verify_access(&pair.access_token, ActorType::User).unwrap();
        assert!(!claims.fields.contains_key("aud"));
        assert!(!claims.fields.contains_key("nbf"));
        assert_eq!(claims.fields["name"], "Grace");
        svc.verify_refresh(&pair.refresh_token, ActorType::User)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn revoke_ends_session_but_not_access_token() {
        let (svc, cache) = service();
        let pair = svc.issue_tokens(&actor(), ActorType::User).await.unwrap();
        svc.revoke("actor-1").await.unwrap();

        assert_eq!(cache.get("actor-1").await.unwrap(), None);
        assert!(
            svc.verify_refresh(&pair.refresh_token, ActorType::User)
                .await
                .is_err()
        );
        svc.verify_access(&pair.access_token, ActorType::User)
            .unwrap();
    }

    #[tokio::test]
    async fn missing_secret_fails_issue_without_touching_cache() {
        let cache = Arc::new(MemoryCache::new());
        let map: HashMap<String, String> =
            HashMap::from([("USER_ACCESS_SECRET".to_string(), "only-access".to_string())]);
        let svc = TokenService::new(Arc::new(map), cache.clone());

        let err = svc.issue_tokens(&actor(), ActorType::User).await.unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn unreachable_cache_fails_closed() {
        let (issuer, _) = service();
        let pair = issuer.issue_tokens(&actor(), ActorType::User).await.unwrap();

        let verifier = TokenService::new(secrets(), Arc::new(DownCache));
        let err = verifier
            .verify_refresh(&pair.refresh_token, ActorType::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { cache: true }));
        assert!(matches!(
            verifier.issue_tokens(&actor(), ActorType::User).await,
            Err(AuthError::Cache(_))
        ));
    }

    #[test]
    fn garbage_and_id_less_tokens_are_malformed() {
        let (svc, _) = service();
        assert!(matches!(
            svc.verify_access("not.a.jwt", ActorType::User),
            Err(AuthError::MalformedToken)
        ));

        let mut claims = build_claims(&actor(), None, 60).unwrap();
        claims.id = String::new();
        let token = sign(&claims, "user-access").unwrap();
        assert!(matches!(
            svc.verify_access(&token, ActorType::User),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn expired_access_token_is_invalid() {
        let (svc, _) = service();
        let mut claims = build_claims(&actor(), Some(ActorType::User), 60).unwrap();
        claims.exp = Utc::now().timestamp() - 10;
        let token = sign(&claims, "user-access").unwrap();
        assert!(matches!(
            svc.verify_access(&token, ActorType::User),
            Err(AuthError::InvalidToken { cache: false })
        ));
    }

    #[test]
    fn session_ttl_tracks_token_expiry() {
        let claims = build_claims(&actor(), None, 3600).unwrap();
        let token = sign(&claims, "k").unwrap();
        let ttl = session_ttl(&token).as_secs() as i64;
        assert!((3590..=3600).contains(&ttl));

        let fallback = session_ttl("garbage").as_secs() as i64;
        assert_eq!(fallback, REFRESH_TOKEN_EXPIRY_SECS);
    }
}
