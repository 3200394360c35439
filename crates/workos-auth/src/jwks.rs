//! Access token verification against the WorkOS JWKS
//!
//! Access tokens are RS256 JWTs signed by WorkOS. Public keys are published
//! at `{base}/sso/jwks/{client_id}`. Keys are fetched on first use and cached
//! by `kid`; an unknown `kid` triggers one refetch (key rotation), rate limited
//! by `REFETCH_COOLDOWN`. Failed fetches count against the cooldown too.

use std::collections::HashMap;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::constants::{JWKS_PATH, endpoint};
use crate::error::{Error, Result};

/// Minimum time between two JWKS fetches triggered by unknown key IDs.
const REFETCH_COOLDOWN: Duration = Duration::from_secs(30);

/// Claims read from a WorkOS access token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    /// Session ID, used to build the logout URL
    pub sid: String,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: u64,
}

struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    /// Time of the last fetch attempt, successful or not
    fetched_at: Option<Instant>,
}

/// Verifies access token signatures and expiry.
pub struct AccessTokenVerifier {
    http: reqwest::Client,
    /// `None` for pinned keys: nothing is ever fetched
    jwks_url: Option<String>,
    algorithm: Algorithm,
    cache: RwLock<KeyCache>,
}

impl AccessTokenVerifier {
    /// Verifier that fetches RS256 keys from the client's JWKS endpoint.
    pub fn new(http: reqwest::Client, base_url: &str, client_id: &str) -> Self {
        Self {
            http,
            jwks_url: Some(format!("{}/{client_id}", endpoint(base_url, JWKS_PATH))),
            algorithm: Algorithm::RS256,
            cache: RwLock::new(KeyCache {
                keys: HashMap::new(),
                fetched_at: None,
            }),
        }
    }

    /// Verifier with a fixed key set and no network access.
    pub fn with_pinned_keys(keys: HashMap<String, DecodingKey>, algorithm: Algorithm) -> Self {
        Self {
            http: reqwest::Client::new(),
            jwks_url: None,
            algorithm,
            cache: RwLock::new(KeyCache {
                keys,
                fetched_at: None,
            }),
        }
    }

    /// Use a different signing algorithm for fetched keys.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Verify the token's signature and expiry, returning its claims.
    pub async fn verify(&self, token: &str) -> Result<AccessTokenClaims> {
        let header =
            decode_header(token).map_err(|e| Error::InvalidAccessToken(e.to_string()))?;

        if header.alg != self.algorithm {
            return Err(Error::InvalidAccessToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| Error::InvalidAccessToken("missing kid".into()))?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(self.algorithm);
        // WorkOS access tokens carry no audience
        validation.validate_aud = false;

        decode::<AccessTokenClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::InvalidAccessToken(e.to_string()))
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cache = self.cache.read().await;
            if let Some(key) = cache.keys.get(kid) {
                return Ok(key.clone());
            }
            if cache
                .fetched_at
                .is_some_and(|at| at.elapsed() < REFETCH_COOLDOWN)
            {
                return Err(Error::InvalidAccessToken(format!("unknown kid {kid}")));
            }
        }

        let Some(url) = &self.jwks_url else {
            return Err(Error::InvalidAccessToken(format!("unknown kid {kid}")));
        };

        self.refetch(url).await?;

        self.cache
            .read()
            .await
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| Error::InvalidAccessToken(format!("unknown kid {kid}")))
    }

    async fn refetch(&self, url: &str) -> Result<()> {
        let fetched = self.fetch_keys(url).await;

        let mut cache = self.cache.write().await;
        cache.fetched_at = Some(Instant::now());
        match fetched {
            Ok(keys) => {
                cache.keys = keys;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "JWKS fetch failed, keeping cached keys");
                Err(e)
            }
        }
    }

    async fn fetch_keys(&self, url: &str) -> Result<HashMap<String, DecodingKey>> {
        debug!(url, "fetching JWKS");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Jwks(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Jwks(format!("JWKS endpoint returned {status}")));
        }

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| Error::Jwks(format!("invalid JWKS document: {e}")))?;

        let mut keys = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => warn!(kid = %kid, error = %e, "skipping unusable JWK"),
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};
    use tokio::net::TcpListener;

    const SECRET: &[u8] = b"jwks-test-signing-secret-0123456789";

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn token(kid: &str, exp: u64) -> String {
        let header = Header {
            kid: Some(kid.to_string()),
            ..Header::new(Algorithm::HS256)
        };
        let claims = serde_json::json!({
            "sid": "session_01H",
            "sub": "user_01H",
            "org_id": "org_1",
            "role": "member",
            "permissions": ["posts:read"],
            "exp": exp,
        });
        encode(&header, &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn pinned() -> AccessTokenVerifier {
        let mut keys = HashMap::new();
        keys.insert("k1".to_string(), DecodingKey::from_secret(SECRET));
        AccessTokenVerifier::with_pinned_keys(keys, Algorithm::HS256)
    }

    #[tokio::test]
    async fn valid_token_yields_claims() {
        let claims = pinned().verify(&token("k1", now() + 300)).await.unwrap();
        assert_eq!(claims.sid, "session_01H");
        assert_eq!(claims.org_id.as_deref(), Some("org_1"));
        assert_eq!(claims.permissions, vec!["posts:read".to_string()]);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let result = pinned().verify(&token("k1", now() - 3600)).await;
        assert!(matches!(result, Err(Error::InvalidAccessToken(_))));
    }

    #[tokio::test]
    async fn unknown_kid_is_rejected_without_fetching() {
        let result = pinned().verify(&token("k2", now() + 300)).await;
        match result {
            Err(Error::InvalidAccessToken(msg)) => assert!(msg.contains("unknown kid")),
            other => panic!("expected unknown kid error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrong_signature_is_rejected() {
        let header = Header {
            kid: Some("k1".into()),
            ..Header::new(Algorithm::HS256)
        };
        let forged = encode(
            &header,
            &serde_json::json!({"sid": "s", "exp": now() + 300}),
            &EncodingKey::from_secret(b"someone-else's-secret"),
        )
        .unwrap();
        assert!(pinned().verify(&forged).await.is_err());
    }

    #[tokio::test]
    async fn algorithm_mismatch_is_rejected() {
        let rs_verifier =
            AccessTokenVerifier::with_pinned_keys(HashMap::new(), Algorithm::RS256);
        let result = rs_verifier.verify(&token("k1", now() + 300)).await;
        match result {
            Err(Error::InvalidAccessToken(msg)) => assert!(msg.contains("unexpected algorithm")),
            other => panic!("expected algorithm error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        assert!(pinned().verify("not.a.jwt").await.is_err());
    }

    fn oct_jwks(kid: &str) -> serde_json::Value {
        serde_json::json!({
            "keys": [{
                "kty": "oct",
                "kid": kid,
                "alg": "HS256",
                "k": URL_SAFE_NO_PAD.encode(SECRET),
            }]
        })
    }

    /// Mock JWKS endpoint. `respond` receives the 1-based hit number.
    async fn start_jwks_server(
        respond: fn(usize) -> axum::response::Response,
    ) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let counter = hits.clone();
        let app = axum::Router::new().route(
            "/sso/jwks/client_123",
            axum::routing::get(move || {
                let counter = counter.clone();
                async move {
                    let hit = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    respond(hit).into_response()
                }
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), hits)
    }

    fn fetching_verifier(base_url: &str) -> AccessTokenVerifier {
        AccessTokenVerifier::new(reqwest::Client::new(), base_url, "client_123")
            .with_algorithm(Algorithm::HS256)
    }

    /// Move the last fetch attempt back past the cooldown.
    async fn expire_cooldown(verifier: &AccessTokenVerifier) {
        let mut cache = verifier.cache.write().await;
        let at = cache.fetched_at.expect("a fetch must have happened");
        cache.fetched_at = Some(at - REFETCH_COOLDOWN);
    }

    #[tokio::test]
    async fn keys_are_fetched_once_and_cached() {
        let (base_url, hits) =
            start_jwks_server(|_| axum::Json(oct_jwks("k1")).into_response()).await;
        let verifier = fetching_verifier(&base_url);

        verifier.verify(&token("k1", now() + 300)).await.unwrap();
        verifier.verify(&token("k1", now() + 300)).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1, "JWKS must be cached");

        // Unknown kid right after a fetch stays within the cooldown
        assert!(verifier.verify(&token("k9", now() + 300)).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rotated_key_is_picked_up_after_cooldown() {
        let (base_url, hits) = start_jwks_server(|hit| {
            let kid = if hit == 1 { "k1" } else { "k2" };
            axum::Json(oct_jwks(kid)).into_response()
        })
        .await;
        let verifier = fetching_verifier(&base_url);

        verifier.verify(&token("k1", now() + 300)).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Inside the cooldown the new kid is rejected without a refetch
        let err = verifier.verify(&token("k2", now() + 300)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAccessToken(ref msg) if msg.contains("unknown kid")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        expire_cooldown(&verifier).await;

        let claims = verifier.verify(&token("k2", now() + 300)).await.unwrap();
        assert_eq!(claims.sid, "session_01H");
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // The retired key is gone and no further fetch happens
        assert!(verifier.verify(&token("k1", now() + 300)).await.is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_starts_the_cooldown() {
        let (base_url, hits) = start_jwks_server(|hit| {
            if hit == 1 {
                axum::http::StatusCode::SERVICE_UNAVAILABLE.into_response()
            } else {
                axum::Json(oct_jwks("k1")).into_response()
            }
        })
        .await;
        let verifier = fetching_verifier(&base_url);

        let err = verifier.verify(&token("k1", now() + 300)).await.unwrap_err();
        assert!(matches!(err, Error::Jwks(_)), "got: {err:?}");

        // Further tokens inside the cooldown do not hit the endpoint again
        for _ in 0..3 {
            assert!(verifier.verify(&token("k1", now() + 300)).await.is_err());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        expire_cooldown(&verifier).await;
        verifier.verify(&token("k1", now() + 300)).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_jwks_is_an_error() {
        let verifier =
            AccessTokenVerifier::new(reqwest::Client::new(), "http://127.0.0.1:1", "client_123");
        let err = verifier.verify(&token_rs256_header()).await.unwrap_err();
        assert!(matches!(err, Error::Jwks(_)), "got: {err:?}");
    }

    /// A syntactically valid RS256 header with a dummy payload; the fetch
    /// fails before any signature check happens.
    fn token_rs256_header() -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT","kid":"k1"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sid":"s","exp":0}"#);
        format!("{header}.{payload}.c2ln")
    }
}
