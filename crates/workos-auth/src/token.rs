//! Authorization code exchange and token refresh
//!
//! Both operations POST JSON to the User Management authenticate endpoint with
//! different grant types. The API key is sent as `client_secret`.

use common::Secret;
use serde::{Deserialize, Serialize};

use crate::constants::{AUTHENTICATE_PATH, endpoint};
use crate::error::{Error, Result};
use crate::user::{Impersonator, User};

/// Client identity sent with every authenticate request.
#[derive(Debug, Clone, Copy)]
pub struct ClientCredentials<'a> {
    pub client_id: &'a str,
    pub api_key: &'a Secret<String>,
}

/// Response from the authenticate endpoint for both grant types.
#[derive(Debug, Deserialize)]
pub struct AuthenticationResponse {
    pub user: User,
    #[serde(default)]
    pub organization_id: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub impersonator: Option<Impersonator>,
    #[serde(default)]
    pub authentication_method: Option<String>,
}

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

/// OAuth-style error body returned on 4xx.
#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Exchange an authorization code from the AuthKit callback for tokens.
pub async fn authenticate_with_code(
    client: &reqwest::Client,
    base_url: &str,
    credentials: ClientCredentials<'_>,
    code: &str,
) -> Result<AuthenticationResponse> {
    let body = AuthenticateRequest {
        client_id: credentials.client_id,
        client_secret: credentials.api_key.expose(),
        grant_type: "authorization_code",
        code: Some(code),
        refresh_token: None,
    };
    post_authenticate(client, base_url, &body).await
}

/// Exchange a refresh token for a new access/refresh token pair.
///
/// Refresh tokens are single-use: the response carries the replacement.
pub async fn authenticate_with_refresh_token(
    client: &reqwest::Client,
    base_url: &str,
    credentials: ClientCredentials<'_>,
    refresh_token: &str,
) -> Result<AuthenticationResponse> {
    let body = AuthenticateRequest {
        client_id: credentials.client_id,
        client_secret: credentials.api_key.expose(),
        grant_type: "refresh_token",
        code: None,
        refresh_token: Some(refresh_token),
    };
    post_authenticate(client, base_url, &body).await
}

async fn post_authenticate(
    client: &reqwest::Client,
    base_url: &str,
    body: &AuthenticateRequest<'_>,
) -> Result<AuthenticationResponse> {
    let response = client
        .post(endpoint(base_url, AUTHENTICATE_PATH))
        .json(body)
        .send()
        .await
        .map_err(|e| Error::Http(format!("{} request failed: {e}", body.grant_type)))?;

    let status = response.status();
    if !status.is_success() {
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        if status.is_client_error() {
            if let Ok(oauth) = serde_json::from_str::<OAuthErrorBody>(&text) {
                return Err(Error::OAuth {
                    code: oauth.error,
                    description: oauth.error_description,
                });
            }
        }

        return Err(Error::TokenExchange(format!(
            "authenticate endpoint returned {status}: {text}"
        )));
    }

    response
        .json::<AuthenticationResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid authenticate response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use tokio::net::TcpListener;

    const USER_JSON: &str = r#"{
        "id": "user_01H",
        "email": "ada@example.com",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email_verified": true,
        "created_at": "2024-01-01T00:00:00.000Z",
        "updated_at": "2024-01-01T00:00:00.000Z"
    }"#;

    /// Start a mock authenticate endpoint that accepts `code=good` and the
    /// refresh token `rt_good`, answers `code=boom` with a 500, and rejects
    /// everything else with `invalid_grant`.
    async fn start_mock_provider() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = axum::Router::new().route(
            AUTHENTICATE_PATH,
            axum::routing::post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["client_id"], "client_123");
                assert_eq!(body["client_secret"], "sk_test");

                let accepted = match body["grant_type"].as_str() {
                    Some("authorization_code") if body["code"] == "boom" => {
                        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
                            .into_response();
                    }
                    Some("authorization_code") => body["code"] == "good",
                    Some("refresh_token") => body["refresh_token"] == "rt_good",
                    _ => false,
                };

                if accepted {
                    let user: serde_json::Value = serde_json::from_str(USER_JSON).unwrap();
                    Json(serde_json::json!({
                        "user": user,
                        "organization_id": "org_1",
                        "access_token": "at_new",
                        "refresh_token": "rt_new",
                        "authentication_method": "Password"
                    }))
                    .into_response()
                } else {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({
                            "error": "invalid_grant",
                            "error_description": "The code has expired or is invalid."
                        })),
                    )
                        .into_response()
                }
            }),
        );

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    fn api_key() -> Secret<String> {
        Secret::new("sk_test".to_string())
    }

    #[test]
    fn response_deserializes_without_optional_fields() {
        let json = format!(
            r#"{{"user":{USER_JSON},"access_token":"at","refresh_token":"rt"}}"#
        );
        let response: AuthenticationResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response.user.email, "ada@example.com");
        assert!(response.organization_id.is_none());
        assert!(response.impersonator.is_none());
    }

    #[test]
    fn request_omits_unused_grant_fields() {
        let body = AuthenticateRequest {
            client_id: "client_123",
            client_secret: "sk_test",
            grant_type: "authorization_code",
            code: Some("abc"),
            refresh_token: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "abc");
        assert!(json.get("refresh_token").is_none());
    }

    #[tokio::test]
    async fn code_exchange_succeeds() {
        let base = start_mock_provider().await;
        let key = api_key();
        let credentials = ClientCredentials {
            client_id: "client_123",
            api_key: &key,
        };

        let response = authenticate_with_code(&reqwest::Client::new(), &base, credentials, "good")
            .await
            .unwrap();
        assert_eq!(response.access_token, "at_new");
        assert_eq!(response.refresh_token, "rt_new");
        assert_eq!(response.organization_id.as_deref(), Some("org_1"));
        assert_eq!(response.user.first_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn invalid_code_maps_to_oauth_error() {
        let base = start_mock_provider().await;
        let key = api_key();
        let credentials = ClientCredentials {
            client_id: "client_123",
            api_key: &key,
        };

        let err = authenticate_with_code(&reqwest::Client::new(), &base, credentials, "stale")
            .await
            .unwrap_err();
        match err {
            Error::OAuth { code, .. } => assert_eq!(code, "invalid_grant"),
            other => panic!("expected OAuth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_maps_to_token_exchange() {
        let base = start_mock_provider().await;
        let key = api_key();
        let credentials = ClientCredentials {
            client_id: "client_123",
            api_key: &key,
        };

        let err = authenticate_with_code(&reqwest::Client::new(), &base, credentials, "boom")
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::TokenExchange(ref msg) if msg.contains("500")),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn refresh_exchange_succeeds_and_rejects() {
        let base = start_mock_provider().await;
        let key = api_key();
        let credentials = ClientCredentials {
            client_id: "client_123",
            api_key: &key,
        };
        let client = reqwest::Client::new();

        let ok = authenticate_with_refresh_token(&client, &base, credentials, "rt_good")
            .await
            .unwrap();
        assert_eq!(ok.refresh_token, "rt_new");

        let err = authenticate_with_refresh_token(&client, &base, credentials, "rt_revoked")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OAuth { .. }));
    }

    #[tokio::test]
    async fn unreachable_provider_maps_to_http_error() {
        let key = api_key();
        let credentials = ClientCredentials {
            client_id: "client_123",
            api_key: &key,
        };
        let err = authenticate_with_code(
            &reqwest::Client::new(),
            "http://127.0.0.1:1",
            credentials,
            "good",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
