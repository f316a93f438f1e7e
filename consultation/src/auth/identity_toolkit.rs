use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use super::{AuthProvider, link::parse_sign_in_link};
use crate::{error::AuthError, models::UserSession};

pub const DEFAULT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendOobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
    continue_url: &'a str,
    can_handle_code_in_app: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailLinkSignInRequest<'a> {
    email: &'a str,
    oob_code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailLinkSignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Email-link sign-in through the Identity Toolkit REST API.
pub struct IdentityToolkitAuthProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl IdentityToolkitAuthProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/accounts:{}?key={}", self.endpoint, method, self.api_key);
        debug!(method = %method, "Calling identity toolkit");

        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(AuthError::Rejected(message));
        }

        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitAuthProvider {
    async fn send_link(&self, email: &str, redirect_url: &str) -> Result<(), AuthError> {
        let request = SendOobCodeRequest {
            request_type: "EMAIL_SIGNIN",
            email,
            continue_url: redirect_url,
            can_handle_code_in_app: true,
        };
        let _: serde_json::Value = self.call("sendOobCode", &request).await?;
        info!("Sign-in link requested");
        Ok(())
    }

    fn is_sign_in_link(&self, url: &str) -> bool {
        parse_sign_in_link(url).is_some()
    }

    async fn complete_sign_in(&self, email: &str, url: &str) -> Result<UserSession, AuthError> {
        let link = parse_sign_in_link(url).ok_or(AuthError::InvalidLink)?;
        let request = EmailLinkSignInRequest {
            email,
            oob_code: &link.oob_code,
        };

        let response: EmailLinkSignInResponse = self.call("signInWithEmailLink", &request).await?;

        Ok(UserSession {
            uid: response.local_id,
            email: response.email.or_else(|| Some(email.to_string())),
            id_token: response.id_token,
            refresh_token: response.refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let body = serde_json::to_value(SendOobCodeRequest {
            request_type: "EMAIL_SIGNIN",
            email: "ana@example.com",
            continue_url: "http://localhost:3000/auth/verify",
            can_handle_code_in_app: true,
        })
        .unwrap();
        assert_eq!(body["requestType"], "EMAIL_SIGNIN");
        assert_eq!(body["continueUrl"], "http://localhost:3000/auth/verify");
        assert_eq!(body["canHandleCodeInApp"], true);
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let provider = IdentityToolkitAuthProvider::with_endpoint("key", "http://127.0.0.1:9099/v1/");
        assert_eq!(provider.endpoint, "http://127.0.0.1:9099/v1");
        assert!(provider.is_sign_in_link("http://localhost/?mode=signIn&oobCode=abc"));
    }
}
