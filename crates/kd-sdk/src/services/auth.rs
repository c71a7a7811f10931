use crate::client::Client;
use crate::error::Result;
use crate::request::{ApiRequest, MultipartForm};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Session fields picked out of a login response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default, alias = "accessToken", alias = "token")]
    pub access_token: Option<String>,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default, alias = "role", alias = "userScope")]
    pub scope: Option<String>,
}

#[derive(Debug, Serialize)]
struct RevokeRequest<'a> {
    token: &'a str,
}

/// `/Auth` endpoints
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a Client,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Student sign-up with uploaded documents
    pub async fn register_student(&self, form: MultipartForm) -> Result<Value> {
        self.client
            .send(ApiRequest::post("/Auth/RegisterStudent").with_multipart(form))
            .await
    }

    pub async fn register(&self, user: &Value) -> Result<Value> {
        self.client
            .send(ApiRequest::post("/Auth/Register").with_json(user)?)
            .await
    }

    pub async fn register_company(&self, company: &Value) -> Result<Value> {
        self.client
            .send(ApiRequest::post("/Auth/RegisterCompany").with_json(company)?)
            .await
    }

    /// Log in and store whatever session fields the server returned.
    ///
    /// The raw payload is returned unchanged.
    pub async fn login(&self, email: &str, password: &str) -> Result<Value> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let payload = self
            .client
            .send(ApiRequest::post("/Auth/Login").with_json(&body)?)
            .await?;

        let session: LoginResponse = serde_json::from_value(payload.clone()).unwrap_or_default();
        match session.access_token.as_deref() {
            Some(token) if !token.is_empty() => {
                self.client.store().save_session(
                    token,
                    session.refresh_token.as_deref(),
                    session.scope.as_deref(),
                )?;
                info!(scope = ?session.scope, "Logged in");
            }
            _ => info!("Login response carried no access token; nothing stored"),
        }

        Ok(payload)
    }

    /// Revoke the refresh token if one is stored, then end the session.
    ///
    /// Revocation failures are logged and never prevent the logout.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.client.store().refresh_token() {
            if let Err(e) = self.revoke(&refresh_token).await {
                error!(error = %e, "Failed to revoke refresh token");
            }
        }
        self.client.logout();
    }

    async fn revoke(&self, refresh_token: &str) -> Result<Value> {
        let request = ApiRequest::post("/Auth/Revoke").with_json(&RevokeRequest {
            token: refresh_token,
        })?;
        self.client.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_response_field_names() {
        let snake: LoginResponse = serde_json::from_value(json!({
            "access_token": "a", "refresh_token": "r", "scope": "Student"
        }))
        .unwrap();
        assert_eq!(snake.scope.as_deref(), Some("Student"));

        let camel: LoginResponse = serde_json::from_value(json!({
            "token": "a", "refreshToken": "r", "role": "Company"
        }))
        .unwrap();
        assert_eq!(camel.access_token.as_deref(), Some("a"));
        assert_eq!(camel.scope.as_deref(), Some("Company"));
    }
}
