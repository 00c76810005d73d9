use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::auth::dto::{
    ChangePasswordRequest, ChangePasswordResponse, CreateAccountRequest, CreateAccountResponse,
    PublicUser,
};

/// Wire mirror of the server's error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    field: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a domain error. `field` names the form input
    /// the message belongs to, when the server tagged one.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        field: Option<String>,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// HTTP client for the auth endpoints.
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn create_account(
        &self,
        req: &CreateAccountRequest,
    ) -> Result<PublicUser, ClientError> {
        let resp = self
            .http
            .post(format!("{}/api/auth/create-account", self.base_url))
            .json(req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        let body: CreateAccountResponse = resp.json().await?;
        debug!(user_id = %body.data.user.id, "account created");
        Ok(body.data.user)
    }

    pub async fn change_password(
        &self,
        token: &str,
        req: &ChangePasswordRequest,
    ) -> Result<(), ClientError> {
        let resp = self
            .http
            .put(format!("{}/api/auth/change-password", self.base_url))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        resp.json::<ChangePasswordResponse>().await?;
        debug!("password changed");
        Ok(())
    }

    async fn api_error(resp: reqwest::Response) -> ClientError {
        let status = resp.status().as_u16();
        match resp.json::<ApiErrorBody>().await {
            Ok(body) => ClientError::Api {
                status,
                message: body.error,
                field: body.field,
            },
            Err(_) => ClientError::Api {
                status,
                message: "Unexpected server response".to_string(),
                field: None,
            },
        }
    }
}
