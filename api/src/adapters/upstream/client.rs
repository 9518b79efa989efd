//! X gateway client implementation
//!
//! Talks JSON to the gateway. Sessions travel as a `Cookie` header plus the
//! `x-csrf-token` header mirrored from the `ct0` cookie.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::domain::entities::Handle;
use crate::domain::ports::{
    Credentials, PostCategory, RawPost, RawUser, Session, SessionCookie, UpstreamClient,
};
use crate::error::UpstreamError;

/// Implementation of the upstream client over HTTP
pub struct HttpUpstreamClient {
    http: Client,
    base_url: String,
}

impl HttpUpstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_session(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        let request = request.header(reqwest::header::COOKIE, session.cookie_header());
        match session.cookies.iter().find(|c| c.name == "ct0") {
            Some(csrf) => request.header("x-csrf-token", &csrf.value),
            None => request,
        }
    }
}

async fn handle_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| UpstreamError::Deserialization(e.to_string()))
    } else if status.as_u16() == 401 || status.as_u16() == 403 {
        Err(UpstreamError::Unauthorized)
    } else if status.as_u16() == 429 {
        Err(UpstreamError::RateLimited)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(UpstreamError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Request types for the gateway
#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    totp_secret: Option<&'a str>,
}

#[derive(Deserialize)]
struct LoginResponse {
    cookies: Vec<SessionCookie>,
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn login(&self, credentials: &Credentials) -> Result<Session, UpstreamError> {
        let resp = self
            .http
            .post(self.api_url("/auth/login"))
            .json(&LoginRequest {
                username: &credentials.username,
                email: &credentials.email,
                password: &credentials.password,
                totp_secret: credentials.totp_secret.as_deref(),
            })
            .send()
            .await?;

        let login: LoginResponse = match handle_response(resp).await {
            Ok(login) => login,
            Err(UpstreamError::Unauthorized) => {
                return Err(UpstreamError::Login("credentials rejected".to_string()))
            }
            Err(e) => return Err(e),
        };

        if login.cookies.is_empty() {
            return Err(UpstreamError::Login("no session cookies returned".to_string()));
        }

        Ok(Session {
            cookies: login.cookies,
        })
    }

    async fn validate(&self, session: &Session) -> Result<(), UpstreamError> {
        let resp = self
            .with_session(self.http.get(self.api_url("/auth/session")), session)
            .send()
            .await?;

        let _: serde_json::Value = handle_response(resp).await?;
        Ok(())
    }

    async fn get_user(&self, session: &Session, handle: &Handle) -> Result<RawUser, UpstreamError> {
        let url = self.api_url(&format!("/users/by-screen-name/{}", encode(handle.as_str())));
        let resp = self
            .with_session(self.http.get(url), session)
            .send()
            .await?;

        if resp.status().as_u16() == 404 {
            return Err(UpstreamError::NotFound(handle.to_string()));
        }

        handle_response(resp).await
    }

    async fn get_posts(
        &self,
        session: &Session,
        user_id: &str,
        category: PostCategory,
    ) -> Result<Vec<RawPost>, UpstreamError> {
        let url = self.api_url(&format!(
            "/users/{}/posts?category={}",
            encode(user_id),
            category.as_str()
        ));
        let resp = self
            .with_session(self.http.get(url), session)
            .send()
            .await?;

        handle_response(resp).await
    }
}
