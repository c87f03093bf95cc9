//! REST API client for the Lucid Loom backend.
//!
//! Wraps every HTTP endpoint the journal uses (auth, dreams, symbols,
//! analytics, account) using [`reqwest`]. The bearer token is read from
//! the shared [`AuthContext`] on each request, and a `401` from a
//! protected endpoint signs that context out.

use loom_core::account::{
    ChangePasswordRequest, DeleteAccountRequest, EmailRequest, LoginForm, MessageResponse,
    RegisterRequest, RegisterResponse, ResetPasswordRequest, ResetTokenResponse, TokenResponse,
    UserInfo, UserStats, VerifyOtpRequest, VerifyResetOtpRequest,
};
use loom_core::analytics::{AnalyticsSummary, PatternAnalysis};
use loom_core::auth::{AuthContext, Persistence};
use loom_core::dream::{
    Dream, DreamDraft, DreamUpdate, RegenerateResponse, RewriteRequest, RewriteResponse,
    RewriteStyle, SymbolExplanation,
};
use loom_core::error::CoreError;
use loom_core::types::DreamId;
use reqwest::header::AUTHORIZATION;
use reqwest::{IntoUrl, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;

/// Path prefixes that require a signed-in user.
const PROTECTED_PREFIXES: [&str; 4] = ["/dreams", "/analytics", "/user", "/symbols"];

/// HTTP client for one Lucid Loom backend.
#[derive(Clone)]
pub struct LoomApi {
    client: reqwest::Client,
    api_url: String,
    auth: AuthContext,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum LoomApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("{detail}")]
    ApiError {
        status: u16,
        /// `detail` from the backend's error body, or the raw body.
        detail: String,
    },

    /// Rejected locally before anything was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl LoomApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            LoomApiError::ApiError { status, .. } => Some(*status),
            LoomApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Interpretation features fail this way when the backend has no AI
    /// provider key configured.
    pub fn mentions_missing_api_key(&self) -> bool {
        match self {
            LoomApiError::ApiError { detail, .. } => {
                let detail = detail.to_lowercase();
                detail.contains("api key") || detail.contains("api_key")
            }
            _ => false,
        }
    }
}

impl LoomApi {
    /// Create a client from `config`, sharing `auth` with the caller.
    pub fn new(config: &ClientConfig, auth: AuthContext) -> Result<Self, LoomApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config.api_url.clone(), auth))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, auth: AuthContext) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Create an unverified account; the backend e-mails a one-time code.
    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, LoomApiError> {
        let path = "/auth/register";
        let response = self.request(Method::POST, path).json(req).send().await?;
        self.parse_response(path, response).await
    }

    /// Confirm the e-mailed code and sign in with the issued token.
    pub async fn verify_otp(
        &self,
        req: &VerifyOtpRequest,
        persistence: Persistence,
    ) -> Result<TokenResponse, LoomApiError> {
        let path = "/auth/verify-otp";
        let response = self.request(Method::POST, path).json(req).send().await?;
        let token: TokenResponse = self.parse_response(path, response).await?;
        self.auth.set(token.access_token.clone(), persistence);
        tracing::info!(?persistence, "Signed in after e-mail verification");
        Ok(token)
    }

    /// Password sign-in (form-encoded, OAuth2 field names).
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        persistence: Persistence,
    ) -> Result<TokenResponse, LoomApiError> {
        let path = "/auth/login";
        let form = LoginForm {
            username: email.trim().to_string(),
            password: password.to_string(),
        };
        let response = self.request(Method::POST, path).form(&form).send().await?;
        let token: TokenResponse = self.parse_response(path, response).await?;
        self.auth.set(token.access_token.clone(), persistence);
        tracing::info!(?persistence, "Signed in");
        Ok(token)
    }

    /// Forget the current session locally. The backend keeps no session
    /// state, so there is nothing to call.
    pub fn logout(&self) -> bool {
        self.auth.clear()
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, LoomApiError> {
        let path = "/auth/forgot-password";
        let body = EmailRequest {
            email: email.trim().to_string(),
        };
        let response = self.request(Method::POST, path).json(&body).send().await?;
        self.parse_response(path, response).await
    }

    /// Exchange a reset code for a short-lived reset token.
    pub async fn verify_reset_otp(
        &self,
        req: &VerifyResetOtpRequest,
    ) -> Result<ResetTokenResponse, LoomApiError> {
        let path = "/auth/verify-reset-otp";
        let response = self.request(Method::POST, path).json(req).send().await?;
        self.parse_response(path, response).await
    }

    pub async fn reset_password(
        &self,
        req: &ResetPasswordRequest,
    ) -> Result<MessageResponse, LoomApiError> {
        let path = "/auth/reset-password";
        let response = self.request(Method::POST, path).json(req).send().await?;
        self.parse_response(path, response).await
    }

    pub async fn change_password(
        &self,
        req: &ChangePasswordRequest,
    ) -> Result<MessageResponse, LoomApiError> {
        let path = "/auth/change-password";
        let response = self.request(Method::POST, path).json(req).send().await?;
        self.parse_response(path, response).await
    }

    // -----------------------------------------------------------------------
    // Dreams
    // -----------------------------------------------------------------------

    /// Record a dream. Interpretation runs in the background; the returned
    /// record usually has none yet.
    pub async fn create_dream(&self, draft: &DreamDraft) -> Result<Dream, LoomApiError> {
        draft.validate()?;
        let path = "/dreams";
        let response = self.request(Method::POST, path).json(draft).send().await?;
        self.parse_response(path, response).await
    }

    pub async fn list_dreams(&self) -> Result<Vec<Dream>, LoomApiError> {
        let path = "/dreams";
        let response = self.request(Method::GET, path).send().await?;
        self.parse_response(path, response).await
    }

    pub async fn fetch_dream(&self, id: DreamId) -> Result<Dream, LoomApiError> {
        let path = format!("/dreams/{id}");
        let response = self.request(Method::GET, &path).send().await?;
        self.parse_response(&path, response).await
    }

    pub async fn update_dream(
        &self,
        id: DreamId,
        update: &DreamUpdate,
    ) -> Result<Dream, LoomApiError> {
        update.validate()?;
        let path = format!("/dreams/{id}");
        let response = self.request(Method::PUT, &path).json(update).send().await?;
        self.parse_response(&path, response).await
    }

    pub async fn delete_dream(&self, id: DreamId) -> Result<(), LoomApiError> {
        let path = format!("/dreams/{id}");
        let response = self.request(Method::DELETE, &path).send().await?;
        self.check_status(&path, response).await
    }

    /// Discard the current interpretation and start a new one (always
    /// with an image). Completion is tracked like a fresh dream.
    pub async fn regenerate_dream(&self, id: DreamId) -> Result<RegenerateResponse, LoomApiError> {
        let path = format!("/dreams/{id}/regenerate");
        let response = self.request(Method::POST, &path).send().await?;
        self.parse_response(&path, response).await
    }

    pub async fn rewrite_dream(
        &self,
        id: DreamId,
        style: RewriteStyle,
    ) -> Result<RewriteResponse, LoomApiError> {
        let path = format!("/dreams/{id}/rewrite");
        let response = self
            .request(Method::POST, &path)
            .json(&RewriteRequest { style })
            .send()
            .await?;
        self.parse_response(&path, response).await
    }

    /// Explain one symbol in the context of the user's journal.
    pub async fn explain_symbol(&self, symbol: &str) -> Result<SymbolExplanation, LoomApiError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(CoreError::Validation("symbol must not be empty".to_string()).into());
        }
        let mut url = reqwest::Url::parse(&self.api_url)
            .map_err(|e| LoomApiError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|_| LoomApiError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["symbols", symbol, "explain"]);

        let response = self
            .request_url(Method::GET, url)
            .send()
            .await?;
        self.parse_response("/symbols", response).await
    }

    // -----------------------------------------------------------------------
    // Analytics
    // -----------------------------------------------------------------------

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary, LoomApiError> {
        let path = "/analytics/summary";
        let response = self.request(Method::GET, path).send().await?;
        self.parse_response(path, response).await
    }

    /// AI pattern analysis across the whole journal. Slow.
    pub async fn analyze_patterns(&self) -> Result<PatternAnalysis, LoomApiError> {
        let path = "/analytics/patterns";
        let response = self.request(Method::POST, path).send().await?;
        self.parse_response(path, response).await
    }

    // -----------------------------------------------------------------------
    // Account
    // -----------------------------------------------------------------------

    pub async fn user_info(&self) -> Result<UserInfo, LoomApiError> {
        let path = "/user/info";
        let response = self.request(Method::GET, path).send().await?;
        self.parse_response(path, response).await
    }

    pub async fn user_stats(&self) -> Result<UserStats, LoomApiError> {
        let path = "/user/stats";
        let response = self.request(Method::GET, path).send().await?;
        self.parse_response(path, response).await
    }

    /// Everything the backend holds for the user, as free-form JSON.
    pub async fn export_user_data(&self) -> Result<serde_json::Value, LoomApiError> {
        let path = "/user/export";
        let response = self.request(Method::GET, path).send().await?;
        self.parse_response(path, response).await
    }

    /// Permanently delete the account, then sign out locally.
    pub async fn delete_account(&self, password: &str) -> Result<(), LoomApiError> {
        let path = "/user/account";
        let body = DeleteAccountRequest {
            password: password.to_string(),
        };
        let response = self.request(Method::DELETE, path).json(&body).send().await?;
        self.check_status(path, response).await?;
        self.auth.clear();
        tracing::info!("Account deleted");
        Ok(())
    }

    // ---- private helpers ----

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request_url(method, format!("{}{path}", self.api_url))
    }

    /// Build a request carrying the current bearer token, if any.
    fn request_url(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.auth.bearer() {
            Some(bearer) => builder.header(AUTHORIZATION, bearer),
            None => builder,
        }
    }

    /// Ensure the response has a success status code. On failure, the
    /// backend's `detail` becomes the error text, and a `401` from a
    /// protected endpoint signs the user out.
    async fn ensure_success(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, LoomApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let detail = extract_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        if status == StatusCode::UNAUTHORIZED && is_protected(path) && self.auth.clear() {
            tracing::warn!(path, "Session expired, signed out");
        } else {
            tracing::debug!(path, status = status.as_u16(), detail = %detail, "Backend error");
        }

        Err(LoomApiError::ApiError {
            status: status.as_u16(),
            detail,
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, LoomApiError> {
        let response = self.ensure_success(path, response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<(), LoomApiError> {
        self.ensure_success(path, response).await?;
        Ok(())
    }
}

fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Pull a human-readable message out of an error body.
///
/// Handles `{"detail": "..."}` and validation errors of the form
/// `{"detail": [{"msg": "..."}, ...]}`; falls back to the trimmed body.
fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return Some(trimmed.to_string());
    };
    match json.get("detail") {
        Some(serde_json::Value::String(detail)) => Some(detail.clone()),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                Some(trimmed.to_string())
            } else {
                Some(messages.join("; "))
            }
        }
        _ => Some(trimmed.to_string()),
    }
}
