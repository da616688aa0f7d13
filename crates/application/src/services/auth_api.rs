//! Account endpoints that do not change the stored session.

use std::sync::Arc;

use ecoroute_domain::{
    ApiMessage, ApiRequest, ChangePasswordRequest, ForgotPasswordRequest, RegisterRequest,
    ResetPasswordRequest, User,
};

use super::join_segment;
use crate::auth::AuthenticatedClient;
use crate::endpoints;
use crate::error::{ApplicationError, ApplicationResult, ensure_success};

/// Account management calls.
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: Arc<AuthenticatedClient>,
}

impl AuthApi {
    /// Create the service.
    #[must_use]
    pub const fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    /// Create an account. A confirmation code is emailed to the user.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status.
    pub async fn register(&self, request: &RegisterRequest) -> ApplicationResult<ApiMessage> {
        let request = ApiRequest::post(endpoints::REGISTER).with_json(request)?;
        self.public(request).await
    }

    /// Confirm an email address with the emailed code.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status.
    pub async fn confirm_email(&self, email: &str, code: &str) -> ApplicationResult<ApiMessage> {
        let path = join_segment(endpoints::CONFIRMATION, email)?;
        let request = ApiRequest::put(path).with_query("code", code);
        self.public(request).await
    }

    /// Ask for a password reset link.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status.
    pub async fn forgot_password(&self, email: &str) -> ApplicationResult<ApiMessage> {
        let body = ForgotPasswordRequest {
            email: email.to_string(),
        };
        let request = ApiRequest::put(endpoints::FORGOT_PASSWORD).with_json(&body)?;
        self.public(request).await
    }

    /// Set a new password using the token from the reset link.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> ApplicationResult<ApiMessage> {
        let path = join_segment(endpoints::RESET_PASSWORD, token)?;
        let body = ResetPasswordRequest {
            new_password: new_password.to_string(),
        };
        let request = ApiRequest::put(path).with_json(&body)?;
        self.public(request).await
    }

    /// Change the password of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Validation`] without calling the server
    /// when the confirmation does not match.
    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> ApplicationResult<ApiMessage> {
        if !request.is_confirmed() {
            return Err(ApplicationError::Validation(
                "new password and confirmation do not match".to_string(),
            ));
        }
        let request = ApiRequest::put(endpoints::CHANGE_PASSWORD).with_json(request)?;
        let response = self.client.send_checked(request).await?;
        Ok(message_or_default(&response))
    }

    /// The logged-in user.
    ///
    /// # Errors
    ///
    /// Returns the error class matching the response status.
    pub async fn me(&self) -> ApplicationResult<User> {
        self.client.send_json(ApiRequest::get(endpoints::ME)).await
    }

    async fn public(&self, request: ApiRequest) -> ApplicationResult<ApiMessage> {
        let response = ensure_success(self.client.send_public(request).await?)?;
        Ok(message_or_default(&response))
    }
}

/// Some endpoints answer with an empty body.
fn message_or_default(response: &ecoroute_domain::ApiResponse) -> ApiMessage {
    response.json().unwrap_or_default()
}
