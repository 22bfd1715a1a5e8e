//! Sign-in, second factor, password reset and sign-out

use crate::http::{ApiClient, ApiRequest};
use chrono::Utc;
use propdesk_core::{
    types::{LoginResponse, OtpChallengeResponse},
    validate_form, AdminUser, Error, ForgotPasswordForm, LoginForm, LoginOutcome, OtpChallenge,
    OtpForm, ResetPasswordForm, Result, Session, TokenResponse,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize)]
struct VerifyOtpRequest<'a> {
    otp_token: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct ResendOtpRequest<'a> {
    otp_token: &'a str,
}

#[derive(Serialize)]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    refresh_token: &'a str,
}

impl ApiClient {
    /// Submit email and password
    ///
    /// When the API issues tokens straight away the session is stored and
    /// the user returned; otherwise the OTP challenge to verify next is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed form, an authentication
    /// error for rejected credentials, or any transport/API error.
    pub async fn login(&self, form: &LoginForm) -> Result<LoginOutcome> {
        validate_form(form)?;

        let response: LoginResponse = self
            .send_json(ApiRequest::post("/auth/login").anonymous().json(form)?)
            .await?;

        match response {
            LoginResponse::Challenge(challenge) => {
                info!(email = %form.email, "Password accepted, one-time code required");
                Ok(LoginOutcome::OtpRequired(OtpChallenge::from_response(
                    challenge,
                    form.email.clone(),
                    Utc::now(),
                )))
            }
            LoginResponse::Tokens(tokens) => {
                let user = self.start_session(tokens).await?;
                Ok(LoginOutcome::Authenticated(user))
            }
        }
    }

    /// Verify the one-time code for a pending login
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the challenge has expired or the
    /// code is rejected, a validation error for a malformed code, or any
    /// transport/API error.
    pub async fn verify_otp(&self, challenge: &OtpChallenge, form: &OtpForm) -> Result<AdminUser> {
        validate_form(form)?;
        if challenge.is_expired(Utc::now()) {
            return Err(Error::Authentication(
                "verification code expired, request a new one".to_string(),
            ));
        }

        let tokens: TokenResponse = self
            .send_json(
                ApiRequest::post("/auth/verify-otp")
                    .anonymous()
                    .json(&VerifyOtpRequest {
                        otp_token: &challenge.otp_token,
                        code: &form.code,
                    })?,
            )
            .await?;

        self.start_session(tokens).await
    }

    /// Ask for a new one-time code
    ///
    /// # Errors
    ///
    /// Returns any transport/API error.
    pub async fn resend_otp(&self, challenge: &OtpChallenge) -> Result<OtpChallenge> {
        let response: OtpChallengeResponse = self
            .send_json(
                ApiRequest::post("/auth/resend-otp")
                    .anonymous()
                    .json(&ResendOtpRequest {
                        otp_token: &challenge.otp_token,
                    })?,
            )
            .await?;

        info!(email = %challenge.email, "One-time code resent");
        Ok(OtpChallenge::from_response(
            response,
            challenge.email.clone(),
            Utc::now(),
        ))
    }

    /// Send a password reset email
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email or any
    /// transport/API error.
    pub async fn request_password_reset(&self, form: &ForgotPasswordForm) -> Result<()> {
        validate_form(form)?;
        self.send_empty(ApiRequest::post("/auth/forgot-password").anonymous().json(form)?)
            .await
    }

    /// Set a new password using the token from the reset email
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed form or any transport/API
    /// error.
    pub async fn reset_password(&self, form: &ResetPasswordForm) -> Result<()> {
        validate_form(form)?;
        self.send_empty(
            ApiRequest::post("/auth/reset-password")
                .anonymous()
                .json(&ResetPasswordRequest {
                    token: &form.token,
                    password: &form.password,
                })?,
        )
        .await
    }

    /// Sign out
    ///
    /// The refresh token is revoked on a best-effort basis; the local
    /// session is cleared whatever the API answers.
    pub async fn logout(&self) {
        let Some(session) = self.session().current() else {
            return;
        };

        if let Err(e) = self.revoke_refresh_token().await {
            warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
        }

        self.session().clear();
        info!(user = %session.user.email, "Signed out");
    }

    /// Fetch the signed-in user and update the stored copy
    ///
    /// # Errors
    ///
    /// Returns a session error when not signed in or any transport/API error.
    pub async fn current_user(&self) -> Result<AdminUser> {
        let user: AdminUser = self.send_json(ApiRequest::get("/auth/me")).await?;
        self.session().update_user(user.clone());
        Ok(user)
    }

    /// Load the persisted session, returning its user
    #[must_use]
    pub fn restore_session(&self) -> Option<AdminUser> {
        self.session().restore()
    }

    async fn start_session(&self, tokens: TokenResponse) -> Result<AdminUser> {
        let user = match tokens.user.clone() {
            Some(user) => user,
            None => self.fetch_user_with(&tokens.access_token).await?,
        };

        let session = Session::from_tokens(tokens, Some(user), Utc::now())?;
        let user = session.user.clone();
        self.session().set(session);
        info!(user = %user.email, role = %user.role, "Signed in");
        Ok(user)
    }

    /// Revoke the refresh token that is current once the access token is
    /// usable; a proactive refresh may rotate it first
    async fn revoke_refresh_token(&self) -> Result<()> {
        self.fresh_access_token().await?;
        let session = self.session().current().ok_or(Error::SessionExpired)?;

        let request = ApiRequest::post("/auth/logout").json(&LogoutRequest {
            refresh_token: &session.refresh_token,
        })?;
        self.send_empty(request).await
    }

    /// `GET /auth/me` with a token that is not stored yet
    async fn fetch_user_with(&self, access_token: &str) -> Result<AdminUser> {
        let request = ApiRequest::get("/auth/me").anonymous().bearer(access_token);
        let response = self.send(&request).await?;
        crate::http::decode(response).await
    }
}
