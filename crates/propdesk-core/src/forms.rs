//! User input for the sign-in and listing moderation screens
//!
//! Every form is validated with the `validator` derive before anything is
//! sent to the API. [`validate_form`] collapses the validator report into a
//! single [`Error::Validation`] naming the first failing field, which is what
//! the UI shows under the form.

use crate::{
    types::{Listing, ListingUpdate},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};
use validator::{Validate, ValidationError, ValidationErrors};

/// Number of digits in a one-time code
pub const OTP_LENGTH: usize = 6;

/// Minimum password length accepted by the reset form
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Maximum password length accepted by the reset form
pub const MAX_PASSWORD_LENGTH: u64 = 128;

const TITLE_LENGTH: std::ops::RangeInclusive<usize> = 3..=200;
const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Validate a form and report the first failing field
///
/// Fields are visited in name order so the reported error is stable.
///
/// # Errors
///
/// Returns [`Error::Validation`] when any rule fails.
pub fn validate_form<T: Validate>(form: &T) -> Result<()> {
    form.validate().map_err(|errors| first_error(&errors))
}

fn first_error(errors: &ValidationErrors) -> Error {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map_or_else(|| e.code.to_string(), ToString::to_string);
                Error::validation(field.to_string(), message)
            })
        })
        .unwrap_or_else(|| Error::validation("form", "is invalid"))
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_otp_code(code: &str) -> std::result::Result<(), ValidationError> {
    if code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(rule("otp_format", "must be 6 digits"))
    }
}

fn validate_title(title: &str) -> std::result::Result<(), ValidationError> {
    if TITLE_LENGTH.contains(&title.trim().chars().count()) {
        Ok(())
    } else {
        Err(rule("length", "must be between 3 and 200 characters"))
    }
}

fn validate_description(description: &str) -> std::result::Result<(), ValidationError> {
    if description.trim().chars().count() <= MAX_DESCRIPTION_LENGTH {
        Ok(())
    } else {
        Err(rule("length", "must be at most 5000 characters"))
    }
}

fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(rule("required", "is required"))
    } else {
        Ok(())
    }
}

/// Email and password step
#[derive(Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    /// Login email
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Password
    #[validate(custom(function = "validate_not_blank"))]
    pub password: String,
}

impl LoginForm {
    /// Build the form, trimming the email
    pub fn new(email: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self {
            email: email.as_ref().trim().to_string(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One-time code step
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OtpForm {
    /// Code as typed, whitespace removed
    #[validate(custom(function = "validate_otp_code"))]
    pub code: String,
}

impl OtpForm {
    /// Build the form, dropping any whitespace the user typed or pasted
    pub fn new(code: impl AsRef<str>) -> Self {
        Self {
            code: code.as_ref().chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }
}

/// Request a password reset email
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordForm {
    /// Account email
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

impl ForgotPasswordForm {
    /// Build the form, trimming the email
    pub fn new(email: impl AsRef<str>) -> Self {
        Self {
            email: email.as_ref().trim().to_string(),
        }
    }
}

/// Choose a new password with the token from the reset email
#[derive(Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResetPasswordForm {
    /// Token from the reset link
    #[validate(custom(function = "validate_not_blank"))]
    pub token: String,
    /// New password
    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        max = MAX_PASSWORD_LENGTH,
        message = "must be between 8 and 128 characters"
    ))]
    pub password: String,
    /// New password, typed again
    #[validate(must_match(other = "password", message = "does not match the password"))]
    pub password_confirmation: String,
}

impl ResetPasswordForm {
    /// Build the form
    pub fn new(
        token: impl AsRef<str>,
        password: impl Into<String>,
        password_confirmation: impl Into<String>,
    ) -> Self {
        Self {
            token: token.as_ref().trim().to_string(),
            password: password.into(),
            password_confirmation: password_confirmation.into(),
        }
    }
}

impl fmt::Debug for ResetPasswordForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetPasswordForm")
            .field("token", &"<redacted>")
            .field("password", &"<redacted>")
            .field("password_confirmation", &"<redacted>")
            .finish()
    }
}

/// Reason shown to the owner when a listing is rejected
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RejectForm {
    /// Reason, trimmed
    #[validate(length(min = 10, max = 500, message = "must be between 10 and 500 characters"))]
    pub reason: String,
}

impl RejectForm {
    /// Build the form, trimming the reason
    pub fn new(reason: impl AsRef<str>) -> Self {
        Self {
            reason: reason.as_ref().trim().to_string(),
        }
    }
}

/// Editable listing fields
///
/// Text lengths are checked on the trimmed value, which is what
/// [`EditListingForm::changes_from`] sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct EditListingForm {
    /// Headline
    #[validate(custom(function = "validate_title"))]
    pub title: String,
    /// Description
    #[validate(custom(function = "validate_description"))]
    pub description: String,
    /// Asking price
    #[validate(range(min = 1, message = "must be greater than zero"))]
    pub price: u64,
    /// Bedrooms
    #[validate(range(max = 50, message = "must be at most 50"))]
    pub bedrooms: Option<u8>,
    /// Bathrooms
    #[validate(range(max = 50, message = "must be at most 50"))]
    pub bathrooms: Option<u8>,
    /// Floor area
    #[validate(range(min = 1.0, message = "must be positive"))]
    pub area_sqm: Option<f64>,
}

impl EditListingForm {
    /// Pre-fill the form from the listing being edited
    #[must_use]
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone(),
            price: listing.price,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            area_sqm: listing.area_sqm,
        }
    }

    /// Fields that differ from `listing`
    ///
    /// Text fields are compared after trimming. Clearing an optional number
    /// is not expressible as a partial update and is ignored.
    #[must_use]
    pub fn changes_from(&self, listing: &Listing) -> ListingUpdate {
        let title = self.title.trim();
        let description = self.description.trim();

        ListingUpdate {
            title: (title != listing.title).then(|| title.to_string()),
            description: (description != listing.description).then(|| description.to_string()),
            price: (self.price != listing.price).then_some(self.price),
            bedrooms: self.bedrooms.filter(|b| Some(*b) != listing.bedrooms),
            bathrooms: self.bathrooms.filter(|b| Some(*b) != listing.bathrooms),
            area_sqm: self.area_sqm.filter(|a| Some(*a) != listing.area_sqm),
        }
    }
}
