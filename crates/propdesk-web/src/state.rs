//! Application state shared through Leptos context

use leptos::prelude::*;
use propdesk_client::ApiClient;
use propdesk_core::{
    AdminUser, ApiConfig, EditListingForm, Error, Listing, ListingAction, OtpChallenge, Result,
};
use send_wrapper::SendWrapper;

/// API configuration for the page
///
/// `PROPDESK_API_URL` at build time wins; otherwise the API is expected under
/// `/api` on the origin serving the dashboard.
#[must_use]
pub fn api_config() -> ApiConfig {
    let base_url = option_env!("PROPDESK_API_URL").map_or_else(
        || {
            web_sys::window()
                .and_then(|window| window.location().origin().ok())
                .map_or_else(|| ApiConfig::default().base_url, |origin| format!("{origin}/api"))
        },
        str::to_string,
    );
    ApiConfig::with_base_url(base_url)
}

/// Authentication state
///
/// The client lives behind a [`SendWrapper`] because browser futures are not
/// `Send`; the page is single threaded so the wrapper never trips.
#[derive(Clone)]
pub struct AuthContext {
    client: SendWrapper<ApiClient>,
    /// Signed-in administrator, `None` when signed out
    pub user: RwSignal<Option<AdminUser>>,
    /// Login waiting for its one-time code
    pub pending_otp: RwSignal<Option<OtpChallenge>>,
}

impl AuthContext {
    /// Context for `client`, restoring any stored session
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let user = client.restore_session();
        Self {
            client: SendWrapper::new(client),
            user: RwSignal::new(user),
            pending_otp: RwSignal::new(None),
        }
    }

    /// Handle to the API client
    #[must_use]
    pub fn client(&self) -> ApiClient {
        (*self.client).clone()
    }

    /// Message to show for a failed operation
    ///
    /// Session failures sign the user out locally instead; protected views
    /// then redirect to the login page.
    pub fn error_message(&self, err: &Error) -> Option<String> {
        if err.is_session_failure() {
            self.user.set(None);
            return None;
        }
        Some(friendly_message(err))
    }
}

/// Put the auth context in scope
pub fn provide_auth(client: ApiClient) -> AuthContext {
    let auth = AuthContext::new(client);
    provide_context(auth.clone());
    auth
}

/// Auth context provided by the app root
#[must_use]
pub fn use_auth() -> AuthContext {
    expect_context::<AuthContext>()
}

/// Human readable description of an error
#[must_use]
pub fn friendly_message(err: &Error) -> String {
    match err {
        Error::Validation { field, message } => format!("{} {message}", field_label(field)),
        Error::Authentication(message) => message.clone(),
        Error::RateLimitExceeded { .. } => "Too many requests, try again in a moment".to_string(),
        Error::Transport(_) => "Could not reach the server, check your connection".to_string(),
        Error::NotFound { .. } => "The listing no longer exists".to_string(),
        Error::Api { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn field_label(field: &str) -> String {
    let mut label = field.replace('_', " ");
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    label
}

/// Kind of flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
}

/// Short-lived banner shown above the listings table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    /// Kind
    pub kind: FlashKind,
    /// Text
    pub message: String,
}

impl Flash {
    /// Success banner
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    /// Error banner
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Banner for a completed listing action
    #[must_use]
    pub fn for_action(listing: &Listing, action: ListingAction) -> Self {
        Self::success(format!("\"{}\" was {}", listing.title, action.past_tense()))
    }

    /// CSS class
    #[must_use]
    pub const fn class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "flash flash-success",
            FlashKind::Error => "flash flash-error",
        }
    }
}

/// Which modal is open on the listings page
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ModalState {
    /// No modal
    #[default]
    Closed,
    /// Yes/no confirmation before an action
    Confirm {
        /// Listing acted on
        listing: Listing,
        /// Action awaiting confirmation
        action: ListingAction,
    },
    /// Reason entry before rejecting
    Reject {
        /// Listing to reject
        listing: Listing,
    },
    /// Listing details editor
    Edit {
        /// Listing being edited
        listing: Listing,
    },
}

impl ModalState {
    /// Modal to open when `action` is picked from a row's menu
    ///
    /// `Closed` means the action runs straight away.
    #[must_use]
    pub fn for_action(listing: &Listing, action: ListingAction) -> Self {
        match action {
            ListingAction::Edit => Self::Edit {
                listing: listing.clone(),
            },
            ListingAction::Reject => Self::Reject {
                listing: listing.clone(),
            },
            action if action.requires_confirmation() => Self::Confirm {
                listing: listing.clone(),
                action,
            },
            _ => Self::Closed,
        }
    }

    /// Whether a modal is showing
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Edit form as typed, before numbers are parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDraft {
    /// Headline
    pub title: String,
    /// Description
    pub description: String,
    /// Asking price
    pub price: String,
    /// Bedrooms, blank for unknown
    pub bedrooms: String,
    /// Bathrooms, blank for unknown
    pub bathrooms: String,
    /// Floor area in square metres, blank for unknown
    pub area_sqm: String,
}

impl EditDraft {
    /// Draft pre-filled from `listing`
    #[must_use]
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone(),
            price: listing.price.to_string(),
            bedrooms: listing.bedrooms.map(|b| b.to_string()).unwrap_or_default(),
            bathrooms: listing.bathrooms.map(|b| b.to_string()).unwrap_or_default(),
            area_sqm: listing.area_sqm.map(|a| a.to_string()).unwrap_or_default(),
        }
    }

    /// Parse the numeric fields
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first field that is not a
    /// number.
    pub fn to_form(&self) -> Result<EditListingForm> {
        let price: String = self
            .price
            .chars()
            .filter(|c| !matches!(c, ',' | '_' | ' '))
            .collect();
        let price = price
            .parse()
            .map_err(|_| Error::validation("price", "must be a whole number"))?;

        Ok(EditListingForm {
            title: self.title.clone(),
            description: self.description.clone(),
            price,
            bedrooms: parse_optional(&self.bedrooms, "bedrooms", "must be a whole number")?,
            bathrooms: parse_optional(&self.bathrooms, "bathrooms", "must be a whole number")?,
            area_sqm: parse_optional(&self.area_sqm, "area_sqm", "must be a number")?,
        })
    }
}

fn parse_optional<T: std::str::FromStr>(
    raw: &str,
    field: &str,
    message: &str,
) -> Result<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| Error::validation(field, message))
}
