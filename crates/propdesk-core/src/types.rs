//! Core data types for the PropDesk admin dashboard

use crate::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Listing identifier type
pub type ListingId = Uuid;

/// Upper bound applied to server supplied lifetimes (ten years)
const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

// ============================================================================
// Administrators and sessions
// ============================================================================

/// Role of a dashboard user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Regular administrator
    Admin,
    /// Administrator with access to every tenant
    SuperAdmin,
    /// Reviewer limited to moderation
    Moderator,
    /// Role this build does not know about
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "super admin"),
            Self::Moderator => write!(f, "moderator"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Signed-in dashboard user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminUser {
    /// User identifier
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Role
    pub role: AdminRole,
}

impl AdminUser {
    /// Name to show in the header, falling back to the email
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// Token payload returned by login, OTP verification and refresh
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Bearer token for API calls
    pub access_token: String,
    /// Long lived token used to obtain a new access token
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Token type, normally `Bearer`
    #[serde(default)]
    pub token_type: Option<String>,
    /// Authenticated user, when the endpoint includes it
    #[serde(default)]
    pub user: Option<AdminUser>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("user", &self.user)
            .finish()
    }
}

/// Second factor challenge returned by the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtpChallengeResponse {
    /// Always true for a challenge
    pub otp_required: bool,
    /// Opaque token identifying the pending login
    pub otp_token: String,
    /// Challenge lifetime in seconds
    pub expires_in: i64,
}

/// Body of a successful `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    /// Second factor required before tokens are issued
    Challenge(OtpChallengeResponse),
    /// Tokens issued directly
    Tokens(TokenResponse),
}

/// Authenticated session as persisted between page loads
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for API calls
    pub access_token: String,
    /// Token used to obtain a new access token
    pub refresh_token: String,
    /// When the access token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// Signed-in user
    pub user: AdminUser,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

impl Session {
    /// Build a session from a freshly issued token pair
    ///
    /// `user` is used when the token response does not embed one.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the response carries no refresh
    /// token or no user can be determined.
    pub fn from_tokens(
        tokens: TokenResponse,
        user: Option<AdminUser>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let refresh_token = tokens.refresh_token.ok_or_else(|| {
            Error::Authentication("token response is missing a refresh token".to_string())
        })?;
        let user = tokens.user.or(user).ok_or_else(|| {
            Error::Authentication("token response is missing the user".to_string())
        })?;

        Ok(Self {
            access_token: tokens.access_token,
            refresh_token,
            expires_at: expiry_from(now, tokens.expires_in),
            user,
        })
    }

    /// Session after a successful refresh
    ///
    /// The refresh token and user are only replaced when the response
    /// supplies new ones.
    #[must_use]
    pub fn refreshed(&self, tokens: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens
                .refresh_token
                .unwrap_or_else(|| self.refresh_token.clone()),
            expires_at: expiry_from(now, tokens.expires_in),
            user: tokens.user.unwrap_or_else(|| self.user.clone()),
        }
    }

    /// Whether the access token is expired or expires within `skew`
    #[must_use]
    pub fn expires_within(&self, skew: TimeDelta, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + skew
    }

    /// Value for the `Authorization` header
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Pending second factor for an administrator who passed the password step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtpChallenge {
    /// Opaque token identifying the pending login
    pub otp_token: String,
    /// Email the code was sent to
    pub email: String,
    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Build a challenge from the API response
    #[must_use]
    pub fn from_response(
        response: OtpChallengeResponse,
        email: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            otp_token: response.otp_token,
            email: email.into(),
            expires_at: expiry_from(now, response.expires_in),
        }
    }

    /// Whether the code can no longer be submitted
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whole seconds left before expiry, zero once expired
    #[must_use]
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Result of submitting the login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Tokens were issued and the session stored
    Authenticated(AdminUser),
    /// A one-time code was sent and must be verified
    OtpRequired(OtpChallenge),
}

fn expiry_from(now: DateTime<Utc>, expires_in: i64) -> DateTime<Utc> {
    now + TimeDelta::seconds(expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS))
}

// ============================================================================
// Listings
// ============================================================================

/// Moderation and visibility status of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Submitted, awaiting review
    Pending,
    /// Reviewed and accepted, not yet visible
    Approved,
    /// Reviewed and refused
    Rejected,
    /// Visible on the public site
    Published,
    /// Taken down after being published
    Unpublished,
}

impl ListingStatus {
    /// Every status in display order
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Published,
        Self::Unpublished,
    ];

    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Published => "published",
            Self::Unpublished => "unpublished",
        }
    }

    /// Human readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Published => "Published",
            Self::Unpublished => "Unpublished",
        }
    }

    /// Actions an administrator may take on a listing in this status
    #[must_use]
    pub fn allowed_actions(self) -> &'static [ListingAction] {
        use ListingAction::{Approve, Delete, Edit, Publish, Reject, Unpublish};

        match self {
            Self::Pending => &[Approve, Reject, Edit, Delete],
            Self::Approved => &[Publish, Reject, Edit, Delete],
            Self::Rejected => &[Approve, Edit, Delete],
            Self::Published => &[Unpublish, Edit, Delete],
            Self::Unpublished => &[Publish, Edit, Delete],
        }
    }

    /// Whether `action` is allowed in this status
    #[must_use]
    pub fn allows(self, action: ListingAction) -> bool {
        self.allowed_actions().contains(&action)
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| Error::validation("status", format!("unknown listing status '{s}'")))
    }
}

/// Operation an administrator can perform on a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListingAction {
    /// Accept a pending or rejected listing
    Approve,
    /// Refuse a listing with a reason
    Reject,
    /// Make an approved listing visible
    Publish,
    /// Hide a published listing
    Unpublish,
    /// Change listing details
    Edit,
    /// Remove the listing permanently
    Delete,
}

impl ListingAction {
    /// Every action in menu order
    pub const ALL: [Self; 6] = [
        Self::Approve,
        Self::Reject,
        Self::Publish,
        Self::Unpublish,
        Self::Edit,
        Self::Delete,
    ];

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::Reject => "Reject",
            Self::Publish => "Publish",
            Self::Unpublish => "Unpublish",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
        }
    }

    /// Past participle used in messages ("listing was approved")
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
            Self::Publish => "published",
            Self::Unpublish => "unpublished",
            Self::Edit => "edited",
            Self::Delete => "deleted",
        }
    }

    /// Status the API reports after the action succeeds
    #[must_use]
    pub const fn target_status(self) -> Option<ListingStatus> {
        match self {
            Self::Approve => Some(ListingStatus::Approved),
            Self::Reject => Some(ListingStatus::Rejected),
            Self::Publish => Some(ListingStatus::Published),
            Self::Unpublish => Some(ListingStatus::Unpublished),
            Self::Edit | Self::Delete => None,
        }
    }

    /// Whether the UI must ask before performing the action
    #[must_use]
    pub const fn requires_confirmation(self) -> bool {
        matches!(self, Self::Reject | Self::Unpublish | Self::Delete)
    }

    /// Whether the action needs a free-text reason
    #[must_use]
    pub const fn requires_reason(self) -> bool {
        matches!(self, Self::Reject)
    }

    /// Whether the action cannot be undone
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl fmt::Display for ListingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Edit => "edit",
            Self::Delete => "delete",
        })
    }
}

/// Kind of property
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// Flat in a shared building
    Apartment,
    /// Standalone house
    House,
    /// Detached villa
    Villa,
    /// Plot of land
    Land,
    /// Office, shop or warehouse
    Commercial,
    /// Anything else
    #[serde(other)]
    Other,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Apartment => "Apartment",
            Self::House => "House",
            Self::Villa => "Villa",
            Self::Land => "Land",
            Self::Commercial => "Commercial",
            Self::Other => "Other",
        })
    }
}

/// Whether the property is offered for sale or rent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    /// For sale
    Sale,
    /// For rent
    Rent,
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sale => "For sale",
            Self::Rent => "For rent",
        })
    }
}

/// Postal address of a listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    /// Street and number
    #[serde(default)]
    pub line1: String,
    /// Apartment, suite, etc.
    #[serde(default)]
    pub line2: Option<String>,
    /// City
    pub city: String,
    /// State or region
    #[serde(default)]
    pub state: Option<String>,
    /// Country
    pub country: String,
    /// Postal code
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl Address {
    /// Short "City, Country" form used in tables
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.city.trim(), self.country.trim()) {
            ("", country) => country.to_string(),
            (city, "") => city.to_string(),
            (city, country) => format!("{city}, {country}"),
        }
    }
}

/// Account that submitted the listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingOwner {
    /// Owner identifier
    pub id: Uuid,
    /// Owner name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
}

/// Property listing as returned by the admin API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// Listing identifier
    pub id: ListingId,
    /// Headline
    pub title: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Asking price in whole currency units
    pub price: u64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Kind of property
    pub property_type: PropertyType,
    /// Sale or rent
    pub listing_type: ListingType,
    /// Location
    pub address: Address,
    /// Number of bedrooms
    #[serde(default)]
    pub bedrooms: Option<u8>,
    /// Number of bathrooms
    #[serde(default)]
    pub bathrooms: Option<u8>,
    /// Floor area in square metres
    #[serde(default)]
    pub area_sqm: Option<f64>,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
    /// Submitting account
    pub owner: ListingOwner,
    /// Current status
    pub status: ListingStatus,
    /// Reason given on the last rejection
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Whether `action` may be taken in the current status
    #[must_use]
    pub fn can(&self, action: ListingAction) -> bool {
        self.status.allows(action)
    }

    /// Fail with [`Error::InvalidTransition`] unless `action` is allowed
    ///
    /// # Errors
    ///
    /// Returns an error when the current status does not allow `action`.
    pub fn ensure_can(&self, action: ListingAction) -> Result<()> {
        if self.can(action) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                id: self.id,
                action,
                status: self.status,
            })
        }
    }

    /// Price with currency and thousands separators, e.g. `USD 1,250,000`
    #[must_use]
    pub fn formatted_price(&self) -> String {
        format_price(self.price, &self.currency)
    }

    /// Cover image, if any
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Format an amount with thousands separators
#[must_use]
pub fn format_price(amount: u64, currency: &str) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if currency.is_empty() {
        grouped
    } else {
        format!("{currency} {grouped}")
    }
}

/// Partial listing update; absent fields are left untouched by the API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingUpdate {
    /// New headline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    /// New bedroom count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    /// New bathroom count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u8>,
    /// New floor area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_sqm: Option<f64>,
}

impl ListingUpdate {
    /// Whether the update changes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.area_sqm.is_none()
    }
}

// ============================================================================
// Queries and pagination
// ============================================================================

/// Default page size of the listings table
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Largest page size the API accepts
pub const MAX_PER_PAGE: u32 = 100;

/// Filters and paging for `GET /admin/listings`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    /// Only listings in this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    /// Free-text search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// 1-based page
    pub page: u32,
    /// Page size
    pub per_page: u32,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListingQuery {
    /// First page, no filters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by status and go back to the first page
    #[must_use]
    pub fn with_status(mut self, status: Option<ListingStatus>) -> Self {
        self.status = status;
        self.page = 1;
        self
    }

    /// Filter by search text and go back to the first page; blank clears it
    #[must_use]
    pub fn with_search(mut self, search: impl AsRef<str>) -> Self {
        let search = search.as_ref().trim();
        self.search = (!search.is_empty()).then(|| search.to_string());
        self.page = 1;
        self
    }

    /// Select a page, never below 1
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Select a page size within the accepted range
    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    /// Query string pairs
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs.push(("page", self.page.max(1).to_string()));
        pairs.push(("per_page", self.per_page.clamp(1, MAX_PER_PAGE).to_string()));
        pairs
    }
}

/// Paging metadata
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    /// 1-based page
    pub page: u32,
    /// Page size
    pub per_page: u32,
    /// Total number of matching items
    pub total: u64,
}

impl PageMeta {
    /// Number of pages, at least one
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let per_page = u64::from(self.per_page.max(1));
        let pages = self.total.div_ceil(per_page).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Whether a later page exists
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Whether an earlier page exists
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub data: Vec<T>,
    /// Paging metadata
    pub meta: PageMeta,
}

impl Page<Listing> {
    /// Replace the listing with the same id; returns whether one was found
    pub fn replace(&mut self, listing: Listing) -> bool {
        match self.data.iter_mut().find(|l| l.id == listing.id) {
            Some(slot) => {
                *slot = listing;
                true
            }
            None => false,
        }
    }

    /// Drop the listing with `id`; returns whether one was removed
    pub fn remove(&mut self, id: ListingId) -> bool {
        let before = self.data.len();
        self.data.retain(|l| l.id != id);
        let removed = self.data.len() != before;
        if removed {
            self.meta.total = self.meta.total.saturating_sub(1);
        }
        removed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    pub(crate) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    pub(crate) fn user() -> AdminUser {
        AdminUser {
            id: Uuid::from_u128(7),
            email: "ops@propdesk.test".to_string(),
            name: "Ops".to_string(),
            role: AdminRole::Admin,
        }
    }

    pub(crate) fn listing(status: ListingStatus) -> Listing {
        Listing {
            id: Uuid::from_u128(42),
            title: "Sunny two-bedroom flat".to_string(),
            description: "Close to the park".to_string(),
            price: 1_250_000,
            currency: "USD".to_string(),
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Sale,
            address: Address {
                city: "Lisbon".to_string(),
                country: "Portugal".to_string(),
                ..Address::default()
            },
            bedrooms: Some(2),
            bathrooms: Some(1),
            area_sqm: Some(84.5),
            images: vec!["https://cdn.test/1.jpg".to_string()],
            owner: ListingOwner {
                id: Uuid::from_u128(9),
                name: "Ana".to_string(),
                email: "ana@example.test".to_string(),
                phone: None,
            },
            status,
            rejection_reason: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn tokens(refresh: Option<&str>, user: Option<AdminUser>) -> TokenResponse {
        TokenResponse {
            access_token: "access-1".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_in: 900,
            token_type: Some("Bearer".to_string()),
            user,
        }
    }

    #[test]
    fn test_session_from_tokens() {
        let session =
            Session::from_tokens(tokens(Some("refresh-1"), Some(user())), None, now()).unwrap();

        assert_eq!(session.access_token, "access-1");
        assert_eq!(session.refresh_token, "refresh-1");
        assert_eq!(session.expires_at, now() + TimeDelta::seconds(900));
        assert_eq!(session.user, user());
        assert_eq!(session.bearer(), "Bearer access-1");
    }

    #[test]
    fn test_session_from_tokens_uses_fallback_user() {
        let session = Session::from_tokens(tokens(Some("r"), None), Some(user()), now()).unwrap();
        assert_eq!(session.user.email, "ops@propdesk.test");
    }

    #[test]
    fn test_session_from_tokens_requires_refresh_token() {
        let err = Session::from_tokens(tokens(None, Some(user())), None, now()).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_session_from_tokens_requires_user() {
        let err = Session::from_tokens(tokens(Some("r"), None), None, now()).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_refresh_keeps_refresh_token_unless_rotated() {
        let session =
            Session::from_tokens(tokens(Some("refresh-1"), Some(user())), None, now()).unwrap();
        let later = now() + TimeDelta::minutes(14);

        let kept = session.refreshed(
            TokenResponse {
                access_token: "access-2".to_string(),
                refresh_token: None,
                expires_in: 900,
                token_type: None,
                user: None,
            },
            later,
        );
        assert_eq!(kept.access_token, "access-2");
        assert_eq!(kept.refresh_token, "refresh-1");
        assert_eq!(kept.expires_at, later + TimeDelta::seconds(900));
        assert_eq!(kept.user, user());

        let rotated = session.refreshed(tokens(Some("refresh-2"), None), later);
        assert_eq!(rotated.refresh_token, "refresh-2");
    }

    #[rstest]
    #[case(0, true)]
    #[case(29, true)]
    #[case(30, true)]
    #[case(31, false)]
    #[case(600, false)]
    fn test_expires_within(#[case] remaining: i64, #[case] expected: bool) {
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: now() + TimeDelta::seconds(remaining),
            user: user(),
        };

        assert_eq!(session.expires_within(TimeDelta::seconds(30), now()), expected);
    }

    #[test]
    fn test_huge_lifetimes_are_clamped() {
        let mut response = tokens(Some("r"), Some(user()));
        response.expires_in = i64::MAX;
        let session = Session::from_tokens(response, None, now()).unwrap();
        assert_eq!(session.expires_at, now() + TimeDelta::seconds(MAX_TOKEN_LIFETIME_SECS));

        let mut response = tokens(Some("r"), Some(user()));
        response.expires_in = -5;
        let session = Session::from_tokens(response, None, now()).unwrap();
        assert_eq!(session.expires_at, now());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let tokens = tokens(Some("refresh-secret"), Some(user()));
        let session = Session::from_tokens(tokens, None, now()).unwrap();
        let rendered = format!("{session:?}");

        assert!(!rendered.contains("access-1"));
        assert!(!rendered.contains("refresh-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_login_response_variants() {
        let challenge: LoginResponse = serde_json::from_str(
            r#"{"otp_required": true, "otp_token": "otp-abc", "expires_in": 300}"#,
        )
        .unwrap();
        assert!(matches!(challenge, LoginResponse::Challenge(ref c) if c.otp_token == "otp-abc"));

        let tokens: LoginResponse = serde_json::from_str(
            r#"{"access_token": "a", "refresh_token": "r", "expires_in": 900}"#,
        )
        .unwrap();
        assert!(matches!(tokens, LoginResponse::Tokens(ref t) if t.access_token == "a"));
    }

    #[test]
    fn test_otp_challenge_expiry() {
        let challenge = OtpChallenge::from_response(
            OtpChallengeResponse {
                otp_required: true,
                otp_token: "otp".to_string(),
                expires_in: 120,
            },
            "ops@propdesk.test",
            now(),
        );

        assert!(!challenge.is_expired(now()));
        assert_eq!(challenge.seconds_remaining(now()), 120);
        assert!(challenge.is_expired(now() + TimeDelta::seconds(120)));
        assert_eq!(challenge.seconds_remaining(now() + TimeDelta::hours(1)), 0);
    }

    #[test]
    fn test_unknown_role_deserializes() {
        let user: AdminUser = serde_json::from_str(
            r#"{
                "id": "00000000-0000-0000-0000-000000000001",
                "email": "x@y.z",
                "role": "auditor"
            }"#,
        )
        .unwrap();
        assert_eq!(user.role, AdminRole::Unknown);
        assert_eq!(user.display_name(), "x@y.z");
    }

    #[rstest]
    #[case(
        ListingStatus::Pending,
        &[ListingAction::Approve, ListingAction::Reject, ListingAction::Edit, ListingAction::Delete]
    )]
    #[case(
        ListingStatus::Approved,
        &[ListingAction::Publish, ListingAction::Reject, ListingAction::Edit, ListingAction::Delete]
    )]
    #[case(
        ListingStatus::Rejected,
        &[ListingAction::Approve, ListingAction::Edit, ListingAction::Delete]
    )]
    #[case(
        ListingStatus::Published,
        &[ListingAction::Unpublish, ListingAction::Edit, ListingAction::Delete]
    )]
    #[case(
        ListingStatus::Unpublished,
        &[ListingAction::Publish, ListingAction::Edit, ListingAction::Delete]
    )]
    fn test_allowed_actions(#[case] status: ListingStatus, #[case] expected: &[ListingAction]) {
        assert_eq!(status.allowed_actions(), expected);
    }

    #[test]
    fn test_transitions_land_in_a_status_that_allows_further_work() {
        for status in ListingStatus::ALL {
            for &action in status.allowed_actions() {
                if let Some(target) = action.target_status() {
                    assert_ne!(target, status, "{action} from {status} must change status");
                    assert!(target.allows(ListingAction::Delete));
                }
            }
        }
    }

    #[test]
    fn test_action_flags() {
        assert!(ListingAction::Reject.requires_reason());
        assert!(!ListingAction::Approve.requires_reason());
        assert!(ListingAction::Delete.requires_confirmation());
        assert!(ListingAction::Unpublish.requires_confirmation());
        assert!(!ListingAction::Publish.requires_confirmation());
        assert!(ListingAction::Delete.is_destructive());
        assert_eq!(ListingAction::Edit.target_status(), None);
    }

    #[test]
    fn test_ensure_can() {
        let pending = listing(ListingStatus::Pending);
        assert!(pending.ensure_can(ListingAction::Approve).is_ok());

        let err = pending.ensure_can(ListingAction::Unpublish).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                action: ListingAction::Unpublish,
                status: ListingStatus::Pending,
                ..
            }
        ));
    }

    #[rstest]
    #[case("pending", ListingStatus::Pending)]
    #[case(" Published ", ListingStatus::Published)]
    #[case("UNPUBLISHED", ListingStatus::Unpublished)]
    fn test_status_from_str(#[case] input: &str, #[case] expected: ListingStatus) {
        assert_eq!(input.parse::<ListingStatus>().unwrap(), expected);
    }

    #[test]
    fn test_status_from_str_rejects_unknown() {
        assert!("archived".parse::<ListingStatus>().is_err());
    }

    #[rstest]
    #[case(0, "USD", "USD 0")]
    #[case(999, "USD", "USD 999")]
    #[case(1_000, "EUR", "EUR 1,000")]
    #[case(1_250_000, "USD", "USD 1,250,000")]
    #[case(12_345, "", "12,345")]
    fn test_format_price(#[case] amount: u64, #[case] currency: &str, #[case] expected: &str) {
        assert_eq!(format_price(amount, currency), expected);
    }

    #[test]
    fn test_listing_deserializes_with_optional_fields_missing() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-00000000002a",
            "title": "Plot near the coast",
            "price": 90000,
            "currency": "EUR",
            "property_type": "land",
            "listing_type": "sale",
            "address": {"city": "Faro", "country": "Portugal"},
            "owner": {
                "id": "00000000-0000-0000-0000-000000000009",
                "name": "Ana",
                "email": "ana@example.test"
            },
            "status": "pending",
            "created_at": "2026-03-01T12:00:00Z",
            "updated_at": "2026-03-01T12:00:00Z"
        }"#;

        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.id, Uuid::from_u128(42));
        assert_eq!(listing.property_type, PropertyType::Land);
        assert!(listing.images.is_empty());
        assert_eq!(listing.cover_image(), None);
        assert_eq!(listing.address.summary(), "Faro, Portugal");
    }

    #[test]
    fn test_unknown_property_type_is_other() {
        let kind: PropertyType = serde_json::from_str(r#""houseboat""#).unwrap();
        assert_eq!(kind, PropertyType::Other);
    }

    #[test]
    fn test_listing_update_serializes_only_changes() {
        let update = ListingUpdate {
            price: Some(1_100_000),
            ..ListingUpdate::default()
        };

        assert!(!update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({"price": 1_100_000}));
        assert!(ListingUpdate::default().is_empty());
    }

    #[test]
    fn test_query_builders_reset_page() {
        let query = ListingQuery::new().with_page(4).with_status(Some(ListingStatus::Pending));
        assert_eq!(query.page, 1);

        let query = query.with_page(3).with_search("  lisbon ");
        assert_eq!(query.page, 1);
        assert_eq!(query.search.as_deref(), Some("lisbon"));

        let query = query.with_search("   ");
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_query_pairs() {
        let query = ListingQuery::new()
            .with_status(Some(ListingStatus::Approved))
            .with_search("sea view")
            .with_page(0)
            .with_per_page(500);

        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("status", "approved".to_string()),
                ("search", "sea view".to_string()),
                ("page", "1".to_string()),
                ("per_page", "100".to_string()),
            ]
        );
    }

    #[rstest]
    #[case(0, 20, 1)]
    #[case(20, 20, 1)]
    #[case(21, 20, 2)]
    #[case(101, 10, 11)]
    fn test_total_pages(#[case] total: u64, #[case] per_page: u32, #[case] pages: u32) {
        let meta = PageMeta { page: 1, per_page, total };
        assert_eq!(meta.total_pages(), pages);
    }

    #[test]
    fn test_page_navigation_flags() {
        let meta = PageMeta { page: 2, per_page: 10, total: 25 };
        assert!(meta.has_prev());
        assert!(meta.has_next());

        let last = PageMeta { page: 3, ..meta };
        assert!(!last.has_next());
    }

    #[test]
    fn test_page_replace_and_remove() {
        let mut page = Page {
            data: vec![listing(ListingStatus::Pending)],
            meta: PageMeta { page: 1, per_page: 20, total: 1 },
        };

        let mut approved = listing(ListingStatus::Approved);
        approved.title = "Renamed".to_string();
        assert!(page.replace(approved));
        assert_eq!(page.data[0].status, ListingStatus::Approved);
        assert_eq!(page.data[0].title, "Renamed");

        assert!(!page.remove(Uuid::from_u128(1)));
        assert!(page.remove(Uuid::from_u128(42)));
        assert!(page.data.is_empty());
        assert_eq!(page.meta.total, 0);
    }
}
