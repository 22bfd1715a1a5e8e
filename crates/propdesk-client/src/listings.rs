//! Listing moderation operations

use crate::http::{ApiClient, ApiRequest};
use propdesk_core::{
    validate_form, EditListingForm, Error, Listing, ListingAction, ListingId, ListingQuery, Page,
    RejectForm, Result,
};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct RejectRequest<'a> {
    reason: &'a str,
}

fn listing_path(id: ListingId) -> String {
    format!("/admin/listings/{id}")
}

impl ApiClient {
    /// One page of listings matching `query`
    ///
    /// # Errors
    ///
    /// Returns a session error when not signed in or any transport/API error.
    pub async fn list_listings(&self, query: &ListingQuery) -> Result<Page<Listing>> {
        self.send_json(ApiRequest::get("/admin/listings").query(query.to_query_pairs()))
            .await
    }

    /// A single listing
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, a session error when not
    /// signed in, or any transport/API error.
    pub async fn get_listing(&self, id: ListingId) -> Result<Listing> {
        self.send_json(ApiRequest::get(listing_path(id))).await
    }

    /// Accept a pending or rejected listing
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] without contacting the API when
    /// the listing's status does not allow approval.
    pub async fn approve_listing(&self, listing: &Listing) -> Result<Listing> {
        self.transition(listing, ListingAction::Approve, None).await
    }

    /// Refuse a listing, telling the owner why
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] or a validation error without
    /// contacting the API when the action is not allowed or the reason is
    /// malformed.
    pub async fn reject_listing(&self, listing: &Listing, form: &RejectForm) -> Result<Listing> {
        validate_form(form)?;
        self.transition(listing, ListingAction::Reject, Some(&form.reason))
            .await
    }

    /// Make an approved listing visible
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] without contacting the API when
    /// the listing's status does not allow publishing.
    pub async fn publish_listing(&self, listing: &Listing) -> Result<Listing> {
        self.transition(listing, ListingAction::Publish, None).await
    }

    /// Hide a published listing
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] without contacting the API when
    /// the listing is not published.
    pub async fn unpublish_listing(&self, listing: &Listing) -> Result<Listing> {
        self.transition(listing, ListingAction::Unpublish, None).await
    }

    /// Remove a listing permanently
    ///
    /// # Errors
    ///
    /// Returns a session error when not signed in or any transport/API error.
    pub async fn delete_listing(&self, listing: &Listing) -> Result<()> {
        listing.ensure_can(ListingAction::Delete)?;
        self.send_empty(ApiRequest::delete(listing_path(listing.id)))
            .await?;
        info!(listing = %listing.id, "Listing deleted");
        Ok(())
    }

    /// Save edited listing details, sending only the changed fields
    ///
    /// # Errors
    ///
    /// Returns a validation error when the form is invalid or nothing
    /// changed, or any transport/API error.
    pub async fn update_listing(
        &self,
        listing: &Listing,
        form: &EditListingForm,
    ) -> Result<Listing> {
        listing.ensure_can(ListingAction::Edit)?;
        validate_form(form)?;

        let update = form.changes_from(listing);
        if update.is_empty() {
            return Err(Error::validation("form", "no changes to save"));
        }

        let updated: Listing = self
            .send_json(ApiRequest::patch(listing_path(listing.id)).json(&update)?)
            .await?;
        info!(listing = %listing.id, "Listing updated");
        Ok(updated)
    }

    /// Run a status transition picked from the action menu
    ///
    /// Edit and Delete carry no status transition and are rejected here;
    /// use [`ApiClient::update_listing`] and [`ApiClient::delete_listing`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] when the action is not a status
    /// transition or is not allowed, a validation error when a required
    /// reason is missing, or any transport/API error.
    pub async fn apply_action(
        &self,
        listing: &Listing,
        action: ListingAction,
        reason: Option<&str>,
    ) -> Result<Listing> {
        match action {
            ListingAction::Reject => {
                let form = RejectForm::new(reason.unwrap_or_default());
                self.reject_listing(listing, &form).await
            }
            ListingAction::Approve | ListingAction::Publish | ListingAction::Unpublish => {
                self.transition(listing, action, None).await
            }
            ListingAction::Edit | ListingAction::Delete => Err(Error::InvalidTransition {
                id: listing.id,
                action,
                status: listing.status,
            }),
        }
    }

    async fn transition(
        &self,
        listing: &Listing,
        action: ListingAction,
        reason: Option<&str>,
    ) -> Result<Listing> {
        listing.ensure_can(action)?;

        let mut request = ApiRequest::post(format!("{}/{action}", listing_path(listing.id)));
        if let Some(reason) = reason {
            request = request.json(&RejectRequest { reason })?;
        }

        let updated: Listing = self.send_json(request).await?;
        info!(
            listing = %listing.id,
            action = %action,
            from = %listing.status,
            to = %updated.status,
            "Listing status changed"
        );
        Ok(updated)
    }
}
