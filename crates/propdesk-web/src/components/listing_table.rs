//! Listings table

use crate::components::{action_menu::ActionMenu, status_badge::StatusBadge};
use leptos::prelude::*;
use propdesk_core::{Listing, ListingAction};

/// Table of listings with a per-row action menu
#[component]
pub fn ListingTable(
    /// Rows to show
    listings: Vec<Listing>,
    /// Called when an action is picked from a row's menu
    on_action: Callback<(Listing, ListingAction)>,
    /// Whether an action is in flight
    #[prop(into)]
    busy: Signal<bool>,
) -> impl IntoView {
    if listings.is_empty() {
        return view! { <p class="empty-state">"No listings match these filters."</p> }.into_any();
    }

    view! {
        <table class="listing-table">
            <thead>
                <tr>
                    <th>"Listing"</th>
                    <th>"Location"</th>
                    <th>"Type"</th>
                    <th>"Price"</th>
                    <th>"Owner"</th>
                    <th>"Status"</th>
                    <th>"Updated"</th>
                    <th class="sr-only">"Actions"</th>
                </tr>
            </thead>
            <tbody>
                {listings
                    .into_iter()
                    .map(|listing| view! { <ListingRow listing on_action busy /> })
                    .collect_view()}
            </tbody>
        </table>
    }
    .into_any()
}

#[component]
fn ListingRow(
    listing: Listing,
    on_action: Callback<(Listing, ListingAction)>,
    busy: Signal<bool>,
) -> impl IntoView {
    let cover = listing.cover_image().map(str::to_string);
    let kind = format!("{} / {}", listing.property_type, listing.listing_type);
    let price = listing.formatted_price();
    let updated = listing.updated_at.format("%Y-%m-%d %H:%M").to_string();

    view! {
        <tr class="listing-row">
            <td class="listing-title">
                {cover.map(|src| view! { <img class="thumb" src=src alt="" /> })}
                <span>{listing.title.clone()}</span>
            </td>
            <td>{listing.address.summary()}</td>
            <td>{kind}</td>
            <td class="numeric">{price}</td>
            <td>
                <div>{listing.owner.name.clone()}</div>
                <div class="muted">{listing.owner.email.clone()}</div>
            </td>
            <td>
                <StatusBadge status=listing.status />
                {listing
                    .rejection_reason
                    .clone()
                    .map(|reason| view! { <div class="rejection-reason">{reason}</div> })}
            </td>
            <td>{updated}</td>
            <td>
                <ActionMenu listing=listing.clone() on_select=on_action busy />
            </td>
        </tr>
    }
}
