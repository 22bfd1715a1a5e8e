//! Colored pill showing a listing status

use leptos::prelude::*;
use propdesk_core::ListingStatus;

/// Coloured status label
#[component]
pub fn StatusBadge(status: ListingStatus) -> impl IntoView {
    view! { <span class=format!("badge badge-{}", status.as_str())>{status.label()}</span> }
}
