//! Loading component for displaying loading states

use leptos::prelude::*;

/// Loading spinner component
#[component]
pub fn Loading(
    /// Text under the spinner
    #[prop(optional, into)]
    label: Option<String>,
) -> impl IntoView {
    let label = label.unwrap_or_else(|| "Loading...".to_string());

    view! {
        <div class="loading" aria-busy="true">
            <div class="spinner"></div>
            <p>{label}</p>
        </div>
    }
}
