//! Success and error banner above the listings table

use crate::state::Flash;
use leptos::prelude::*;

/// Dismissible success or error banner
#[component]
pub fn FlashBanner(flash: RwSignal<Option<Flash>>) -> impl IntoView {
    move || {
        flash.get().map(|current| {
            view! {
                <div class=current.class() role="status">
                    <span>{current.message.clone()}</span>
                    <button
                        class="flash-dismiss"
                        aria-label="Dismiss"
                        on:click=move |_| flash.set(None)
                    >
                        "\u{d7}"
                    </button>
                </div>
            }
        })
    }
}
