//! Per-row action popover

use leptos::prelude::*;
use propdesk_core::{Listing, ListingAction};

fn item_class(action: ListingAction) -> &'static str {
    if action.is_destructive() {
        "action-menu-item action-menu-item-danger"
    } else {
        "action-menu-item"
    }
}

/// Button that opens a popover with the actions the listing's status allows
#[component]
pub fn ActionMenu(
    /// Listing the actions apply to
    listing: Listing,
    /// Called with the chosen action
    on_select: Callback<(Listing, ListingAction)>,
    /// Disable the menu while another action runs
    #[prop(into)]
    busy: Signal<bool>,
) -> impl IntoView {
    let (open, set_open) = signal(false);
    let actions = listing.status.allowed_actions();

    view! {
        <div class="action-menu">
            <button
                class="btn btn-sm"
                aria-haspopup="menu"
                aria-expanded=move || open.get().to_string()
                disabled=move || busy.get()
                on:click=move |_| set_open.update(|open| *open = !*open)
            >
                "Actions"
            </button>
            <Show when=move || open.get() && !busy.get()>
                <ul class="action-menu-popover" role="menu">
                    {actions
                        .iter()
                        .map(|&action| {
                            let listing = listing.clone();
                            view! {
                                <li>
                                    <button
                                        class=item_class(action)
                                        role="menuitem"
                                        on:click=move |_| {
                                            set_open.set(false);
                                            on_select.run((listing.clone(), action));
                                        }
                                    >
                                        {action.label()}
                                    </button>
                                </li>
                            }
                        })
                        .collect_view()}
                </ul>
            </Show>
        </div>
    }
}
