//! Pagination component for navigating through listing pages

use leptos::prelude::*;
use propdesk_core::PageMeta;

/// Pagination component
#[component]
pub fn Pagination(
    /// Paging metadata of the page on screen
    meta: PageMeta,
    /// Callback when page changes
    on_page_change: Callback<u32>,
) -> impl IntoView {
    let current_page = meta.page.max(1);
    let total_pages = meta.total_pages();
    let has_prev = meta.has_prev();
    let has_next = meta.has_next();

    view! {
        <div class="pagination">
            <button
                class="pagination-btn"
                disabled=!has_prev
                on:click=move |_| {
                    if has_prev {
                        on_page_change.run(current_page - 1);
                    }
                }
            >
                "Previous"
            </button>

            <span class="pagination-info">
                "Page " {current_page} " of " {total_pages} " (" {meta.total} " listings)"
            </span>

            <button
                class="pagination-btn"
                disabled=!has_next
                on:click=move |_| {
                    if has_next {
                        on_page_change.run(current_page + 1);
                    }
                }
            >
                "Next"
            </button>
        </div>
    }
}
