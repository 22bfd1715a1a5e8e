//! Listing moderation page

use crate::{
    components::{
        flash_banner::FlashBanner,
        layout::{AppLayout, RequireAuth},
        listing_table::ListingTable,
        loading::Loading,
        modals::{ConfirmModal, EditModal, RejectModal},
        pagination::Pagination,
    },
    state::{use_auth, AuthContext, Flash, ModalState},
};
use leptos::{ev::SubmitEvent, prelude::*, task::spawn_local};
use propdesk_core::{
    EditListingForm, Listing, ListingAction, ListingQuery, ListingStatus, Page, Result,
};

/// Protected listings page
#[component]
pub fn ListingsPage() -> impl IntoView {
    view! {
        <RequireAuth>
            <AppLayout>
                <ListingsView />
            </AppLayout>
        </RequireAuth>
    }
}

/// Reactive state of the listings page
#[derive(Clone)]
struct ListingsState {
    auth: AuthContext,
    query: RwSignal<ListingQuery>,
    page: RwSignal<Option<Page<Listing>>>,
    loading: RwSignal<bool>,
    busy: RwSignal<bool>,
    flash: RwSignal<Option<Flash>>,
    modal: RwSignal<ModalState>,
    reload: RwSignal<u32>,
}

impl ListingsState {
    fn new(auth: AuthContext) -> Self {
        Self {
            auth,
            query: RwSignal::new(ListingQuery::new()),
            page: RwSignal::new(None),
            loading: RwSignal::new(false),
            busy: RwSignal::new(false),
            flash: RwSignal::new(None),
            modal: RwSignal::new(ModalState::Closed),
            reload: RwSignal::new(0),
        }
    }

    fn report(&self, err: &propdesk_core::Error) {
        if let Some(message) = self.auth.error_message(err) {
            self.flash.set(Some(Flash::error(message)));
        }
    }

    fn load(&self, query: ListingQuery) {
        let state = self.clone();
        self.loading.set(true);
        spawn_local(async move {
            match state.auth.client().list_listings(&query).await {
                // A delete can empty the last page; step back instead of showing nothing
                Ok(page) if page.data.is_empty() && query.page > 1 => {
                    let previous = page.meta.total_pages().min(query.page - 1);
                    state.query.set(query.with_page(previous));
                }
                Ok(page) => state.page.set(Some(page)),
                Err(e) => state.report(&e),
            }
            state.loading.set(false);
        });
    }

    /// React to an action picked from a row's menu
    fn select(&self, listing: &Listing, action: ListingAction) {
        match ModalState::for_action(listing, action) {
            ModalState::Closed => self.perform(listing.clone(), action, None),
            modal => self.modal.set(modal),
        }
    }

    /// Run a status transition or a delete
    fn perform(&self, listing: Listing, action: ListingAction, reason: Option<String>) {
        let state = self.clone();
        self.busy.set(true);
        spawn_local(async move {
            let client = state.auth.client();
            let result: Result<Option<Listing>> = if action == ListingAction::Delete {
                client.delete_listing(&listing).await.map(|()| None)
            } else {
                client
                    .apply_action(&listing, action, reason.as_deref())
                    .await
                    .map(Some)
            };

            match result {
                Ok(Some(updated)) => {
                    state.page.update(|page| {
                        if let Some(page) = page {
                            page.replace(updated);
                        }
                    });
                    state.flash.set(Some(Flash::for_action(&listing, action)));
                }
                Ok(None) => {
                    state.flash.set(Some(Flash::for_action(&listing, action)));
                    state.reload.update(|n| *n += 1);
                }
                Err(e) => state.report(&e),
            }
            state.modal.set(ModalState::Closed);
            state.busy.set(false);
        });
    }

    fn save(&self, listing: Listing, form: EditListingForm) {
        let state = self.clone();
        self.busy.set(true);
        spawn_local(async move {
            match state.auth.client().update_listing(&listing, &form).await {
                Ok(updated) => {
                    state.page.update(|page| {
                        if let Some(page) = page {
                            page.replace(updated);
                        }
                    });
                    state
                        .flash
                        .set(Some(Flash::for_action(&listing, ListingAction::Edit)));
                    state.modal.set(ModalState::Closed);
                }
                Err(e) => state.report(&e),
            }
            state.busy.set(false);
        });
    }
}

#[component]
fn ListingsView() -> impl IntoView {
    let state = ListingsState::new(use_auth());
    let ListingsState {
        query,
        page,
        loading,
        busy,
        flash,
        modal,
        reload,
        ..
    } = state.clone();

    Effect::new({
        let state = state.clone();
        move |_| {
            reload.track();
            state.load(query.get());
        }
    });

    let on_action = Callback::new({
        let state = state.clone();
        move |(listing, action): (Listing, ListingAction)| state.select(&listing, action)
    });
    let close_modal = Callback::new(move |()| modal.set(ModalState::Closed));
    let change_page = Callback::new(move |n: u32| query.update(|q| *q = q.clone().with_page(n)));

    let (search, set_search) = signal(String::new());
    let submit_search = move |ev: SubmitEvent| {
        ev.prevent_default();
        query.update(|q| *q = q.clone().with_search(search.get_untracked()));
    };

    let tabs = std::iter::once(None)
        .chain(ListingStatus::ALL.into_iter().map(Some))
        .map(|status| {
            let label = status.map_or("All", ListingStatus::label);
            view! {
                <button
                    class=move || {
                        if query.with(|q| q.status == status) { "tab tab-active" } else { "tab" }
                    }
                    on:click=move |_| query.update(|q| *q = q.clone().with_status(status))
                >
                    {label}
                </button>
            }
        })
        .collect_view();

    let modal_view = move || {
        let state = state.clone();
        match modal.get() {
            ModalState::Closed => None,
            ModalState::Confirm { listing, action } => {
                let target = listing.clone();
                let on_confirm =
                    Callback::new(move |()| state.perform(target.clone(), action, None));
                Some(
                    view! { <ConfirmModal listing action busy on_confirm on_cancel=close_modal /> }
                        .into_any(),
                )
            }
            ModalState::Reject { listing } => {
                let target = listing.clone();
                let on_submit = Callback::new(move |reason: String| {
                    state.perform(target.clone(), ListingAction::Reject, Some(reason));
                });
                Some(
                    view! { <RejectModal listing busy on_submit on_cancel=close_modal /> }
                        .into_any(),
                )
            }
            ModalState::Edit { listing } => {
                let target = listing.clone();
                let on_submit = Callback::new(move |form: EditListingForm| {
                    state.save(target.clone(), form);
                });
                Some(
                    view! { <EditModal listing busy on_submit on_cancel=close_modal /> }
                        .into_any(),
                )
            }
        }
    };

    view! {
        <section class="listings-page">
            <div class="listings-header">
                <h2>"Listings"</h2>
                <form class="search-form" on:submit=submit_search>
                    <input
                        type="search"
                        class="search-input"
                        placeholder="Search title, owner or city..."
                        prop:value=move || search.get()
                        on:input=move |ev| set_search.set(event_target_value(&ev))
                    />
                    <button type="submit" class="btn">"Search"</button>
                </form>
            </div>

            <nav class="status-tabs">{tabs}</nav>

            <FlashBanner flash />

            {move || {
                if loading.get() && page.with(Option::is_none) {
                    return view! { <Loading label="Loading listings..." /> }.into_any();
                }
                page.get()
                    .map(|current| {
                        view! {
                            <div class="listings-body" class:stale=move || loading.get()>
                                <ListingTable listings=current.data on_action busy />
                                <Pagination meta=current.meta on_page_change=change_page />
                            </div>
                        }
                    })
                    .into_any()
            }}

            {modal_view}
        </section>
    }
}
