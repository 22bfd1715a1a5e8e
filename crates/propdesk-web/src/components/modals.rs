//! Confirmation, rejection and edit dialogs

use crate::state::{friendly_message, EditDraft};
use leptos::{ev::SubmitEvent, prelude::*};
use propdesk_core::{validate_form, EditListingForm, Listing, ListingAction, RejectForm};

#[component]
fn Modal(title: String, children: Children) -> impl IntoView {
    view! {
        <div class="modal-backdrop">
            <div class="modal" role="dialog" aria-modal="true">
                <h3 class="modal-title">{title}</h3>
                {children()}
            </div>
        </div>
    }
}

/// Yes/no dialog before an action that needs confirming
#[component]
pub fn ConfirmModal(
    /// Listing the action applies to
    listing: Listing,
    /// Action awaiting confirmation
    action: ListingAction,
    /// Whether the action is running
    #[prop(into)]
    busy: Signal<bool>,
    /// Run the action
    on_confirm: Callback<()>,
    /// Close without acting
    on_cancel: Callback<()>,
) -> impl IntoView {
    let title = format!("{} listing?", action.label());
    let message = if action.is_destructive() {
        format!(
            "\"{}\" will be removed permanently. This cannot be undone.",
            listing.title
        )
    } else {
        format!("\"{}\" will be {}.", listing.title, action.past_tense())
    };
    let confirm_class = if action.is_destructive() {
        "btn btn-danger"
    } else {
        "btn btn-primary"
    };

    view! {
        <Modal title>
            <p>{message}</p>
            <div class="modal-actions">
                <button class="btn" disabled=move || busy.get() on:click=move |_| on_cancel.run(())>
                    "Cancel"
                </button>
                <button
                    class=confirm_class
                    disabled=move || busy.get()
                    on:click=move |_| on_confirm.run(())
                >
                    {action.label()}
                </button>
            </div>
        </Modal>
    }
}

/// Rejection dialog collecting the reason shown to the owner
#[component]
pub fn RejectModal(
    /// Listing to reject
    listing: Listing,
    /// Whether the rejection is being sent
    #[prop(into)]
    busy: Signal<bool>,
    /// Called with the validated reason
    on_submit: Callback<String>,
    /// Close without rejecting
    on_cancel: Callback<()>,
) -> impl IntoView {
    let (reason, set_reason) = signal(String::new());
    let (error, set_error) = signal(None::<String>);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let form = RejectForm::new(reason.get_untracked());
        match validate_form(&form) {
            Ok(()) => {
                set_error.set(None);
                on_submit.run(form.reason);
            }
            Err(e) => set_error.set(Some(friendly_message(&e))),
        }
    };

    view! {
        <Modal title=format!("Reject \"{}\"", listing.title)>
            <form on:submit=submit>
                <label for="reject-reason">"Reason shown to the owner"</label>
                <textarea
                    id="reject-reason"
                    rows="4"
                    prop:value=move || reason.get()
                    on:input=move |ev| set_reason.set(event_target_value(&ev))
                ></textarea>
                {move || error.get().map(|e| view! { <p class="field-error">{e}</p> })}
                <div class="modal-actions">
                    <button type="button" class="btn" on:click=move |_| on_cancel.run(())>
                        "Cancel"
                    </button>
                    <button type="submit" class="btn btn-danger" disabled=move || busy.get()>
                        "Reject"
                    </button>
                </div>
            </form>
        </Modal>
    }
}

/// Listing details editor
#[component]
pub fn EditModal(
    /// Listing being edited
    listing: Listing,
    /// Whether the changes are being saved
    #[prop(into)]
    busy: Signal<bool>,
    /// Called with the validated form
    on_submit: Callback<EditListingForm>,
    /// Close without saving
    on_cancel: Callback<()>,
) -> impl IntoView {
    let draft = RwSignal::new(EditDraft::from_listing(&listing));
    let (error, set_error) = signal(None::<String>);
    let title = format!("Edit \"{}\"", listing.title);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let form = draft
            .with_untracked(EditDraft::to_form)
            .and_then(|form| validate_form(&form).map(|()| form));

        match form {
            Ok(form) if form.changes_from(&listing).is_empty() => {
                set_error.set(Some("Nothing to save".to_string()));
            }
            Ok(form) => {
                set_error.set(None);
                on_submit.run(form);
            }
            Err(e) => set_error.set(Some(friendly_message(&e))),
        }
    };

    view! {
        <Modal title>
            <form class="edit-form" on:submit=submit>
                <label for="edit-title">"Title"</label>
                <input
                    id="edit-title"
                    type="text"
                    prop:value=move || draft.with(|d| d.title.clone())
                    on:input=move |ev| draft.update(|d| d.title = event_target_value(&ev))
                />

                <label for="edit-description">"Description"</label>
                <textarea
                    id="edit-description"
                    rows="6"
                    prop:value=move || draft.with(|d| d.description.clone())
                    on:input=move |ev| draft.update(|d| d.description = event_target_value(&ev))
                ></textarea>

                <label for="edit-price">"Price"</label>
                <input
                    id="edit-price"
                    type="text"
                    inputmode="numeric"
                    prop:value=move || draft.with(|d| d.price.clone())
                    on:input=move |ev| draft.update(|d| d.price = event_target_value(&ev))
                />

                <div class="form-row">
                    <div>
                        <label for="edit-bedrooms">"Bedrooms"</label>
                        <input
                            id="edit-bedrooms"
                            type="number"
                            min="0"
                            prop:value=move || draft.with(|d| d.bedrooms.clone())
                            on:input=move |ev| {
                                draft.update(|d| d.bedrooms = event_target_value(&ev));
                            }
                        />
                    </div>
                    <div>
                        <label for="edit-bathrooms">"Bathrooms"</label>
                        <input
                            id="edit-bathrooms"
                            type="number"
                            min="0"
                            prop:value=move || draft.with(|d| d.bathrooms.clone())
                            on:input=move |ev| {
                                draft.update(|d| d.bathrooms = event_target_value(&ev));
                            }
                        />
                    </div>
                    <div>
                        <label for="edit-area">"Area (m\u{b2})"</label>
                        <input
                            id="edit-area"
                            type="number"
                            min="1"
                            step="any"
                            prop:value=move || draft.with(|d| d.area_sqm.clone())
                            on:input=move |ev| {
                                draft.update(|d| d.area_sqm = event_target_value(&ev));
                            }
                        />
                    </div>
                </div>

                {move || error.get().map(|e| view! { <p class="field-error">{e}</p> })}
                <div class="modal-actions">
                    <button type="button" class="btn" on:click=move |_| on_cancel.run(())>
                        "Cancel"
                    </button>
                    <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                        "Save changes"
                    </button>
                </div>
            </form>
        </Modal>
    }
}
