//! New password from a reset link

use crate::state::{friendly_message, use_auth};
use leptos::{ev::SubmitEvent, prelude::*, task::spawn_local};
use leptos_router::{components::A, hooks::use_query_map};
use propdesk_core::{validate_form, ResetPasswordForm};

/// Set a new password using the `token` query parameter
#[component]
pub fn ResetPasswordPage() -> impl IntoView {
    let auth = use_auth();
    let query = use_query_map();
    let token = move || query.with(|q| q.get("token")).filter(|t| !t.trim().is_empty());

    let (password, set_password) = signal(String::new());
    let (confirmation, set_confirmation) = signal(String::new());
    let (error, set_error) = signal(None::<String>);
    let (done, set_done) = signal(false);
    let (busy, set_busy) = signal(false);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let form = ResetPasswordForm::new(
            token().unwrap_or_default(),
            password.get_untracked(),
            confirmation.get_untracked(),
        );
        if let Err(e) = validate_form(&form) {
            set_error.set(Some(friendly_message(&e)));
            return;
        }

        set_busy.set(true);
        set_error.set(None);
        let auth = auth.clone();
        spawn_local(async move {
            match auth.client().reset_password(&form).await {
                Ok(()) => set_done.set(true),
                Err(e) => set_error.set(auth.error_message(&e)),
            }
            set_busy.set(false);
        });
    };

    let form_view = move || {
        if done.get() {
            return view! {
                <div class="auth-card">
                    <h2>"Password updated"</h2>
                    <p>"You can now sign in with your new password."</p>
                    <A href="/login" attr:class="btn btn-primary">"Sign in"</A>
                </div>
            }
            .into_any();
        }

        if token().is_none() {
            return view! {
                <div class="auth-card">
                    <h2>"Invalid reset link"</h2>
                    <p>"This link is missing its reset token."</p>
                    <A href="/forgot-password" attr:class="auth-link">"Request a new link"</A>
                </div>
            }
            .into_any();
        }

        view! {
            <form class="auth-card" on:submit=submit.clone()>
                <h2>"Choose a new password"</h2>
                <label for="reset-password">"New password"</label>
                <input
                    id="reset-password"
                    type="password"
                    autocomplete="new-password"
                    prop:value=move || password.get()
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />
                <label for="reset-confirmation">"Confirm password"</label>
                <input
                    id="reset-confirmation"
                    type="password"
                    autocomplete="new-password"
                    prop:value=move || confirmation.get()
                    on:input=move |ev| set_confirmation.set(event_target_value(&ev))
                />
                {move || error.get().map(|e| view! { <p class="form-error">{e}</p> })}
                <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                    "Update password"
                </button>
            </form>
        }
        .into_any()
    };

    view! { <div class="auth-page">{form_view}</div> }
}
