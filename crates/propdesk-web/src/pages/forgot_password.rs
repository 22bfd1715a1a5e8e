//! Password reset request

use crate::state::{friendly_message, use_auth};
use leptos::{ev::SubmitEvent, prelude::*, task::spawn_local};
use leptos_router::components::A;
use propdesk_core::{validate_form, ForgotPasswordForm};

/// Ask for a reset link by email
#[component]
pub fn ForgotPasswordPage() -> impl IntoView {
    let auth = use_auth();
    let (email, set_email) = signal(String::new());
    let (error, set_error) = signal(None::<String>);
    let (sent_to, set_sent_to) = signal(None::<String>);
    let (busy, set_busy) = signal(false);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let form = ForgotPasswordForm::new(email.get_untracked());
        if let Err(e) = validate_form(&form) {
            set_error.set(Some(friendly_message(&e)));
            return;
        }

        set_busy.set(true);
        set_error.set(None);
        let auth = auth.clone();
        spawn_local(async move {
            match auth.client().request_password_reset(&form).await {
                Ok(()) => set_sent_to.set(Some(form.email)),
                Err(e) => set_error.set(auth.error_message(&e)),
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="auth-page">
            <Show
                when=move || sent_to.with(Option::is_none)
                fallback=move || {
                    view! {
                        <div class="auth-card">
                            <h2>"Check your inbox"</h2>
                            <p>
                                "If an account exists for " <strong>{sent_to.get()}</strong>
                                ", a reset link is on its way."
                            </p>
                            <A href="/login" attr:class="auth-link">"Back to sign in"</A>
                        </div>
                    }
                }
            >
                <form class="auth-card" on:submit=submit.clone()>
                    <h2>"Reset your password"</h2>
                    <label for="forgot-email">"Email"</label>
                    <input
                        id="forgot-email"
                        type="email"
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                    />
                    {move || error.get().map(|e| view! { <p class="form-error">{e}</p> })}
                    <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                        "Send reset link"
                    </button>
                    <A href="/login" attr:class="auth-link">"Back to sign in"</A>
                </form>
            </Show>
        </div>
    }
}
