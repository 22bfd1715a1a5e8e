//! Email and password sign-in

use crate::state::{friendly_message, use_auth};
use leptos::{ev::SubmitEvent, prelude::*, task::spawn_local};
use leptos_router::{components::A, hooks::use_navigate, NavigateOptions};
use propdesk_core::{validate_form, LoginForm, LoginOutcome};

/// Login page
#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = use_auth();
    let navigate = use_navigate();
    let to_verify = use_navigate();
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(None::<String>);
    let (busy, set_busy) = signal(false);

    let user = auth.user;
    let pending_otp = auth.pending_otp;
    Effect::new(move |_| {
        if user.with(Option::is_some) {
            navigate("/listings", NavigateOptions::default());
        }
    });

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let form = LoginForm::new(email.get_untracked(), password.get_untracked());
        if let Err(e) = validate_form(&form) {
            set_error.set(Some(friendly_message(&e)));
            return;
        }

        set_busy.set(true);
        set_error.set(None);
        let auth = auth.clone();
        let navigate = to_verify.clone();
        spawn_local(async move {
            match auth.client().login(&form).await {
                Ok(LoginOutcome::Authenticated(signed_in)) => user.set(Some(signed_in)),
                Ok(LoginOutcome::OtpRequired(challenge)) => {
                    pending_otp.set(Some(challenge));
                    navigate("/verify", NavigateOptions::default());
                }
                Err(e) => {
                    set_password.set(String::new());
                    set_error.set(auth.error_message(&e));
                }
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="auth-page">
            <form class="auth-card" on:submit=submit>
                <h2>"Sign in"</h2>
                <label for="login-email">"Email"</label>
                <input
                    id="login-email"
                    type="email"
                    autocomplete="username"
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                />
                <label for="login-password">"Password"</label>
                <input
                    id="login-password"
                    type="password"
                    autocomplete="current-password"
                    prop:value=move || password.get()
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                />
                {move || error.get().map(|e| view! { <p class="form-error">{e}</p> })}
                <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                    {move || if busy.get() { "Signing in..." } else { "Sign in" }}
                </button>
                <A href="/forgot-password" attr:class="auth-link">"Forgot your password?"</A>
            </form>
        </div>
    }
}
