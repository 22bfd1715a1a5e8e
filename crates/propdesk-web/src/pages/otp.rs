//! One-time code verification

use crate::state::{friendly_message, use_auth};
use leptos::{ev::SubmitEvent, prelude::*, task::spawn_local};
use leptos_router::{hooks::use_navigate, NavigateOptions};
use propdesk_core::{validate_form, OtpForm};

/// Second sign-in step; only reachable with a pending challenge
#[component]
pub fn OtpPage() -> impl IntoView {
    let auth = use_auth();
    let navigate = use_navigate();
    let user = auth.user;
    let pending_otp = auth.pending_otp;

    let (code, set_code) = signal(String::new());
    let (error, set_error) = signal(None::<String>);
    let (notice, set_notice) = signal(None::<String>);
    let (busy, set_busy) = signal(false);

    Effect::new(move |_| {
        if user.with(Option::is_some) {
            navigate("/listings", NavigateOptions::default());
        } else if pending_otp.with(Option::is_none) {
            navigate("/login", NavigateOptions::default());
        }
    });

    let submit = {
        let auth = auth.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            let Some(challenge) = pending_otp.get_untracked() else {
                return;
            };
            let form = OtpForm::new(code.get_untracked());
            if let Err(e) = validate_form(&form) {
                set_error.set(Some(friendly_message(&e)));
                return;
            }

            set_busy.set(true);
            set_error.set(None);
            let auth = auth.clone();
            spawn_local(async move {
                match auth.client().verify_otp(&challenge, &form).await {
                    Ok(signed_in) => {
                        user.set(Some(signed_in));
                        pending_otp.set(None);
                    }
                    Err(e) => {
                        set_code.set(String::new());
                        set_error.set(auth.error_message(&e));
                    }
                }
                set_busy.set(false);
            });
        }
    };

    let resend = move |_: leptos::ev::MouseEvent| {
        let Some(challenge) = pending_otp.get_untracked() else {
            return;
        };

        set_busy.set(true);
        set_error.set(None);
        let auth = auth.clone();
        spawn_local(async move {
            match auth.client().resend_otp(&challenge).await {
                Ok(fresh) => {
                    set_notice.set(Some(format!("A new code was sent to {}", fresh.email)));
                    pending_otp.set(Some(fresh));
                }
                Err(e) => set_error.set(auth.error_message(&e)),
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="auth-page">
            <form class="auth-card" on:submit=submit>
                <h2>"Enter your code"</h2>
                {move || {
                    pending_otp
                        .get()
                        .map(|challenge| {
                            view! {
                                <p>
                                    "We sent a 6-digit code to " <strong>{challenge.email}</strong>
                                    ". It is valid until "
                                    {challenge.expires_at.format("%H:%M UTC").to_string()} "."
                                </p>
                            }
                        })
                }}
                <label for="otp-code">"Verification code"</label>
                <input
                    id="otp-code"
                    type="text"
                    inputmode="numeric"
                    autocomplete="one-time-code"
                    maxlength="7"
                    prop:value=move || code.get()
                    on:input=move |ev| set_code.set(event_target_value(&ev))
                />
                {move || notice.get().map(|n| view! { <p class="form-notice">{n}</p> })}
                {move || error.get().map(|e| view! { <p class="form-error">{e}</p> })}
                <button type="submit" class="btn btn-primary" disabled=move || busy.get()>
                    "Verify"
                </button>
                <button
                    type="button"
                    class="btn btn-link"
                    disabled=move || busy.get()
                    on:click=resend
                >
                    "Send a new code"
                </button>
            </form>
        </div>
    }
}
