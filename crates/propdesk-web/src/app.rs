//! Main Leptos application component with routing

use crate::{
    pages::{
        forgot_password::ForgotPasswordPage, listings::ListingsPage, login::LoginPage,
        not_found::NotFound, otp::OtpPage, reset_password::ResetPasswordPage,
    },
    state::{api_config, provide_auth},
    storage::LocalStorageSessionStore,
};
use leptos::prelude::*;
use leptos_router::{
    components::{Redirect, Route, Router, Routes},
    path,
};
use propdesk_client::{ApiClient, SessionManager};
use std::sync::Arc;

/// Main application component
#[component]
pub fn App() -> impl IntoView {
    let session = Arc::new(SessionManager::new(LocalStorageSessionStore::default()));
    let client = match ApiClient::new(&api_config(), session) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start the dashboard");
            return view! {
                <div class="fatal-error">
                    <h2>"The dashboard could not start"</h2>
                    <p>{e.to_string()}</p>
                </div>
            }
            .into_any();
        }
    };

    let auth = provide_auth(client);
    if let Some(user) = auth.user.get_untracked() {
        tracing::info!(user = %user.email, "Restored session");
    }

    view! {
        <Router>
            <Routes fallback=|| view! { <NotFound /> }>
                <Route path=path!("/") view=|| view! { <Redirect path="/listings" /> } />
                <Route path=path!("/login") view=LoginPage />
                <Route path=path!("/verify") view=OtpPage />
                <Route path=path!("/forgot-password") view=ForgotPasswordPage />
                <Route path=path!("/reset-password") view=ResetPasswordPage />
                <Route path=path!("/listings") view=ListingsPage />
            </Routes>
        </Router>
    }
    .into_any()
}
