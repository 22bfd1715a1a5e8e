//! Page chrome and route guards

use crate::state::use_auth;
use leptos::{prelude::*, task::spawn_local};
use leptos_router::components::{Redirect, A};

/// Header with the signed-in administrator and a sign-out button
#[component]
pub fn Header() -> impl IntoView {
    let auth = use_auth();
    let user = auth.user;

    // Clearing the user lets the route guard take over the redirect
    let sign_out = move |_: leptos::ev::MouseEvent| {
        let auth = auth.clone();
        spawn_local(async move {
            auth.client().logout().await;
            auth.user.set(None);
        });
    };

    view! {
        <header class="header">
            <div class="header-content">
                <h1 class="logo">
                    <A href="/listings">"PropDesk Admin"</A>
                </h1>
                <nav class="nav">
                    <A href="/listings" attr:class="nav-link">"Listings"</A>
                </nav>
                {move || {
                    let sign_out = sign_out.clone();
                    user.get()
                        .map(|user| {
                            view! {
                                <div class="header-user">
                                    <span class="user-name">{user.display_name().to_string()}</span>
                                    <span class="user-role">{user.role.to_string()}</span>
                                    <button class="btn btn-sm" on:click=sign_out>
                                        "Sign out"
                                    </button>
                                </div>
                            }
                        })
                }}
            </div>
        </header>
    }
}

/// Header plus page body
#[component]
pub fn AppLayout(children: Children) -> impl IntoView {
    view! {
        <Header />
        <main class="content">{children()}</main>
    }
}

/// Render `children` only while signed in, otherwise go to the login page
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    let user = use_auth().user;

    view! {
        <Show
            when=move || user.with(Option::is_some)
            fallback=|| view! { <Redirect path="/login" /> }
        >
            {children()}
        </Show>
    }
}
