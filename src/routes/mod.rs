mod login;
mod not_found;
mod pending;
mod signup;
mod verify_email;

pub(crate) use login::LoginPage;
pub(crate) use not_found::NotFoundPage;
pub(crate) use pending::PendingVerificationPage;
pub(crate) use signup::SignUpPage;
pub(crate) use verify_email::VerifyEmailPage;

use leptos::prelude::*;
use leptos_router::components::{Route, Routes};
use leptos_router::path;

/// Client-side paths linked from more than one screen.
pub(crate) mod paths {
    pub const LOGIN: &str = "/login";
    pub const SIGNUP: &str = "/signup";
    pub const VERIFY_EMAIL: &str = "/verify-email";
    pub const VERIFY_PENDING: &str = "/verify-email/pending";
}

#[component]
pub fn AppRoutes() -> impl IntoView {
    view! {
        <Routes fallback=|| view! { <NotFoundPage /> }>
            <Route path=path!("/") view=LoginPage />
            <Route path=path!("/login") view=LoginPage />
            <Route path=path!("/signup") view=SignUpPage />
            <Route path=path!("/verify-email") view=VerifyEmailPage />
            <Route path=path!("/verify-email/pending") view=PendingVerificationPage />
            <Route path=path!("/*any") view=NotFoundPage />
        </Routes>
    }
}
