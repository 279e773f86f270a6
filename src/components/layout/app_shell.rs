//! Shared layout wrapper with the header and content container. Navigation is
//! client-side only; the API enforces access control.

use crate::routes::paths;
use leptos::prelude::*;
use leptos_router::{components::A, hooks::use_location};

const NAV_LINK: &str = "block py-2 px-3 text-slate-900 rounded hover:bg-slate-100 md:hover:bg-transparent md:border-0 md:hover:text-emerald-700 md:p-0 dark:text-white md:dark:hover:text-emerald-400";

/// Wraps routes with a header and main content container.
#[component]
pub fn AppShell(children: Children) -> impl IntoView {
    let location = use_location();
    let on_login = move || location.pathname.get() == paths::LOGIN;

    view! {
        <div class="min-h-screen flex flex-col">
            <header class="border-b border-slate-200 dark:border-slate-700 dark:bg-slate-900">
                <div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4">
                    <A href=paths::LOGIN {..} class="flex items-center">
                        <span class="font-semibold whitespace-nowrap dark:text-white">"JACS"</span>
                    </A>
                    <Show
                        when=on_login
                        fallback=move || view! { <A href=paths::LOGIN {..} class=NAV_LINK>"Sign In"</A> }
                    >
                        <A href=paths::SIGNUP {..} class=NAV_LINK>"Create account"</A>
                    </Show>
                </div>
            </header>
            <main class="flex-1">
                <div class="container mx-auto p-4 mt-6">{children()}</div>
            </main>
        </div>
    }
}
