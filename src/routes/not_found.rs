//! Fallback page for unknown routes.

use crate::{components::AppShell, routes::paths};
use leptos::prelude::*;
use leptos_router::components::A;

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <AppShell>
            <div class="flex flex-col items-center justify-center min-h-[50vh] text-center px-4">
                <h1 class="text-8xl font-black text-slate-100 dark:text-slate-800 select-none">"404"</h1>
                <p class="mt-2 text-2xl font-bold text-slate-900 dark:text-white">"Page not found"</p>
                <p class="mt-4 max-w-sm text-slate-500 dark:text-slate-400">
                    "The page you requested doesn't exist. Check the link in your email or sign in again."
                </p>
                <A
                    href=paths::LOGIN
                    {..}
                    class="mt-6 inline-flex items-center px-5 py-2.5 text-sm font-medium text-white bg-emerald-700 rounded-lg hover:bg-emerald-800 focus:ring-4 focus:outline-none focus:ring-emerald-300"
                >
                    "Back to sign in"
                </A>
            </div>
        </AppShell>
    }
}
