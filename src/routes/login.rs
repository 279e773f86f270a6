//! Sign-in route. It consumes the one-shot `verified_email` marker left by the
//! verification handshake to greet the user and pre-fill the address.

use crate::{
    app_lib::{AppError, storage::BrowserStore},
    components::{Alert, AlertKind, AppShell, Button, Spinner},
    features::{
        auth::{client, forms::login_request, types::LoginRequest},
        verification::reconciler::SessionReconciler,
    },
    routes::paths,
};
use leptos::{ev::SubmitEvent, prelude::*};
use leptos_router::components::A;
use tracing::info;

const INPUT_CLASS: &str = "bg-slate-50 border border-slate-300 text-slate-900 text-sm rounded-lg focus:ring-emerald-500 focus:border-emerald-500 block w-full p-2.5 dark:bg-slate-700 dark:border-slate-600 dark:placeholder-slate-400 dark:text-white";

#[component]
pub fn LoginPage() -> impl IntoView {
    let verified_email = SessionReconciler::new(&BrowserStore::local()).take_verified_email();
    let (email, set_email) = signal(verified_email.clone().unwrap_or_default());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal::<Option<AppError>>(None);
    let (signed_in, set_signed_in) = signal::<Option<String>>(None);

    let login_action = Action::new_local(move |request: &LoginRequest| {
        let request = request.clone();
        async move { client::login(&request).await }
    });

    Effect::new(move |_| {
        if let Some(result) = login_action.value().get() {
            let stored = result.and_then(|session| {
                SessionReconciler::new(&BrowserStore::local()).store_login(&session)?;
                Ok(session)
            });
            match stored {
                Ok(session) => {
                    info!(role = %session.user.role, "signed in");
                    set_signed_in.set(Some(session.user.email));
                }
                Err(err) => set_error.set(Some(err)),
            }
        }
    });

    let on_submit = move |event: SubmitEvent| {
        event.prevent_default();
        set_error.set(None);

        match login_request(&email.get_untracked(), &password.get_untracked()) {
            Ok(request) => {
                login_action.dispatch(request);
            }
            Err(err) => set_error.set(Some(err)),
        }
    };

    view! {
        <AppShell>
            <div class="max-w-sm mx-auto">
                {verified_email.map(|address| {
                    view! {
                        <div class="mb-5">
                            <Alert
                                kind=AlertKind::Success
                                message=format!("Your email {address} has been verified. Please sign in.")
                            />
                        </div>
                    }
                })}
                <form on:submit=on_submit>
                    <div class="mb-5">
                        <label
                            class="block mb-2 text-sm font-medium text-slate-900 dark:text-white"
                            for="email"
                        >
                            "Your email"
                        </label>
                        <input
                            id="email"
                            type="email"
                            class=INPUT_CLASS
                            autocomplete="email"
                            placeholder="name@example.com"
                            required
                            prop:value=move || email.get()
                            on:input=move |event| set_email.set(event_target_value(&event))
                        />
                    </div>
                    <div class="mb-5">
                        <label
                            class="block mb-2 text-sm font-medium text-slate-900 dark:text-white"
                            for="password"
                        >
                            "Your password"
                        </label>
                        <input
                            id="password"
                            type="password"
                            class=INPUT_CLASS
                            autocomplete="current-password"
                            required
                            on:input=move |event| set_password.set(event_target_value(&event))
                        />
                    </div>
                    <Button button_type="submit" disabled=login_action.pending()>
                        "Sign in"
                    </Button>
                    {move || {
                        login_action
                            .pending()
                            .get()
                            .then_some(view! { <div class="mt-4"><Spinner /></div> })
                    }}
                    {move || {
                        signed_in.get().map(|address| {
                            view! {
                                <div class="mt-4">
                                    <Alert kind=AlertKind::Success message=format!("Signed in as {address}.") />
                                </div>
                            }
                        })
                    }}
                    {move || {
                        error.get().map(|err| {
                            view! {
                                <div class="mt-4">
                                    <Alert kind=AlertKind::Error message=err.user_message() />
                                </div>
                            }
                        })
                    }}
                </form>
                <p class="mt-6 text-sm text-slate-500">
                    "New to JACS? "
                    <A href=paths::SIGNUP {..} class="font-medium text-emerald-700 hover:underline">
                        "Create an account"
                    </A>
                </p>
            </div>
        </AppShell>
    }
}
