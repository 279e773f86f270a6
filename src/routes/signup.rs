//! Signup route. It validates the form locally, registers the account and
//! records the pending-verification markers before the verification email
//! goes out, so this browser can later recognise itself as the originating
//! one.

use crate::{
    app_lib::{AppError, storage::BrowserStore},
    components::{Alert, AlertKind, AppShell, Button, Spinner},
    features::{
        auth::{
            client,
            forms::{MIN_PASSWORD_LENGTH, SignupInput},
            types::{RegisterRequest, SignupRole},
        },
        verification::reconciler::SessionReconciler,
    },
    routes::paths,
};
use leptos::{ev::SubmitEvent, prelude::*};
use leptos_router::{components::A, hooks::use_navigate};

const INPUT_CLASS: &str = "w-full rounded-xl border border-slate-200 bg-slate-50 px-3 py-2.5 text-sm text-slate-900 focus:border-emerald-400 focus:ring-2 focus:ring-emerald-200";
const LABEL_CLASS: &str = "block mb-2 text-sm font-medium text-slate-700";

#[component]
pub fn SignUpPage() -> impl IntoView {
    let navigate = use_navigate();
    let form = RwSignal::new(SignupInput {
        role: SignupRole::Tenant.as_str().to_string(),
        ..SignupInput::default()
    });
    let (error, set_error) = signal::<Option<AppError>>(None);

    let signup_action = Action::new_local(move |request: &RegisterRequest| {
        let request = request.clone();
        async move {
            client::register(&request).await?;
            Ok::<String, AppError>(request.email)
        }
    });

    Effect::new(move |_| {
        if let Some(result) = signup_action.value().get() {
            match result {
                Ok(email) => {
                    let store = BrowserStore::local();
                    match SessionReconciler::new(&store).mark_pending(&email) {
                        Ok(()) => navigate(paths::VERIFY_PENDING, Default::default()),
                        Err(err) => set_error.set(Some(err)),
                    }
                }
                Err(err) => set_error.set(Some(err)),
            }
        }
    });

    let on_submit = move |event: SubmitEvent| {
        event.prevent_default();
        set_error.set(None);

        match form.with_untracked(SignupInput::validate) {
            Ok(request) => {
                signup_action.dispatch(request);
            }
            Err(err) => set_error.set(Some(err)),
        }
    };

    let text_field = move |id: &'static str,
                           label: &'static str,
                           kind: &'static str,
                           autocomplete: &'static str,
                           write: fn(&mut SignupInput, String)| {
        view! {
            <div>
                <label class=LABEL_CLASS for=id>{label}</label>
                <input
                    id=id
                    type=kind
                    class=INPUT_CLASS
                    autocomplete=autocomplete
                    on:input=move |event| {
                        let value = event_target_value(&event);
                        form.update(|input| write(input, value));
                    }
                />
            </div>
        }
    };

    view! {
        <AppShell>
            <div class="min-h-[70vh] flex items-center justify-center px-6 py-10">
                <form
                    class="w-full max-w-md rounded-2xl border border-slate-200 bg-white/90 p-6 shadow-sm sm:p-8"
                    on:submit=on_submit
                >
                    <div class="space-y-2">
                        <h1 class="text-2xl font-semibold text-slate-900">"Create your JACS account"</h1>
                        <p class="text-sm text-slate-500">
                            "We'll send a verification link to your email before you can sign in."
                        </p>
                    </div>

                    <div class="mt-6 space-y-4">
                        <div class="grid gap-4 sm:grid-cols-2">
                            {text_field("first_name", "First name", "text", "given-name", |input, value| input.first_name = value)}
                            {text_field("last_name", "Last name", "text", "family-name", |input, value| input.last_name = value)}
                        </div>
                        {text_field("email", "Email", "email", "email", |input, value| input.email = value)}
                        {text_field("phone", "Phone (optional)", "tel", "tel", |input, value| input.phone = value)}
                        <div>
                            <label class=LABEL_CLASS for="role">"I am a"</label>
                            <select
                                id="role"
                                class=INPUT_CLASS
                                on:change=move |event| {
                                    let value = event_target_value(&event);
                                    form.update(|input| input.role = value);
                                }
                            >
                                <option value=SignupRole::Tenant.as_str() selected>"Tenant"</option>
                                <option value=SignupRole::PropertyManager.as_str()>"Property manager"</option>
                            </select>
                        </div>
                        {text_field("password", "Password", "password", "new-password", |input, value| input.password = value)}
                        {text_field("confirm_password", "Confirm password", "password", "new-password", |input, value| input.confirm_password = value)}
                        <p class="text-xs text-slate-500">
                            {format!("Use at least {MIN_PASSWORD_LENGTH} characters.")}
                        </p>

                        <Button button_type="submit" disabled=signup_action.pending()>
                            "Create account"
                        </Button>
                    </div>

                    {move || {
                        signup_action
                            .pending()
                            .get()
                            .then_some(view! { <div class="mt-4"><Spinner /></div> })
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

                    <p class="mt-6 text-sm text-slate-500">
                        "Already have an account? "
                        <A href=paths::LOGIN {..} class="font-medium text-emerald-700 hover:underline">
                            "Sign in"
                        </A>
                    </p>
                </form>
            </div>
        </AppShell>
    }
}
