//! Resend-verification form shared by the link page and the waiting screen.

use crate::{
    components::{Alert, AlertKind, Button, ButtonVariant, Spinner},
    features::{
        auth::{client, types::ResendVerificationRequest},
        verification::resend::{ResendGate, ResendStatus, resend_target},
    },
};
use leptos::{ev::SubmitEvent, prelude::*, task::spawn_local};

/// Posts a resend request for the typed (or pre-filled) address.
///
/// The button stays disabled while the request is out and is re-enabled once
/// it settles. `on_sent` runs after the backend accepts the resend.
#[component]
pub fn ResendForm<F>(#[prop(into)] email: Option<String>, on_sent: F) -> impl IntoView
where
    F: Fn(String) + Clone + 'static,
{
    let (address, set_address) = signal(email.unwrap_or_default());
    let gate = RwSignal::new(ResendGate::default());
    let in_flight = Signal::derive(move || gate.with(ResendGate::in_flight));

    let on_submit = move |event: SubmitEvent| {
        event.prevent_default();

        let target = match resend_target(&address.get_untracked()) {
            Ok(target) => target,
            Err(err) => {
                gate.update(|gate| gate.reject(&err));
                return;
            }
        };
        if !gate.try_update(ResendGate::begin).unwrap_or(false) {
            return;
        }

        let on_sent = on_sent.clone();
        spawn_local(async move {
            let request = ResendVerificationRequest {
                email: target.clone(),
            };
            let result = client::resend_verification(&request).await;
            let settled = gate
                .try_update(|gate| gate.settle(&result))
                .unwrap_or(false);
            if settled && result.is_ok() {
                on_sent(target);
            }
        });
    };

    view! {
        <form
            class="mt-8 rounded-lg border border-slate-200 bg-white p-5 dark:border-slate-700 dark:bg-slate-800"
            on:submit=on_submit
        >
            <h2 class="text-sm font-semibold text-slate-900 dark:text-white">"Need a new link?"</h2>
            <p class="mt-1 text-sm text-slate-600 dark:text-slate-300">
                "We'll email you a fresh verification link."
            </p>
            <div class="mt-4">
                <label
                    class="block mb-2 text-sm font-medium text-slate-900 dark:text-white"
                    for="resend_email"
                >
                    "Email"
                </label>
                <input
                    id="resend_email"
                    type="email"
                    class="w-full rounded-xl border border-slate-200 bg-slate-50 px-3 py-2.5 text-sm text-slate-900 focus:border-emerald-400 focus:ring-2 focus:ring-emerald-200 dark:bg-slate-700 dark:border-slate-600 dark:text-white"
                    autocomplete="email"
                    placeholder="name@example.com"
                    prop:value=move || address.get()
                    on:input=move |event| set_address.set(event_target_value(&event))
                />
            </div>
            <div class="mt-4">
                <Button button_type="submit" variant=ButtonVariant::Secondary disabled=in_flight>
                    "Resend verification email"
                </Button>
            </div>
            {move || in_flight.get().then_some(view! { <div class="mt-4"><Spinner /></div> })}
            {move || match gate.with(|gate| gate.status().clone()) {
                ResendStatus::Idle | ResendStatus::Pending => None,
                ResendStatus::Sent(message) => Some(view! {
                    <div class="mt-4">
                        <Alert kind=AlertKind::Success message=message />
                    </div>
                }
                .into_any()),
                ResendStatus::Failed(message) => Some(view! {
                    <div class="mt-4">
                        <Alert kind=AlertKind::Error message=message />
                    </div>
                }
                .into_any()),
            }}
        </form>
    }
}
