//! Verification link route. It consumes the single-use token from the URL,
//! tells the originating browser through a broadcast when the link was opened
//! elsewhere, and records the result in local storage.

use crate::{
    app_lib::{config::AppConfig, storage::BrowserStore},
    components::{Alert, AlertKind, AppShell, ResendForm, Spinner},
    features::{
        auth::client,
        verification::{
            broadcast::{BroadcastMessage, VerificationChannel},
            handles::{BrowserTimer, ChannelHandle, TimerHandle},
            link::LinkVerification,
            machine::FlowState,
            reconciler::SessionReconciler,
        },
    },
    routes::paths,
};
use leptos::{prelude::*, task::spawn_local};
use leptos_router::{
    components::A,
    hooks::{use_location, use_navigate},
};
use std::{rc::Rc, time::Duration};
use tracing::{error, warn};
use wasm_bindgen::JsValue;

type Navigate = Rc<dyn Fn(&str)>;

/// Browser resources opened for one link visit.
#[derive(Default)]
struct LinkHandles {
    publisher: Option<VerificationChannel>,
    timers: Vec<BrowserTimer>,
}

impl LinkHandles {
    fn close_publisher(&mut self) {
        if let Some(channel) = self.publisher.take() {
            channel.close();
        }
    }

    fn release(&mut self) {
        self.close_publisher();
        for timer in self.timers.drain(..) {
            timer.cancel();
        }
    }
}

#[component]
pub fn VerifyEmailPage() -> impl IntoView {
    let config = AppConfig::load();
    let query = use_location().search.get_untracked();
    let mut link = LinkVerification::start(&query, &BrowserStore::local());
    clear_token_from_url();

    let originating = link.originating();
    let email = link.email().map(str::to_string);
    let state = RwSignal::new(link.state().clone());
    let handles = StoredValue::new_local(LinkHandles::default());
    let navigate = use_navigate();
    let navigate = StoredValue::new_local(Rc::new(move |path: &str| {
        navigate(path, Default::default());
    }) as Navigate);

    if let Some(message) = link.broadcast() {
        publish(&config, handles, &message);
    }

    let request = link.begin();
    let link = StoredValue::new_local(link);
    on_cleanup(move || {
        handles.try_update_value(LinkHandles::release);
    });

    if let Some(request) = request {
        let completion_delay_ms = config.completion_delay_ms;
        spawn_local(async move {
            let result = client::verify_email(&request).await;
            let Some((redirect, next)) = link.try_update_value(|link| {
                let redirect = match link.complete(result, &BrowserStore::local()) {
                    Ok(transition) => link.redirects_after(transition),
                    Err(err) => {
                        error!("failed to record verification: {err}");
                        false
                    }
                };
                (redirect, link.state().clone())
            }) else {
                return;
            };

            state.try_set(next);
            if redirect {
                redirect_after(handles, navigate, completion_delay_ms);
            }
        });
    }

    let on_sent = move |address: String| {
        let store = BrowserStore::local();
        match SessionReconciler::new(&store).mark_pending(&address) {
            Ok(()) => {
                if let Some(navigate) = navigate.try_get_value() {
                    navigate(paths::VERIFY_PENDING);
                }
            }
            Err(err) => warn!("failed to record pending verification: {err}"),
        }
    };

    view! {
        <AppShell>
            <div class="max-w-lg mx-auto">
                <h1 class="text-2xl font-semibold text-slate-900 dark:text-white">
                    "Verify your email"
                </h1>
                {move || match state.get() {
                    FlowState::Waiting | FlowState::TimedOut => view! {
                        <div class="mt-4">
                            <Spinner label="Verifying your email…" />
                        </div>
                    }
                    .into_any(),
                    FlowState::Verified { .. } => view! {
                        <div class="mt-4 space-y-4">
                            <Alert kind=AlertKind::Success message=success_message(originating) />
                            {(!originating).then(|| view! {
                                <A href=paths::LOGIN {..} class="text-sm font-medium text-emerald-700 hover:underline">
                                    "Go to sign in"
                                </A>
                            })}
                        </div>
                    }
                    .into_any(),
                    FlowState::Failed { message } | FlowState::Invalid { message } => view! {
                        <div class="mt-4">
                            <Alert kind=AlertKind::Error message=message />
                        </div>
                        <ResendForm email=email.clone() on_sent=on_sent />
                        <div class="mt-6">
                            <A href=paths::LOGIN {..} class="text-sm font-medium text-emerald-700 hover:underline">
                                "Back to sign in"
                            </A>
                        </div>
                    }
                    .into_any(),
                }}
            </div>
        </AppShell>
    }
}

fn success_message(originating: bool) -> String {
    if originating {
        "Email verified. Redirecting you to sign in…".to_string()
    } else {
        "Email verified. You can close this tab and sign in from any device.".to_string()
    }
}

/// Publishes the token to the originating browser and closes the channel after
/// the configured delay.
fn publish(
    config: &AppConfig,
    handles: StoredValue<LinkHandles, LocalStorage>,
    message: &BroadcastMessage,
) {
    let channel = match VerificationChannel::open(&config.verification_channel) {
        Ok(channel) => channel,
        Err(err) => {
            warn!("verification broadcast unavailable: {err}");
            return;
        }
    };
    if let Err(err) = channel.publish(message) {
        warn!("verification broadcast failed: {err}");
    }
    handles.update_value(|handles| handles.publisher = Some(channel));

    let delay = Duration::from_millis(u64::from(config.broadcast_close_delay_ms));
    match set_timeout_with_handle(
        move || {
            handles.try_update_value(LinkHandles::close_publisher);
        },
        delay,
    ) {
        Ok(handle) => {
            handles.update_value(|handles| handles.timers.push(BrowserTimer::Timeout(handle)));
        }
        Err(_) => warn!("failed to schedule the broadcast channel close"),
    }
}

fn redirect_after(
    handles: StoredValue<LinkHandles, LocalStorage>,
    navigate: StoredValue<Navigate, LocalStorage>,
    delay_ms: u32,
) {
    let Some(navigate) = navigate.try_get_value() else {
        return;
    };
    let delay = Duration::from_millis(u64::from(delay_ms));
    match set_timeout_with_handle(move || navigate(paths::LOGIN), delay) {
        Ok(handle) => {
            handles.try_update_value(|handles| handles.timers.push(BrowserTimer::Timeout(handle)));
        }
        Err(_) => error!("failed to schedule the sign-in redirect"),
    }
}

/// Drops the token from the address bar and history once it has been read.
fn clear_token_from_url() {
    let Some(history) = web_sys::window().and_then(|window| window.history().ok()) else {
        return;
    };
    let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(paths::VERIFY_EMAIL));
}
