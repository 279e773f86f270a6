//! Waiting screen shown in the originating browser after signup.
//!
//! Flow Overview: subscribe to verification broadcasts, poll the status
//! endpoint on an interval, and redirect to sign-in once either path observes
//! the verification. Both paths feed one `PendingWatch`, which owns the timer
//! and channel handles and releases them on verified, timeout or unmount.

use crate::{
    app_lib::{config::AppConfig, storage::BrowserStore},
    components::{Alert, AlertKind, AppShell, ResendForm, Spinner},
    features::{
        auth::client,
        verification::{
            broadcast::{BroadcastMessage, VerificationChannel},
            handles::BrowserTimer,
            machine::FlowState,
            reconciler::SessionReconciler,
            watch::{PendingWatch, WatchEvent},
        },
    },
    routes::paths,
};
use gloo_timers::callback::Interval;
use leptos::{prelude::*, task::spawn_local};
use leptos_router::{components::A, hooks::use_navigate};
use std::{rc::Rc, time::Duration};
use tracing::{debug, error, warn};

type Watch = PendingWatch<BrowserTimer, VerificationChannel>;
type Navigate = Rc<dyn Fn(&str)>;

/// Handles shared by the timer, broadcast and resend callbacks. Every field is
/// an arena handle, so the context is `Copy` and safe to move into views.
#[derive(Clone, Copy)]
struct PendingContext {
    watch: StoredValue<Watch, LocalStorage>,
    state: RwSignal<FlowState>,
    navigate: StoredValue<Navigate, LocalStorage>,
    interval_ms: u32,
    completion_delay_ms: u32,
}

#[component]
pub fn PendingVerificationPage() -> impl IntoView {
    let pending_email = SessionReconciler::new(&BrowserStore::local()).pending_email();

    view! {
        <AppShell>
            <div class="max-w-lg mx-auto">
                <h1 class="text-2xl font-semibold text-slate-900 dark:text-white">
                    "Check your email"
                </h1>
                {match pending_email {
                    Some(email) => view! { <PendingWatchPanel email=email /> }.into_any(),
                    None => view! {
                        <div class="mt-4 space-y-4">
                            <Alert
                                kind=AlertKind::Info
                                message="There is no signup waiting for verification in this browser.".to_string()
                            />
                            <A href=paths::SIGNUP {..} class="text-sm font-medium text-emerald-700 hover:underline">
                                "Create an account"
                            </A>
                        </div>
                    }
                    .into_any(),
                }}
            </div>
        </AppShell>
    }
}

#[component]
fn PendingWatchPanel(email: String) -> impl IntoView {
    let config = AppConfig::load();
    let navigate = use_navigate();
    let context = PendingContext {
        watch: StoredValue::new_local(Watch::new(email.clone(), config.poll_policy())),
        state: RwSignal::new(FlowState::Waiting),
        navigate: StoredValue::new_local(Rc::new(move |path: &str| {
            navigate(path, Default::default());
        }) as Navigate),
        interval_ms: config.poll_interval_ms,
        completion_delay_ms: config.completion_delay_ms,
    };

    match VerificationChannel::subscribe(&config.verification_channel, move |message| {
        on_broadcast(context, &message);
    }) {
        Ok(channel) => {
            context
                .watch
                .update_value(|watch| watch.attach_channel(channel));
        }
        Err(err) => warn!("verification broadcasts unavailable: {err}"),
    }
    start_polling(context);

    let watch = context.watch;
    on_cleanup(move || {
        watch.try_update_value(Watch::unmount);
    });

    let resend_email = email.clone();
    let on_sent = move |_: String| {
        if context
            .watch
            .try_update_value(Watch::restart)
            .unwrap_or(false)
        {
            context.state.try_set(FlowState::Waiting);
            start_polling(context);
        }
    };

    view! {
        {move || match context.state.get() {
            FlowState::Verified { .. } => view! {
                <div class="mt-4">
                    <Alert
                        kind=AlertKind::Success
                        message="Email verified. Redirecting you to sign in…".to_string()
                    />
                </div>
            }
            .into_any(),
            FlowState::TimedOut => view! {
                <div class="mt-4">
                    <Alert
                        kind=AlertKind::Info
                        message="We haven't seen your verification yet. The link may have failed, so request a new one below.".to_string()
                    />
                </div>
            }
            .into_any(),
            FlowState::Failed { message } | FlowState::Invalid { message } => view! {
                <div class="mt-4">
                    <Alert kind=AlertKind::Error message=message />
                </div>
            }
            .into_any(),
            FlowState::Waiting => view! {
                <div class="mt-4 space-y-4">
                    <p class="text-sm text-slate-600 dark:text-slate-300">
                        {format!("We sent a verification link to {email}. Open it on any device; this page updates on its own.")}
                    </p>
                    <Spinner label="Waiting for verification…" />
                </div>
            }
            .into_any(),
        }}
        {move || {
            (!matches!(context.state.get(), FlowState::Verified { .. })).then(|| {
                view! { <ResendForm email=resend_email.clone() on_sent=on_sent /> }
            })
        }}
    }
}

/// Starts the status poll unless one is already running or no longer wanted.
fn start_polling(context: PendingContext) {
    let wanted = context
        .watch
        .try_with_value(Watch::wants_interval)
        .unwrap_or(false);
    if !wanted {
        return;
    }

    let interval = Interval::new(context.interval_ms, move || poll_once(context));
    context
        .watch
        .try_update_value(|watch| watch.attach_interval(BrowserTimer::Interval(interval)));
}

fn poll_once(context: PendingContext) {
    let Some((attempt, email)) = context
        .watch
        .try_update_value(|watch| watch.next_poll().map(|attempt| (attempt, watch.email().to_string())))
        .flatten()
    else {
        return;
    };

    debug!(attempt, "checking verification status");
    spawn_local(async move {
        let result = client::check_verification_status(&email).await;
        let event = context
            .watch
            .try_update_value(|watch| watch.on_poll_result(result))
            .unwrap_or(WatchEvent::Nothing);
        handle_event(context, event);
    });
}

fn on_broadcast(context: PendingContext, message: &BroadcastMessage) {
    let Some(request) = context
        .watch
        .try_update_value(|watch| watch.on_broadcast(message))
        .flatten()
    else {
        return;
    };

    spawn_local(async move {
        let result = client::verify_email(&request).await;
        let event = context
            .watch
            .try_update_value(|watch| watch.on_broadcast_verified(result))
            .unwrap_or(WatchEvent::Nothing);
        handle_event(context, event);
    });
}

fn handle_event(context: PendingContext, event: WatchEvent) {
    match event {
        WatchEvent::Nothing => {}
        WatchEvent::TimedOut => {
            context.state.try_set(FlowState::TimedOut);
        }
        WatchEvent::Verified { email, user } => {
            let store = BrowserStore::local();
            match SessionReconciler::new(&store).apply_if_pending(&email, user.as_ref()) {
                Ok(true) => {}
                Ok(false) => debug!("session left untouched, verification already recorded"),
                Err(err) => error!("failed to record verification: {err}"),
            }
            context.state.try_set(FlowState::Verified { email, user });
            schedule_completion(context);
        }
    }
}

fn schedule_completion(context: PendingContext) {
    let Some(navigate) = context.navigate.try_get_value() else {
        return;
    };
    let delay = Duration::from_millis(u64::from(context.completion_delay_ms));
    match set_timeout_with_handle(move || navigate(paths::LOGIN), delay) {
        Ok(handle) => {
            context
                .watch
                .try_update_value(|watch| watch.attach_completion(BrowserTimer::Timeout(handle)));
        }
        Err(_) => error!("failed to schedule the sign-in redirect"),
    }
}
