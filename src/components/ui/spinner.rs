use leptos::prelude::*;

/// Inline progress indicator with an optional caption next to it.
#[component]
pub fn Spinner(#[prop(optional, into)] label: Option<String>) -> impl IntoView {
    let aria_label = label.clone().unwrap_or_else(|| "Loading".to_string());

    view! {
        <div class="flex items-center gap-3">
            <div
                class="inline-block h-7 w-7 animate-spin rounded-full border-4 border-emerald-200 border-t-emerald-600"
                role="status"
                aria-live="polite"
                aria-label=aria_label
            ></div>
            {label.map(|text| view! { <span class="text-sm text-slate-600 dark:text-slate-300">{text}</span> })}
        </div>
    }
}
