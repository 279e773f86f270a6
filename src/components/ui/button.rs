use leptos::prelude::*;

const PRIMARY: &str = "text-white bg-emerald-700 hover:bg-emerald-800 focus:ring-emerald-300 dark:bg-emerald-600 dark:hover:bg-emerald-700 dark:focus:ring-emerald-800";
const SECONDARY: &str = "text-slate-900 bg-white border border-slate-300 hover:bg-slate-100 focus:ring-slate-200 dark:bg-slate-800 dark:text-slate-200 dark:border-slate-600 dark:hover:bg-slate-700";

#[derive(Clone, Copy, Default)]
pub enum ButtonVariant {
    #[default]
    Primary,
    /// Outlined, for actions next to the main one (resend, retry).
    Secondary,
}

/// Form button. Click handling is left to the surrounding form's submit.
#[component]
pub fn Button(
    #[prop(optional)] button_type: Option<&'static str>,
    #[prop(optional)] variant: ButtonVariant,
    #[prop(optional, into, default = Signal::from(false))] disabled: Signal<bool>,
    children: Children,
) -> impl IntoView {
    let palette = match variant {
        ButtonVariant::Primary => PRIMARY,
        ButtonVariant::Secondary => SECONDARY,
    };
    let class = format!(
        "{palette} focus:ring-4 focus:outline-none font-medium rounded-lg text-sm w-full sm:w-auto px-5 py-2.5 text-center"
    );

    view! {
        <button
            type=button_type.unwrap_or("button")
            class=class
            class:cursor-not-allowed=move || disabled.get()
            class:opacity-70=move || disabled.get()
            disabled=move || disabled.get()
        >
            {children()}
        </button>
    }
}
