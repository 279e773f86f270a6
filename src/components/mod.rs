//! Shared UI components exported for routes and features.

pub(crate) mod layout;
mod resend_form;
pub(crate) mod ui;

pub(crate) use layout::AppShell;
pub(crate) use resend_form::ResendForm;
pub(crate) use ui::{Alert, AlertKind, Button, ButtonVariant, Spinner};
