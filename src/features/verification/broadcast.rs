//! Same-browser notification over the `jacs_verification` broadcast channel.
//!
//! A link opened outside the originating browser publishes the token so that
//! a waiting tab in the same profile can verify without waiting for its next
//! poll. Delivery is at-most-once and best effort; nothing may depend on it.

use super::request::VerificationRequest;
use serde::{Deserialize, Serialize};

/// Wire shape: `{"type":"VERIFY_EMAIL","email":"..","token":".."}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BroadcastMessage {
    #[serde(rename = "VERIFY_EMAIL")]
    VerifyEmail { email: String, token: String },
}

impl BroadcastMessage {
    pub fn verify_email(request: &VerificationRequest) -> Self {
        BroadcastMessage::VerifyEmail {
            email: request.email().to_string(),
            token: request.token().to_string(),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Unknown or malformed payloads from other code on the origin are dropped.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::VerificationChannel;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::BroadcastMessage;
    use crate::{app_lib::AppError, features::verification::handles::ChannelHandle};
    use wasm_bindgen::{JsCast, JsValue, closure::Closure};
    use web_sys::{BroadcastChannel, MessageEvent};

    /// Owned handle on a `BroadcastChannel`. Dropping it detaches the listener
    /// and closes the channel, so every exit path releases it.
    pub struct VerificationChannel {
        channel: BroadcastChannel,
        listener: Option<Closure<dyn FnMut(MessageEvent)>>,
    }

    impl VerificationChannel {
        pub fn open(name: &str) -> Result<Self, AppError> {
            let channel = BroadcastChannel::new(name)
                .map_err(|_| AppError::Config("Broadcast channels are unavailable.".to_string()))?;
            Ok(Self {
                channel,
                listener: None,
            })
        }

        /// Opens the channel and forwards every decodable message to `handler`.
        pub fn subscribe(
            name: &str,
            mut handler: impl FnMut(BroadcastMessage) + 'static,
        ) -> Result<Self, AppError> {
            let mut channel = Self::open(name)?;
            let listener = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                let Some(raw) = event.data().as_string() else {
                    return;
                };
                if let Some(message) = BroadcastMessage::decode(&raw) {
                    handler(message);
                }
            });
            channel
                .channel
                .set_onmessage(Some(listener.as_ref().unchecked_ref()));
            channel.listener = Some(listener);
            Ok(channel)
        }

        pub fn publish(&self, message: &BroadcastMessage) -> Result<(), AppError> {
            let payload = message.encode().map_err(|err| {
                AppError::Serialization(format!("Failed to encode message: {err}"))
            })?;
            self.channel
                .post_message(&JsValue::from_str(&payload))
                .map_err(|_| AppError::Network("Failed to broadcast verification.".to_string()))
        }
    }

    impl Drop for VerificationChannel {
        fn drop(&mut self) {
            if self.listener.take().is_some() {
                self.channel.set_onmessage(None);
            }
            self.channel.close();
        }
    }

    impl ChannelHandle for VerificationChannel {
        fn close(self) {
            drop(self);
        }
    }
}
