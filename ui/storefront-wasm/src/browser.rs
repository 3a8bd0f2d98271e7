//! Browser implementations of the session's storage and clock seams.

use async_trait::async_trait;
use gloo_storage::{LocalStorage, Storage};
use gloo_timers::future::TimeoutFuture;
use sf_session::{IdentityStore, SessionError, Timer};
use std::time::Duration;
use wasm_bindgen::JsValue;

/// Identity kept as a raw string in `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalIdentityStore;

fn storage_error(err: JsValue) -> SessionError {
    SessionError::Storage(format!("{err:?}"))
}

impl IdentityStore for LocalIdentityStore {
    fn load(&self, key: &str) -> Option<String> {
        LocalStorage::raw()
            .get_item(key)
            .ok()
            .flatten()
            .filter(|value| !value.is_empty())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SessionError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(storage_error)
    }

    fn clear(&self, key: &str) -> Result<(), SessionError> {
        LocalStorage::delete(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTimer;

#[async_trait(?Send)]
impl Timer for BrowserTimer {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    async fn sleep(&self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        TimeoutFuture::new(millis).await;
    }
}
