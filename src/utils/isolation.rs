//! Panic isolation for code driven through caller-supplied callbacks.
//!
//! The drain loop calls into the output sink and the engine; a panic in
//! either must surface as an error so the engine session can still be
//! released and the sink still receives its terminal signal.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

/// Poll `fut` to completion, converting a panic into `Err(message)`.
pub async fn catch_panic<F, T>(fut: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(value) => Ok(value),
        Err(panic_info) => {
            let msg = panic_message(&panic_info);
            tracing::error!(message = %msg, "Panic caught during synthesis");
            Err(msg)
        }
    }
}

/// Extract a readable message from a panic payload.
pub fn panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic (non-string payload)".to_string()
    }
}
