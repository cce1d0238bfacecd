//! Panic isolation for calls into plugin code.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

/// Extract a human-readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

/// Run a synchronous plugin call, turning a panic into an error.
pub(crate) fn guard_call<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload))),
    }
}

/// Await a plugin hook, turning a panic into an error.
pub(crate) async fn guard_hook<F>(hook: F) -> anyhow::Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_str_and_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*payload), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*payload), "owned");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(&*payload), "non-string panic payload");
    }

    #[test]
    fn guard_call_catches_panics() {
        let err = guard_call::<()>(|| panic!("constructor exploded")).unwrap_err();
        assert_eq!(err.to_string(), "panicked: constructor exploded");
        assert_eq!(guard_call(|| Ok(5)).unwrap(), 5);
    }

    async fn exploding_hook() -> anyhow::Result<()> {
        panic!("hook exploded")
    }

    async fn quiet_hook() -> anyhow::Result<()> {
        Ok(())
    }

    #[tokio::test]
    async fn guard_hook_catches_panics() {
        let err = guard_hook(exploding_hook()).await.unwrap_err();
        assert_eq!(err.to_string(), "panicked: hook exploded");
        assert!(guard_hook(quiet_hook()).await.is_ok());
    }
}
