use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::Cancelled;

/// Returns `Err(Cancelled)` if the token already fired.
pub fn ensure_active(cancel: &CancellationToken) -> Result<(), Cancelled> {
    if cancel.is_cancelled() {
        Err(Cancelled)
    } else {
        Ok(())
    }
}

/// Races `fut` against the token. The future is dropped (and any in-flight
/// request with it) as soon as the token fires.
pub async fn cancellable<F, T>(cancel: &CancellationToken, fut: F) -> Result<T, Cancelled>
where
    F: Future<Output = T>,
{
    ensure_active(cancel)?;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_cancellable_passes_through_output() {
        let cancel = CancellationToken::new();
        let out = cancellable(&cancel, async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_cancellable_aborts_pending_future() {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });
        let out = cancellable(&cancel, tokio::time::sleep(Duration::from_secs(60))).await;
        assert_eq!(out, Err(Cancelled));
    }

    #[tokio::test]
    async fn test_cancellable_refuses_to_start_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let out = cancellable(&cancel, async { unreachable!() }).await;
        assert_eq!(out, Err::<(), _>(Cancelled));
    }
}
