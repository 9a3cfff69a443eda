use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Detects signals sent to the process. This works with limmited success.
///
/// On Windows detached processes can't detect signals sent to them, there the daemon relies on
/// autosaves to keep data when it is killed.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c");
        },
        _ = terminate() => {
            info!("Received terminate signal");
        },
        _ = cancelation.cancelled() => return,
    };
    cancelation.cancel();
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            terminate.recv().await;
        }
        Err(e) => {
            error!("Can't listen for terminate signals {e:?}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
