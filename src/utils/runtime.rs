use anyhow::Result;

/// Runtime of the daemon. Tracking is a single sequential loop, one thread is enough.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
