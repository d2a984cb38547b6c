use tokio::signal;

pub(crate) use envbench_core::prelude::{DelegatedShutdownListener, ShutdownHandle};

/// Stop the run on Ctrl-C.
///
/// A run that is stopped this way keeps the ticks it completed and is still saved.
pub(crate) fn start_shutdown_listener(
    runtime: &tokio::runtime::Runtime,
) -> anyhow::Result<ShutdownHandle> {
    let handle = ShutdownHandle::default();

    let listener_handle = handle.clone();
    runtime.spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        listener_handle.shutdown();
        println!("Received shutdown signal, finishing the current tick...");
    });

    Ok(handle)
}
