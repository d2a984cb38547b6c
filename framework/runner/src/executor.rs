use std::future::Future;
use std::time::Duration;

use envbench_core::prelude::{DelegatedShutdownListener, ShutdownHandle, ShutdownSignalError};

/// Runs the async parts of a measurement, the waits between ticks, on behalf of the synchronous
/// sampling loop.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    pub fn new(runtime: tokio::runtime::Runtime, shutdown_handle: ShutdownHandle) -> Self {
        Self {
            runtime,
            shutdown_handle,
        }
    }

    /// Run async code in place, blocking until it completes.
    ///
    /// Note that the future will be cancelled if the run is shut down, in which case the error
    /// is a [ShutdownSignalError].
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        let mut shutdown_listener = self.shutdown_handle.new_listener();
        self.execute_until_shutdown(fut, &mut shutdown_listener)
    }

    /// Like [Executor::execute_in_place] but races an existing listener.
    ///
    /// A signal the listener received before this call cancels the future straight away, which a
    /// fresh listener would miss.
    pub fn execute_until_shutdown<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
        shutdown_listener: &mut DelegatedShutdownListener,
    ) -> anyhow::Result<T> {
        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => result,
                _ = shutdown_listener.wait_for_shutdown() => {
                    Err(anyhow::anyhow!(ShutdownSignalError::default()))
                },
            }
        })
    }

    /// Block for `duration` unless `shutdown_listener` sees a shutdown first.
    pub fn sleep(
        &self,
        duration: Duration,
        shutdown_listener: &mut DelegatedShutdownListener,
    ) -> anyhow::Result<()> {
        self.execute_until_shutdown(
            async move {
                tokio::time::sleep(duration).await;
                Ok(())
            },
            shutdown_listener,
        )
    }
}
