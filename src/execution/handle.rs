//! One-shot delivery of an execution running on its own task.

use super::{ExecutionRequest, ExecutionResult};
use crate::error::LocatedError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;

/// Receives the result of a spawned execution exactly once.
///
/// Awaiting the handle suspends the caller until the result arrives;
/// [`ExecutionHandle::wait`] blocks the current thread instead. Dropping the
/// handle abandons the result without stopping the execution.
#[derive(Debug)]
pub struct ExecutionHandle {
    receiver: oneshot::Receiver<ExecutionResult>,
}

impl ExecutionHandle {
    /// Blocks until the result is available.
    ///
    /// Must not be called from within an asynchronous context; await the
    /// handle there instead.
    pub fn wait(self) -> ExecutionResult {
        self.receiver.blocking_recv().unwrap_or_else(|_| lost_result())
    }
}

impl Future for ExecutionHandle {
    type Output = ExecutionResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| lost_result()))
    }
}

/// Starts `request` on a separate task and returns a handle to its result.
///
/// Inside a tokio runtime the request runs as a task of that runtime;
/// elsewhere it runs on a dedicated thread with its own single-threaded
/// runtime.
pub fn spawn_execution(request: ExecutionRequest) -> ExecutionHandle {
    let (sender, receiver) = oneshot::channel();
    let job = async move {
        let result = request.execute().await;
        if sender.send(result).is_err() {
            tracing::debug!("execution handle dropped before the result was delivered");
        }
    };

    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(job);
        }
        Err(_) => {
            std::thread::spawn(move || match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(job),
                Err(error) => {
                    tracing::warn!(error = %error, "failed to start an execution runtime");
                }
            });
        }
    }
    ExecutionHandle { receiver }
}

fn lost_result() -> ExecutionResult {
    tracing::warn!("execution task ended without delivering a result");
    ExecutionResult::from_errors(vec![LocatedError::request(
        "Execution ended before producing a result.",
    )])
}
