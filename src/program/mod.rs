// program/mod.rs
//! Combinators for composing programs out of asynchronous operations.
//!
//! Nothing here knows about devices: any future resolving to a `Result` can
//! be adapted with [`op`] and ordered with [`run_sequence`] or fanned out
//! with [`run_parallel`]. Both combinators return `Result<(), E>` themselves,
//! so programs nest freely.
//!
//! Failure policy of [`run_parallel`]: every member runs to completion, no
//! sibling is cancelled, and the first error in completion order is returned
//! once all members are done. Any further errors are logged at `warn`.

use futures_util::{
    FutureExt, StreamExt,
    future::BoxFuture,
    stream::FuturesUnordered,
};
use std::fmt;
use std::future::Future;
use tracing::warn;

/// A boxed, not-yet-started step of a program.
pub type Operation<'a, E> = BoxFuture<'a, Result<(), E>>;

/// Adapts a fallible future into an [`Operation`], discarding its success value.
pub fn op<'a, F, T, E>(future: F) -> Operation<'a, E>
where
    F: Future<Output = Result<T, E>> + Send + 'a,
    T: 'a,
    E: 'a,
{
    future.map(|result| result.map(|_| ())).boxed()
}

/// Runs `ops` one after another. The first failure stops the sequence and
/// later operations are never started.
pub async fn run_sequence<'a, E, I>(ops: I) -> Result<(), E>
where
    I: IntoIterator<Item = Operation<'a, E>>,
{
    for operation in ops {
        operation.await?;
    }
    Ok(())
}

/// Starts all `ops` together and resolves once every one has finished.
pub async fn run_parallel<'a, E, I>(ops: I) -> Result<(), E>
where
    I: IntoIterator<Item = Operation<'a, E>>,
    E: fmt::Display,
{
    let mut pending: FuturesUnordered<Operation<'a, E>> = ops.into_iter().collect();
    let mut first_error = None;

    while let Some(result) = pending.next().await {
        if let Err(e) = result {
            if first_error.is_none() {
                first_error = Some(e);
            } else {
                warn!(error = %e, "Additional failure in parallel group");
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
