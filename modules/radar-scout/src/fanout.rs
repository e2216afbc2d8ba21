// Settle-all fan-out. Every task runs to completion; an error or a panic in
// one task becomes a `Rejected` entry and never cancels its siblings.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;

#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    Fulfilled(T),
    Rejected(String),
}

impl<T> Settled<T> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settled::Fulfilled(_))
    }
}

/// Drive all futures concurrently on the current task and wait for every one.
/// Results come back in input order.
pub async fn settle_all<T, Fut, I>(tasks: I) -> Vec<Settled<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = anyhow::Result<T>>,
{
    join_all(tasks.into_iter().map(settle)).await
}

/// Same isolation as [`settle_all`] but one task at a time.
pub async fn settle_each<T, Fut, I>(tasks: I) -> Vec<Settled<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut settled = Vec::new();
    for task in tasks {
        settled.push(settle(task).await);
    }
    settled
}

/// Run one task, turning an error or a panic into `Rejected`.
pub async fn settle<T, Fut>(task: Fut) -> Settled<T>
where
    Fut: Future<Output = anyhow::Result<T>>,
{
    match AssertUnwindSafe(task).catch_unwind().await {
        Ok(Ok(value)) => Settled::Fulfilled(value),
        Ok(Err(e)) => Settled::Rejected(format!("{e:#}")),
        Err(panic) => Settled::Rejected(panic_message(panic.as_ref())),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
