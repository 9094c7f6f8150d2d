//! Hook and test bodies
//!
//! A body is either a plain closure returning [`Outcome`] or a closure that
//! produces a future resolving to one. Both are stored behind `Fn` so a
//! registry can be executed any number of times.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

/// What a test or hook body returns
pub type Outcome = anyhow::Result<()>;

/// A registered test or hook body
pub enum Callback {
    /// Runs to completion when called
    Sync(Box<dyn Fn() -> Outcome>),
    /// Returns a future the runner awaits before moving on
    Async(Box<dyn Fn() -> LocalBoxFuture<'static, Outcome>>),
}

impl Callback {
    /// Wrap a synchronous body
    pub fn sync<F>(body: F) -> Self
    where
        F: Fn() -> Outcome + 'static,
    {
        Callback::Sync(Box::new(body))
    }

    /// Wrap an asynchronous body
    pub fn from_async<F, Fut>(body: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Outcome> + 'static,
    {
        Callback::Async(Box::new(move || body().boxed_local()))
    }

    /// Whether the body suspends
    pub fn is_async(&self) -> bool {
        matches!(self, Callback::Async(_))
    }

    /// Run the body to settlement. Panics are caught and reported as errors.
    pub(crate) async fn invoke(&self) -> Outcome {
        match self {
            Callback::Sync(body) => {
                panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|p| Err(panicked(p)))
            }
            Callback::Async(body) => {
                let future = match panic::catch_unwind(AssertUnwindSafe(body)) {
                    Ok(future) => future,
                    Err(payload) => return Err(panicked(payload)),
                };
                AssertUnwindSafe(future)
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|p| Err(panicked(p)))
            }
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Sync(_) => write!(f, "Callback::Sync(..)"),
            Callback::Async(_) => write!(f, "Callback::Async(..)"),
        }
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    anyhow::anyhow!("panicked: {}", message)
}
