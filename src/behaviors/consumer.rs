//! # Per-value consumer abstraction.
//!
//! A [`Consumer`] is invoked by a [`DrainingConsumer`](crate::DrainingConsumer) once per
//! value taken from its input. Returning an error (or panicking) ends consumption for good.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::ConsumeError;

/// Action applied to every value of a draining consumer.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use agentvisor::{ConsumeError, Consumer};
///
/// struct Printer;
///
/// #[async_trait]
/// impl Consumer<i32> for Printer {
///     async fn consume(&self, value: i32) -> Result<(), ConsumeError> {
///         if value < 0 {
///             return Err(ConsumeError::rejected("negative"));
///         }
///         println!("handling {value}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Consumer<T: Send + 'static>: Send + Sync + 'static {
    /// Handles one value.
    async fn consume(&self, value: T) -> Result<(), ConsumeError>;
}

/// Closure-backed consumer.
///
/// ## Example
/// ```rust
/// use agentvisor::{ConsumeError, ConsumerFn};
///
/// let printer: ConsumerFn<String, _> = ConsumerFn::new(|s: String| async move {
///     println!("got {s}");
///     Ok::<_, ConsumeError>(())
/// });
/// # let _ = printer;
/// ```
pub struct ConsumerFn<T, F> {
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, F> ConsumerFn<T, F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> Consumer<T> for ConsumerFn<T, F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ConsumeError>> + Send + 'static,
{
    async fn consume(&self, value: T) -> Result<(), ConsumeError> {
        (self.f)(value).await
    }
}
