//! Read and write functions exchanged with source bindings.
//!
//! Expressions are composed by value: a source is `Readable`, `Writable`, or
//! both, by implementing one or both traits on the same type.

mod value_cache;

pub use value_cache::*;


use crate::ProducerError;

/// Produces one value per invocation.
///
/// `Ok(None)` means no update is available, which is distinct from an error.
pub trait ReadFunction<T>: Send + Sync {
    fn read_value(&self) -> Result<Option<T>, ProducerError>;
}

/// Accepts a value coming from the consumer side.
pub trait WriteFunction<T>: Send + Sync {
    fn write_value(
        &self,
        value: T,
    );
}

impl<T, F> ReadFunction<T> for F
where F: Fn() -> Result<Option<T>, ProducerError> + Send + Sync
{
    fn read_value(&self) -> Result<Option<T>, ProducerError> {
        self()
    }
}
