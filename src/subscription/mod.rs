//! Subscriptions wire one collector, one decoupler and one listener together.
//!
//! The builder validates configuration and resolves every collaborator
//! before anything runs. Building yields two ends:
//! - [`Subscription`] stays with the consumer and controls the lifecycle
//! - [`SourceHandle`] goes to producers and only holds weak references, so
//!   writes after close or drop are silently ignored

mod builder;
mod source_handle;
mod subscription;

pub use builder::*;
pub use source_handle::*;
pub use subscription::*;
