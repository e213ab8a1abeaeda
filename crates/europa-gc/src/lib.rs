//! A non-moving tracing mark-and-sweep collector.
//!
//! One `Heap<T>` manages every heap object of a single, closed object type
//! `T` (Europa's `HeapObject` enum lives in `europa-value` and implements
//! [`Trace`] here). Objects are linked into an intrusive doubly-linked list
//! through their header, mirroring the reference implementation's
//! `_previous`/`_next` object-header fields instead of a `Vec`/slab, so
//! freeing an object during sweep is an O(1) unlink rather than a
//! swap-remove that would invalidate other live handles' indices.

mod config;
mod error;
mod header;
mod heap;
mod trace;

pub use config::GcConfig;
pub use error::{GcError, GcResult};
pub use header::Color;
pub use heap::{Gc, Heap, Stats};
pub use trace::{Trace, Tracer};
