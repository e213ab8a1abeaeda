use std::ptr::NonNull;

use crate::heap::GcBox;

/// Tricolor mark used by the collector. White objects are candidates for
/// sweeping, grey objects are on the mark worklist, black objects have been
/// fully traced and survive the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Grey,
    Black,
}

/// Intrusive doubly-linked list pointers plus the tricolor mark, embedded in
/// every heap allocation. `_previous`/`_next` here are the direct analogue
/// of the reference implementation's object header fields; the original's
/// `_reference_count` field is not carried over; see `DESIGN.md`.
pub(crate) struct Header<T> {
    pub(crate) previous: Option<NonNull<GcBox<T>>>,
    pub(crate) next: Option<NonNull<GcBox<T>>>,
    pub(crate) color: Color,
}

impl<T> Header<T> {
    pub(crate) fn new() -> Self {
        Header {
            previous: None,
            next: None,
            color: Color::White,
        }
    }
}
