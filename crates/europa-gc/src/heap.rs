use std::ptr::NonNull;

use crate::config::GcConfig;
use crate::error::{GcError, GcResult};
use crate::header::{Color, Header};
use crate::trace::{Trace, Tracer};

pub(crate) struct GcBox<T> {
    pub(crate) header: Header<T>,
    pub(crate) value: T,
}

/// A handle to a heap-allocated `T`. Cheap to copy (it is one pointer) and
/// valid as long as it stays reachable from a root at every collection -
/// the same ownership discipline the reference implementation places on
/// `eu_value`/`eu_object` pointers (see `SPEC_FULL.md` §9's "GC as
/// ownership authority" note). Callers that keep a `Gc<T>` alive across a
/// collection point without rooting it invite a dangling reference, exactly
/// as in the original.
pub struct Gc<T>(NonNull<GcBox<T>>);

impl<T> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Gc<T> {}

impl<T> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T> Eq for Gc<T> {}

impl<T> std::ops::Deref for Gc<T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &self.0.as_ref().value }
    }
}

impl<T> Gc<T> {
    pub fn ptr_eq(a: Gc<T>, b: Gc<T>) -> bool {
        a.0 == b.0
    }

    pub fn as_ptr(&self) -> *const () {
        self.0.as_ptr() as *const ()
    }

    fn color(&self) -> Color {
        unsafe { self.0.as_ref().header.color }
    }

    fn set_color(&self, color: Color) {
        unsafe {
            (*self.0.as_ptr()).header.color = color;
        }
    }
}

impl<'a, T: Trace> Tracer<'a, T> {
    pub fn mark(&mut self, child: Gc<T>) {
        if child.color() == Color::White {
            child.set_color(Color::Grey);
            self.worklist.push(child);
        }
    }

    pub fn mark_opt(&mut self, child: Option<Gc<T>>) {
        if let Some(child) = child {
            self.mark(child);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub live: usize,
    pub freed: usize,
}

/// Owns every heap allocation of type `T` and runs mark-and-sweep cycles
/// over them. `T` is `europa_value::HeapObject` in practice - one heap, one
/// closed set of variants, matching the reference implementation's single
/// intrusive object list rather than a per-type arena.
pub struct Heap<T: Trace> {
    head: Option<NonNull<GcBox<T>>>,
    len: usize,
    config: GcConfig,
    since_last_collect: usize,
}

impl<T: Trace> Heap<T> {
    pub fn new(config: GcConfig) -> Self {
        Heap {
            head: None,
            len: 0,
            config,
            since_last_collect: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    pub fn alloc(&mut self, value: T) -> Gc<T> {
        let boxed = Box::new(GcBox {
            header: Header::new(),
            value,
        });
        let mut ptr = NonNull::from(Box::leak(boxed));
        unsafe {
            ptr.as_mut().header.next = self.head;
        }
        if let Some(mut head) = self.head {
            unsafe {
                head.as_mut().header.previous = Some(ptr);
            }
        }
        self.head = Some(ptr);
        self.len += 1;
        self.since_last_collect += 1;
        Gc(ptr)
    }

    pub fn should_collect(&self) -> bool {
        self.since_last_collect >= self.config.collect_threshold
    }

    /// Runs one full mark-and-sweep cycle rooted at `roots`.
    pub fn collect<I>(&mut self, roots: I) -> GcResult<Stats>
    where
        I: IntoIterator<Item = Gc<T>>,
    {
        self.mark(roots);
        let stats = self.sweep()?;
        if stats.freed.saturating_mul(2) < stats.live.max(1) {
            let grown = (self.config.collect_threshold as f64) * self.config.growth_factor;
            self.config.collect_threshold = grown as usize;
        }
        self.since_last_collect = 0;
        tracing::debug!(live = stats.live, freed = stats.freed, "gc cycle complete");
        Ok(stats)
    }

    fn mark<I>(&mut self, roots: I)
    where
        I: IntoIterator<Item = Gc<T>>,
    {
        let mut worklist: Vec<Gc<T>> = Vec::new();
        for root in roots {
            grey(root, &mut worklist);
        }
        while let Some(obj) = worklist.pop() {
            let mut tracer = Tracer {
                worklist: &mut worklist,
            };
            obj.trace(&mut tracer);
            obj.set_color(Color::Black);
        }
    }

    fn sweep(&mut self) -> GcResult<Stats> {
        let mut stats = Stats::default();
        let mut current = self.head;
        let mut new_head = None;
        let mut prev: Option<NonNull<GcBox<T>>> = None;

        while let Some(node) = current {
            let next = unsafe { node.as_ref().header.next };
            let color = unsafe { node.as_ref().header.color };
            match color {
                Color::White => {
                    unsafe {
                        drop(Box::from_raw(node.as_ptr()));
                    }
                    self.len -= 1;
                    stats.freed += 1;
                }
                Color::Black => {
                    unsafe {
                        let header = &mut (*node.as_ptr()).header;
                        header.color = Color::White;
                        header.previous = prev;
                        header.next = None;
                    }
                    match prev {
                        Some(mut p) => unsafe {
                            p.as_mut().header.next = Some(node);
                        },
                        None => new_head = Some(node),
                    }
                    prev = Some(node);
                    stats.live += 1;
                }
                Color::Grey => return Err(GcError::SweptGreyObject),
            }
            current = next;
        }

        self.head = new_head;
        Ok(stats)
    }
}

impl<T: Trace> Drop for Heap<T> {
    fn drop(&mut self) {
        let mut current = self.head;
        while let Some(node) = current {
            let next = unsafe { node.as_ref().header.next };
            unsafe {
                drop(Box::from_raw(node.as_ptr()));
            }
            current = next;
        }
    }
}

fn grey<T: Trace>(obj: Gc<T>, worklist: &mut Vec<Gc<T>>) {
    if obj.color() == Color::White {
        obj.set_color(Color::Grey);
        worklist.push(obj);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Node {
        next: Cell<Option<Gc<Node>>>,
        tag: u32,
    }

    impl Trace for Node {
        fn trace(&self, tracer: &mut Tracer<Self>) {
            tracer.mark_opt(self.next.get());
        }
    }

    fn leaf(tag: u32) -> Node {
        Node {
            next: Cell::new(None),
            tag,
        }
    }

    #[test]
    fn unreachable_objects_are_freed() {
        let mut heap: Heap<Node> = Heap::new(GcConfig::default());
        let a = heap.alloc(leaf(1));
        let _b = heap.alloc(leaf(2));
        assert_eq!(heap.len(), 2);

        let stats = heap.collect([a]).unwrap();
        assert_eq!(stats.live, 1);
        assert_eq!(stats.freed, 1);
        assert_eq!(heap.len(), 1);
        assert_eq!(a.tag, 1);
    }

    #[test]
    fn cyclic_graph_rooted_at_one_node_survives_whole() {
        let mut heap: Heap<Node> = Heap::new(GcConfig::default());
        let a = heap.alloc(leaf(1));
        let b = heap.alloc(leaf(2));
        b.next.set(Some(a));
        a.next.set(Some(b));

        let stats = heap.collect([a]).unwrap();
        assert_eq!(stats.live, 2);
        assert_eq!(stats.freed, 0);
    }

    #[test]
    fn collecting_with_no_roots_frees_everything() {
        let mut heap: Heap<Node> = Heap::new(GcConfig::default());
        heap.alloc(leaf(1));
        heap.alloc(leaf(2));

        let stats = heap.collect(std::iter::empty()).unwrap();
        assert_eq!(stats.live, 0);
        assert_eq!(stats.freed, 2);
        assert!(heap.is_empty());
    }
}
