//! Symbol interning.
//!
//! Unlike a batch compiler's global, thread-safe, leaked-`'static` interner,
//! Europa's symbols are owned by a single `Global` (one per embedded
//! `Runtime`) and the interner never outlives it. A process embedding more
//! than one Europa runtime gets independent symbol tables, which is the
//! correct behavior for an embeddable library.

use rustc_hash::FxHashMap;

/// A compact handle to an interned string. Two symbols compare equal iff
/// they were interned from equal strings in the same `Interner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns the backing strings for all `Symbol`s handed out from it.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, Symbol>,
}

impl Interner {
    pub fn new() -> Self {
        Interner::default()
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(&sym) = self.lookup.get(text) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.lookup.insert(boxed, sym);
        sym
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_text_yields_same_symbol() {
        let mut i = Interner::new();
        let a = i.intern("hello");
        let b = i.intern("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn interning_distinct_text_yields_distinct_symbols() {
        let mut i = Interner::new();
        let a = i.intern("hello");
        let b = i.intern("world");
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_roundtrips_the_original_text() {
        let mut i = Interner::new();
        let sym = i.intern("scheme");
        assert_eq!(i.resolve(sym), "scheme");
    }
}
