use rustc_hash::FxHashMap;

use europa_util::{Interner, Symbol};

use crate::object::{Gc, Heap, HeapObject};

/// Owns both the text interner and the cache mapping each interned text to
/// its canonical heap-allocated symbol object, so that two reads of the
/// same identifier produce `eq?` values - this is what makes symbol
/// comparison a pointer check instead of a string compare. Strings, by
/// contrast, are not structure-shared: each string literal the reader sees
/// allocates its own mutable `HeapObject::Str`, since sharing one
/// allocation across textually-identical literals would make
/// `string-set!` on one mutate the other.
#[derive(Default)]
pub struct SymbolTable {
    interner: Interner,
    cache: FxHashMap<Symbol, Gc>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn intern(&mut self, heap: &mut Heap, text: &str) -> Gc {
        let sym = self.interner.intern(text);
        self.intern_symbol(heap, sym)
    }

    /// Same as [`SymbolTable::intern`], but starting from an already
    /// interned [`Symbol`] id (e.g. one pulled out of a [`crate::object::Formals`]
    /// list) rather than raw text - used when the VM needs to rebuild the
    /// canonical heap object for a formal parameter name at closure
    /// application time.
    pub fn intern_symbol(&mut self, heap: &mut Heap, sym: Symbol) -> Gc {
        if let Some(&gc) = self.cache.get(&sym) {
            return gc;
        }
        let gc = heap.alloc(HeapObject::Symbol(sym));
        self.cache.insert(sym, gc);
        gc
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use europa_gc::GcConfig;

    #[test]
    fn interning_same_text_twice_yields_the_same_heap_object() {
        let mut heap = Heap::new(GcConfig::default());
        let mut table = SymbolTable::new();
        let a = table.intern(&mut heap, "foo");
        let b = table.intern(&mut heap, "foo");
        assert!(europa_gc::Gc::ptr_eq(a, b));
    }

    #[test]
    fn distinct_text_yields_distinct_objects() {
        let mut heap = Heap::new(GcConfig::default());
        let mut table = SymbolTable::new();
        let a = table.intern(&mut heap, "foo");
        let b = table.intern(&mut heap, "bar");
        assert!(!europa_gc::Gc::ptr_eq(a, b));
    }
}
