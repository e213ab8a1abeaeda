use europa_table::TableKey;

use crate::object::HeapObject;
use crate::value::Value;

fn fnv1a(bytes: impl IntoIterator<Item = u8>) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// `eqv?`: same immediate value, or the identical heap object (pointer
/// identity, not contents). Two freshly-read `"abc"` strings are not
/// `eqv?` even though `equal?` would accept them - exactly like the
/// reference implementation's `euvalue_eqv`.
pub fn eqv(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Eof, Value::Eof) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Fixnum(x), Value::Fixnum(y)) => x == y,
        (Value::Real(x), Value::Real(y)) => x.to_bits() == y.to_bits(),
        (Value::Character(x), Value::Character(y)) => x == y,
        (Value::CPointer(x), Value::CPointer(y)) => std::ptr::eq(*x, *y),
        (Value::Object(x), Value::Object(y)) => europa_gc::Gc::ptr_eq(*x, *y),
        _ => false,
    }
}

/// `eq?` in this implementation coincides with `eqv?` - there is no boxed
/// fixnum/character representation to distinguish pointer identity from
/// value identity for immediates, matching the reference's tagged-union
/// representation.
pub fn eq(a: &Value, b: &Value) -> bool {
    eqv(a, b)
}

/// `equal?`: structural equality, recursing into pairs/vectors/strings.
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            if europa_gc::Gc::ptr_eq(*x, *y) {
                return true;
            }
            match (&**x, &**y) {
                (HeapObject::Str(sx), HeapObject::Str(sy)) => *sx.borrow() == *sy.borrow(),
                (HeapObject::Bytevector(bx), HeapObject::Bytevector(by)) => {
                    *bx.borrow() == *by.borrow()
                }
                (HeapObject::Vector(vx), HeapObject::Vector(vy)) => {
                    let vx = vx.borrow();
                    let vy = vy.borrow();
                    vx.len() == vy.len() && vx.iter().zip(vy.iter()).all(|(p, q)| equal(p, q))
                }
                (HeapObject::Pair(ca, da), HeapObject::Pair(cb, db)) => {
                    equal(&ca.get(), &cb.get()) && equal(&da.get(), &db.get())
                }
                _ => eqv(a, b),
            }
        }
        _ => eqv(a, b),
    }
}

fn hash_value(v: &Value) -> u64 {
    match v {
        Value::Null => 0,
        Value::Eof => 1,
        Value::Boolean(b) => 2u64.wrapping_add(*b as u64),
        Value::Fixnum(i) => fnv1a(i.to_le_bytes()),
        Value::Real(r) => fnv1a(r.to_bits().to_le_bytes()),
        Value::Character(c) => fnv1a((*c as u32).to_le_bytes()),
        Value::CPointer(p) => *p as u64,
        Value::Object(obj) => match &**obj {
            // Symbols/strings hash by content so that `get_symbol`-style
            // lookups in a table can be driven by text, not identity.
            HeapObject::Symbol(_) => obj.as_ptr() as u64,
            HeapObject::Str(s) => fnv1a(s.borrow().bytes()),
            _ => obj.as_ptr() as u64,
        },
    }
}

impl TableKey for Value {
    fn table_hash(&self) -> u64 {
        hash_value(self)
    }

    fn table_eqv(&self, other: &Self) -> bool {
        eqv(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eqv_distinguishes_distinct_reals_with_same_value_but_not_bits() {
        assert!(eqv(&Value::Real(1.0), &Value::Real(1.0)));
        assert!(!eqv(&Value::Real(f64::NAN), &Value::Real(1.0)));
    }

    #[test]
    fn eqv_treats_fixnums_by_value() {
        assert!(eqv(&Value::Fixnum(5), &Value::Fixnum(5)));
        assert!(!eqv(&Value::Fixnum(5), &Value::Fixnum(6)));
    }
}
