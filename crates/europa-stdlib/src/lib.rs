//! Native (Rust-implemented) procedures bound into the global environment:
//! pairs/lists, numeric operations, predicates/equality, strings/symbols,
//! and port I/O. Procedures that must call back into the interpreter's own
//! execution loop (`apply`, `map`, `for-each`) live in `europa-runtime`
//! instead, since this crate deliberately has no dependency on `europa-vm`.

mod helpers;
mod io;
mod numbers;
mod pairs;
mod predicates;
mod print;
mod strings;

use europa_value::object::Heap;
use europa_value::{Environment, SymbolTable};

pub use print::{display_string, write_string};

/// Binds every native procedure this crate provides into `env`.
pub fn register_standard_library(heap: &mut Heap, symbols: &mut SymbolTable, env: &mut Environment) {
    pairs::register(heap, symbols, env);
    numbers::register(heap, symbols, env);
    predicates::register(heap, symbols, env);
    strings::register(heap, symbols, env);
    io::register(heap, symbols, env);
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use europa_gc::GcConfig;
    use europa_value::object::NativeContext;
    use europa_value::HeapObject;

    use super::*;

    fn setup() -> (Heap, SymbolTable, Environment) {
        let heap = Heap::new(GcConfig::default());
        let symbols = SymbolTable::new();
        let env = Environment::new(None);
        (heap, symbols, env)
    }

    fn call(
        heap: &mut Heap,
        symbols: &mut SymbolTable,
        env: &Environment,
        name: &str,
        args: &[europa_value::Value],
    ) -> europa_value::Value {
        let key = europa_value::Value::Object(symbols.intern(heap, name));
        let proc = env.rget(&key).unwrap_or_else(|| panic!("{name} is not bound"));
        let closure = proc.as_object().unwrap().as_closure().unwrap().clone();
        let f = closure.native.unwrap_or_else(|| panic!("{name} is not native"));
        let mut ctx = NativeContext { heap, symbols };
        f(&mut ctx, args).unwrap_or_else(|e| panic!("{name} raised {e}"))
    }

    #[test]
    fn cons_car_cdr_round_trip() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let one = europa_value::Value::Fixnum(1);
        let two = europa_value::Value::Fixnum(2);
        let pair = call(&mut heap, &mut symbols, &env, "cons", &[one, two]);
        let got_car = call(&mut heap, &mut symbols, &env, "car", &[pair]);
        let got_cdr = call(&mut heap, &mut symbols, &env, "cdr", &[pair]);
        assert!(matches!(got_car, europa_value::Value::Fixnum(1)));
        assert!(matches!(got_cdr, europa_value::Value::Fixnum(2)));
    }

    #[test]
    fn arithmetic_mixes_fixnums_and_folds_left_to_right() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let args = [
            europa_value::Value::Fixnum(10),
            europa_value::Value::Fixnum(3),
            europa_value::Value::Fixnum(2),
        ];
        let result = call(&mut heap, &mut symbols, &env, "-", &args);
        assert!(matches!(result, europa_value::Value::Fixnum(5)));
    }

    #[test]
    fn division_by_zero_is_a_bad_argument_error() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let key = europa_value::Value::Object(symbols.intern(&mut heap, "/"));
        let proc = env.rget(&key).unwrap();
        let closure = proc.as_object().unwrap().as_closure().unwrap().clone();
        let f = closure.native.unwrap();
        let mut ctx = NativeContext {
            heap: &mut heap,
            symbols: &mut symbols,
        };
        let err = f(&mut ctx, &[europa_value::Value::Fixnum(1), europa_value::Value::Fixnum(0)]).unwrap_err();
        assert_eq!(err.kind, europa_value::ErrorKind::BadArgument);
    }

    #[test]
    fn equal_recurses_structurally_while_eq_does_not() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let a = call(
            &mut heap,
            &mut symbols,
            &env,
            "cons",
            &[europa_value::Value::Fixnum(1), europa_value::Value::Null],
        );
        let b = call(
            &mut heap,
            &mut symbols,
            &env,
            "cons",
            &[europa_value::Value::Fixnum(1), europa_value::Value::Null],
        );
        let eq_result = call(&mut heap, &mut symbols, &env, "eq?", &[a, b]);
        let equal_result = call(&mut heap, &mut symbols, &env, "equal?", &[a, b]);
        assert!(matches!(eq_result, europa_value::Value::Boolean(false)));
        assert!(matches!(equal_result, europa_value::Value::Boolean(true)));
    }

    #[test]
    fn string_append_concatenates_in_order() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let a = europa_value::Value::Object(heap.alloc(HeapObject::Str(RefCell::new("foo".to_string()))));
        let b = europa_value::Value::Object(heap.alloc(HeapObject::Str(RefCell::new("bar".to_string()))));
        let result = call(&mut heap, &mut symbols, &env, "string-append", &[a, b]);
        let gc = result.as_object().unwrap();
        let HeapObject::Str(s) = &*gc else { panic!("not a string") };
        assert_eq!(*s.borrow(), "foobar");
    }

    #[test]
    fn display_renders_strings_without_quotes_write_does_with() {
        let (mut heap, symbols, _env) = setup();
        let s = europa_value::Value::Object(heap.alloc(HeapObject::Str(RefCell::new("hi".to_string()))));
        assert_eq!(display_string(&symbols, s), "hi");
        assert_eq!(write_string(&symbols, s), "\"hi\"");
    }

    #[test]
    fn exactness_and_integer_predicates_follow_the_value_representation() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let fixnum = europa_value::Value::Fixnum(4);
        let whole_real = europa_value::Value::Real(4.0);
        let fractional_real = europa_value::Value::Real(4.5);

        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "exact?", &[fixnum]),
            europa_value::Value::Boolean(true)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "exact?", &[whole_real]),
            europa_value::Value::Boolean(false)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "inexact?", &[whole_real]),
            europa_value::Value::Boolean(true)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "integer?", &[whole_real]),
            europa_value::Value::Boolean(true)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "integer?", &[fractional_real]),
            europa_value::Value::Boolean(false)
        ));
    }

    #[test]
    fn odd_and_even_treat_a_fractional_real_as_neither() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let three = europa_value::Value::Fixnum(3);
        let four = europa_value::Value::Fixnum(4);
        let fractional = europa_value::Value::Real(2.5);

        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "odd?", &[three]),
            europa_value::Value::Boolean(true)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "even?", &[four]),
            europa_value::Value::Boolean(true)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "odd?", &[fractional]),
            europa_value::Value::Boolean(false)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "even?", &[fractional]),
            europa_value::Value::Boolean(false)
        ));
    }

    #[test]
    fn min_and_max_pick_the_extreme_of_the_arguments() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let args = [
            europa_value::Value::Fixnum(5),
            europa_value::Value::Fixnum(1),
            europa_value::Value::Fixnum(3),
        ];
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "min", &args),
            europa_value::Value::Fixnum(1)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "max", &args),
            europa_value::Value::Fixnum(5)
        ));
    }

    #[test]
    fn boolean_eq_requires_at_least_two_booleans_and_rejects_non_booleans() {
        let (mut heap, mut symbols, mut env) = setup();
        register_standard_library(&mut heap, &mut symbols, &mut env);
        let t = europa_value::Value::Boolean(true);
        let f = europa_value::Value::Boolean(false);
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "boolean=?", &[t, t, t]),
            europa_value::Value::Boolean(true)
        ));
        assert!(matches!(
            call(&mut heap, &mut symbols, &env, "boolean=?", &[t, f]),
            europa_value::Value::Boolean(false)
        ));

        let key = europa_value::Value::Object(symbols.intern(&mut heap, "boolean=?"));
        let proc = env.rget(&key).unwrap();
        let closure = proc.as_object().unwrap().as_closure().unwrap().clone();
        let native = closure.native.unwrap();
        let mut ctx = NativeContext { heap: &mut heap, symbols: &mut symbols };
        let err = native(&mut ctx, &[t, europa_value::Value::Fixnum(1)]).unwrap_err();
        assert_eq!(err.kind, europa_value::ErrorKind::BadArgument);
    }
}
