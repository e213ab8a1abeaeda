//! The literal input/output pairs an embedder should be able to hand to
//! `Runtime::do_string` and get back exactly, exercising the reader,
//! compiler, and VM together through the public embedding surface rather
//! than any one crate's internals.

use europa_runtime::{Runtime, RuntimeConfig};
use europa_value::Value;

fn runtime() -> Runtime {
    let mut rt = Runtime::new(RuntimeConfig::default());
    rt.register_standard_library();
    rt.set_standard_ports();
    rt
}

#[test]
fn fixed_arity_lambda_returns_the_second_argument() {
    let mut rt = runtime();
    let v = rt.do_string("((lambda (a b) b) 123 456)").unwrap();
    assert!(matches!(v, Value::Fixnum(456)));
}

#[test]
fn all_rest_formals_collect_every_argument_into_a_proper_list() {
    let mut rt = runtime();
    let v = rt.do_string("((lambda x x) 123 456)").unwrap();
    let gc = v.as_object().expect("result is a pair");
    let (first, rest) = gc.as_pair().expect("result is a pair");
    assert!(matches!(first.get(), Value::Fixnum(123)));
    let (second, tail) = rest.get().as_object().unwrap().as_pair().unwrap();
    assert!(matches!(second.get(), Value::Fixnum(456)));
    assert!(tail.get().is_null());
}

#[test]
fn variadic_formals_bind_the_overflow_to_the_rest_parameter() {
    let mut rt = runtime();
    let v = rt.do_string("((lambda (a b . c) c) 1 2 3 4)").unwrap();
    assert_eq!(europa_stdlib::write_string(rt.symbols(), v), "(3 4)");
}

#[test]
fn only_the_boolean_false_is_falsy() {
    let mut rt = runtime();
    assert!(matches!(rt.do_string("(if #t 1 2)").unwrap(), Value::Fixnum(1)));
    assert!(matches!(rt.do_string("(if #f 1 2)").unwrap(), Value::Fixnum(2)));
    let v = rt.do_string("(if 0 'yes 'no)").unwrap();
    assert_eq!(europa_stdlib::write_string(rt.symbols(), v), "yes");
}

#[test]
fn call_cc_invoked_in_its_own_extent_acts_like_a_plain_return() {
    let mut rt = runtime();
    let v = rt
        .do_string("((lambda (value) (call/cc (lambda (return) (return value)))) 123)")
        .unwrap();
    assert!(matches!(v, Value::Fixnum(123)));
}

#[test]
fn reinvoking_a_captured_continuation_resumes_call_cc_with_the_new_value() {
    let mut rt = runtime();
    let v = rt
        .do_string("((lambda (c) (set! c (call/cc (lambda (i) i))) (if c (c #f) 1234)) #t)")
        .unwrap();
    assert!(matches!(v, Value::Fixnum(1234)));
}

#[test]
fn reader_parses_signed_binary_radix_inexact_marker_and_hex_char_escapes() {
    let mut rt = runtime();
    assert!(matches!(rt.do_string("#b-1001").unwrap(), Value::Fixnum(-9)));
    assert!(matches!(rt.do_string("#b#i1001.1").unwrap(), Value::Real(r) if r == 9.5));
    let v = rt.do_string("\"escaped \\x35;\\n\"").unwrap();
    assert_eq!(europa_stdlib::display_string(rt.symbols(), v), "escaped 5\n");
}

#[test]
fn a_self_tail_call_runs_to_completion_through_the_embedding_api() {
    let mut rt = runtime();
    let v = rt
        .do_string(
            "(define n 0)
             (define (loop i) (if (= i 5000) i (begin (set! n (+ n 1)) (loop (+ i 1)))))
             (loop 0)",
        )
        .unwrap();
    assert!(matches!(v, Value::Fixnum(5000)));
}
