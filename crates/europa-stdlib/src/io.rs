use std::cell::RefCell;
use std::io::Write as _;

use europa_port::FilePort;
use europa_value::object::NativeContext;
use europa_value::{ErrorObj, HeapObject, PortBackend, Value};

use crate::helpers::{arity_error, bad_argument, define_native};
use crate::print::{display_string, write_string};

fn port_arg(args: &[Value], at: usize, name: &str) -> Result<Option<europa_gc::Gc<HeapObject>>, ErrorObj> {
    match args.get(at) {
        None => Ok(None),
        Some(v) => v
            .as_object()
            .filter(|gc| matches!(&**gc, HeapObject::Port(_)))
            .map(Some)
            .ok_or_else(|| bad_argument(format!("{name}: not a port"))),
    }
}

fn emit(ctx: &mut NativeContext, port: Option<europa_gc::Gc<HeapObject>>, text: &str) -> Result<(), ErrorObj> {
    match port {
        Some(gc) => {
            let HeapObject::Port(backend) = &*gc else { unreachable!() };
            backend
                .borrow_mut()
                .write_bytes(text.as_bytes())
                .map_err(|e| bad_argument(format!("write: {e}")))?;
            let _ = ctx;
            Ok(())
        }
        None => {
            print!("{text}");
            std::io::stdout()
                .flush()
                .map_err(|e| bad_argument(format!("write: {e}")))
        }
    }
}

fn display(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    if args.is_empty() {
        return Err(arity_error("display", "1 or 2", 0));
    }
    let port = port_arg(args, 1, "display")?;
    let text = display_string(ctx.symbols, args[0]);
    emit(ctx, port, &text)?;
    Ok(Value::Null)
}

fn write(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    if args.is_empty() {
        return Err(arity_error("write", "1 or 2", 0));
    }
    let port = port_arg(args, 1, "write")?;
    let text = write_string(ctx.symbols, args[0]);
    emit(ctx, port, &text)?;
    Ok(Value::Null)
}

fn newline(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let port = port_arg(args, 0, "newline")?;
    emit(ctx, port, "\n")?;
    Ok(Value::Null)
}

fn path_arg(args: &[Value], name: &str) -> Result<String, ErrorObj> {
    match args {
        [v] => {
            let gc = v
                .as_object()
                .filter(|gc| matches!(&**gc, HeapObject::Str(_)))
                .ok_or_else(|| bad_argument(format!("{name}: not a string")))?;
            let HeapObject::Str(s) = &*gc else { unreachable!() };
            Ok(s.borrow().clone())
        }
        _ => Err(arity_error(name, "1", args.len())),
    }
}

fn open_input_file(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let path = path_arg(args, "open-input-file")?;
    let port = FilePort::open(&path, true, false).map_err(|e| bad_argument(format!("open-input-file: {e}")))?;
    Ok(Value::Object(
        ctx.heap.alloc(HeapObject::Port(RefCell::new(Box::new(port)))),
    ))
}

fn open_output_file(ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    let path = path_arg(args, "open-output-file")?;
    let port = FilePort::open(&path, false, true).map_err(|e| bad_argument(format!("open-output-file: {e}")))?;
    Ok(Value::Object(
        ctx.heap.alloc(HeapObject::Port(RefCell::new(Box::new(port)))),
    ))
}

fn close_port(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => {
            let gc = v
                .as_object()
                .filter(|gc| matches!(&**gc, HeapObject::Port(_)))
                .ok_or_else(|| bad_argument("close-port: not a port"))?;
            let HeapObject::Port(backend) = &*gc else { unreachable!() };
            backend
                .borrow_mut()
                .close()
                .map_err(|e| bad_argument(format!("close-port: {e}")))?;
            Ok(Value::Null)
        }
        _ => Err(arity_error("close-port", "1", args.len())),
    }
}

fn port_p(_ctx: &mut NativeContext, args: &[Value]) -> Result<Value, ErrorObj> {
    match args {
        [v] => Ok(Value::Boolean(
            v.as_object().is_some_and(|gc| matches!(&*gc, HeapObject::Port(_))),
        )),
        _ => Err(arity_error("port?", "1", args.len())),
    }
}

pub fn register(
    heap: &mut europa_value::object::Heap,
    symbols: &mut europa_value::SymbolTable,
    env: &mut europa_value::Environment,
) {
    define_native(heap, symbols, env, "display", display);
    define_native(heap, symbols, env, "write", write);
    define_native(heap, symbols, env, "newline", newline);
    define_native(heap, symbols, env, "open-input-file", open_input_file);
    define_native(heap, symbols, env, "open-output-file", open_output_file);
    define_native(heap, symbols, env, "close-port", close_port);
    define_native(heap, symbols, env, "port?", port_p);
}
