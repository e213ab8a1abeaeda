use europa_gc::Tracer;

use crate::object::HeapObject;
use crate::value::Value;

fn mark_value(tracer: &mut Tracer<HeapObject>, value: &Value) {
    if let Value::Object(obj) = value {
        tracer.mark(*obj);
    }
}

impl europa_gc::Trace for HeapObject {
    fn trace(&self, tracer: &mut Tracer<Self>) {
        match self {
            HeapObject::Symbol(_)
            | HeapObject::Str(_)
            | HeapObject::Bytevector(_)
            | HeapObject::Port(_) => {}
            HeapObject::Error(err) => tracer.mark_opt(err.nested),
            HeapObject::Pair(car, cdr) => {
                mark_value(tracer, &car.get());
                mark_value(tracer, &cdr.get());
            }
            HeapObject::Vector(items) => {
                for item in items.borrow().iter() {
                    mark_value(tracer, item);
                }
            }
            HeapObject::Table(env) => {
                let env = env.borrow();
                for (k, v) in env.iter() {
                    mark_value(tracer, k);
                    mark_value(tracer, v);
                }
                tracer.mark_opt(env.parent());
            }
            HeapObject::Prototype(proto) => {
                for constant in &proto.constants {
                    mark_value(tracer, constant);
                }
                for sub in &proto.sub_protos {
                    tracer.mark(*sub);
                }
            }
            HeapObject::Closure(closure) => {
                tracer.mark_opt(closure.proto);
                tracer.mark_opt(closure.env);
            }
            HeapObject::Continuation(cont) => {
                tracer.mark_opt(cont.previous);
                tracer.mark_opt(cont.env);
                tracer.mark_opt(cont.closure);
                mark_value(tracer, &cont.rib);
                tracer.mark_opt(cont.rib_last);
            }
        }
    }
}
