//! Language Integration Tests
//!
//! Exercises the interpreter through the public host API the way module
//! code uses it: whole scripts, host-compiled functions and values passed
//! back and forth.

use modulus_engine::{CapturedConsole, Engine, EngineOptions, Error, Value};
use std::rc::Rc;

fn run(source: &str) -> String {
    let engine = Engine::new();
    engine
        .eval(source)
        .unwrap_or_else(|e| panic!("{}", e))
        .to_string()
}

#[test]
fn test_arithmetic() {
    assert_eq!(run("5 + 3;"), "8");
    assert_eq!(run("10 - 4;"), "6");
    assert_eq!(run("6 * 7;"), "42");
    assert_eq!(run("15 / 3;"), "5");
    assert_eq!(run("17 % 5;"), "2");
    assert_eq!(run("0.1 + 0.2;"), "0.30000000000000004");
}

#[test]
fn test_strings() {
    assert_eq!(run("`Hello, ${'World'}!`"), "Hello, World!");
    assert_eq!(run("'a-b-c'.split('-').reverse().join('+')"), "c+b+a");
    assert_eq!(run("'  padded '.trim().padStart(8, '.')"), "..padded");
    assert_eq!(run("'Modulus'.toUpperCase().slice(1, 4)"), "ODU");
}

#[test]
fn test_arrays() {
    assert_eq!(run("[3, 1, 2].sort().map(x => x * 10).join()"), "10,20,30");
    assert_eq!(run("[1, 2, 3, 4].filter(x => x % 2 === 0).reduce((a, b) => a + b, 0)"), "6");
    assert_eq!(run("[[1, 2], [3]].flat().includes(3)"), "true");
    assert_eq!(run("Array.isArray([]) && !Array.isArray({})"), "true");
}

#[test]
fn test_objects() {
    let source = r#"
        const config = { name: 'app', server: { port: 3000 } };
        const copy = Object.assign({}, config, { debug: true });
        Object.keys(copy).join() + ':' + copy.server.port
    "#;
    assert_eq!(run(source), "name,server,debug:3000");
    assert_eq!(run("const o = Object.freeze({ a: 1 }); o.a = 2; o.a"), "1");
}

#[test]
fn test_closures_and_higher_order_functions() {
    let source = r#"
        function memoize(fn) {
            const cache = {};
            let calls = 0;
            const wrapped = (n) => {
                if (!(n in cache)) { calls++; cache[n] = fn(n); }
                return cache[n];
            };
            wrapped.calls = () => calls;
            return wrapped;
        }
        const square = memoize(x => x * x);
        square(4); square(4); square(5);
        square.calls()
    "#;
    assert_eq!(run(source), "2");
}

#[test]
fn test_class_hierarchy() {
    let source = r#"
        class Shape {
            constructor(name) { this.name = name; }
            area() { return 0; }
            describe() { return `${this.name} with area ${this.area()}`; }
        }
        class Rect extends Shape {
            constructor(w, h) { super('rect'); this.w = w; this.h = h; }
            area() { return this.w * this.h; }
        }
        class Square extends Rect {
            constructor(side) { super(side, side); this.name = 'square'; }
        }
        new Square(3).describe()
    "#;
    assert_eq!(run(source), "square with area 9");
}

#[test]
fn test_custom_errors() {
    let source = r#"
        class NotFound extends Error {
            constructor(what) {
                super(`${what} not found`);
                this.name = 'NotFound';
                this.code = 'E_NOT_FOUND';
            }
        }
        try {
            throw new NotFound('widget');
        } catch (err) {
            [err instanceof NotFound, err instanceof Error, err.code, String(err)].join('|')
        }
    "#;
    assert_eq!(run(source), "true|true|E_NOT_FOUND|NotFound: widget not found");
}

#[test]
fn test_json_round_trip_through_script() {
    let source = r#"
        const text = JSON.stringify({ list: [1, 'two', null], nested: { ok: true } });
        const back = JSON.parse(text);
        back.list[1] + back.nested.ok
    "#;
    assert_eq!(run(source), "twotrue");
}

#[test]
fn test_uncaught_error_reports_name_and_message() {
    let engine = Engine::new();
    let err = engine.eval("const math = {}; math.multiply(2, 3);").unwrap_err();
    assert_eq!(err.to_string(), "TypeError: math.multiply is not a function");
}

#[test]
fn test_syntax_error_position() {
    let engine = Engine::new();
    match engine.eval("let ok = 1;\nlet = ;") {
        Err(Error::Syntax { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn test_host_function_bindings() {
    let console = Rc::new(CapturedConsole::default());
    let engine = Engine::with_options(console.clone(), EngineOptions { max_call_depth: 64 });

    let wrapper = engine
        .compile_function(
            "wrapper",
            &["exports", "name"],
            "exports.greeting = 'hi ' + name; console.log(exports.greeting);",
        )
        .unwrap();
    let exports = Value::Object(engine.new_object());
    engine
        .call(&wrapper, exports.clone(), &[exports.clone(), Value::from("there")])
        .unwrap();

    assert_eq!(engine.get(&exports, "greeting").unwrap(), Value::from("hi there"));
    assert_eq!(console.messages(), vec!["hi there".to_string()]);
}

#[test]
fn test_this_in_compiled_function() {
    let engine = Engine::new();
    let function = engine
        .compile_function("f", &[], "return this === receiver;")
        .unwrap();
    let receiver = Value::Object(engine.new_object());
    engine.set_global("receiver", receiver.clone());
    assert_eq!(
        engine.call(&function, receiver, &[]).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_runaway_recursion_is_recoverable() {
    let engine = Engine::with_max_call_depth(40);
    let err = engine
        .eval("const down = (n) => down(n + 1); down(0);")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "RangeError: Maximum call stack size exceeded"
    );
    assert_eq!(engine.eval("'still alive'").unwrap(), Value::from("still alive"));
}
