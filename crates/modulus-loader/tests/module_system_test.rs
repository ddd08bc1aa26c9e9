//! Module system integration tests
//!
//! Exercises require() end to end: resolution, caching, circular requests,
//! failure rollback, JSON modules and the module scope bindings. Most tests
//! run against an in-memory file system; the fixture tests load the sample
//! modules under `tests/fixtures`.

use modulus_engine::{CapturedConsole, Value};
use modulus_loader::{LoadError, LoaderConfig, MemoryFileSystem, ModuleSystem};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::rc::Rc;

struct Harness {
    system: ModuleSystem,
    console: Rc<CapturedConsole>,
    fs: Rc<MemoryFileSystem>,
}

impl Harness {
    fn new(files: &[(&str, &str)]) -> Self {
        let fs = Rc::new(MemoryFileSystem::new());
        for (path, contents) in files {
            fs.insert(*path, *contents);
        }
        let console = Rc::new(CapturedConsole::default());
        let config = LoaderConfig {
            base_dir: Some("/app".into()),
            ..LoaderConfig::default()
        };
        let system = ModuleSystem::builder(config)
            .file_system(fs.clone())
            .console(console.clone())
            .build()
            .unwrap();
        Self {
            system,
            console,
            fs,
        }
    }

    fn require(&self, specifier: &str) -> Value {
        self.system.require(specifier).unwrap()
    }

    fn get(&self, target: &Value, key: &str) -> Value {
        self.system.engine().get(target, key).unwrap()
    }

    fn call(&self, target: &Value, method: &str, args: &[Value]) -> Value {
        self.system
            .engine()
            .call_method(target, method, args)
            .unwrap()
    }

    fn eval(&self, source: &str) -> Value {
        self.system.evaluate(source).unwrap()
    }
}

fn fixtures_system(console: Rc<CapturedConsole>) -> ModuleSystem {
    let config = LoaderConfig {
        base_dir: Some(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")),
        ..LoaderConfig::default()
    };
    ModuleSystem::builder(config)
        .console(console)
        .build()
        .unwrap()
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn test_module_body_runs_once() {
    let h = Harness::new(&[(
        "/app/counter.js",
        "console.log('counter loaded'); exports.value = 1;",
    )]);

    let first = h.require("./counter");
    let second = h.require("./counter.js");
    let third = h.require("/app/counter.js");

    assert!(first.strict_equals(&second));
    assert!(second.strict_equals(&third));
    assert_eq!(h.console.messages(), vec!["counter loaded".to_string()]);
    assert_eq!(h.fs.reads(), vec![PathBuf::from("/app/counter.js")]);
}

#[test]
fn test_shared_dependency_loaded_once() {
    let h = Harness::new(&[
        ("/app/shared.js", "console.log('shared'); exports.n = 0;"),
        ("/app/left.js", "const s = require('./shared'); s.n += 1; exports.s = s;"),
        ("/app/right.js", "const s = require('./shared'); s.n += 1; exports.s = s;"),
    ]);

    let left = h.require("./left");
    let right = h.require("./right");

    assert!(h.get(&left, "s").strict_equals(&h.get(&right, "s")));
    assert_eq!(h.get(&h.get(&left, "s"), "n"), Value::Number(2.0));
    assert_eq!(h.console.messages(), vec!["shared".to_string()]);
}

#[test]
fn test_cache_info_in_insertion_order() {
    let h = Harness::new(&[
        ("/app/main.js", "require('./lib/a'); require('./lib/b');"),
        ("/app/lib/a.js", "exports.a = true;"),
        ("/app/lib/b.js", "exports.b = true;"),
    ]);
    h.require("./main");

    let info = h.system.cache_info();
    assert_eq!(info.count, 3);
    assert_eq!(
        info.modules,
        vec![
            PathBuf::from("/app/main.js"),
            PathBuf::from("/app/lib/a.js"),
            PathBuf::from("/app/lib/b.js"),
        ]
    );
}

#[test]
fn test_clear_cache_reloads_but_keeps_old_exports() {
    let h = Harness::new(&[(
        "/app/stamp.js",
        "console.log('stamp'); exports.id = Math.random();",
    )]);
    let before = h.require("./stamp");
    h.system.clear_cache();
    assert_eq!(h.system.cache_info().count, 0);

    let after = h.require("./stamp");
    assert!(!before.strict_equals(&after));
    assert!(h.get(&before, "id").as_number().is_some());
    assert_eq!(h.console.messages().len(), 2);
}

// ============================================================================
// Circular dependencies
// ============================================================================

#[test]
fn test_circular_require_sees_partial_exports() {
    let h = Harness::new(&[
        (
            "/app/a.js",
            r#"
            exports.early = 'a-early';
            const b = require('./b');
            exports.late = 'a-late';
            exports.fromB = b.seen;
            "#,
        ),
        (
            "/app/b.js",
            r#"
            const a = require('./a');
            exports.seen = [a.early, a.late].join('|');
            "#,
        ),
    ]);

    let a = h.require("./a");
    assert_eq!(h.get(&a, "fromB"), Value::from("a-early|"));
    assert_eq!(h.get(&a, "late"), Value::from("a-late"));
    assert_eq!(h.system.cache_info().count, 2);
}

#[test]
fn test_self_require_returns_own_exports() {
    let h = Harness::new(&[(
        "/app/self.js",
        "exports.same = require('./self') === exports;",
    )]);
    let exports = h.require("./self");
    assert_eq!(h.get(&exports, "same"), Value::Boolean(true));
}

#[test]
fn test_record_is_loaded_only_after_completion() {
    let h = Harness::new(&[
        ("/app/a.js", "exports.during = module.loaded; require('./b');"),
        ("/app/b.js", "exports.b = true;"),
    ]);
    let a = h.require("./a");
    assert_eq!(h.get(&a, "during"), Value::Boolean(false));

    let record = h.system.module(Path::new("/app/a.js")).unwrap();
    assert!(record.is_loaded());
    let module = Value::Object(record.module_object().clone());
    assert_eq!(h.get(&module, "loaded"), Value::Boolean(true));
    assert_eq!(record.dependents(), vec![PathBuf::from("/app/b.js")]);
}

// ============================================================================
// Failure rollback
// ============================================================================

#[test]
fn test_failed_module_is_evicted_and_retried() {
    let h = Harness::new(&[(
        "/app/broken.js",
        "console.log('attempt'); throw new Error('broken on purpose');",
    )]);

    let first = h.system.require("./broken").unwrap_err();
    assert_eq!(h.system.cache_info().count, 0);
    let second = h.system.require("./broken").unwrap_err();
    assert_eq!(h.system.cache_info().count, 0);

    assert_eq!(first.to_string(), "Error: broken on purpose");
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(h.console.messages(), vec!["attempt", "attempt"]);

    h.fs.insert("/app/broken.js", "exports.fixed = true;");
    let fixed = h.require("./broken");
    assert_eq!(h.get(&fixed, "fixed"), Value::Boolean(true));
    assert_eq!(h.system.cache_info().count, 1);
}

#[test]
fn test_oversized_string_fails_the_module() {
    let h = Harness::new(&[("/app/huge.js", "exports.pad = 'x'.padStart(1e12);")]);

    let err = h.system.require("./huge").unwrap_err();
    assert!(matches!(err, LoadError::Execution { .. }));
    assert_eq!(err.to_string(), "RangeError: Invalid string length");
    assert_eq!(h.system.cache_info().count, 0);
}

#[test]
fn test_failure_keeps_previously_loaded_dependencies() {
    let h = Harness::new(&[
        ("/app/dep.js", "exports.ok = true;"),
        ("/app/main.js", "require('./dep'); throw new TypeError('late failure');"),
    ]);

    let err = h.system.require("./main").unwrap_err();
    assert_eq!(err.exception().unwrap().name(), "TypeError");
    assert_eq!(err.path(), Some(Path::new("/app/main.js")));
    assert_eq!(h.system.cache_info().modules, vec![PathBuf::from("/app/dep.js")]);
}

#[test]
fn test_missing_module() {
    let h = Harness::new(&[]);
    let err = h.system.require("./nope").unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.code(), Some("MODULE_NOT_FOUND"));
    assert_eq!(err.to_string(), "Cannot find module '/app/nope.js'");
    assert_eq!(h.system.cache_info().count, 0);

    let again = h.system.require("./nope").unwrap_err();
    assert!(again.is_not_found());
    assert_eq!(again.to_string(), "Cannot find module '/app/nope.js'");
    assert_eq!(h.system.cache_info().count, 0);
}

#[test]
fn test_missing_nested_module_reaches_host_unchanged() {
    let h = Harness::new(&[
        ("/app/top.js", "require('./middle');"),
        ("/app/middle.js", "require('./missing');"),
    ]);
    let err = h.system.require("./top").unwrap_err();

    assert!(matches!(err, LoadError::Read { .. }));
    assert_eq!(err.path(), Some(Path::new("/app/missing.js")));
    assert_eq!(h.system.cache_info().count, 0);
}

#[test]
fn test_nested_exception_keeps_innermost_path() {
    let h = Harness::new(&[
        ("/app/top.js", "require('./inner');"),
        ("/app/inner.js", "null.boom;"),
    ]);
    let err = h.system.require("./top").unwrap_err();

    assert_eq!(err.path(), Some(Path::new("/app/inner.js")));
    assert_eq!(err.exception().unwrap().name(), "TypeError");
}

#[test]
fn test_failed_dependency_removed_from_dependents() {
    let h = Harness::new(&[
        (
            "/app/main.js",
            "try { require('./bad'); } catch (e) {} require('./good');",
        ),
        ("/app/bad.js", "throw new Error('bad');"),
        ("/app/good.js", "exports.good = true;"),
    ]);
    h.require("./main");

    let main = h.system.module(Path::new("/app/main.js")).unwrap();
    assert_eq!(main.dependents(), vec![PathBuf::from("/app/good.js")]);
}

#[test]
fn test_module_can_catch_missing_require() {
    let h = Harness::new(&[(
        "/app/optional.js",
        r#"
        let plugin;
        try {
            plugin = require('./plugin');
        } catch (e) {
            exports.code = e.code;
            exports.message = e.message;
            exports.isError = e instanceof Error;
        }
        exports.hasPlugin = plugin !== undefined;
        "#,
    )]);
    let exports = h.require("./optional");

    assert_eq!(h.get(&exports, "code"), Value::from("MODULE_NOT_FOUND"));
    assert_eq!(
        h.get(&exports, "message"),
        Value::from("Cannot find module '/app/plugin.js'")
    );
    assert_eq!(h.get(&exports, "isError"), Value::Boolean(true));
    assert_eq!(h.get(&exports, "hasPlugin"), Value::Boolean(false));
}

#[test]
fn test_syntax_error_in_module() {
    let h = Harness::new(&[("/app/bad.js", "const = 1;")]);
    let err = h.system.require("./bad").unwrap_err();

    let exception = err.exception().unwrap();
    assert_eq!(exception.name(), "SyntaxError");
    assert!(exception.message().contains("/app/bad.js:1:"));
    assert_eq!(h.system.cache_info().count, 0);
}

#[test]
fn test_unsupported_extension() {
    let h = Harness::new(&[("/app/style.css", "body {}")]);
    let err = h.system.require("./style.css").unwrap_err();

    assert!(matches!(err, LoadError::UnsupportedType { .. }));
    assert_eq!(err.code(), Some("ERR_UNKNOWN_FILE_EXTENSION"));
    assert!(h.fs.reads().is_empty());
}

#[test]
fn test_invalid_argument_to_require() {
    let h = Harness::new(&[(
        "/app/main.js",
        r#"
        const messages = [];
        for (const bad of [42, '', undefined]) {
            try { require(bad); } catch (e) { messages.push(e.name); }
        }
        exports.messages = messages.join(',');
        "#,
    )]);
    let exports = h.require("./main");
    assert_eq!(
        h.get(&exports, "messages"),
        Value::from("TypeError,TypeError,TypeError")
    );
}

// ============================================================================
// JSON modules
// ============================================================================

#[test]
fn test_json_module() {
    let h = Harness::new(&[
        ("/app/data.json", r#"{ "name": "demo", "tags": ["a", "b"], "n": 3 }"#),
        (
            "/app/main.js",
            "const d = require('./data.json'); exports.same = d === require('./data.json'); exports.summary = d.name + ':' + d.tags.length + ':' + d.n;",
        ),
    ]);
    let exports = h.require("./main");
    assert_eq!(h.get(&exports, "same"), Value::Boolean(true));
    assert_eq!(h.get(&exports, "summary"), Value::from("demo:2:3"));
}

#[test]
fn test_malformed_json_module() {
    let h = Harness::new(&[("/app/broken.json", "{ \"a\": }")]);
    let err = h.system.require("./broken.json").unwrap_err();

    assert!(matches!(err, LoadError::Format { .. }));
    assert_eq!(err.code(), Some("ERR_INVALID_JSON"));
    assert!(err.to_string().starts_with("/app/broken.json: "));
    assert_eq!(h.system.cache_info().count, 0);
}

// ============================================================================
// Module scope
// ============================================================================

#[test]
fn test_module_bindings() {
    let h = Harness::new(&[(
        "/app/lib/info.js",
        r#"
        exports.filename = __filename;
        exports.dirname = __dirname;
        exports.id = module.id;
        exports.path = module.path;
        exports.sameExports = module.exports === exports;
        exports.thisIsExports = this === exports;
        exports.requireType = typeof require;
        exports.resolved = require.resolve('../other');
        "#,
    )]);
    let info = h.require("./lib/info");

    assert_eq!(h.get(&info, "filename"), Value::from("/app/lib/info.js"));
    assert_eq!(h.get(&info, "dirname"), Value::from("/app/lib"));
    assert_eq!(h.get(&info, "id"), Value::from("/app/lib/info.js"));
    assert_eq!(h.get(&info, "path"), Value::from("/app/lib"));
    assert_eq!(h.get(&info, "sameExports"), Value::Boolean(true));
    assert_eq!(h.get(&info, "thisIsExports"), Value::Boolean(true));
    assert_eq!(h.get(&info, "requireType"), Value::from("function"));
    assert_eq!(h.get(&info, "resolved"), Value::from("/app/other.js"));
}

#[test]
fn test_module_scope_is_private() {
    let h = Harness::new(&[
        ("/app/a.js", "var secret = 'a'; function helper() { return secret; } exports.get = helper;"),
        ("/app/b.js", "var secret = 'b'; exports.leaked = typeof helper;"),
    ]);
    let a = h.require("./a");
    let b = h.require("./b");

    assert_eq!(h.call(&a, "get", &[]), Value::from("a"));
    assert_eq!(h.get(&b, "leaked"), Value::from("undefined"));
    assert_eq!(h.system.engine().global("secret"), None);
}

#[test]
fn test_destructuring_loop_over_entries() {
    let h = Harness::new(&[(
        "/app/pairs.js",
        r#"
        const out = [];
        for (const [k, v] of Object.entries({ a: 1, b: 2 })) out.push(k + v);
        for (let { name } of [{ name: 'c' }]) out.push(name);
        exports.joined = out.join();
        "#,
    )]);
    let pairs = h.require("./pairs");

    assert_eq!(h.get(&pairs, "joined"), Value::from("a1,b2,c"));
}

#[test]
fn test_reassigning_module_exports() {
    let h = Harness::new(&[
        ("/app/fn.js", "module.exports = function greet(n) { return 'hi ' + n; };"),
        ("/app/prim.js", "module.exports = 42;"),
    ]);
    let greet = h.require("./fn");
    let result = h.system.engine().call(&greet, Value::Undefined, &["bob".into()]).unwrap();

    assert_eq!(result, Value::from("hi bob"));
    assert_eq!(h.require("./prim"), Value::Number(42.0));
}

#[test]
fn test_rebinding_exports_is_not_tracked() {
    let h = Harness::new(&[(
        "/app/rebind.js",
        "exports.kept = true; exports = { lost: true };",
    )]);
    let exports = h.require("./rebind");

    assert_eq!(h.get(&exports, "kept"), Value::Boolean(true));
    assert_eq!(h.get(&exports, "lost"), Value::Undefined);
}

#[test]
fn test_resolution_is_relative_to_requiring_module() {
    let h = Harness::new(&[
        ("/app/src/main.js", "exports.util = require('./util').where; exports.shared = require('../shared/x').where;"),
        ("/app/src/util.js", "exports.where = __filename;"),
        ("/app/shared/x.js", "exports.where = __filename;"),
    ]);
    let main = h.require("./src/main");

    assert_eq!(h.get(&main, "util"), Value::from("/app/src/util.js"));
    assert_eq!(h.get(&main, "shared"), Value::from("/app/shared/x.js"));

    let record = h.system.module(Path::new("/app/src/util.js")).unwrap();
    assert_eq!(record.requested_by(), Some(Path::new("/app/src/main.js")));
}

// ============================================================================
// Evaluation and sessions
// ============================================================================

#[test]
fn test_evaluate_inline_source() {
    let h = Harness::new(&[("/app/math.js", "exports.square = (x) => x * x;")]);
    assert_eq!(h.eval("require('./math').square(7)"), Value::Number(49.0));
    assert_eq!(h.eval("__filename"), Value::from("/app/[eval]"));
    assert_eq!(h.system.cache_info().modules, vec![PathBuf::from("/app/math.js")]);
}

#[test]
fn test_session_keeps_declarations() {
    let h = Harness::new(&[("/app/math.js", "exports.double = (x) => x * 2;")]);
    let session = h.system.session("[repl]");

    session.evaluate("const math = require('./math');").unwrap();
    session.evaluate("let total = math.double(5);").unwrap();
    assert_eq!(session.evaluate("total + 1").unwrap(), Value::Number(11.0));
    assert!(session.visible_names().iter().any(|name| &**name == "math"));

    let err = session.evaluate("undefinedThing").unwrap_err();
    assert_eq!(err.to_string(), "ReferenceError: undefinedThing is not defined");
    assert_eq!(session.evaluate("total").unwrap(), Value::Number(10.0));
}

// ============================================================================
// Sample modules
// ============================================================================

#[test]
fn test_calculator_scenario() {
    let console = Rc::new(CapturedConsole::default());
    let system = fixtures_system(console.clone());
    let engine = system.engine();

    let calculator_class = system.require("./calculator").unwrap();
    let calc = engine
        .construct(&calculator_class, &["Demo".into()])
        .unwrap();

    let sum = engine
        .call_method(&calc, "add", &[10.0.into(), 5.0.into()])
        .unwrap();
    assert_eq!(sum, Value::Number(15.0));
    let product = engine
        .call_method(&calc, "multiply", &[4.0.into(), 3.0.into()])
        .unwrap();
    assert_eq!(product, Value::Number(12.0));

    let history = engine.call_method(&calc, "getHistory", &[]).unwrap();
    let joined = engine
        .call_method(&history, "join", &["; ".into()])
        .unwrap();
    assert_eq!(joined, Value::from("10 + 5 = 15; 4 * 3 = 12"));

    let greeting = engine.call_method(&calc, "greet", &[]).unwrap();
    assert_eq!(greeting, Value::from("Hello, Demo!"));

    assert_eq!(
        console.messages(),
        vec![
            "Math module loaded",
            "Greetings module loaded",
            "Calculator module loaded",
        ]
    );

    // Requiring a dependency directly hits the cache
    system.require("./math").unwrap();
    assert_eq!(console.messages().len(), 3);
    assert_eq!(system.cache_info().count, 3);
}

#[test]
fn test_division_by_zero_is_a_script_exception() {
    let system = fixtures_system(Rc::new(CapturedConsole::default()));
    let math = system.require("./math").unwrap();

    let thrown = system
        .engine()
        .call_method(&math, "divide", &[1.0.into(), 0.0.into()])
        .unwrap_err();
    let exception = modulus_engine::Exception::from(thrown);
    assert_eq!(exception.to_string(), "Error: Division by zero");
}

#[test]
fn test_greetings_exports_shorthand() {
    let system = fixtures_system(Rc::new(CapturedConsole::default()));
    let engine = system.engine();
    let greetings = system.require("./greetings").unwrap();

    let custom = engine
        .call_method(&greetings, "customGreeting", &["Howdy".into(), "partner".into()])
        .unwrap();
    assert_eq!(custom, Value::from("Howdy, partner!"));
    let bye = engine
        .call_method(&greetings, "sayGoodbye", &["Alice".into()])
        .unwrap();
    assert_eq!(bye, Value::from("Goodbye, Alice!"));
    let list = engine.get(&greetings, "greetings").unwrap();
    assert_eq!(engine.get(&list, "length").unwrap(), Value::Number(4.0));
}

#[test]
fn test_circular_fixtures() {
    let console = Rc::new(CapturedConsole::default());
    let system = fixtures_system(console.clone());
    let engine = system.engine();

    let a = system.require("./circular-a").unwrap();
    let b = system.require("./circular-b").unwrap();

    assert_eq!(
        console.messages(),
        vec![
            "Loading module A...",
            "Loading module B...",
            "Module B loaded!",
            "Module A loaded!",
        ]
    );
    assert_eq!(engine.get(&b, "sawPartialA").unwrap(), Value::Boolean(true));
    assert_eq!(
        engine.call_method(&a, "getMessage", &[]).unwrap(),
        Value::from("Hello from Module A, working with Module B")
    );
    // B holds A's exports object, which has since been filled in
    assert_eq!(
        engine.call_method(&b, "getMessage", &[]).unwrap(),
        Value::from("Hello from Module B, working with Module A")
    );
}

#[test]
fn test_json_fixture() {
    let system = fixtures_system(Rc::new(CapturedConsole::default()));
    let engine = system.engine();
    let config = system.require("./config.json").unwrap();

    let server = engine.get(&config, "server").unwrap();
    assert_eq!(engine.get(&server, "port").unwrap(), Value::Number(3000.0));
    assert_eq!(engine.get(&config, "timeout").unwrap(), Value::Null);
    assert!(config.strict_equals(&system.require("./config.json").unwrap()));
}

#[test]
fn test_directory_relative_resolution_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("lib")).unwrap();
    std::fs::write(
        dir.path().join("main.js"),
        "module.exports = require('./lib/helper').name;",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("lib/helper.js"),
        "exports.name = require('./name.json').value;",
    )
    .unwrap();
    std::fs::write(dir.path().join("lib/name.json"), r#"{ "value": "nested" }"#).unwrap();

    let config = LoaderConfig {
        base_dir: Some(dir.path().to_path_buf()),
        ..LoaderConfig::default()
    };
    let system = ModuleSystem::builder(config)
        .console(Rc::new(CapturedConsole::default()))
        .build()
        .unwrap();

    assert_eq!(system.require("./main").unwrap(), Value::from("nested"));
    assert_eq!(system.cache_info().count, 3);
}
