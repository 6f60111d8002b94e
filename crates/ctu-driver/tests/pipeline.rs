// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! End-to-end runs of the compilation pipeline.

use ctu_diagnostics::Severity;
use ctu_driver::{compile, Compilation, Config};
use ctu_ssa::Value;
use ctu_tree::{
    BinaryOp, DeclId, Digit, Expr, Function, Global, Module, Sign, Span, Stmt, Type, Visibility,
};

fn public_global(id: u32, name: &str, init: Expr) -> Global {
    Global::new(DeclId(id), name, init.ty.clone(), Some(init)).with_visibility(Visibility::Public)
}

fn call(id: u32) -> Stmt {
    let callee = Expr::function(DeclId(id), Type::closure(Type::Void, vec![]));
    Stmt::expr(Expr::call(callee, vec![]))
}

/// `main` calls `helper`; `unused` is private and never called.
fn program() -> Module {
    let main = Function::new(DeclId(10), "main", Type::Void, Some(Stmt::block(vec![call(11)])))
        .with_visibility(Visibility::EntryPoint);
    let helper = Function::new(DeclId(11), "helper", Type::Void, Some(Stmt::block(vec![])));
    let unused = Function::new(DeclId(12), "unused", Type::Void, Some(Stmt::block(vec![])));
    let sum = Expr::binary(BinaryOp::Add, Expr::int(4), Expr::int(5), Type::int());
    Module::new("main")
        .with_function(main)
        .with_function(helper)
        .with_function(unused)
        .with_global(public_global(0, "x", sum))
}

fn global_value(c: &Compilation, name: &str) -> Option<Value> {
    let id = c.module.find_global(name)?;
    c.module.flow(id)?.cached_value().cloned()
}

#[test]
fn clean_program() {
    let c = compile(&[program()], &Config::default());
    assert!(!c.should_halt(), "{:?}", c.reports);
    assert!(c.reports.is_empty());
    assert_eq!(c.poisoned, 0);
    assert_eq!(global_value(&c, "x"), Some(Value::digit(9, Type::int())));

    assert!(c.module.find_function("main").is_some());
    assert!(c.module.find_function("helper").is_some());
    assert!(c.module.find_function("unused").is_none());

    let stats = c.stats.unwrap();
    assert!(stats.converged);
    assert_eq!(stats.flows, 1);

    let dump = c.module.to_string();
    assert!(dump.contains("global @x: int"));
    assert!(!dump.contains("@unused"));
}

#[test]
fn division_by_zero_halts_after_all_stages() {
    let source = "var y = 7 / 0;\nvar z = 1;\n";
    let div = Expr::binary(BinaryOp::Div, Expr::int(7), Expr::int(0), Type::int())
        .at(Span::new(8, 13));
    let m = Module::new("consts")
        .with_global(public_global(0, "y", div))
        .with_global(public_global(1, "z", Expr::int(1)));

    let c = compile(&[m], &Config::default());
    assert!(c.should_halt());
    assert_eq!(c.poisoned, 1);
    assert_eq!(global_value(&c, "z"), Some(Value::digit(1, Type::int())));
    assert!(c.stats.is_some());

    colored::control::set_override(false);
    let text = c.render(source, "consts.ct");
    assert!(text.starts_with("error[E0200]: division by zero"), "{}", text);
    assert!(text.contains("--> consts.ct:1:9"), "{}", text);

    let report = c.json_report(source, "consts.ct");
    assert!(!report.success);
    assert_eq!(report.error_count, 1);
    let json = ctu_diagnostics::json::to_json_string(&report);
    assert!(json.contains("\"code\": \"E0200\""), "{}", json);
}

#[test]
fn warnings_do_not_halt() {
    let char_ty = Type::digit(Digit::Char, Sign::Signed);
    let m = Module::new("m").with_global(public_global(0, "c", Expr::digit(200, char_ty)));
    let c = compile(&[m], &Config::default());
    assert!(!c.should_halt());
    assert_eq!(c.reports.count(Severity::Warning), 1);
}

#[test]
fn stages_can_be_switched_off() {
    let config = Config::from_json_str(r#"{ "evaluate_globals": false, "optimize": false }"#).unwrap();
    let c = compile(&[program()], &config);
    assert!(c.reports.is_empty());
    assert!(c.stats.is_none());
    assert_eq!(global_value(&c, "x"), None);
    assert!(c.module.find_function("unused").is_some());
}

#[test]
fn cycle_limit_is_fatal() {
    let config = Config {
        max_opt_cycles: Some(1),
        ..Config::default()
    };
    let c = compile(&[program()], &config);
    let stats = c.stats.unwrap();
    assert!(!stats.converged);
    assert_eq!(stats.cycles, 1);
    assert_eq!(c.reports.count(Severity::Internal), 1);
    assert!(c.should_halt());
}

#[test]
fn malformed_input_is_reported_not_fatal_to_the_run() {
    let broken = Function::new(
        DeclId(20),
        "broken",
        Type::Void,
        Some(Stmt::block(vec![
            Stmt::expr(Expr::error("unresolved name `q`")),
            call(99),
        ])),
    )
    .with_visibility(Visibility::Public);
    let m = program().with_function(broken);

    let c = compile(&[m], &Config::default());
    assert!(c.should_halt());
    assert_eq!(c.reports.count(Severity::Internal), 2);
    // the rest of the program still went through every stage
    assert_eq!(global_value(&c, "x"), Some(Value::digit(9, Type::int())));
    assert!(c.module.find_function("unused").is_none());
}

#[test]
fn modules_share_one_namespace() {
    let a = Module::new("a").with_global(public_global(
        0,
        "base",
        Expr::int(40),
    ));
    let read = Expr::load(Expr::global(DeclId(0), Type::int()));
    let b = Module::new("b").with_global(public_global(
        1,
        "answer",
        Expr::binary(BinaryOp::Add, read, Expr::int(2), Type::int()),
    ));
    let c = compile(&[a, b], &Config::default());
    assert!(c.reports.is_empty(), "{:?}", c.reports);
    assert_eq!(global_value(&c, "answer"), Some(Value::digit(42, Type::int())));
}
