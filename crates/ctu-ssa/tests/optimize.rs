// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Dead-code elimination over lowered modules.

use ctu_diagnostics::{Reports, Severity};
use ctu_ssa::{
    lower_modules, optimize, optimize_bounded, validate_module, FlowId, SsaModule, StepKind,
};
use ctu_tree::{DeclId, Expr, Function, Global, Module, Stmt, Type, Visibility};

fn lower(m: Module) -> SsaModule {
    let mut reports = Reports::new();
    let module = lower_modules(&[m], &mut reports);
    assert!(reports.is_empty(), "{:?}", reports);
    module
}

fn void_fn(id: u32, name: &str, body: Vec<Stmt>) -> Function {
    Function::new(DeclId(id), name, Type::Void, Some(Stmt::block(body)))
}

fn call(id: u32) -> Stmt {
    let callee = Expr::function(DeclId(id), Type::closure(Type::Void, vec![]));
    Stmt::expr(Expr::call(callee, vec![]))
}

fn pick() -> Module {
    let body = Stmt::branch(
        Expr::param(0, Type::Bool),
        Stmt::ret(Some(Expr::int(1))),
        Some(Stmt::ret(Some(Expr::int(2)))),
    );
    let f = Function::new(DeclId(0), "pick", Type::int(), Some(body))
        .with_param("c", Type::Bool)
        .with_visibility(Visibility::Public);
    Module::new("m").with_function(f)
}

/// Every surviving flow is reachable from a root.
fn assert_no_orphans(module: &SsaModule) {
    let mut seen: Vec<FlowId> = module
        .live_flows()
        .filter(|(_, f)| f.visibility.is_root())
        .map(|(id, _)| id)
        .collect();
    let mut i = 0;
    while i < seen.len() {
        let flow = module.flow(seen[i]).unwrap();
        for step in flow.blocks.iter().flat_map(|b| &b.steps) {
            if step.is_nop() {
                continue;
            }
            for target in step.kind.operands().into_iter().filter_map(|o| o.flow()) {
                if !seen.contains(&target) {
                    seen.push(target);
                }
            }
        }
        i += 1;
    }
    for (id, flow) in module.live_flows() {
        assert!(seen.contains(&id), "`{}` survived without a reference", flow.name);
    }
}

/// No live step follows a terminator within one block.
fn assert_nothing_after_terminators(module: &SsaModule) {
    for (_, flow) in module.live_flows() {
        for block in &flow.blocks {
            let mut ended = false;
            for step in &block.steps {
                if step.is_nop() {
                    continue;
                }
                assert!(!ended, "live {} after terminator in `{}`", step.kind.name(), flow.name);
                ended = step.kind.is_terminator();
            }
        }
    }
}

#[test]
fn uncalled_private_function_is_removed() {
    let m = Module::new("m")
        .with_function(void_fn(0, "main", vec![]).with_visibility(Visibility::EntryPoint))
        .with_function(void_fn(1, "f", vec![]));
    let mut module = lower(m);
    assert!(module.find_function("f").is_some());

    let stats = optimize(&mut module);
    assert!(module.find_function("f").is_none());
    assert!(module.find_function("main").is_some());
    assert_eq!(stats.flows, 1);
    assert!(stats.converged);
}

#[test]
fn reachability_is_transitive() {
    let seed = Global::new(DeclId(9), "seed", Type::int(), Some(Expr::int(1)));
    let orphan = Global::new(DeclId(8), "orphan", Type::int(), Some(Expr::int(2)));
    let read_seed = Stmt::assign(
        Expr::local(DeclId(20), Type::int()),
        Expr::load(Expr::global(DeclId(9), Type::int())),
    );
    let m = Module::new("m")
        .with_global(seed)
        .with_global(orphan)
        .with_function(void_fn(0, "main", vec![call(1)]).with_visibility(Visibility::Public))
        .with_function(void_fn(1, "a", vec![call(2)]))
        .with_function(void_fn(2, "b", vec![read_seed]).with_local(DeclId(20), "t", Type::int()))
        .with_function(void_fn(3, "c", vec![call(3)]));
    let mut module = lower(m);
    optimize(&mut module);

    for name in ["main", "a", "b"] {
        assert!(module.find_function(name).is_some(), "{} removed", name);
    }
    assert!(module.find_global("seed").is_some());
    // self-recursion alone does not keep a function alive
    assert!(module.find_function("c").is_none());
    assert!(module.find_global("orphan").is_none());
    assert_no_orphans(&module);
}

#[test]
fn jumps_after_returns_are_neutralized() {
    let mut module = lower(pick());
    let stats = optimize(&mut module);

    let flow = module.flow(module.find_function("pick").unwrap()).unwrap();
    for arm in [1, 2] {
        let steps = &flow.blocks[arm].steps;
        assert!(matches!(steps[0].kind, StepKind::Label));
        assert!(matches!(steps[1].kind, StepKind::Return { .. }));
        assert!(steps[2].is_nop());
    }
    // nothing jumps to the tail any more, so it goes too
    assert!(flow.blocks[3].steps.iter().all(|s| s.is_nop()));
    assert_eq!(stats.steps, 3);
    assert_eq!(stats.labels, 1);
    assert_eq!(stats.cycles, 3);
    assert_nothing_after_terminators(&module);
}

#[test]
fn callee_of_dead_call_goes_in_the_same_run() {
    let m = Module::new("m")
        .with_function(
            void_fn(0, "main", vec![Stmt::ret(None), call(1)]).with_visibility(Visibility::Public),
        )
        .with_function(void_fn(1, "helper", vec![]));
    let mut module = lower(m);
    let stats = optimize(&mut module);
    assert!(module.find_function("helper").is_none());
    // the one cycle that found the dead call also dropped the callee
    assert_eq!(stats.cycles, 2);
}

#[test]
fn second_run_changes_nothing() {
    let m = pick()
        .with_function(void_fn(5, "unused", vec![call(5)]))
        .with_global(Global::new(DeclId(6), "g", Type::int(), Some(Expr::int(3))));
    let mut module = lower(m);
    assert!(optimize(&mut module).changed());

    let before = module.to_string();
    let again = optimize(&mut module);
    assert!(!again.changed());
    assert_eq!(again.cycles, 1);
    assert_eq!(module.to_string(), before);
}

#[test]
fn optimized_module_still_validates() {
    let mut module = lower(pick().with_function(void_fn(1, "g", vec![call(0)])));
    optimize(&mut module);
    let mut reports = Reports::new();
    assert_eq!(validate_module(&module, &mut reports), 0);
    assert_no_orphans(&module);
    assert_nothing_after_terminators(&module);
}

#[test]
fn cycle_limit_is_reported() {
    let mut module = lower(pick());
    let mut reports = Reports::new();
    let stats = optimize_bounded(&mut module, 1, &mut reports);
    assert!(!stats.converged);
    assert_eq!(reports.count(Severity::Internal), 1);

    let mut reports = Reports::new();
    let stats = optimize_bounded(&mut module, 10, &mut reports);
    assert!(stats.converged);
    assert!(reports.is_empty());
}

#[test]
fn dump_shows_surviving_steps() {
    let mut module = lower(pick());
    optimize(&mut module);
    let dump = module.to_string();
    assert!(dump.starts_with("fn @pick: fn(bool) -> int {\n"));
    assert!(dump.contains("  branch $param0 .then1 .other2\n"));
    assert!(dump.contains(".then1:\n  ret int 1\n"));
    assert!(!dump.contains("jmp"));
    assert!(!dump.contains(".tail3"));
}
