// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Lowering - typed tree to SSA flows.
//!
//! Two passes. The forward pass allocates an empty flow for every global and
//! function of every module, so references resolve regardless of declaration
//! order. The compile pass then fills each flow with blocks and steps.
//!
//! Lowering never stops on a malformed node: the problem is reported as an
//! internal diagnostic and a poison immediate stands in for the node.

mod expr;
mod stmt;

use std::collections::HashMap;

use ctu_diagnostics::{codes, Diagnostic, DiagnosticSink, ToDiagnostic};
use ctu_tree::{DeclId, Function, Global, Module, Span, Type};
use indexmap::IndexMap;
use thiserror::Error;

use crate::{BlockId, Flow, FlowBuilder, FlowId, FlowKind, Operand, SsaModule, StepKind, Value};

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("unexpected {kind} node in {context}")]
    UnexpectedNode {
        kind: &'static str,
        context: &'static str,
        span: Span,
    },

    #[error("{kind} expression is not assignable")]
    InvalidLvalue { kind: &'static str, span: Span },

    #[error("reference to undeclared {what} {decl}")]
    UndeclaredFlow {
        what: &'static str,
        decl: DeclId,
        span: Span,
    },

    #[error("local {decl} is not declared in `{function}`")]
    UndeclaredLocal {
        decl: DeclId,
        function: String,
        span: Span,
    },

    #[error("parameter {index} out of range: `{function}` takes {count}")]
    ParamOutOfRange {
        index: usize,
        count: usize,
        function: String,
        span: Span,
    },

    #[error("{decl} declared twice")]
    DuplicateDecl { decl: DeclId, first: Span, span: Span },

    #[error("unresolved node: {message}")]
    Unresolved { message: String, span: Span },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::UnexpectedNode { span, .. }
            | LowerError::InvalidLvalue { span, .. }
            | LowerError::UndeclaredFlow { span, .. }
            | LowerError::UndeclaredLocal { span, .. }
            | LowerError::ParamOutOfRange { span, .. }
            | LowerError::DuplicateDecl { span, .. }
            | LowerError::Unresolved { span, .. } => *span,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            LowerError::UnexpectedNode { .. } => codes::UNEXPECTED_NODE,
            LowerError::InvalidLvalue { .. } => codes::INVALID_LVALUE,
            LowerError::UndeclaredFlow { .. }
            | LowerError::UndeclaredLocal { .. }
            | LowerError::ParamOutOfRange { .. }
            | LowerError::DuplicateDecl { .. } => codes::UNDECLARED_FLOW,
            LowerError::Unresolved { .. } => codes::UNRESOLVED_NODE,
        }
    }
}

impl ToDiagnostic for LowerError {
    // Everything lowering can trip over was supposed to be rejected by
    // semantic analysis, so it is a compiler bug rather than a user error.
    fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::internal(self.to_string())
            .with_code(self.code())
            .at(Some(self.span()));
        match self {
            LowerError::DuplicateDecl { first, .. } if !first.is_dummy() => {
                diagnostic.with_secondary(*first, "first declared here")
            }
            _ => diagnostic,
        }
    }
}

/// Lower every module into one SSA module.
pub fn lower_modules(modules: &[Module], sink: &mut dyn DiagnosticSink) -> SsaModule {
    let mut module = SsaModule::new();

    // Forward pass: every flow exists before anything is compiled.
    for tree in modules {
        for decl in &tree.types {
            module.types.push((decl.name.clone(), decl.ty.clone()));
        }
        for global in &tree.globals {
            let mut flow = Flow::new(FlowKind::Global, &global.name, global.ty.clone(), global.visibility);
            flow.span = global.span;
            let id = module.add_flow(flow);
            // The first declaration keeps its slot.
            if let Some(&existing) = module.globals.get(&global.id) {
                let first = module.flow(existing).map_or(Span::DUMMY, |f| f.span);
                sink.emit(&LowerError::DuplicateDecl {
                    decl: global.id,
                    first,
                    span: global.span,
                });
            } else {
                module.globals.insert(global.id, id);
            }
        }
        for function in &tree.functions {
            let mut flow = Flow::new(
                FlowKind::Function,
                &function.name,
                function.ty.clone(),
                function.visibility,
            );
            flow.span = function.span;
            flow.params = function.params.iter().map(|p| p.ty.clone()).collect();
            flow.locals = function.locals.iter().map(|l| l.ty.clone()).collect();
            let id = module.add_flow(flow);
            if let Some(&existing) = module.functions.get(&function.id) {
                let first = module.flow(existing).map_or(Span::DUMMY, |f| f.span);
                sink.emit(&LowerError::DuplicateDecl {
                    decl: function.id,
                    first,
                    span: function.span,
                });
            } else {
                module.functions.insert(function.id, id);
            }
        }
    }

    // Compile pass.
    let mut next = 0usize;
    for tree in modules {
        for global in &tree.globals {
            compile_global(&mut module, FlowId(next as u32), global, sink);
            next += 1;
        }
        for function in &tree.functions {
            compile_function(&mut module, FlowId(next as u32), function, sink);
            next += 1;
        }
    }

    module
}

fn compile_global(module: &mut SsaModule, id: FlowId, global: &Global, sink: &mut dyn DiagnosticSink) {
    let SsaModule {
        flows,
        globals,
        functions,
        ..
    } = module;
    let Some(flow) = flows.get_mut(id.index()).and_then(Option::as_mut) else {
        return;
    };

    let mut lowerer = Lowerer {
        builder: FlowBuilder::new(flow),
        globals,
        functions,
        locals: HashMap::new(),
        in_function: false,
        sink,
    };

    let value = match &global.init {
        Some(init) => lowerer.rvalue(init, BlockId::ENTRY),
        None => Operand::Empty,
    };
    lowerer.builder.push(
        BlockId::ENTRY,
        StepKind::Return { value },
        global.ty.clone(),
        global.span,
    );

    log::debug!(
        "[Lower] global `{}`: {} steps",
        global.name,
        lowerer.builder.flow().live_steps()
    );
}

fn compile_function(
    module: &mut SsaModule,
    id: FlowId,
    function: &Function,
    sink: &mut dyn DiagnosticSink,
) {
    let Some(body) = &function.body else {
        log::debug!("[Lower] function `{}` has no body", function.name);
        return;
    };
    let SsaModule {
        flows,
        globals,
        functions,
        ..
    } = module;
    let Some(flow) = flows.get_mut(id.index()).and_then(Option::as_mut) else {
        return;
    };

    let mut lowerer = Lowerer {
        builder: FlowBuilder::new(flow),
        globals,
        functions,
        locals: function
            .locals
            .iter()
            .enumerate()
            .map(|(slot, local)| (local.id, slot))
            .collect(),
        in_function: true,
        sink,
    };

    let mut cursor = BlockId::ENTRY;
    lowerer.stmt(body, &mut cursor);

    // Falling off the end returns nothing.
    if lowerer.builder.falls_through(cursor) {
        lowerer.builder.push(
            cursor,
            StepKind::Return {
                value: Operand::Empty,
            },
            function.result().clone(),
            function.span,
        );
    }

    let flow = lowerer.builder.flow();
    log::debug!(
        "[Lower] function `{}`: {} blocks, {} steps",
        function.name,
        flow.blocks.len(),
        flow.live_steps()
    );
}

/// Per-flow lowering state.
struct Lowerer<'a> {
    builder: FlowBuilder<'a>,
    globals: &'a IndexMap<DeclId, FlowId>,
    functions: &'a IndexMap<DeclId, FlowId>,
    /// Local declaration to slot index.
    locals: HashMap<DeclId, usize>,
    in_function: bool,
    sink: &'a mut dyn DiagnosticSink,
}

impl Lowerer<'_> {
    /// Report `error` and return the poison operand that replaces the node.
    fn fail(&mut self, error: LowerError, ty: &Type) -> Operand {
        let message = error.to_string();
        self.sink.emit(&error);
        Operand::Imm(Value::poison(message, ty.clone()))
    }

    fn flow_name(&self) -> String {
        self.builder.flow().name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctu_diagnostics::{Reports, Severity};
    use ctu_tree::{Expr, Stmt};

    #[test]
    fn duplicate_declarations_are_internal() {
        let g = Global::new(DeclId(1), "a", Type::int(), Some(Expr::int(1)));
        let m = Module::new("m").with_global(g.clone()).with_global(g);
        let mut reports = Reports::new();
        lower_modules(&[m], &mut reports);
        assert_eq!(reports.count(Severity::Internal), 1);
        assert!(reports.matching("declared twice").next().is_some());
    }

    #[test]
    fn duplicate_declaration_keeps_first_slot() {
        let mut first = Global::new(DeclId(1), "a", Type::int(), Some(Expr::int(1)));
        first.span = Span::new(0, 5);
        let mut second = Global::new(DeclId(1), "b", Type::int(), Some(Expr::int(2)));
        second.span = Span::new(10, 15);
        let m = Module::new("m").with_global(first).with_global(second);
        let mut reports = Reports::new();
        let module = lower_modules(&[m], &mut reports);
        assert_eq!(reports.count(Severity::Internal), 1);
        assert_eq!(module.global_flow(DeclId(1)), Some(FlowId(0)));
        assert_eq!(module.flow(FlowId(0)).unwrap().name, "a");

        let labels = &reports.diagnostics()[0].labels;
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].span, Span::new(10, 15));
        assert_eq!(labels[1].span, Span::new(0, 5));
        assert_eq!(labels[1].message.as_deref(), Some("first declared here"));
    }

    #[test]
    fn function_without_body_has_no_blocks() {
        let f = Function::new(DeclId(1), "puts", Type::Void, None);
        let g = Function::new(DeclId(2), "main", Type::Void, Some(Stmt::block(vec![])));
        let m = Module::new("m").with_function(f).with_function(g);
        let mut reports = Reports::new();
        let module = lower_modules(&[m], &mut reports);
        assert!(reports.is_empty());
        let puts = module.find_function("puts").unwrap();
        assert!(module.flow(puts).unwrap().blocks.is_empty());
        let main = module.find_function("main").unwrap();
        assert_eq!(module.flow(main).unwrap().live_steps(), 1);
    }

    #[test]
    fn types_are_collected() {
        let m = Module::new("m").with_type("word", Type::uint());
        let module = lower_modules(&[m], &mut Reports::new());
        assert_eq!(module.types, vec![("word".to_string(), Type::uint())]);
    }
}
