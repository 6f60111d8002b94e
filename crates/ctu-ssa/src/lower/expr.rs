// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Expression lowering.
//!
//! Expressions never open blocks, so they take the block to append to by
//! value; only statements move the cursor.

use ctu_tree::{Expr, ExprKind, Type};

use super::{LowerError, Lowerer};
use crate::{BlockId, Operand, StepKind, Value};

impl Lowerer<'_> {
    /// Lower an expression for its value.
    pub(super) fn rvalue(&mut self, expr: &Expr, block: BlockId) -> Operand {
        match &expr.kind {
            ExprKind::Digit(n) => Operand::Imm(Value::digit(n.clone(), expr.ty.clone())),
            ExprKind::Bool(b) => Operand::Imm(Value::bool(*b).retag(expr.ty.clone())),
            ExprKind::String(s) => Operand::Imm(Value::string(s.as_str()).retag(expr.ty.clone())),

            // By identity: naming a global or function is not reading it.
            ExprKind::Global(_) | ExprKind::Function(_) | ExprKind::Local(_) => self.reference(expr),

            ExprKind::Param(index) => self.param(*index, expr),

            ExprKind::Load(storage) => {
                let src = self.lvalue(storage, block);
                self.emit(block, StepKind::Load { src }, expr)
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.rvalue(operand, block);
                self.emit(block, StepKind::Unary { op: *op, operand }, expr)
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.rvalue(lhs, block);
                let rhs = self.rvalue(rhs, block);
                self.emit(block, StepKind::Binary { op: *op, lhs, rhs }, expr)
            }

            ExprKind::Compare { op, lhs, rhs } => {
                let lhs = self.rvalue(lhs, block);
                let rhs = self.rvalue(rhs, block);
                self.emit(block, StepKind::Compare { op: *op, lhs, rhs }, expr)
            }

            ExprKind::Cast(operand) => {
                let operand = self.rvalue(operand, block);
                self.emit(block, StepKind::Cast { operand }, expr)
            }

            ExprKind::Call { callee, args } => {
                let callee = self.rvalue(callee, block);
                let args = args.iter().map(|arg| self.rvalue(arg, block)).collect();
                self.emit(block, StepKind::Call { callee, args }, expr)
            }

            ExprKind::Index { .. } => {
                let src = self.lvalue(expr, block);
                self.emit(block, StepKind::Load { src }, expr)
            }

            ExprKind::Array(elements) => self.array_literal(elements, expr, block),

            ExprKind::Error(message) => self.fail(
                LowerError::Unresolved {
                    message: message.clone(),
                    span: expr.span,
                },
                &expr.ty,
            ),
        }
    }

    /// Lower an expression for its storage. Only globals, locals and
    /// array elements can be written.
    pub(super) fn lvalue(&mut self, expr: &Expr, block: BlockId) -> Operand {
        match &expr.kind {
            ExprKind::Global(_) | ExprKind::Local(_) => self.reference(expr),

            ExprKind::Index { array, index } => {
                let array = self.rvalue(array, block);
                let index = self.rvalue(index, block);
                self.emit(block, StepKind::Offset { array, index }, expr)
            }

            _ => self.fail(
                LowerError::InvalidLvalue {
                    kind: expr.kind_name(),
                    span: expr.span,
                },
                &expr.ty,
            ),
        }
    }

    /// Resolve a declaration reference to its operand.
    fn reference(&mut self, expr: &Expr) -> Operand {
        match &expr.kind {
            ExprKind::Global(decl) => match self.globals.get(decl) {
                Some(id) => Operand::Global(*id),
                None => self.fail(
                    LowerError::UndeclaredFlow {
                        what: "global",
                        decl: *decl,
                        span: expr.span,
                    },
                    &expr.ty,
                ),
            },

            ExprKind::Function(decl) => match self.functions.get(decl) {
                Some(id) => Operand::Function(*id),
                None => self.fail(
                    LowerError::UndeclaredFlow {
                        what: "function",
                        decl: *decl,
                        span: expr.span,
                    },
                    &expr.ty,
                ),
            },

            ExprKind::Local(decl) => match self.locals.get(decl) {
                Some(slot) => Operand::Local(*slot),
                None => {
                    let function = self.flow_name();
                    self.fail(
                        LowerError::UndeclaredLocal {
                            decl: *decl,
                            function,
                            span: expr.span,
                        },
                        &expr.ty,
                    )
                }
            },

            _ => self.fail(
                LowerError::UnexpectedNode {
                    kind: expr.kind_name(),
                    context: "reference",
                    span: expr.span,
                },
                &expr.ty,
            ),
        }
    }

    fn param(&mut self, index: usize, expr: &Expr) -> Operand {
        if !self.in_function {
            return self.fail(
                LowerError::UnexpectedNode {
                    kind: "parameter",
                    context: "global initializer",
                    span: expr.span,
                },
                &expr.ty,
            );
        }
        let count = self.builder.flow().params.len();
        if index >= count {
            let function = self.flow_name();
            return self.fail(
                LowerError::ParamOutOfRange {
                    index,
                    count,
                    function,
                    span: expr.span,
                },
                &expr.ty,
            );
        }
        Operand::Param(index)
    }

    /// `[a, b, c]`: reserve storage, then store each element through its offset.
    fn array_literal(&mut self, elements: &[Expr], expr: &Expr, block: BlockId) -> Operand {
        let storage = self.emit(
            block,
            StepKind::Reserve {
                count: elements.len(),
            },
            expr,
        );
        let element_ty = expr.ty.element().cloned().unwrap_or(Type::Void);

        for (i, element) in elements.iter().enumerate() {
            let src = self.rvalue(element, block);
            let dst = self.builder.push(
                block,
                StepKind::Offset {
                    array: storage.clone(),
                    index: Operand::Imm(Value::index(i)),
                },
                element_ty.clone(),
                element.span,
            );
            self.builder
                .push(block, StepKind::Store { dst, src }, Type::Void, element.span);
        }

        storage
    }

    /// Append a step typed and located like `expr`.
    fn emit(&mut self, block: BlockId, kind: StepKind, expr: &Expr) -> Operand {
        self.builder.push(block, kind, expr.ty.clone(), expr.span)
    }
}

#[cfg(test)]
mod tests {
    use crate::lower::lower_modules;
    use crate::{Operand, StepKind};
    use ctu_diagnostics::{Reports, Severity};
    use ctu_tree::{BinaryOp, DeclId, Expr, Global, Module, Type};

    fn lower_init(init: Expr) -> (crate::SsaModule, Reports) {
        let m = Module::new("m").with_global(Global::new(DeclId(0), "g", init.ty.clone(), Some(init)));
        let mut reports = Reports::new();
        let module = lower_modules(&[m], &mut reports);
        (module, reports)
    }

    #[test]
    fn nested_binary_registers() {
        let inner = Expr::binary(BinaryOp::Mul, Expr::int(2), Expr::int(3), Type::int());
        let (module, reports) = lower_init(Expr::binary(BinaryOp::Add, Expr::int(1), inner, Type::int()));
        assert!(reports.is_empty());
        let steps = &module.flows[0].as_ref().unwrap().blocks[0].steps;
        assert_eq!(steps.len(), 3);
        match &steps[1].kind {
            StepKind::Binary { rhs: Operand::Reg(r), .. } => assert_eq!(r.index, 0),
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn array_literal_reserves_then_stores() {
        let (module, reports) =
            lower_init(Expr::array(Type::int(), vec![Expr::int(1), Expr::int(2)]));
        assert!(reports.is_empty());
        let names: Vec<_> = module.flows[0].as_ref().unwrap().blocks[0]
            .steps
            .iter()
            .map(|s| s.kind.name())
            .collect();
        assert_eq!(names, ["reserve", "offset", "store", "offset", "store", "ret"]);
    }

    #[test]
    fn parameter_in_global_is_internal() {
        let (module, reports) = lower_init(Expr::param(0, Type::int()));
        assert_eq!(reports.count(Severity::Internal), 1);
        let steps = &module.flows[0].as_ref().unwrap().blocks[0].steps;
        assert!(matches!(&steps[0].kind, StepKind::Return { value } if value.is_poison()));
    }

    #[test]
    fn load_of_literal_is_not_assignable() {
        let (_, reports) = lower_init(Expr::load(Expr::int(1)));
        assert!(reports.matching("digit literal expression is not assignable").next().is_some());
    }
}
