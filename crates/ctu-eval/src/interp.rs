// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Step interpreter for a single flow.

use ctu_ssa::{ArrayRef, BlockId, Flow, Operand, Step, StepKind, Value, ValueKind};
use ctu_tree::{BinaryOp, CompareOp, Span, Type, UnaryOp};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{check_range, EvalError, EvalResult, Evaluator};

/// One register per step, per block. `None` until the step has run.
type Registers = Vec<Vec<Option<Value>>>;

impl Evaluator<'_, '_> {
    /// Interpret `flow` from its entry block until it returns.
    pub(crate) fn run(&mut self, flow: &Flow) -> Value {
        let mut registers: Registers = flow
            .blocks
            .iter()
            .map(|b| vec![None; b.steps.len()])
            .collect();
        let mut block = BlockId::ENTRY;
        let mut index = 0usize;
        let mut backward = 0usize;

        loop {
            let Some(step) = flow.block(block).and_then(|b| b.steps.get(index)) else {
                return self.fail(EvalError::FellOffEnd, Some(flow.span), flow.ty.clone());
            };
            let at = index;
            index += 1;
            log::trace!("[Eval] `{}` {}.{}: {}", flow.name, block.0, at, step.kind.name());

            let next = match &step.kind {
                StepKind::Label | StepKind::Nop => continue,
                StepKind::Return { value } => return self.finish(flow, &registers, value, step),
                StepKind::Jump { target } => target,
                StepKind::Branch { cond, then, other } => {
                    let cond = self.operand(&registers, cond, step.span);
                    if cond.is_poison() {
                        return cond.retag(flow.ty.clone());
                    }
                    match cond.as_bool() {
                        Some(true) => then,
                        Some(false) => other,
                        None => {
                            let error = invalid("branch", &cond);
                            return self.fail(error, Some(step.span), flow.ty.clone());
                        }
                    }
                }
                _ => {
                    let value = match self.exec(&registers, step) {
                        Ok(value) => value,
                        Err(error) => self.fail(error, Some(step.span), step.ty.clone()),
                    };
                    registers[block.index()][at] = Some(value);
                    continue;
                }
            };

            match next {
                Operand::Block(target) if target.index() < flow.blocks.len() => {
                    if *target <= block {
                        backward += 1;
                        if backward > self.options.branch_quota {
                            let error = EvalError::BranchQuotaExceeded(self.options.branch_quota);
                            return self.fail(error, Some(step.span), flow.ty.clone());
                        }
                    }
                    block = *target;
                    index = 0;
                }
                _ => {
                    return self.fail(EvalError::UnresolvedTarget, Some(step.span), flow.ty.clone());
                }
            }
        }
    }

    /// The value a `Return` hands back, range-checked against its type.
    fn finish(&mut self, flow: &Flow, registers: &Registers, value: &Operand, step: &Step) -> Value {
        if matches!(value, Operand::Empty) {
            return self.fail(EvalError::NoInitializer, Some(flow.span), flow.ty.clone());
        }
        let value = self.operand(registers, value, step.span);
        if let Some(warning) = check_range(&value) {
            self.fail(warning, Some(step.span), value.ty.clone());
        }
        value
    }

    /// Execute a value-producing step.
    fn exec(&mut self, registers: &Registers, step: &Step) -> EvalResult<Value> {
        let ty = step.ty.clone();
        match &step.kind {
            StepKind::Unary { op, operand } => {
                let operand = self.operand(registers, operand, step.span);
                unary(*op, &operand, ty)
            }
            StepKind::Binary { op, lhs, rhs } => {
                let lhs = self.operand(registers, lhs, step.span);
                let rhs = self.operand(registers, rhs, step.span);
                binary(*op, &lhs, &rhs, ty)
            }
            StepKind::Compare { op, lhs, rhs } => {
                let lhs = self.operand(registers, lhs, step.span);
                let rhs = self.operand(registers, rhs, step.span);
                compare(*op, &lhs, &rhs, ty)
            }
            StepKind::Load { src } => self.load(registers, src, step),
            StepKind::Store { dst, src } => {
                let dst = self.operand(registers, dst, step.span);
                let src = self.operand(registers, src, step.span);
                store(&dst, src)
            }
            StepKind::Offset { array, index } => {
                let array = self.operand(registers, array, step.span);
                let index = self.operand(registers, index, step.span);
                offset(&array, &index)
            }
            StepKind::Reserve { count } => Ok(Value::array(ArrayRef::reserve(*count), ty)),
            StepKind::Call { .. } => Err(EvalError::NonConstantCall),
            StepKind::Cast { operand } => Ok(self.operand(registers, operand, step.span).retag(ty)),
            StepKind::Jump { .. }
            | StepKind::Branch { .. }
            | StepKind::Return { .. }
            | StepKind::Label
            | StepKind::Nop => Err(EvalError::InvalidOperand {
                step: step.kind.name(),
                found: "control".to_string(),
            }),
        }
    }

    fn load(&mut self, registers: &Registers, src: &Operand, step: &Step) -> EvalResult<Value> {
        match src {
            Operand::Global(id) => return Ok(self.evaluate(*id)),
            Operand::Local(slot) => return Err(EvalError::NonConstantRead(format!("local {}", slot))),
            Operand::Param(n) => return Err(EvalError::NonConstantRead(format!("parameter {}", n))),
            Operand::Function(_) => {
                return Err(EvalError::NonConstantRead("a function".to_string()))
            }
            _ => {}
        }

        let value = self.operand(registers, src, step.span);
        match &value.kind {
            ValueKind::Array(view) => {
                if !view.in_bounds() {
                    return Err(EvalError::OutOfBounds {
                        index: BigInt::from(view.offset),
                        len: view.len(),
                    });
                }
                view.get().ok_or(EvalError::Uninitialized)
            }
            ValueKind::String(_) | ValueKind::Poison(_) => Ok(value),
            _ => Err(invalid("load", &value)),
        }
    }

    /// Resolve an operand to a value. Failures are reported here and come
    /// back as poison.
    fn operand(&mut self, registers: &Registers, operand: &Operand, span: Span) -> Value {
        let result = match operand {
            Operand::Imm(value) => Ok(value.clone()),
            Operand::Reg(reg) => registers
                .get(reg.block.index())
                .and_then(|b| b.get(reg.index as usize))
                .cloned()
                .flatten()
                .ok_or(EvalError::UndefinedRegister {
                    block: reg.block.0,
                    index: reg.index,
                }),
            Operand::Global(id) => {
                let name = self.module.flow(*id).map_or("?", |f| f.name.as_str());
                Err(EvalError::NonConstantRead(format!("the address of `{}`", name)))
            }
            Operand::Function(_) => Err(EvalError::NonConstantRead("a function".to_string())),
            Operand::Local(slot) => Err(EvalError::NonConstantRead(format!("local {}", slot))),
            Operand::Param(n) => Err(EvalError::NonConstantRead(format!("parameter {}", n))),
            Operand::Block(_) | Operand::Empty => Err(EvalError::InvalidOperand {
                step: "value",
                found: "non-value".to_string(),
            }),
        };
        result.unwrap_or_else(|error| self.fail(error, Some(span), Type::Void))
    }
}

// ============================================================================
// Operations
// ============================================================================

fn invalid(step: &'static str, value: &Value) -> EvalError {
    let found = match &value.kind {
        ValueKind::Digit(_) => "integer",
        ValueKind::Bool(_) => "bool",
        ValueKind::String(_) => "string",
        ValueKind::Array(_) => "array",
        ValueKind::Poison(_) => "poison",
    };
    EvalError::InvalidOperand {
        step,
        found: found.to_string(),
    }
}

/// The first poison among `values`, re-typed for the consumer.
fn poisoned(values: &[&Value], ty: &Type) -> Option<Value> {
    values
        .iter()
        .find(|v| v.is_poison())
        .map(|v| v.retag(ty.clone()))
}

fn unary(op: UnaryOp, operand: &Value, ty: Type) -> EvalResult<Value> {
    if let Some(poison) = poisoned(&[operand], &ty) {
        return Ok(poison);
    }
    match (op, &operand.kind) {
        (UnaryOp::Abs, ValueKind::Digit(n)) => Ok(Value::digit(n.abs(), ty)),
        (UnaryOp::Neg, ValueKind::Digit(_)) if operand.ty.is_unsigned() => {
            Err(EvalError::NegateUnsigned(operand.ty.clone()))
        }
        (UnaryOp::Neg, ValueKind::Digit(n)) => Ok(Value::digit(-n, ty)),
        (UnaryOp::Flip, ValueKind::Digit(n)) => Ok(Value::digit(!n, ty)),
        (UnaryOp::Not, ValueKind::Bool(b)) => Ok(Value::bool(!b).retag(ty)),
        _ => Err(invalid(op.symbol(), operand)),
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value, ty: Type) -> EvalResult<Value> {
    if let Some(poison) = poisoned(&[lhs, rhs], &ty) {
        return Ok(poison);
    }
    match (&lhs.kind, &rhs.kind) {
        (ValueKind::Digit(a), ValueKind::Digit(b)) => {
            let n = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div | BinaryOp::Rem if b.is_zero() => {
                    return Err(EvalError::DivisionByZero)
                }
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                BinaryOp::Xor => a ^ b,
                BinaryOp::Shl => a << shift_amount(b)?,
                BinaryOp::Shr => a >> shift_amount(b)?,
                BinaryOp::And | BinaryOp::Or => return Err(invalid(op.symbol(), lhs)),
            };
            Ok(Value::digit(n, ty))
        }
        (ValueKind::Bool(a), ValueKind::Bool(b)) => match op {
            BinaryOp::And => Ok(Value::bool(*a && *b).retag(ty)),
            BinaryOp::Or => Ok(Value::bool(*a || *b).retag(ty)),
            _ => Err(invalid(op.symbol(), lhs)),
        },
        (ValueKind::Digit(_), _) => Err(invalid(op.symbol(), rhs)),
        _ => Err(invalid(op.symbol(), lhs)),
    }
}

fn shift_amount(n: &BigInt) -> EvalResult<usize> {
    if n.is_negative() {
        return Err(EvalError::InvalidShift(n.clone()));
    }
    n.to_u32()
        .map(|n| n as usize)
        .ok_or_else(|| EvalError::InvalidShift(n.clone()))
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value, ty: Type) -> EvalResult<Value> {
    if let Some(poison) = poisoned(&[lhs, rhs], &ty) {
        return Ok(poison);
    }
    let ordering = match (&lhs.kind, &rhs.kind) {
        (ValueKind::Digit(a), ValueKind::Digit(b)) => a.cmp(b),
        (ValueKind::Bool(a), ValueKind::Bool(b)) if matches!(op, CompareOp::Eq | CompareOp::Neq) => {
            a.cmp(b)
        }
        (ValueKind::String(a), ValueKind::String(b))
            if matches!(op, CompareOp::Eq | CompareOp::Neq) =>
        {
            a.cmp(b)
        }
        _ => return Err(invalid(op.symbol(), lhs)),
    };
    let result = match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Neq => ordering.is_ne(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Lte => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Gte => ordering.is_ge(),
    };
    Ok(Value::bool(result).retag(ty))
}

/// Element storage `index` elements past the view.
fn offset(array: &Value, index: &Value) -> EvalResult<Value> {
    if let Some(poison) = poisoned(&[array, index], &array.ty) {
        return Ok(poison);
    }
    let ValueKind::Array(view) = &array.kind else {
        return Err(invalid("offset", array));
    };
    let Some(n) = index.as_digit() else {
        return Err(invalid("offset", index));
    };
    let target = BigInt::from(view.offset) + n;
    match target.to_usize() {
        Some(at) => Ok(Value::array(view.at(at), array.ty.clone())),
        None => Err(EvalError::OutOfBounds {
            index: target,
            len: view.len(),
        }),
    }
}

/// Store produces no value; the stored one stands in for its register.
fn store(dst: &Value, src: Value) -> EvalResult<Value> {
    match &dst.kind {
        ValueKind::Array(view) => {
            if view.set(src.clone()) {
                Ok(src)
            } else {
                Err(EvalError::OutOfBounds {
                    index: BigInt::from(view.offset),
                    len: view.len(),
                })
            }
        }
        ValueKind::Poison(_) => Ok(dst.clone()),
        _ => Err(invalid("store", dst)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::digit(n, Type::int())
    }

    #[test]
    fn arithmetic_truncates_toward_zero() {
        let q = binary(BinaryOp::Div, &int(-7), &int(2), Type::int()).unwrap();
        let r = binary(BinaryOp::Rem, &int(-7), &int(2), Type::int()).unwrap();
        assert_eq!(q, int(-3));
        assert_eq!(r, int(-1));
    }

    #[test]
    fn zero_divisor() {
        assert!(matches!(
            binary(BinaryOp::Rem, &int(1), &int(0), Type::int()),
            Err(EvalError::DivisionByZero)
        ));
    }

    #[test]
    fn poison_propagates_silently() {
        let p = Value::poison("earlier", Type::int());
        let v = binary(BinaryOp::Div, &int(1), &p, Type::int()).unwrap();
        assert!(v.is_poison());
        assert!(unary(UnaryOp::Neg, &p, Type::int()).unwrap().is_poison());
    }

    #[test]
    fn shifts() {
        assert_eq!(binary(BinaryOp::Shl, &int(3), &int(4), Type::int()).unwrap(), int(48));
        assert_eq!(binary(BinaryOp::Shr, &int(-8), &int(1), Type::int()).unwrap(), int(-4));
        assert!(matches!(
            binary(BinaryOp::Shl, &int(1), &int(-1), Type::int()),
            Err(EvalError::InvalidShift(_))
        ));
        let huge = Value::digit(BigInt::from(u64::MAX), Type::int());
        assert!(matches!(
            binary(BinaryOp::Shl, &int(1), &huge, Type::int()),
            Err(EvalError::InvalidShift(_))
        ));
    }

    #[test]
    fn unary_ops() {
        assert_eq!(unary(UnaryOp::Abs, &int(-5), Type::int()).unwrap(), int(5));
        assert_eq!(unary(UnaryOp::Flip, &int(0), Type::int()).unwrap(), int(-1));
        assert!(matches!(
            unary(UnaryOp::Neg, &Value::digit(1, Type::uint()), Type::uint()),
            Err(EvalError::NegateUnsigned(_))
        ));
        assert_eq!(
            unary(UnaryOp::Not, &Value::bool(true), Type::Bool).unwrap(),
            Value::bool(false)
        );
    }

    #[test]
    fn comparisons() {
        let lt = compare(CompareOp::Lt, &int(1), &int(2), Type::Bool).unwrap();
        assert_eq!(lt, Value::bool(true));
        let eq = compare(CompareOp::Eq, &Value::string("a"), &Value::string("a"), Type::Bool).unwrap();
        assert_eq!(eq, Value::bool(true));
        assert!(compare(CompareOp::Lt, &Value::bool(true), &Value::bool(false), Type::Bool).is_err());
    }

    #[test]
    fn offsets_and_stores() {
        let storage = Value::array(ArrayRef::reserve(2), Type::array(Type::int(), 2));
        let second = offset(&storage, &Value::index(1)).unwrap();
        store(&second, int(9)).unwrap();
        assert_eq!(storage.as_array().unwrap().at(1).get(), Some(int(9)));

        let past = offset(&storage, &Value::index(2)).unwrap();
        assert!(matches!(store(&past, int(1)), Err(EvalError::OutOfBounds { len: 2, .. })));
        assert!(matches!(offset(&storage, &int(-1)), Err(EvalError::OutOfBounds { .. })));
        assert!(offset(&int(1), &Value::index(0)).is_err());
    }
}
