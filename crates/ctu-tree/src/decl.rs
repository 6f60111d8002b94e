// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Declaration nodes and the module that groups them.

use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::{DeclId, Span, Type};

/// How far a declaration is visible outside its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Private,
    Public,
    /// Program or library entry point
    EntryPoint,
}

impl Visibility {
    /// Externally observable: must survive dead-code elimination.
    pub fn is_root(self) -> bool {
        matches!(self, Visibility::Public | Visibility::EntryPoint)
    }
}

/// A global variable.
#[derive(Debug, Clone)]
pub struct Global {
    pub id: DeclId,
    pub name: String,
    pub ty: Type,
    /// `None` for a global declared without initializer.
    pub init: Option<Expr>,
    pub visibility: Visibility,
    pub span: Span,
}

/// A function definition or declaration.
#[derive(Debug, Clone)]
pub struct Function {
    pub id: DeclId,
    pub name: String,
    /// Signature; always a `Type::Closure`.
    pub ty: Type,
    pub params: Vec<Param>,
    /// Every local declared anywhere in the body, in declaration order.
    pub locals: Vec<Local>,
    /// `None` for an imported function.
    pub body: Option<Stmt>,
    pub visibility: Visibility,
    pub span: Span,
}

/// A function-local variable.
#[derive(Debug, Clone)]
pub struct Local {
    pub id: DeclId,
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

/// A named type (struct, union, alias).
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub ty: Type,
}

/// One semantically checked source module.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
    pub types: Vec<TypeDecl>,
}

impl Global {
    pub fn new(id: DeclId, name: impl Into<String>, ty: Type, init: Option<Expr>) -> Self {
        Global {
            id,
            name: name.into(),
            ty,
            init,
            visibility: Visibility::Private,
            span: Span::DUMMY,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

impl Function {
    pub fn new(id: DeclId, name: impl Into<String>, result: Type, body: Option<Stmt>) -> Self {
        Function {
            id,
            name: name.into(),
            ty: Type::closure(result, Vec::new()),
            params: Vec::new(),
            locals: Vec::new(),
            body,
            visibility: Visibility::Private,
            span: Span::DUMMY,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Append a parameter, keeping the signature in step.
    pub fn with_param(mut self, name: impl Into<String>, ty: Type) -> Self {
        if let Type::Closure { params, .. } = &mut self.ty {
            params.push(ty.clone());
        }
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn with_local(mut self, id: DeclId, name: impl Into<String>, ty: Type) -> Self {
        self.locals.push(Local {
            id,
            name: name.into(),
            ty,
        });
        self
    }

    /// Type of the value this function returns.
    pub fn result(&self) -> &Type {
        self.ty.result().unwrap_or(&Type::Void)
    }
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Module::default()
        }
    }

    pub fn with_global(mut self, global: Global) -> Self {
        self.globals.push(global);
        self
    }

    pub fn with_function(mut self, function: Function) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_type(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.types.push(TypeDecl {
            name: name.into(),
            ty,
        });
        self
    }
}
