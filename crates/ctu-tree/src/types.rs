// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Resolved types attached to every typed node.

use std::fmt;

/// Width class of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digit {
    Char,
    Short,
    Int,
    Long,
    /// Platform-defined: `size_t`-like.
    Size,
    /// Platform-defined: pointer-sized.
    IntPtr,
    /// Platform-defined: widest native integer.
    IntMax,
}

impl Digit {
    /// Bit width for the fixed-size classes. Platform-defined classes have
    /// no width known at this stage.
    pub fn bits(self) -> Option<u32> {
        match self {
            Digit::Char => Some(8),
            Digit::Short => Some(16),
            Digit::Int => Some(32),
            Digit::Long => Some(64),
            Digit::Size | Digit::IntPtr | Digit::IntMax => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Digit::Char => "char",
            Digit::Short => "short",
            Digit::Int => "int",
            Digit::Long => "long",
            Digit::Size => "size",
            Digit::IntPtr => "intptr",
            Digit::IntMax => "intmax",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Signed,
    Unsigned,
}

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Digit { digit: Digit, sign: Sign },
    Bool,
    String,
    Void,
    /// Function signature.
    Closure {
        result: Box<Type>,
        params: Vec<Type>,
        variadic: bool,
    },
    Pointer(Box<Type>),
    Array { element: Box<Type>, length: usize },
    Struct { name: String, fields: Vec<(String, Type)> },
    Union { name: String, fields: Vec<(String, Type)> },
    /// Named alias; `resolved()` looks through it.
    Alias { name: String, target: Box<Type> },
}

impl Type {
    pub fn digit(digit: Digit, sign: Sign) -> Type {
        Type::Digit { digit, sign }
    }

    /// Signed `int`, the default literal type.
    pub fn int() -> Type {
        Type::digit(Digit::Int, Sign::Signed)
    }

    pub fn uint() -> Type {
        Type::digit(Digit::Int, Sign::Unsigned)
    }

    pub fn array(element: Type, length: usize) -> Type {
        Type::Array {
            element: Box::new(element),
            length,
        }
    }

    pub fn closure(result: Type, params: Vec<Type>) -> Type {
        Type::Closure {
            result: Box::new(result),
            params,
            variadic: false,
        }
    }

    /// Strip any number of aliases.
    pub fn resolved(&self) -> &Type {
        let mut ty = self;
        while let Type::Alias { target, .. } = ty {
            ty = target;
        }
        ty
    }

    pub fn is_digit(&self) -> bool {
        matches!(self.resolved(), Type::Digit { .. })
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.resolved(), Type::Bool)
    }

    pub fn is_string(&self) -> bool {
        matches!(self.resolved(), Type::String)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.resolved(), Type::Array { .. })
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self.resolved(),
            Type::Digit {
                sign: Sign::Unsigned,
                ..
            }
        )
    }

    /// Element type of an array or pointer.
    pub fn element(&self) -> Option<&Type> {
        match self.resolved() {
            Type::Array { element, .. } | Type::Pointer(element) => Some(&**element),
            _ => None,
        }
    }

    /// Result type of a function signature.
    pub fn result(&self) -> Option<&Type> {
        match self.resolved() {
            Type::Closure { result, .. } => Some(&**result),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Digit { digit, sign } => match sign {
                Sign::Signed => write!(f, "{}", digit.name()),
                Sign::Unsigned => write!(f, "u{}", digit.name()),
            },
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "str"),
            Type::Void => write!(f, "void"),
            Type::Closure {
                result,
                params,
                variadic,
            } => {
                write!(f, "fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                if *variadic {
                    write!(f, "{}...", if params.is_empty() { "" } else { ", " })?;
                }
                write!(f, ") -> {}", result)
            }
            Type::Pointer(inner) => write!(f, "*{}", inner),
            Type::Array { element, length } => write!(f, "[{}; {}]", element, length),
            Type::Struct { name, .. } => write!(f, "struct {}", name),
            Type::Union { name, .. } => write!(f, "union {}", name),
            Type::Alias { name, .. } => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_resolution() {
        let inner = Type::uint();
        let alias = Type::Alias {
            name: "word".into(),
            target: Box::new(Type::Alias {
                name: "w".into(),
                target: Box::new(inner.clone()),
            }),
        };
        assert_eq!(alias.resolved(), &inner);
        assert!(alias.is_digit());
        assert!(alias.is_unsigned());
        assert_eq!(alias.to_string(), "word");
    }

    #[test]
    fn display_signature() {
        let sig = Type::Closure {
            result: Box::new(Type::Void),
            params: vec![Type::int(), Type::array(Type::Bool, 4)],
            variadic: true,
        };
        assert_eq!(sig.to_string(), "fn(int, [bool; 4], ...) -> void");
    }

    #[test]
    fn fixed_widths() {
        assert_eq!(Digit::Char.bits(), Some(8));
        assert_eq!(Digit::Long.bits(), Some(64));
        assert_eq!(Digit::Size.bits(), None);
    }
}
