//! Named surface syntax, as produced by the parser and by
//! [`naming`][crate::naming].

use std::fmt;

use crate::{
    common::WithInfo,
    reprs::{
        common::{Name, Span},
        context,
    },
};

pub type Ident = WithInfo<Span, Name>;

pub type Type = WithInfo<Span, RawType>;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RawType {
    Var(Name),
    Arr { dom: Box<Type>, codom: Box<Type> },
    All { param: Ident, body: Box<Type> },
}

pub type Term = WithInfo<Span, RawTerm>;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RawTerm {
    Var(Name),
    Abs {
        param: Ident,
        param_type: Box<Type>,
        body: Box<Term>,
    },
    App {
        func: Box<Term>,
        arg: Box<Term>,
    },
    TyAbs {
        param: Ident,
        body: Box<Term>,
    },
    TyApp {
        func: Box<Term>,
        arg: Box<Type>,
    },
}

pub type Binding = context::Binding<Name, Type, Term>;
pub type Context = context::Context<Name, Type, Term>;

pub type Statement = WithInfo<Span, RawStatement>;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RawStatement {
    /// Assumes a type variable.
    Variable { name: Ident },
    /// Assumes a term constant of the given type.
    Axiom { name: Ident, ty: Type },
    /// Defines a term constant, optionally checking it against an expected type.
    Define {
        name: Ident,
        ty: Option<Type>,
        term: Term,
    },
    /// Normalises a term and prints it.
    Reduce { term: Term },
    /// Prints a term constant's type and definition.
    Print { name: Ident },
    /// Forgets every binding.
    Clear,
}

impl RawStatement {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Variable { .. } => "Variable",
            Self::Axiom { .. } => "Axiom",
            Self::Define { ty: Some(_), .. } => "Theorem",
            Self::Define { ty: None, .. } => "Define",
            Self::Reduce { .. } => "Reduce",
            Self::Print { .. } => "Print",
            Self::Clear => "Clear",
        }
    }
}

pub fn ident(span: Span, name: impl Into<Name>) -> Ident {
    WithInfo(span, name.into())
}

impl Type {
    pub fn var(span: Span, name: impl Into<Name>) -> Self {
        WithInfo(span, RawType::Var(name.into()))
    }

    pub fn arr(span: Span, dom: Self, codom: Self) -> Self {
        WithInfo(
            span,
            RawType::Arr {
                dom: Box::new(dom),
                codom: Box::new(codom),
            },
        )
    }

    pub fn all(span: Span, param: Ident, body: Self) -> Self {
        WithInfo(
            span,
            RawType::All {
                param,
                body: Box::new(body),
            },
        )
    }

    /// `forall A, B. body`, one universal per parameter.
    pub fn all_many(span: Span, params: Vec<Ident>, body: Self) -> Self {
        params
            .into_iter()
            .rev()
            .fold(body, |body, param| Self::all(span, param, body))
    }
}

impl Term {
    pub fn var(span: Span, name: impl Into<Name>) -> Self {
        WithInfo(span, RawTerm::Var(name.into()))
    }

    pub fn abs(span: Span, param: Ident, param_type: Type, body: Self) -> Self {
        WithInfo(
            span,
            RawTerm::Abs {
                param,
                param_type: Box::new(param_type),
                body: Box::new(body),
            },
        )
    }

    /// `fun x: A, y: B. body`, one abstraction per parameter.
    pub fn abs_many(span: Span, params: Vec<(Ident, Type)>, body: Self) -> Self {
        params
            .into_iter()
            .rev()
            .fold(body, |body, (param, param_type)| {
                Self::abs(span, param, param_type, body)
            })
    }

    pub fn app(span: Span, func: Self, arg: Self) -> Self {
        WithInfo(
            span,
            RawTerm::App {
                func: Box::new(func),
                arg: Box::new(arg),
            },
        )
    }

    pub fn ty_abs(span: Span, param: Ident, body: Self) -> Self {
        WithInfo(
            span,
            RawTerm::TyAbs {
                param,
                body: Box::new(body),
            },
        )
    }

    /// `fun2 A, B. body`, one type abstraction per parameter.
    pub fn ty_abs_many(span: Span, params: Vec<Ident>, body: Self) -> Self {
        params
            .into_iter()
            .rev()
            .fold(body, |body, param| Self::ty_abs(span, param, body))
    }

    pub fn ty_app(span: Span, func: Self, arg: Type) -> Self {
        WithInfo(
            span,
            RawTerm::TyApp {
                func: Box::new(func),
                arg: Box::new(arg),
            },
        )
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => f.write_str(name),
            Self::Arr { dom, codom } => {
                if let Self::Var(_) = dom.1 {
                    write!(f, "{} -> {}", dom.1, codom.1)
                } else {
                    write!(f, "({}) -> {}", dom.1, codom.1)
                }
            }
            Self::All { param, body } => write!(f, "forall {}. {}", param.1, body.1),
        }
    }
}

impl fmt::Display for RawTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_func(f: &mut fmt::Formatter<'_>, func: &RawTerm) -> fmt::Result {
            match func {
                RawTerm::Var(_) | RawTerm::App { .. } | RawTerm::TyApp { .. } => {
                    write!(f, "{func}")
                }
                RawTerm::Abs { .. } | RawTerm::TyAbs { .. } => write!(f, "({func})"),
            }
        }

        match self {
            Self::Var(name) => f.write_str(name),
            Self::Abs {
                param,
                param_type,
                body,
            } => write!(f, "fun {}: {}. {}", param.1, param_type.1, body.1),
            Self::App { func, arg } => {
                write_func(f, &func.1)?;
                if let Self::Var(_) = arg.1 {
                    write!(f, " {}", arg.1)
                } else {
                    write!(f, " ({})", arg.1)
                }
            }
            Self::TyAbs { param, body } => write!(f, "fun2 {}. {}", param.1, body.1),
            Self::TyApp { func, arg } => {
                write_func(f, &func.1)?;
                write!(f, " [{}]", arg.1)
            }
        }
    }
}

impl<I> fmt::Display for WithInfo<I, RawType> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.1.fmt(f)
    }
}

impl<I> fmt::Display for WithInfo<I, RawTerm> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.1.fmt(f)
    }
}
