//! Indexed (de Bruijn) representation.
//!
//! Variables are [`Idx`]s into the enclosing [`Context`]. Equality ignores
//! spans, so `==` is alpha-equivalence.

use std::fmt;

use crate::{
    common::WithInfo,
    reprs::{
        common::{Idx, Span},
        context,
    },
};

pub type Type = WithInfo<Span, RawType>;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RawType {
    Var(Idx),
    Arr { dom: Box<Type>, codom: Box<Type> },
    All { body: Box<Type> },
}

pub type Term = WithInfo<Span, RawTerm>;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RawTerm {
    Var(Idx),
    Abs {
        param_type: Box<Type>,
        body: Box<Term>,
    },
    App {
        func: Box<Term>,
        arg: Box<Term>,
    },
    TyAbs {
        body: Box<Term>,
    },
    TyApp {
        func: Box<Term>,
        arg: Box<Type>,
    },
}

pub type Binding = context::Binding<(), Type, Term>;
pub type Context = context::Context<(), Type, Term>;

impl Type {
    pub fn var(span: Span, index: Idx) -> Self {
        WithInfo(span, RawType::Var(index))
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

    pub fn all(span: Span, body: Self) -> Self {
        WithInfo(
            span,
            RawType::All {
                body: Box::new(body),
            },
        )
    }

    /// Adds `delta` to every free index `>= cutoff`.
    #[must_use]
    pub fn shift(&self, cutoff: usize, delta: isize) -> Self {
        let WithInfo(span, ty) = self;
        let ty = match ty {
            RawType::Var(index) if index.0 >= cutoff => RawType::Var(index.shifted(delta)),
            RawType::Var(index) => RawType::Var(*index),
            RawType::Arr { dom, codom } => RawType::Arr {
                dom: Box::new(dom.shift(cutoff, delta)),
                codom: Box::new(codom.shift(cutoff, delta)),
            },
            RawType::All { body } => RawType::All {
                body: Box::new(body.shift(cutoff + 1, delta)),
            },
        };
        WithInfo(*span, ty)
    }

    /// Replaces every free occurrence of `index` with `replacement`.
    ///
    /// No other index is adjusted; callers discarding the binder of `index`
    /// shift the result themselves.
    #[must_use]
    pub fn subst(&self, index: Idx, replacement: &Self) -> Self {
        let WithInfo(span, ty) = self;
        let ty = match ty {
            RawType::Var(i) if *i == index => return replacement.clone(),
            RawType::Var(i) => RawType::Var(*i),
            RawType::Arr { dom, codom } => RawType::Arr {
                dom: Box::new(dom.subst(index, replacement)),
                codom: Box::new(codom.subst(index, replacement)),
            },
            RawType::All { body } => RawType::All {
                body: Box::new(body.subst(index.succ(), &replacement.shift(0, 1))),
            },
        };
        WithInfo(*span, ty)
    }

    /// Instantiates the outermost bound variable of a universal's `body`
    /// with `arg`, where `arg` lives in the context outside the universal.
    #[must_use]
    pub fn instantiate(&self, arg: &Self) -> Self {
        self.subst(Idx::ZERO, &arg.shift(0, 1)).shift(1, -1)
    }

    /// Free indices of this type, in order of first occurrence.
    pub fn free_vars(&self) -> Vec<Idx> {
        fn walk(ty: &Type, depth: usize, acc: &mut Vec<Idx>) {
            match &ty.1 {
                RawType::Var(index) if index.0 >= depth => {
                    let free = Idx(index.0 - depth);
                    if !acc.contains(&free) {
                        acc.push(free);
                    }
                }
                RawType::Var(_) => {}
                RawType::Arr { dom, codom } => {
                    walk(dom, depth, acc);
                    walk(codom, depth, acc);
                }
                RawType::All { body } => walk(body, depth + 1, acc),
            }
        }
        let mut acc = Vec::new();
        walk(self, 0, &mut acc);
        acc
    }
}

impl Term {
    pub fn var(span: Span, index: Idx) -> Self {
        WithInfo(span, RawTerm::Var(index))
    }

    pub fn abs(span: Span, param_type: Type, body: Self) -> Self {
        WithInfo(
            span,
            RawTerm::Abs {
                param_type: Box::new(param_type),
                body: Box::new(body),
            },
        )
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

    pub fn ty_abs(span: Span, body: Self) -> Self {
        WithInfo(
            span,
            RawTerm::TyAbs {
                body: Box::new(body),
            },
        )
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

    /// Adds `delta` to every free index `>= cutoff`, in the term and in the
    /// types embedded in it.
    #[must_use]
    pub fn shift(&self, cutoff: usize, delta: isize) -> Self {
        let WithInfo(span, term) = self;
        let term = match term {
            RawTerm::Var(index) if index.0 >= cutoff => RawTerm::Var(index.shifted(delta)),
            RawTerm::Var(index) => RawTerm::Var(*index),
            RawTerm::Abs { param_type, body } => RawTerm::Abs {
                // the parameter type is outside the new binder
                param_type: Box::new(param_type.shift(cutoff, delta)),
                body: Box::new(body.shift(cutoff + 1, delta)),
            },
            RawTerm::App { func, arg } => RawTerm::App {
                func: Box::new(func.shift(cutoff, delta)),
                arg: Box::new(arg.shift(cutoff, delta)),
            },
            RawTerm::TyAbs { body } => RawTerm::TyAbs {
                body: Box::new(body.shift(cutoff + 1, delta)),
            },
            RawTerm::TyApp { func, arg } => RawTerm::TyApp {
                func: Box::new(func.shift(cutoff, delta)),
                arg: Box::new(arg.shift(cutoff, delta)),
            },
        };
        WithInfo(*span, term)
    }

    /// Replaces every free occurrence of the term variable `index` with
    /// `replacement`.
    #[must_use]
    pub fn subst(&self, index: Idx, replacement: &Self) -> Self {
        let WithInfo(span, term) = self;
        let term = match term {
            RawTerm::Var(i) if *i == index => return replacement.clone(),
            RawTerm::Var(i) => RawTerm::Var(*i),
            RawTerm::Abs { param_type, body } => RawTerm::Abs {
                param_type: param_type.clone(),
                body: Box::new(body.subst(index.succ(), &replacement.shift(0, 1))),
            },
            RawTerm::App { func, arg } => RawTerm::App {
                func: Box::new(func.subst(index, replacement)),
                arg: Box::new(arg.subst(index, replacement)),
            },
            RawTerm::TyAbs { body } => RawTerm::TyAbs {
                body: Box::new(body.subst(index.succ(), &replacement.shift(0, 1))),
            },
            RawTerm::TyApp { func, arg } => RawTerm::TyApp {
                func: Box::new(func.subst(index, replacement)),
                arg: arg.clone(),
            },
        };
        WithInfo(*span, term)
    }

    /// Replaces every free occurrence of the type variable `index` with
    /// `replacement` throughout the types embedded in the term.
    #[must_use]
    pub fn subst_type(&self, index: Idx, replacement: &Type) -> Self {
        let WithInfo(span, term) = self;
        let term = match term {
            RawTerm::Var(i) => RawTerm::Var(*i),
            RawTerm::Abs { param_type, body } => RawTerm::Abs {
                param_type: Box::new(param_type.subst(index, replacement)),
                body: Box::new(body.subst_type(index.succ(), &replacement.shift(0, 1))),
            },
            RawTerm::App { func, arg } => RawTerm::App {
                func: Box::new(func.subst_type(index, replacement)),
                arg: Box::new(arg.subst_type(index, replacement)),
            },
            RawTerm::TyAbs { body } => RawTerm::TyAbs {
                body: Box::new(body.subst_type(index.succ(), &replacement.shift(0, 1))),
            },
            RawTerm::TyApp { func, arg } => RawTerm::TyApp {
                func: Box::new(func.subst_type(index, replacement)),
                arg: Box::new(arg.subst(index, replacement)),
            },
        };
        WithInfo(*span, term)
    }

    /// Beta-reduces `(fun: _. self) arg`, with `arg` in the context outside
    /// the abstraction.
    #[must_use]
    pub fn instantiate(&self, arg: &Self) -> Self {
        self.subst(Idx::ZERO, &arg.shift(0, 1)).shift(1, -1)
    }

    /// Beta-reduces `(fun2. self) [arg]`.
    #[must_use]
    pub fn instantiate_type(&self, arg: &Type) -> Self {
        self.subst_type(Idx::ZERO, &arg.shift(0, 1)).shift(1, -1)
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(index) => write!(f, "{index}"),
            Self::Arr { dom, codom } => {
                if let Self::Var(_) = dom.1 {
                    write!(f, "{} -> {}", dom.1, codom.1)
                } else {
                    write!(f, "({}) -> {}", dom.1, codom.1)
                }
            }
            Self::All { body } => write!(f, "forall. {}", body.1),
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
            Self::Var(index) => write!(f, "{index}"),
            Self::Abs { param_type, body } => write!(f, "fun: {}. {}", param_type.1, body.1),
            Self::App { func, arg } => {
                write_func(f, &func.1)?;
                if let Self::Var(_) = arg.1 {
                    write!(f, " {}", arg.1)
                } else {
                    write!(f, " ({})", arg.1)
                }
            }
            Self::TyAbs { body } => write!(f, "fun2. {}", body.1),
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
