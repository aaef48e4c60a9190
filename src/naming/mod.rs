//! Turns indexed types and terms back into named ones.
//!
//! Free variables take their names from the ambient named context. Every
//! binder gets a freshly generated name: type parameters draw from one
//! counter (`A`, `B`, ...), term parameters from another (`a`, `b`, ...).
//! Both counters only ever increase during a traversal, so no two binders of
//! one rendered expression share a name. Generated names already used by
//! a binding of the same kind in the ambient context are skipped, so a
//! fresh binder can never capture a free variable.

use std::panic::Location;

use hashbrown::HashSet;

use crate::{
    common::{WithInfo, generate_tm_var_name, generate_ty_var_name},
    reprs::{
        ast,
        common::{Idx, Name},
        context::{Binding, BindingKind, LookupError},
        ix,
    },
};

type Result<T> = std::result::Result<T, LookupError>;

/// Names `ty`, whose free variables refer to `ctx`.
///
/// # Errors
/// When `ty` refers outside `ctx` or to a term binder (an illegal error).
pub fn from_indexed_type(ctx: &ast::Context, ty: &ix::Type) -> Result<ast::Type> {
    Namer::new(ctx).ty(ty)
}

/// Names `term`, whose free variables refer to `ctx`.
///
/// # Errors
/// When `term` refers outside `ctx` or to a binder of the wrong kind
/// (an illegal error).
pub fn from_indexed_term(ctx: &ast::Context, term: &ix::Term) -> Result<ast::Term> {
    Namer::new(ctx).term(term)
}

/// Names `ty`, whose free variables refer to `scope`: the indexed form of
/// `ctx` extended with binders introduced while traversing a term.
///
/// The extra binders get generated names.
///
/// # Errors
/// When `scope` is shallower than `ctx`, or `ty` refers outside `scope` or to
/// a term binder.
#[track_caller]
pub fn from_indexed_type_in(
    ctx: &ast::Context,
    scope: &ix::Context,
    ty: &ix::Type,
) -> Result<ast::Type> {
    let Some(extra) = scope.len().checked_sub(ctx.len()) else {
        return Err(LookupError::OutOfRange {
            index: Idx(scope.len()),
            len: ctx.len(),
            location: Location::caller(),
        });
    };

    let mut namer = Namer::new(ctx);
    let kinds: Vec<_> = scope.iter().take(extra).map(Binding::kind).collect();
    for kind in kinds.into_iter().rev() {
        namer.bind(kind);
    }
    namer.ty(ty)
}

type NameBinding = Binding<Name, (), ()>;

struct Namer<'c> {
    ambient: &'c ast::Context,
    /// binders introduced during the traversal, innermost last
    local: Vec<NameBinding>,

    taken_ty_names: HashSet<&'c str>,
    taken_tm_names: HashSet<&'c str>,

    next_ty_id: usize,
    next_tm_id: usize,
}

impl<'c> Namer<'c> {
    fn new(ambient: &'c ast::Context) -> Self {
        let mut taken_ty_names = HashSet::new();
        let mut taken_tm_names = HashSet::new();
        for binding in ambient {
            match binding {
                Binding::Type { name } => taken_ty_names.insert(&**name),
                Binding::Term { name, .. } => taken_tm_names.insert(&**name),
            };
        }

        Self {
            ambient,
            local: Vec::new(),
            taken_ty_names,
            taken_tm_names,
            next_ty_id: 0,
            next_tm_id: 0,
        }
    }

    fn fresh_ty_name(&mut self) -> Name {
        loop {
            let name = generate_ty_var_name(self.next_ty_id);
            self.next_ty_id += 1;
            if !self.taken_ty_names.contains(name.as_str()) {
                return name.into();
            }
        }
    }

    fn fresh_tm_name(&mut self) -> Name {
        loop {
            let name = generate_tm_var_name(self.next_tm_id);
            self.next_tm_id += 1;
            if !self.taken_tm_names.contains(name.as_str()) {
                return name.into();
            }
        }
    }

    /// Pushes a binder with a fresh name, returning the name.
    fn bind(&mut self, kind: BindingKind) -> Name {
        let name = match kind {
            BindingKind::Type => self.fresh_ty_name(),
            BindingKind::Term => self.fresh_tm_name(),
        };
        self.local.push(match kind {
            BindingKind::Type => Binding::Type { name: name.clone() },
            BindingKind::Term => Binding::Term {
                name: name.clone(),
                ty: (),
                definition: None,
            },
        });
        name
    }

    fn unbind(&mut self) {
        self.local.pop();
    }

    #[track_caller]
    fn lookup(&self, index: Idx, expected: BindingKind) -> Result<Name> {
        let Some(ambient_index) = index.0.checked_sub(self.local.len()) else {
            let binding = &self.local[self.local.len() - 1 - index.0];
            if binding.kind() != expected {
                return Err(LookupError::Inconsistent {
                    index,
                    expected,
                    found: binding.kind(),
                    location: Location::caller(),
                });
            }
            return Ok(binding.name().clone());
        };

        let ambient_index = Idx(ambient_index);
        let name = match expected {
            BindingKind::Type => self.ambient.get_ty_binding(ambient_index)?,
            BindingKind::Term => self.ambient.get_tm_binding(ambient_index)?.name,
        };
        Ok(name.clone())
    }

    fn ty(&mut self, ty: &ix::Type) -> Result<ast::Type> {
        let WithInfo(info, ty) = ty;

        let ty = match ty {
            ix::RawType::Var(index) => ast::RawType::Var(self.lookup(*index, BindingKind::Type)?),
            ix::RawType::Arr { dom, codom } => {
                let dom = self.ty(dom)?;
                let codom = self.ty(codom)?;
                ast::RawType::Arr {
                    dom: Box::new(dom),
                    codom: Box::new(codom),
                }
            }
            ix::RawType::All { body } => {
                let name = self.bind(BindingKind::Type);
                let body = self.ty(body);
                self.unbind();
                ast::RawType::All {
                    param: WithInfo(*info, name),
                    body: Box::new(body?),
                }
            }
        };

        Ok(WithInfo(*info, ty))
    }

    fn term(&mut self, term: &ix::Term) -> Result<ast::Term> {
        let WithInfo(info, term) = term;

        let term = match term {
            ix::RawTerm::Var(index) => ast::RawTerm::Var(self.lookup(*index, BindingKind::Term)?),
            ix::RawTerm::Abs { param_type, body } => {
                let param_type = self.ty(param_type)?;
                let name = self.bind(BindingKind::Term);
                let body = self.term(body);
                self.unbind();
                ast::RawTerm::Abs {
                    param: WithInfo(*info, name),
                    param_type: Box::new(param_type),
                    body: Box::new(body?),
                }
            }
            ix::RawTerm::App { func, arg } => {
                let func = self.term(func)?;
                let arg = self.term(arg)?;
                ast::RawTerm::App {
                    func: Box::new(func),
                    arg: Box::new(arg),
                }
            }
            ix::RawTerm::TyAbs { body } => {
                let name = self.bind(BindingKind::Type);
                let body = self.term(body);
                self.unbind();
                ast::RawTerm::TyAbs {
                    param: WithInfo(*info, name),
                    body: Box::new(body?),
                }
            }
            ix::RawTerm::TyApp { func, arg } => {
                let func = self.term(func)?;
                let arg = self.ty(arg)?;
                ast::RawTerm::TyApp {
                    func: Box::new(func),
                    arg: Box::new(arg),
                }
            }
        };

        Ok(WithInfo(*info, term))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::reprs::{
        common::Span,
        ix::tests::{abs, all, app, arr, tv, ty_abs, ty_app, v},
    };

    fn ctx() -> ast::Context {
        ast::Context::new()
            .push_ty("T".into())
            .push_tm("f".into(), ast::Type::var(Span::default(), "T"))
    }

    #[test]
    fn generated_binder_names() {
        let ctx = ctx();
        // forall. forall. 0 -> 1 -> 2
        let ty = all(all(arr(tv(0), arr(tv(1), tv(3)))));
        assert_eq!(
            from_indexed_type(&ctx, &ty).unwrap().to_string(),
            "forall A. forall B. B -> A -> T"
        );

        // fun2. fun: 0. fun: 1. f 0 [2]
        let term = ty_abs(abs(tv(0), abs(tv(1), ty_app(app(v(3), v(0)), tv(2)))));
        assert_eq!(
            from_indexed_term(&ctx, &term).unwrap().to_string(),
            "fun2 A. fun a: A. fun b: A. f b [A]"
        );
    }

    #[test]
    fn counters_never_reuse_names() {
        // (fun: T. 0) (fun: T. 0)
        let id = abs(tv(1), v(0));
        let term = app(id.clone(), id);
        assert_eq!(
            from_indexed_term(&ctx(), &term).unwrap().to_string(),
            "(fun a: T. a) (fun b: T. b)"
        );
    }

    #[test]
    fn fresh_names_avoid_free_names() {
        let ctx = ast::Context::new()
            .push_ty("A".into())
            .push_tm("a".into(), ast::Type::var(Span::default(), "A"));
        // fun: A. 1
        let term = abs(tv(1), v(1));
        assert_eq!(
            from_indexed_term(&ctx, &term).unwrap().to_string(),
            "fun b: A. a"
        );
        assert_eq!(
            from_indexed_type(&ctx, &all(arr(tv(0), tv(2)))).unwrap().to_string(),
            "forall B. B -> A"
        );
    }

    #[test]
    fn local_scope() {
        let ctx = ctx();
        let scope = crate::validation::to_indexed_context(&ctx)
            .unwrap()
            .push_ty(())
            .push_tm((), tv(0));
        assert_eq!(
            from_indexed_type_in(&ctx, &scope, &arr(tv(1), tv(3)))
                .unwrap()
                .to_string(),
            "A -> T"
        );
    }

    #[test]
    fn illegal_indices() {
        assert!(matches!(
            from_indexed_term(&ctx(), &v(1)),
            Err(LookupError::Inconsistent { .. })
        ));
        assert!(matches!(
            from_indexed_type(&ctx(), &tv(2)),
            Err(LookupError::OutOfRange { .. })
        ));
        assert!(matches!(
            from_indexed_term(&ctx(), &ty_abs(v(0))),
            Err(LookupError::Inconsistent { .. })
        ));
    }
}
