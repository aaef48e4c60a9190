use crate::{
    common::WithInfo,
    naming::from_indexed_type_in,
    reprs::{
        ast,
        common::{Idx, Span},
        context::LookupError,
        ix,
    },
};

pub use self::error::{IllegalError, SpannedError, TypeCheckError};

mod error;

/// A type error on indexed terms.
///
/// Types are relative to `scope`, the context at the offending sub-term; use
/// [`TypeError::named`] to render them against the named context.
#[derive(Clone, Debug)]
pub enum TypeError {
    Illegal(IllegalError),
    NotAFunction {
        func_span: Span,
        found: ix::Type,
        arg_span: Span,
        arg_ty: ix::Type,
        scope: ix::Context,
    },
    ArgumentMismatch {
        arg_span: Span,
        expected: ix::Type,
        found: ix::Type,
        scope: ix::Context,
    },
    NotAUniversal {
        func_span: Span,
        found: ix::Type,
        scope: ix::Context,
    },
}

impl From<IllegalError> for TypeError {
    fn from(value: IllegalError) -> Self {
        Self::Illegal(value)
    }
}

impl TypeError {
    /// Renders the types carried by this error through `ctx`, the named
    /// context the checked term was indexed against.
    pub fn named(self, ctx: &ast::Context) -> TypeCheckError {
        self.try_named(ctx).unwrap_or_else(Into::into)
    }

    fn try_named(self, ctx: &ast::Context) -> Result<TypeCheckError, LookupError> {
        let display = |scope: &ix::Context, ty: &ix::Type| {
            from_indexed_type_in(ctx, scope, ty).map(|ty| ty.to_string())
        };

        let err = match self {
            Self::Illegal(err) => err.into(),
            Self::NotAFunction {
                func_span,
                found,
                arg_span,
                arg_ty,
                scope,
            } => SpannedError::new(
                "type mismatch: expected a function",
                format!(
                    "expected: `? -> ?`\n\
                    found:    `{}`",
                    display(&scope, &found)?
                ),
                "applied to an argument here",
                func_span,
            )
            .with_context(
                arg_span,
                format!("argument of type `{}`", display(&scope, &arg_ty)?),
            )
            .into(),
            Self::ArgumentMismatch {
                arg_span,
                expected,
                found,
                scope,
            } => SpannedError::ty_ty_mismatch(
                display(&scope, &expected)?,
                display(&scope, &found)?,
                arg_span,
            )
            .into(),
            Self::NotAUniversal {
                func_span,
                found,
                scope,
            } => SpannedError::new(
                "type mismatch: expected a polymorphic term",
                format!(
                    "expected: `forall ?. ?`\n\
                    found:    `{}`",
                    display(&scope, &found)?
                ),
                "applied to a type here",
                func_span,
            )
            .into(),
        };
        Ok(err)
    }
}

/// Synthesises the type of `term` under `ctx`.
///
/// # Errors
/// When `term` is ill-typed, or refers outside `ctx` or to a binder of the
/// wrong kind (the latter two being illegal errors).
pub fn deduce_type(ctx: &ix::Context, term: &ix::Term) -> Result<ix::Type, TypeError> {
    let WithInfo(span, raw) = term;

    match raw {
        ix::RawTerm::Var(index) => {
            let binding = ctx
                .get_tm_binding(*index)
                .map_err(|err| IllegalError::from(err).with_span(*span))?;
            // the binding's type was recorded `index + 1` binders further out
            Ok(binding.ty.shift(0, index.distance()))
        }
        ix::RawTerm::Abs { param_type, body } => {
            check_type_scope(ctx, param_type)?;
            let body_ty = deduce_type(&ctx.push_tm((), (**param_type).clone()), body)?;
            Ok(ix::Type::arr(
                *span,
                (**param_type).clone(),
                body_ty.shift(1, -1),
            ))
        }
        ix::RawTerm::App { func, arg } => {
            let func_ty = deduce_type(ctx, func)?;
            let arg_ty = deduce_type(ctx, arg)?;
            match func_ty {
                WithInfo(_, ix::RawType::Arr { dom, codom }) => {
                    if *dom != arg_ty {
                        return Err(TypeError::ArgumentMismatch {
                            arg_span: arg.info(),
                            expected: *dom,
                            found: arg_ty,
                            scope: ctx.clone(),
                        });
                    }
                    Ok(*codom)
                }
                found => Err(TypeError::NotAFunction {
                    func_span: func.info(),
                    found,
                    arg_span: arg.info(),
                    arg_ty,
                    scope: ctx.clone(),
                }),
            }
        }
        ix::RawTerm::TyAbs { body } => {
            let body_ty = deduce_type(&ctx.push_ty(()), body)?;
            Ok(ix::Type::all(*span, body_ty))
        }
        ix::RawTerm::TyApp { func, arg } => {
            let func_ty = deduce_type(ctx, func)?;
            check_type_scope(ctx, arg)?;
            match func_ty {
                WithInfo(_, ix::RawType::All { body }) => Ok(body.instantiate(arg)),
                found => Err(TypeError::NotAUniversal {
                    func_span: func.info(),
                    found,
                    scope: ctx.clone(),
                }),
            }
        }
    }
}

/// Checks that `ty` only refers to type binders of `ctx`.
///
/// # Errors
/// When `ty` refers outside `ctx` or to a term binder.
pub fn check_type_scope(ctx: &ix::Context, ty: &ix::Type) -> Result<(), IllegalError> {
    fn walk(ctx: &ix::Context, depth: usize, ty: &ix::Type) -> Result<(), IllegalError> {
        let WithInfo(span, raw) = ty;
        match raw {
            ix::RawType::Var(index) if index.0 < depth => Ok(()),
            ix::RawType::Var(index) => ctx
                .get_ty_binding(Idx(index.0 - depth))
                .map(|_| ())
                .map_err(|err| IllegalError::from(err).with_span(*span)),
            ix::RawType::Arr { dom, codom } => {
                walk(ctx, depth, dom)?;
                walk(ctx, depth, codom)
            }
            ix::RawType::All { body } => walk(ctx, depth + 1, body),
        }
    }
    walk(ctx, 0, ty)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::reprs::ix::tests::{abs, all, app, arr, tv, ty_abs, ty_app, v};

    #[track_caller]
    fn type_check_success(ctx: &ix::Context, term: &ix::Term) -> ix::Type {
        match deduce_type(ctx, term) {
            Ok(ty) => ty,
            Err(err) => panic!("type check failure:\n{term}\n{err:#?}"),
        }
    }

    #[track_caller]
    fn type_check_failure(ctx: &ix::Context, term: &ix::Term) -> TypeError {
        match deduce_type(ctx, term) {
            Ok(ty) => panic!("type check success:\n{term}\n{ty}"),
            Err(err) => err,
        }
    }

    #[test]
    fn abstraction() {
        let ctx = ix::Context::new().push_ty(());
        assert_eq!(type_check_success(&ctx, &abs(tv(0), v(0))), arr(tv(0), tv(0)));
    }

    #[test]
    fn polymorphism() {
        let ctx = ix::Context::new();
        assert_eq!(
            type_check_success(&ctx, &ty_abs(abs(tv(0), v(0)))),
            all(arr(tv(0), tv(0)))
        );

        // fun2 A, B. fun x: A, y: B. x
        let k = ty_abs(ty_abs(abs(tv(1), abs(tv(1), v(1)))));
        assert_eq!(
            type_check_success(&ctx, &k),
            all(all(arr(tv(1), arr(tv(0), tv(1)))))
        );
    }

    #[test]
    fn instantiation() {
        let ctx = ix::Context::new().push_ty(()).push_ty(());
        let poly_id = ty_abs(abs(tv(0), v(0)));
        assert_eq!(
            type_check_success(&ctx, &ty_app(poly_id.clone(), tv(1))),
            arr(tv(1), tv(1))
        );
        // instantiating with a universal keeps its bound variable bound
        assert_eq!(
            type_check_success(&ctx, &ty_app(poly_id, all(arr(tv(0), tv(2))))),
            arr(all(arr(tv(0), tv(2))), all(arr(tv(0), tv(2))))
        );
    }

    #[test]
    fn variables_are_rebased() {
        // A, B, f: A -> A, y: B
        let ctx = ix::Context::new()
            .push_ty(())
            .push_ty(())
            .push_tm((), arr(tv(1), tv(1)))
            .push_tm((), tv(1));
        assert_eq!(type_check_success(&ctx, &v(1)), arr(tv(3), tv(3)));
        assert_eq!(type_check_success(&ctx, &v(0)), tv(2));

        assert!(matches!(
            type_check_failure(&ctx, &app(v(1), v(0))),
            TypeError::ArgumentMismatch { expected, found, .. }
                if expected == tv(3) && found == tv(2)
        ));
    }

    #[test]
    fn application() {
        // A, f: A -> A, x: A
        let ctx = ix::Context::new()
            .push_ty(())
            .push_tm((), arr(tv(0), tv(0)))
            .push_tm((), tv(1));
        assert_eq!(type_check_success(&ctx, &app(v(1), v(0))), tv(2));
        assert!(matches!(
            type_check_failure(&ctx, &app(v(0), v(0))),
            TypeError::NotAFunction { found, .. } if found == tv(2)
        ));
        assert!(matches!(
            type_check_failure(&ctx, &ty_app(v(1), tv(2))),
            TypeError::NotAUniversal { .. }
        ));
    }

    #[test]
    fn illegal_indices() {
        let ctx = ix::Context::new().push_ty(());
        assert!(matches!(
            type_check_failure(&ctx, &v(0)),
            TypeError::Illegal(_)
        ));
        assert!(matches!(
            type_check_failure(&ctx, &v(1)),
            TypeError::Illegal(_)
        ));
        assert!(check_type_scope(&ctx, &all(arr(tv(0), tv(1)))).is_ok());
        assert!(check_type_scope(&ctx, &tv(1)).is_err());
    }

    #[track_caller]
    fn illegal_msg(err: TypeError) -> String {
        match err {
            TypeError::Illegal(err) => err.msg().to_owned(),
            err => panic!("expected an illegal error:\n{err:#?}"),
        }
    }

    #[test]
    fn dangling_types_in_terms() {
        let empty = ix::Context::new();
        let msg = illegal_msg(type_check_failure(&empty, &abs(tv(5), v(0))));
        assert!(msg.starts_with("index out of range"), "{msg}");
        let msg = illegal_msg(type_check_failure(
            &empty,
            &ty_app(ty_abs(abs(tv(0), v(0))), tv(9)),
        ));
        assert!(msg.starts_with("index out of range"), "{msg}");

        // a type argument naming a term binder is just as illegal
        let ctx = ix::Context::new().push_ty(()).push_tm((), tv(0));
        let msg = illegal_msg(type_check_failure(
            &ctx,
            &ty_app(ty_abs(abs(tv(0), v(0))), tv(0)),
        ));
        assert!(msg.starts_with("inconsistent binding"), "{msg}");
        assert_eq!(
            type_check_success(&ctx, &ty_app(ty_abs(abs(tv(0), v(0))), tv(1))),
            arr(tv(1), tv(1))
        );
    }

    #[test]
    fn named_errors() {
        let named = ast::Context::new()
            .push_ty("A".into())
            .push_tm("x".into(), ast::Type::var(Span::default(), "A"));
        let ctx = crate::validation::to_indexed_context(&named).unwrap();

        let TypeCheckError::Spanned(err) = type_check_failure(&ctx, &app(v(0), v(0))).named(&named)
        else {
            panic!("expected a spanned error");
        };
        assert_eq!(err.text(), "expected: `? -> ?`\nfound:    `A`");

        // errors under binders name the binders they cross
        let err = type_check_failure(&ctx, &ty_abs(abs(tv(0), app(v(0), v(0)))));
        let TypeCheckError::Spanned(err) = err.named(&named) else {
            panic!("expected a spanned error");
        };
        assert_eq!(err.text(), "expected: `? -> ?`\nfound:    `B`");
    }
}
