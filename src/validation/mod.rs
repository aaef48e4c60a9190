use crate::{
    common::WithInfo,
    reprs::{
        ast,
        common::{Name, Span},
        context::Binding,
        ix,
    },
};

pub use self::error::ValidationError;

mod error {
    use std::borrow::Cow;

    use annotate_snippets::{AnnotationKind, Group, Level, Snippet};

    use crate::reprs::common::{Name, Span};

    #[derive(Clone, Debug)]
    pub enum ValidationError {
        VarNotFound {
            ty_var: bool,
            name: Name,
            span: Span,
        },
    }

    impl ValidationError {
        pub fn span(&self) -> Span {
            match self {
                Self::VarNotFound { span, .. } => *span,
            }
        }

        pub fn title(&self) -> String {
            match self {
                Self::VarNotFound { ty_var, name, .. } => format!(
                    "unbound {}variable: {name}",
                    if *ty_var { "type " } else { "" }
                ),
            }
        }

        pub fn into_record<'s>(
            self,
            source: &'s str,
            origin: impl Into<Cow<'s, str>>,
        ) -> Vec<Group<'s>> {
            let span = self.span();
            let title = Level::ERROR.primary_title(self.title());

            let group = if span.within(source) {
                title.element(
                    Snippet::source(source)
                        .path(origin.into())
                        .annotation(AnnotationKind::Primary.span(span.range())),
                )
            } else {
                Group::with_title(title)
            };

            vec![group]
        }
    }
}

type Result<T> = std::result::Result<T, ValidationError>;

trait Validate {
    type Validated;
    fn validate(&self, ctx: &ast::Context) -> Result<Self::Validated>;
}

/// Resolves the free type variables of `ty` against `ctx`.
///
/// # Errors
/// When a type variable is bound neither in `ty` nor in `ctx`.
pub fn to_indexed_type(ctx: &ast::Context, ty: &ast::Type) -> Result<ix::Type> {
    ty.validate(ctx)
}

/// Resolves the free (type) variables of `term` against `ctx`, turning
/// names into de Bruijn indices.
///
/// # Errors
/// When a (type) variable is bound neither in `term` nor in `ctx`.
pub fn to_indexed_term(ctx: &ast::Context, term: &ast::Term) -> Result<ix::Term> {
    term.validate(ctx)
}

/// Converts every entry of `ctx`, each resolved against the entries below it.
///
/// # Errors
/// When an entry refers to a name not bound below it.
pub fn to_indexed_context(ctx: &ast::Context) -> Result<ix::Context> {
    let mut entries = Vec::with_capacity(ctx.len());
    let mut rest = ctx;
    while let Some((binding, tail)) = rest.pop() {
        entries.push((binding, tail));
        rest = tail;
    }

    entries
        .into_iter()
        .rev()
        .try_fold(ix::Context::new(), |ix_ctx, (binding, tail)| {
            let binding = match binding {
                Binding::Type { name: _ } => ix::Binding::Type { name: () },
                Binding::Term {
                    name: _,
                    ty,
                    definition,
                } => ix::Binding::Term {
                    name: (),
                    ty: ty.validate(tail)?,
                    definition: definition.validate(tail)?,
                },
            };
            Ok(ix_ctx.push(binding))
        })
}

impl<T: Validate> Validate for Box<T> {
    type Validated = Box<T::Validated>;

    fn validate(&self, ctx: &ast::Context) -> Result<Self::Validated> {
        T::validate(self, ctx).map(Box::new)
    }
}

impl<T: Validate> Validate for Option<T> {
    type Validated = Option<T::Validated>;

    fn validate(&self, ctx: &ast::Context) -> Result<Self::Validated> {
        self.as_ref().map(|t| t.validate(ctx)).transpose()
    }
}

fn var_not_found(ty_var: bool, name: &Name, span: Span) -> ValidationError {
    ValidationError::VarNotFound {
        ty_var,
        name: name.clone(),
        span,
    }
}

impl Validate for ast::Type {
    type Validated = ix::Type;

    fn validate(&self, ctx: &ast::Context) -> Result<Self::Validated> {
        let WithInfo(info, ty) = self;

        let ty = match ty {
            ast::RawType::Var(name) => {
                let Some(index) = ctx.find_ty_var(name) else {
                    return Err(var_not_found(true, name, *info));
                };
                ix::RawType::Var(index)
            }
            ast::RawType::Arr { dom, codom } => ix::RawType::Arr {
                dom: dom.validate(ctx)?,
                codom: codom.validate(ctx)?,
            },
            ast::RawType::All { param, body } => ix::RawType::All {
                body: body.validate(&ctx.push_ty(param.1.clone()))?,
            },
        };

        Ok(WithInfo(*info, ty))
    }
}

impl Validate for ast::Term {
    type Validated = ix::Term;

    fn validate(&self, ctx: &ast::Context) -> Result<Self::Validated> {
        let WithInfo(info, term) = self;

        let term = match term {
            ast::RawTerm::Var(name) => {
                let Some(index) = ctx.find_tm_var(name) else {
                    return Err(var_not_found(false, name, *info));
                };
                ix::RawTerm::Var(index)
            }
            ast::RawTerm::Abs {
                param,
                param_type,
                body,
            } => ix::RawTerm::Abs {
                param_type: param_type.validate(ctx)?,
                body: body.validate(&ctx.push_tm(param.1.clone(), (**param_type).clone()))?,
            },
            ast::RawTerm::App { func, arg } => ix::RawTerm::App {
                func: func.validate(ctx)?,
                arg: arg.validate(ctx)?,
            },
            ast::RawTerm::TyAbs { param, body } => ix::RawTerm::TyAbs {
                body: body.validate(&ctx.push_ty(param.1.clone()))?,
            },
            ast::RawTerm::TyApp { func, arg } => ix::RawTerm::TyApp {
                func: func.validate(ctx)?,
                arg: arg.validate(ctx)?,
            },
        };

        Ok(WithInfo(*info, term))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::reprs::{
        common::Idx,
        ix::tests::{abs, all, app, arr, tv, ty_abs, ty_app, v},
    };

    fn s() -> Span {
        Span::default()
    }

    fn ctx() -> ast::Context {
        ast::Context::new()
            .push_ty("A".into())
            .push_tm("x".into(), ast::Type::var(s(), "A"))
            .push_ty("B".into())
    }

    #[test]
    fn types() {
        let ctx = ctx();
        // forall C. C -> B -> A
        let ty = ast::Type::all(
            s(),
            ast::ident(s(), "C"),
            ast::Type::arr(
                s(),
                ast::Type::var(s(), "C"),
                ast::Type::arr(s(), ast::Type::var(s(), "B"), ast::Type::var(s(), "A")),
            ),
        );
        assert_eq!(
            to_indexed_type(&ctx, &ty).unwrap(),
            all(arr(tv(0), arr(tv(1), tv(3))))
        );
    }

    #[test]
    fn terms_share_one_index_space() {
        let ctx = ctx();
        // fun y: B. fun2 C. y [C] x
        let term = ast::Term::abs(
            s(),
            ast::ident(s(), "y"),
            ast::Type::var(s(), "B"),
            ast::Term::ty_abs(
                s(),
                ast::ident(s(), "C"),
                ast::Term::app(
                    s(),
                    ast::Term::ty_app(s(), ast::Term::var(s(), "y"), ast::Type::var(s(), "C")),
                    ast::Term::var(s(), "x"),
                ),
            ),
        );
        assert_eq!(
            to_indexed_term(&ctx, &term).unwrap(),
            abs(tv(0), ty_abs(app(ty_app(v(1), tv(0)), v(3))))
        );
    }

    #[test]
    fn shadowing() {
        let ctx = ast::Context::new()
            .push_ty("A".into())
            .push_ty("B".into())
            .push_tm("x".into(), ast::Type::var(s(), "A"))
            .push_tm("x".into(), ast::Type::var(s(), "B"));
        assert_eq!(
            to_indexed_term(&ctx, &ast::Term::var(s(), "x")).unwrap(),
            v(0)
        );

        let ix_ctx = to_indexed_context(&ctx).unwrap();
        let binding = ix_ctx.get_tm_binding(Idx(0)).unwrap();
        // B is one binder further away from the top than from `x`'s own position
        assert_eq!(*binding.ty, tv(1));
        assert_eq!(*ix_ctx.get_tm_binding(Idx(1)).unwrap().ty, tv(1));
    }

    #[test]
    fn unbound() {
        let err = to_indexed_term(&ctx(), &ast::Term::var(Span::new(3, 4), "y")).unwrap_err();
        let ValidationError::VarNotFound { ty_var, name, span } = err;
        assert!(!ty_var);
        assert_eq!(&*name, "y");
        assert_eq!(span, Span::new(3, 4));

        // type variables and term variables do not resolve to each other
        assert!(to_indexed_type(&ctx(), &ast::Type::var(s(), "x")).is_err());
        assert!(to_indexed_term(&ctx(), &ast::Term::var(s(), "A")).is_err());
    }

    #[test]
    fn context_definitions_resolve_below_themselves() {
        let ctx = ast::Context::new().push_ty("A".into()).push_definition(
            "id".into(),
            ast::Type::arr(s(), ast::Type::var(s(), "A"), ast::Type::var(s(), "A")),
            ast::Term::abs(
                s(),
                ast::ident(s(), "x"),
                ast::Type::var(s(), "A"),
                ast::Term::var(s(), "x"),
            ),
        );
        let ix_ctx = to_indexed_context(&ctx).unwrap();
        let binding = ix_ctx.get_tm_binding(Idx(0)).unwrap();
        assert_eq!(*binding.ty, arr(tv(0), tv(0)));
        assert_eq!(binding.definition, Some(&abs(tv(0), v(0))));
        assert!(ix_ctx.get_ty_binding(Idx(1)).is_ok());
    }
}
