use tracing::trace;

use crate::{
    common::WithInfo,
    reprs::ix::{self, RawTerm, Term},
    typing::IllegalError,
};

pub use self::error::EvaluationError;

mod error {
    use std::borrow::Cow;

    use annotate_snippets::Group;

    use crate::typing::IllegalError;

    #[derive(Clone, Debug)]
    pub enum EvaluationError {
        Illegal(IllegalError),
    }

    impl From<IllegalError> for EvaluationError {
        fn from(value: IllegalError) -> Self {
            Self::Illegal(value)
        }
    }

    impl EvaluationError {
        pub fn into_record<'s>(
            self,
            source: &'s str,
            origin: impl Into<Cow<'s, str>>,
        ) -> Vec<Group<'s>> {
            let mut buf = Vec::new();
            match self {
                Self::Illegal(err) => err.push_groups(source, &origin.into(), &mut buf),
            }
            buf
        }
    }
}

type Result<T> = std::result::Result<T, EvaluationError>;

/// Fully normalises `term` under `ctx`, unfolding definitions.
///
/// Both sides of an application are normalised before contracting it and
/// reduction continues under binders. Only terminates for well-typed terms.
///
/// # Errors
/// When `term` refers outside `ctx` or to a binder of the wrong kind
/// (an illegal error).
pub fn reduce(ctx: &ix::Context, term: &Term) -> Result<Term> {
    let WithInfo(span, raw) = term;

    match raw {
        RawTerm::Var(index) => {
            let binding = ctx
                .get_tm_binding(*index)
                .map_err(|err| IllegalError::from(err).with_span(*span))?;
            match binding.definition {
                Some(definition) => {
                    trace!(%index, "unfolding definition");
                    reduce(ctx, &definition.shift(0, index.distance()))
                }
                None => Ok(term.clone()),
            }
        }
        RawTerm::Abs { param_type, body } => {
            let body = reduce(&ctx.push_tm((), (**param_type).clone()), body)?;
            Ok(Term::abs(*span, (**param_type).clone(), body))
        }
        RawTerm::App { func, arg } => {
            let func = reduce(ctx, func)?;
            let arg = reduce(ctx, arg)?;
            match func {
                WithInfo(_, RawTerm::Abs { body, .. }) => {
                    trace!(%arg, "beta reduction");
                    reduce(ctx, &body.instantiate(&arg))
                }
                func => Ok(Term::app(*span, func, arg)),
            }
        }
        RawTerm::TyAbs { body } => {
            let body = reduce(&ctx.push_ty(()), body)?;
            Ok(Term::ty_abs(*span, body))
        }
        RawTerm::TyApp { func, arg } => match reduce(ctx, func)? {
            WithInfo(_, RawTerm::TyAbs { body }) => {
                trace!(%arg, "type beta reduction");
                reduce(ctx, &body.instantiate_type(arg))
            }
            func => Ok(Term::ty_app(*span, func, (**arg).clone())),
        },
    }
}
