//! Executes statements against a running named context.
//!
//! Every statement takes the context by reference and returns the next one.
//! A failing statement returns the context it was given.

use std::fmt;

use annotate_snippets::Renderer;
use itertools::Itertools;
use tracing::debug;

use crate::{
    common::WithInfo,
    error::CompilationError,
    evaluation::reduce,
    naming::{from_indexed_term, from_indexed_type},
    parsing::Parser,
    reprs::{
        ast::{self, RawStatement},
        common::Name,
        ix,
    },
    typing::{SpannedError, TypeCheckError, deduce_type},
    validation::{ValidationError, to_indexed_context, to_indexed_term, to_indexed_type},
};

pub use self::error::PipelineError;

mod error {
    use std::borrow::Cow;

    use annotate_snippets::{AnnotationKind, Group, Level, Snippet};

    use crate::reprs::common::{Name, Span};

    #[derive(Clone, Debug)]
    pub enum PipelineError {
        /// The normal form of a term has a different type than the term itself.
        ///
        /// `shadowed` lists type names in either type that refer to a binder
        /// hidden by a later one of the same name.
        UnsoundReduction {
            expected: String,
            found: String,
            shadowed: Vec<Name>,
            span: Span,
        },
    }

    impl PipelineError {
        pub fn into_record<'s>(
            self,
            source: &'s str,
            origin: impl Into<Cow<'s, str>>,
        ) -> Vec<Group<'s>> {
            let group = match self {
                Self::UnsoundReduction {
                    expected,
                    found,
                    shadowed,
                    span,
                } => Group::with_title(
                    Level::ERROR.primary_title("illegal error (bug): reduction changed the type"),
                )
                .elements(span.within(source).then(|| {
                    Snippet::source(source)
                        .path(origin.into())
                        .annotation(AnnotationKind::Primary.span(span.range()))
                }))
                .element(Level::ERROR.message(format!(
                    "expected: `{expected}`\n\
                    found:    `{found}`"
                )))
                .elements(shadowed.into_iter().map(|name| {
                    Level::NOTE.message(format!(
                        "`{name}` here names a type variable shadowed by a later `{name}`; \
                        types stored before the shadowing now refer to the newer one"
                    ))
                })),
            };

            vec![group]
        }
    }
}

/// What a successfully executed statement produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    TypeAssumed {
        name: Name,
    },
    TermAssumed {
        name: Name,
        ty: ast::Type,
    },
    Defined {
        name: Name,
        ty: ast::Type,
    },
    Reduced {
        term: ast::Term,
        ty: ast::Type,
    },
    Printed {
        name: Name,
        ty: ast::Type,
        definition: Option<ast::Term>,
    },
    Cleared,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeAssumed { name } => write!(f, "{name} is assumed."),
            Self::TermAssumed { name, ty } => write!(f, "{name}: {ty} is assumed."),
            Self::Defined { name, ty } => write!(f, "{name}: {ty} is defined."),
            Self::Reduced { term, ty } => write!(f, "{term}\n: {ty}"),
            Self::Printed {
                name,
                ty,
                definition: Some(definition),
            } => write!(f, "{name}: {ty}\n= {definition}"),
            Self::Printed {
                name,
                ty,
                definition: None,
            } => write!(f, "{name}: {ty}\n= (assumed)"),
            Self::Cleared => f.write_str("context cleared."),
        }
    }
}

type Result<T> = std::result::Result<T, CompilationError>;

impl ast::Statement {
    /// Runs this statement against `ctx`, returning the next context.
    ///
    /// On failure the returned context is `ctx` itself.
    pub fn exec(&self, ctx: &ast::Context) -> (ast::Context, Result<Outcome>) {
        let keyword = self.1.keyword();
        debug!(statement = keyword, depth = ctx.len(), "executing statement");

        match self.try_exec(ctx) {
            Ok((next, outcome)) => (next, Ok(outcome)),
            Err(err) => {
                debug!(statement = keyword, "statement failed");
                (ctx.clone(), Err(err))
            }
        }
    }

    fn try_exec(&self, ctx: &ast::Context) -> Result<(ast::Context, Outcome)> {
        let WithInfo(span, statement) = self;

        match statement {
            RawStatement::Variable { name } => {
                let WithInfo(_, name) = name;
                Ok((
                    ctx.push_ty(name.clone()),
                    Outcome::TypeAssumed { name: name.clone() },
                ))
            }
            RawStatement::Axiom { name, ty } => {
                let WithInfo(_, name) = name;
                to_indexed_type(ctx, ty)?;
                Ok((
                    ctx.push_tm(name.clone(), ty.clone()),
                    Outcome::TermAssumed {
                        name: name.clone(),
                        ty: ty.clone(),
                    },
                ))
            }
            RawStatement::Define {
                name,
                ty: expected,
                term,
            } => {
                let WithInfo(_, name) = name;
                let ix_expected = expected
                    .as_ref()
                    .map(|ty| to_indexed_type(ctx, ty))
                    .transpose()?;
                let ix_term = to_indexed_term(ctx, term)?;
                let ix_ctx = to_indexed_context(ctx)?;
                let actual = deduce_type(&ix_ctx, &ix_term).map_err(|err| err.named(ctx))?;

                let ty = match (expected, ix_expected) {
                    (Some(expected), Some(ix_expected)) => {
                        if actual != ix_expected {
                            let err = SpannedError::ty_ty_mismatch(
                                expected.to_string(),
                                from_indexed_type(ctx, &actual)?.to_string(),
                                term.info(),
                            )
                            .with_span_label("defined type does not match")
                            .with_context(expected.info(), "expected due to this");
                            return Err(TypeCheckError::from(err).into());
                        }
                        expected.clone()
                    }
                    _ => from_indexed_type(ctx, &actual)?,
                };

                Ok((
                    ctx.push_definition(name.clone(), ty.clone(), term.clone()),
                    Outcome::Defined {
                        name: name.clone(),
                        ty,
                    },
                ))
            }
            RawStatement::Reduce { term } => {
                let ix_term = to_indexed_term(ctx, term)?;
                let ix_ctx = to_indexed_context(ctx)?;
                let expected = deduce_type(&ix_ctx, &ix_term).map_err(|err| err.named(ctx))?;

                let reduced = reduce(&ix_ctx, &ix_term)?;
                debug!(%reduced, "reduced");

                let found = deduce_type(&ix_ctx, &reduced).map_err(|err| err.named(ctx))?;
                if found != expected {
                    return Err(PipelineError::UnsoundReduction {
                        expected: from_indexed_type(ctx, &expected)?.to_string(),
                        found: from_indexed_type(ctx, &found)?.to_string(),
                        shadowed: shadowed_ty_names(ctx, [&expected, &found]),
                        span: *span,
                    }
                    .into());
                }

                Ok((
                    ctx.clone(),
                    Outcome::Reduced {
                        term: from_indexed_term(ctx, &reduced)?,
                        ty: from_indexed_type(ctx, &expected)?,
                    },
                ))
            }
            RawStatement::Print { name } => {
                let WithInfo(name_span, name) = name;
                let Some(binding) = ctx.find_tm_binding(name) else {
                    return Err(ValidationError::VarNotFound {
                        ty_var: false,
                        name: name.clone(),
                        span: *name_span,
                    }
                    .into());
                };
                Ok((
                    ctx.clone(),
                    Outcome::Printed {
                        name: name.clone(),
                        ty: binding.ty.clone(),
                        definition: binding.definition.cloned(),
                    },
                ))
            }
            RawStatement::Clear => Ok((ast::Context::new(), Outcome::Cleared)),
        }
    }
}

/// Names of the type binders free in `tys` that a more recent type binder of
/// the same name hides.
fn shadowed_ty_names<'t>(
    ctx: &ast::Context,
    tys: impl IntoIterator<Item = &'t ix::Type>,
) -> Vec<Name> {
    tys.into_iter()
        .flat_map(ix::Type::free_vars)
        .filter_map(|index| {
            let name = ctx.get_ty_binding(index).ok()?;
            (ctx.find_ty_var(name) != Some(index)).then(|| name.clone())
        })
        .unique()
        .collect()
}

/// A running context fed with source text.
#[derive(Default)]
pub struct Session {
    parser: Parser,
    context: ast::Context,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &ast::Context {
        &self.context
    }

    /// Parses `source` and executes each statement in turn.
    ///
    /// A parse error executes nothing and is the only result.
    pub fn run(&mut self, source: &str) -> Vec<Result<Outcome>> {
        let statements = match self.parser.parse_program(source) {
            Ok(statements) => statements,
            Err(err) => return vec![Err(err.into())],
        };
        debug!(count = statements.len(), "parsed statements");

        statements
            .iter()
            .map(|statement| {
                let (next, outcome) = statement.exec(&self.context);
                self.context = next;
                outcome
            })
            .collect()
    }

    /// As [`Session::run`], rendering each outcome or error to text.
    pub fn run_rendered(&mut self, source: &str, origin: &str, renderer: &Renderer) -> Vec<String> {
        self.run(source)
            .into_iter()
            .map(|outcome| match outcome {
                Ok(outcome) => outcome.to_string(),
                Err(err) => err.render(source, origin, renderer),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[track_caller]
    fn run_success(session: &mut Session, source: &str) -> Vec<String> {
        session
            .run(source)
            .into_iter()
            .map(|outcome| match outcome {
                Ok(outcome) => outcome.to_string(),
                Err(err) => panic!("execution failure:\n{source}\n{}", err.render_plain(source, "test")),
            })
            .collect()
    }

    #[track_caller]
    fn run_failure(session: &mut Session, source: &str) -> CompilationError {
        match session.run(source).pop() {
            Some(Err(err)) => err,
            Some(Ok(outcome)) => panic!("execution success:\n{source}\n{outcome}"),
            None => panic!("no statements:\n{source}"),
        }
    }

    #[test]
    fn assumptions() {
        let mut session = Session::new();
        assert_eq!(
            run_success(&mut session, "Variable A; Axiom x: A -> A;"),
            ["A is assumed.", "x: A -> A is assumed."]
        );
        assert_eq!(session.context().len(), 2);
    }

    #[test]
    fn definitions() {
        let mut session = Session::new();
        let outcomes = run_success(
            &mut session,
            "Variable A; Define id = fun x: A. x; Theorem id2: A -> A = id; Print id2",
        );
        assert_eq!(
            outcomes,
            [
                "A is assumed.",
                "id: A -> A is defined.",
                "id2: A -> A is defined.",
                "id2: A -> A\n= id",
            ]
        );
    }

    #[test]
    fn theorem_mismatch() {
        let mut session = Session::new();
        run_success(&mut session, "Variable A; Variable B; Axiom a: A");
        let err = run_failure(&mut session, "Theorem t: B = a");
        let CompilationError::TypeCheck(TypeCheckError::Spanned(err)) = err else {
            panic!("expected a type error: {err:?}");
        };
        assert_eq!(err.text(), "expected: `B`\nfound:    `A`");
        assert_eq!(session.context().len(), 3);
    }

    #[test]
    fn failures_keep_the_context() {
        let mut session = Session::new();
        run_success(&mut session, "Variable A");
        let before = session.context().clone();

        assert!(matches!(
            run_failure(&mut session, "Axiom x: B"),
            CompilationError::Validation(_)
        ));
        assert!(matches!(
            run_failure(&mut session, "Print nothing"),
            CompilationError::Validation(_)
        ));
        assert!(session.context().ptr_eq(&before));

        let (after, outcome) = Parser::default()
            .parse_statement("Define bad = fun x: A. x x")
            .unwrap()
            .exec(&before);
        assert!(matches!(
            outcome,
            Err(CompilationError::TypeCheck(TypeCheckError::Spanned(_)))
        ));
        assert!(after.ptr_eq(&before));
    }

    #[test]
    fn reduction() {
        let mut session = Session::new();
        let outcomes = run_success(
            &mut session,
            "Variable A; Axiom a: A;
            Define k = fun2 B. fun x: B, y: B. x;
            Reduce k [A] a;
            Reduce k;",
        );
        // generated names skip the free `a` and `k`
        assert_eq!(outcomes[3], "fun b: A. a\n: A -> A");
        assert_eq!(
            outcomes[4],
            "fun2 B. fun b: B. fun c: B. b\n: forall B. B -> B -> B"
        );
    }

    #[test]
    fn clearing() {
        let mut session = Session::new();
        run_success(&mut session, "Variable A; Axiom a: A; Clear");
        assert!(session.context().is_empty());
        assert!(matches!(
            run_failure(&mut session, "Reduce a"),
            CompilationError::Validation(_)
        ));
    }

    #[test]
    fn stored_types_under_shadowing() {
        let mut session = Session::new();
        let source = "Variable A; Axiom a: A; Variable A; Define d = a";
        run_success(&mut session, source);

        let err = run_failure(&mut session, "Reduce d");
        let CompilationError::Pipeline(PipelineError::UnsoundReduction {
            expected,
            found,
            shadowed,
            ..
        }) = &err
        else {
            panic!("expected an unsound reduction: {err:?}");
        };
        assert_eq!((expected.as_str(), found.as_str()), ("A", "A"));
        assert_eq!(shadowed, &[Name::from("A")]);

        let rendered = err.render_plain("Reduce d", "test");
        assert!(
            rendered.contains("`A` here names a type variable shadowed by a later `A`"),
            "{rendered}"
        );
    }

    #[test]
    fn parse_errors_run_nothing() {
        let mut session = Session::new();
        let outcomes = session.run("Variable A; Variable");
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], Err(CompilationError::Parse(_))));
        assert!(session.context().is_empty());
    }
}
