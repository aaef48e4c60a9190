use std::iter;

use lalrpop_util::lalrpop_mod;

use crate::reprs::{
    ast::{Statement, Term, Type},
    common::Span,
};

pub use self::error::ParseError;

lalrpop_mod!(
    #[allow(clippy::pedantic)]
    syntax,
    "/parsing/syntax.rs"
);

mod error {
    use std::borrow::Cow;

    use annotate_snippets::{AnnotationKind, Group, Level, Snippet};
    use itertools::Itertools;
    use lalrpop_util::lexer::Token;

    use crate::reprs::common::Span;

    type RawParseError<'i> = lalrpop_util::ParseError<usize, Token<'i>, &'static str>;

    #[derive(Clone, Debug)]
    pub struct ParseError {
        span: Span,
        message: String,
        expected: Vec<String>,
    }

    impl ParseError {
        pub(super) fn new(source: &str, err: RawParseError<'_>) -> Self {
            let (span, message, expected) = match err {
                RawParseError::InvalidToken { location } => {
                    let len = source[location..].chars().next().map_or(0, char::len_utf8);
                    (
                        Span::new(location, location + len),
                        "invalid token".to_owned(),
                        Vec::new(),
                    )
                }
                RawParseError::UnrecognizedEof { location, expected } => (
                    Span::new(location, location),
                    "unexpected end of input".to_owned(),
                    expected,
                ),
                RawParseError::UnrecognizedToken {
                    token: (start, Token(_, text), end),
                    expected,
                } => (
                    Span::new(start, end),
                    format!("unexpected token `{text}`"),
                    expected,
                ),
                RawParseError::ExtraToken {
                    token: (start, Token(_, text), end),
                } => (
                    Span::new(start, end),
                    format!("extra token `{text}`"),
                    Vec::new(),
                ),
                RawParseError::User { error } => (Span::default(), error.to_owned(), Vec::new()),
            };
            Self {
                span,
                message,
                expected,
            }
        }

        pub(super) fn unterminated_comment(span: Span) -> Self {
            Self {
                span,
                message: "unterminated comment".to_owned(),
                expected: Vec::new(),
            }
        }

        pub fn span(&self) -> Span {
            self.span
        }

        pub fn message(&self) -> &str {
            &self.message
        }

        pub fn expected(&self) -> &[String] {
            &self.expected
        }

        pub fn into_record<'s>(
            self,
            source: &'s str,
            origin: impl Into<Cow<'s, str>>,
        ) -> Vec<Group<'s>> {
            let Self {
                span,
                message,
                expected,
            } = self;

            let group = Group::with_title(
                Level::ERROR.primary_title(format!("parse error: {message}")),
            )
            .elements(span.within(source).then(|| {
                Snippet::source(source)
                    .path(origin.into())
                    .annotation(AnnotationKind::Primary.span(span.range()))
            }))
            .elements((!expected.is_empty()).then(|| {
                Level::HELP.message(format!("expected one of: {}", expected.iter().join(", ")))
            }));

            vec![group]
        }
    }
}

#[derive(Default)]
pub struct Parser {
    program_parser: syntax::ProgramParser,
    statement_parser: syntax::StatementParser,
    term_parser: syntax::TermParser,
    type_parser: syntax::TypeParser,
}

impl Parser {
    /// Parses `;`-separated statements.
    ///
    /// # Errors
    /// When `input` is not a sequence of statements.
    pub fn parse_program(&self, input: &str) -> Result<Vec<Statement>, ParseError> {
        let input = uncommented(input)?;
        self.program_parser
            .parse(&input)
            .map_err(|err| ParseError::new(&input, err))
    }

    /// # Errors
    /// When `input` is not a single statement.
    pub fn parse_statement(&self, input: &str) -> Result<Statement, ParseError> {
        let input = uncommented(input)?;
        self.statement_parser
            .parse(&input)
            .map_err(|err| ParseError::new(&input, err))
    }

    /// # Errors
    /// When `input` is not a term.
    pub fn parse_term(&self, input: &str) -> Result<Term, ParseError> {
        let input = uncommented(input)?;
        self.term_parser
            .parse(&input)
            .map_err(|err| ParseError::new(&input, err))
    }

    /// # Errors
    /// When `input` is not a type.
    pub fn parse_type(&self, input: &str) -> Result<Type, ParseError> {
        let input = uncommented(input)?;
        self.type_parser
            .parse(&input)
            .map_err(|err| ParseError::new(&input, err))
    }
}

/// Blanks out `(* ... *)` comments, which may nest, keeping every byte
/// offset in place.
///
/// Also returns the start of the outermost comment left open, if any.
fn mask_comments(input: &str) -> (String, Option<usize>) {
    let mut masked = String::with_capacity(input.len());
    let mut depth = 0usize;
    let mut outermost = 0;
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match (c, chars.peek().map(|&(_, next)| next)) {
            ('(', Some('*')) => {
                if depth == 0 {
                    outermost = i;
                }
                depth += 1;
                chars.next();
                masked.push_str("  ");
            }
            ('*', Some(')')) if depth > 0 => {
                depth -= 1;
                chars.next();
                masked.push_str("  ");
            }
            _ if depth > 0 => masked.extend(iter::repeat_n(' ', c.len_utf8())),
            _ => masked.push(c),
        }
    }

    (masked, (depth > 0).then_some(outermost))
}

fn uncommented(input: &str) -> Result<String, ParseError> {
    match mask_comments(input) {
        (masked, None) => Ok(masked),
        (_, Some(start)) => Err(ParseError::unterminated_comment(Span::new(
            start,
            input.len(),
        ))),
    }
}

/// Whether `input` contains a statement terminator outside of comments.
///
/// A line-based front end can use this to decide when to stop buffering.
pub fn has_terminator(input: &str) -> bool {
    mask_comments(input).0.contains(';')
}

#[cfg(test)]
pub mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::reprs::ast::{RawStatement, RawTerm};

    #[track_caller]
    pub(crate) fn parse_success(src: &str) -> Term {
        match Parser::default().parse_term(src) {
            Ok(o) => o,
            Err(e) => panic!("parse failure:\n'{src}'\n{e:#?}"),
        }
    }

    #[track_caller]
    pub(crate) fn parse_failure(src: &str) -> ParseError {
        match Parser::default().parse_term(src) {
            Ok(o) => panic!("parse success:\n'{src}'\n{o:#?}"),
            Err(e) => e,
        }
    }

    #[track_caller]
    fn parse_eq(src1: &str, src2: &str) {
        assert_eq!(parse_success(src1), parse_success(src2));
    }

    #[track_caller]
    fn parse_type_success(src: &str) -> Type {
        match Parser::default().parse_type(src) {
            Ok(o) => o,
            Err(e) => panic!("parse failure:\n'{src}'\n{e:#?}"),
        }
    }

    #[test]
    fn terms() {
        parse_success("x");
        parse_success("fun x: A. x (* comment *)");
        parse_success("(fun x: A. x)");
        parse_success("λ x: A. Λ B. x");
        parse_failure("fun x. x");
        parse_failure("fun x: A.");
        parse_failure("(* unterminated x");
        parse_failure("(* (* still open *) x");

        parse_eq("f x y", "(f x) y");
        parse_eq("f [A] x", "(f [A]) x");
        parse_eq("fun x: A, y: B. x", "fun x: A. fun y: B. x");
        parse_eq("fun2 A, B. x", "fun2 A. fun2 B. x");
        parse_eq("fun x: A -> A. x x", "fun x: (A -> A). (x x)");
        parse_eq("λ x: A. x", "fun x: A. x");
    }

    #[test]
    fn types() {
        assert_eq!(
            parse_type_success("A -> B -> C").to_string(),
            "A -> B -> C"
        );
        assert_eq!(
            parse_type_success("(A -> B) -> C").to_string(),
            "(A -> B) -> C"
        );
        assert_eq!(
            parse_type_success("∀ A, B. A → B").to_string(),
            "forall A. forall B. A -> B"
        );
        assert_eq!(
            parse_type_success("(forall A. A) -> B").to_string(),
            "(forall A. A) -> B"
        );
    }

    #[test]
    fn keywords_are_not_names() {
        parse_failure("fun2");
        parse_success("fun22");
        parse_success("Variables");
        parse_success("x'");
    }

    #[test]
    fn spans() {
        let term = parse_success("  f  x ");
        assert_eq!(term.info(), Span::new(2, 6));
        assert!(matches!(term.1, RawTerm::App { .. }));
    }

    #[test]
    fn programs() {
        let parser = Parser::default();
        let program = parser
            .parse_program(
                "Variable A; Axiom x : A;; Hypothesis y: A;
                Theorem id : A -> A = fun x: A. x;
                Define k = x; Reduce id x; Print id; Clear",
            )
            .unwrap();
        let keywords: Vec<_> = program.iter().map(|s| s.1.keyword()).collect();
        assert_eq!(
            keywords,
            [
                "Variable", "Axiom", "Axiom", "Theorem", "Define", "Reduce", "Print", "Clear"
            ]
        );
        assert!(matches!(
            &program[0].1,
            RawStatement::Variable { name } if &*name.1 == "A"
        ));

        assert!(parser.parse_program("").unwrap().is_empty());
        assert!(parser.parse_program("(* nothing *) ;").unwrap().is_empty());
        assert!(parser.parse_program("Variable A Variable B").is_err());
    }

    #[test]
    fn errors() {
        let err = Parser::default().parse_program("Reduce fun x: A.").unwrap_err();
        assert_eq!(err.message(), "unexpected end of input");
        assert_eq!(err.span(), Span::new(16, 16));
        assert!(!err.expected().is_empty());

        let err = parse_failure("f ]");
        assert_eq!(err.message(), "unexpected token `]`");
        assert_eq!(err.span(), Span::new(2, 3));

        let err = parse_failure("x (* a (* b *) c");
        assert_eq!(err.message(), "unterminated comment");
        assert_eq!(err.span(), Span::new(2, 16));
    }

    #[test]
    fn nested_comments() {
        parse_eq("(* a (* b *) c *) f (* (* *) *) x", "f x");
        parse_eq("f (* λ (* ∀ *) *) x", "f x");
        // offsets after a comment are those of the original input
        let term = parse_success("(* a (* b *) *) x");
        assert_eq!(term.info(), Span::new(16, 17));
    }

    #[test]
    fn terminators() {
        assert!(has_terminator("Variable A;"));
        assert!(!has_terminator("Variable A (* ; *)"));
        assert!(has_terminator("(* ; *) Variable A;"));
        assert!(!has_terminator("Variable A (* ;"));
        assert!(!has_terminator("Variable A (* (* *) ; *)"));
        assert!(has_terminator("(* (* ; *) *) Variable A;"));
        assert!(!has_terminator("(* (* *) Variable A;"));
    }
}
