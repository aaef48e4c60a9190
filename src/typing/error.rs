use std::{borrow::Cow, panic::Location};

use annotate_snippets::{AnnotationKind, Group, Level, Origin, Snippet};

use crate::reprs::{common::Span, context::LookupError};

/// A type error whose types have been rendered to named form.
#[derive(Clone, Debug)]
pub enum TypeCheckError {
    Illegal(IllegalError),
    Spanned(SpannedError),
}

#[derive(Clone, Debug)]
pub struct SpannedError {
    title: Cow<'static, str>,

    span: Span,
    span_label: Cow<'static, str>,

    context_spans: Vec<(Span, Cow<'static, str>)>,

    text: Cow<'static, str>,
}

/// A violated internal invariant: a bug, not a user error.
#[derive(Clone, Debug)]
pub struct IllegalError {
    msg: Cow<'static, str>,
    span: Option<Span>,

    location: &'static Location<'static>,
}

impl From<IllegalError> for TypeCheckError {
    fn from(value: IllegalError) -> Self {
        Self::Illegal(value)
    }
}
impl From<SpannedError> for TypeCheckError {
    fn from(value: SpannedError) -> Self {
        Self::Spanned(value)
    }
}
impl From<LookupError> for TypeCheckError {
    fn from(value: LookupError) -> Self {
        Self::Illegal(value.into())
    }
}

impl From<LookupError> for IllegalError {
    fn from(value: LookupError) -> Self {
        Self {
            msg: value.to_string().into(),
            span: None,
            location: value.location(),
        }
    }
}

impl IllegalError {
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub(crate) fn push_groups<'s>(
        self,
        source: &'s str,
        origin: &Cow<'s, str>,
        buf: &mut Vec<Group<'s>>,
    ) {
        let Self {
            msg,
            span,
            location,
        } = self;

        let group = Level::ERROR
            .primary_title("illegal error (bug)")
            .element(
                Origin::path(location.file())
                    .line(location.line().try_into().expect("not 16-bit arch"))
                    .char_column(location.column().try_into().expect("not 16-bit arch")),
            )
            .elements(span.filter(|span| span.within(source)).map(|span| {
                Snippet::source(source)
                    .path(origin.clone())
                    .annotation(AnnotationKind::Primary.span(span.range()))
            }))
            .element(Level::ERROR.message(msg.into_owned()));
        buf.push(group);
    }
}

impl SpannedError {
    pub fn ty_ty_mismatch(
        expected_ty: impl Into<Cow<'static, str>>,
        found_ty: impl Into<Cow<'static, str>>,
        span: Span,
    ) -> Self {
        let expected_ty = expected_ty.into();
        let found_ty = found_ty.into();
        Self {
            title: format!("type mismatch: expected `{expected_ty}`").into(),

            span,
            span_label: "".into(),
            context_spans: Vec::new(),

            text: format!(
                "expected: `{expected_ty}`\n\
                found:    `{found_ty}`"
            )
            .into(),
        }
    }

    pub fn new(
        title: impl Into<Cow<'static, str>>,
        text: impl Into<Cow<'static, str>>,
        span_label: impl Into<Cow<'static, str>>,
        span: Span,
    ) -> Self {
        Self {
            title: title.into(),
            span,
            span_label: span_label.into(),
            context_spans: Vec::new(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, span: Span, label: impl Into<Cow<'static, str>>) -> Self {
        self.context_spans.push((span, label.into()));
        self
    }

    #[must_use]
    pub fn with_span_label(mut self, span_label: impl Into<Cow<'static, str>>) -> Self {
        self.span_label = span_label.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl TypeCheckError {
    pub fn into_record<'s>(
        self,
        source: &'s str,
        origin: impl Into<Cow<'s, str>>,
    ) -> Vec<Group<'s>> {
        fn if_nonempty<'s>(str: Cow<'static, str>) -> Option<Cow<'s, str>> {
            if str.is_empty() {
                None
            } else {
                Some(Cow::Owned(str.into_owned()))
            }
        }

        let origin = origin.into();
        let mut buf = Vec::new();

        match self {
            Self::Illegal(err) => err.push_groups(source, &origin, &mut buf),
            Self::Spanned(SpannedError {
                title,
                span,
                span_label,
                context_spans,
                text,
            }) => {
                let snippet = span.within(source).then(|| {
                    context_spans
                        .into_iter()
                        .filter(|(span, _)| span.within(source))
                        .fold(
                            Snippet::source(source).path(origin.clone()).annotation(
                                AnnotationKind::Primary
                                    .span(span.range())
                                    .label(if_nonempty(span_label)),
                            ),
                            |snippet, (span, label)| {
                                snippet.annotation(
                                    AnnotationKind::Context
                                        .span(span.range())
                                        .label(if_nonempty(label)),
                                )
                            },
                        )
                });

                let group = Group::with_title(Level::ERROR.primary_title(title.into_owned()))
                    .elements(snippet)
                    .elements(if_nonempty(text).map(|text| Level::ERROR.message(text)));
                buf.push(group);
            }
        }

        buf
    }
}
