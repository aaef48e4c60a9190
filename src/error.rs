use annotate_snippets::{Group, Renderer};

use crate::{
    evaluation::EvaluationError, parsing::ParseError, pipeline::PipelineError,
    reprs::context::LookupError, typing::TypeCheckError, validation::ValidationError,
};

#[derive(Clone, Debug)]
pub enum CompilationError {
    Parse(ParseError),
    Validation(ValidationError),
    TypeCheck(TypeCheckError),
    Evaluation(EvaluationError),
    Pipeline(PipelineError),
}

impl From<ParseError> for CompilationError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<ValidationError> for CompilationError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TypeCheckError> for CompilationError {
    fn from(value: TypeCheckError) -> Self {
        Self::TypeCheck(value)
    }
}

impl From<EvaluationError> for CompilationError {
    fn from(value: EvaluationError) -> Self {
        Self::Evaluation(value)
    }
}

impl From<PipelineError> for CompilationError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<LookupError> for CompilationError {
    fn from(value: LookupError) -> Self {
        Self::TypeCheck(value.into())
    }
}

impl CompilationError {
    pub fn into_record<'s>(self, source: &'s str, origin: &'s str) -> Vec<Group<'s>> {
        match self {
            Self::Parse(parse_error) => parse_error.into_record(source, origin),
            Self::Validation(validation_error) => validation_error.into_record(source, origin),
            Self::TypeCheck(type_check_error) => type_check_error.into_record(source, origin),
            Self::Evaluation(evaluation_error) => evaluation_error.into_record(source, origin),
            Self::Pipeline(pipeline_error) => pipeline_error.into_record(source, origin),
        }
    }

    pub fn render(self, source: &str, origin: &str, renderer: &Renderer) -> String {
        renderer.render(&self.into_record(source, origin))
    }

    pub fn render_styled(self, source: &str, origin: &str) -> String {
        self.render(source, origin, &Renderer::styled())
    }

    pub fn render_plain(self, source: &str, origin: &str) -> String {
        self.render(source, origin, &Renderer::plain())
    }
}
