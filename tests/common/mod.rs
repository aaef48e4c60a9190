use annotate_snippets::{Group, Level, Renderer};
use system_f::error::CompilationError;

pub fn render_error(error: impl Into<CompilationError>, source: &str, origin: &str) -> String {
    let error = error.into();
    let err_type = match &error {
        CompilationError::Parse(_) => "parse",
        CompilationError::Validation(_) => "validation",
        CompilationError::TypeCheck(_) => "type-check",
        CompilationError::Evaluation(_) => "evaluation",
        CompilationError::Pipeline(_) => "pipeline",
    };

    let mut groups = error.into_record(source, origin);

    groups.insert(
        0,
        Group::with_title(Level::ERROR.primary_title(format!("aborting due to {err_type} error"))),
    );

    Renderer::plain().render(&groups)
}
