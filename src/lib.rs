pub mod common;
pub mod error;

pub mod evaluation;
pub mod naming;
pub mod parsing;
pub mod pipeline;
pub mod reprs;
pub mod typing;
pub mod validation;
