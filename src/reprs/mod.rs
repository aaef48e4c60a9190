pub mod ast;
pub mod common;
pub mod context;
pub mod ix;
