pub mod ast;
pub mod span;
pub mod visit;

pub use ast::*;
pub use span::{FileId, Location, SourceMap, Span};
pub use visit::{inspect_expr, inspect_stmt, inspect_stmts};
