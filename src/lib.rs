#![allow(clippy::collapsible_if)]

pub mod builtins;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod imports;
pub mod infer;
pub mod lint;
pub mod scope;
pub mod setters;
pub mod syntax;
pub mod types;

pub use config::LintConfig;
pub use errors::{ResolveError, ResolveResult};
pub use infer::Resolver;
pub use lint::{
    resource::{generators, ResourceDefinition, SchemaError},
    validate_program, Diagnostics, SetterDiagnostic, SetterValidator,
};
pub use scope::ResolutionContext;
pub use types::{Category, Expected, Type};

#[cfg(test)]
mod tests;
