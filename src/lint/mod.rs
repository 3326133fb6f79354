//! Checks `d.Set(key, value)` calls of resource lifecycle functions against
//! the resource schema.

pub mod resource;
pub mod schema;

use crate::{
    config::LintConfig,
    errors::ResolveError,
    infer::Resolver,
    scope::ResolutionContext,
    syntax::{inspect_stmts, Expr, ExprKind, FuncDecl, Location, Program},
    types::{Type, WrapperOverrides},
};
use miette::Diagnostic;
use resource::{module_generators, ResourceDefinition, SchemaError};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Diagnostic)]
pub enum SetterDiagnostic {
    #[error("{location} - broken setter for field `{key}`: field missing in the schema defined in `{resource}`")]
    #[diagnostic(code(setter_lint::missing_field))]
    MissingField {
        location: Location,
        key: String,
        resource: String,
    },
    #[error("{location} - field `{key}` has invalid type `{found}`, expected `{expected}`")]
    #[diagnostic(code(setter_lint::type_mismatch))]
    TypeMismatch {
        location: Location,
        key: String,
        found: String,
        expected: String,
    },
    #[error("{location} - can't determine expression type for field `{key}`")]
    #[diagnostic(code(setter_lint::unresolved))]
    Undetermined { location: Location, key: String },
    #[error("{location} - error getting `{key}` value type: {source}")]
    #[diagnostic(code(setter_lint::unresolved))]
    Unresolved {
        location: Location,
        key: String,
        #[source]
        source: ResolveError,
    },
    #[error("{location} - function `{function}` has {arity} parameters")]
    #[diagnostic(
        code(setter_lint::signature),
        help("lifecycle functions take `(ctx, d, meta)` or `(d, meta)`")
    )]
    UnsupportedSignature {
        location: Location,
        function: String,
        arity: usize,
    },
    #[error("{location} - broken resource definition `{resource}`: {source}")]
    #[diagnostic(code(setter_lint::definition))]
    Definition {
        location: Location,
        resource: String,
        #[source]
        source: SchemaError,
    },
    #[error("can't build scope of module `{module}`: {source}")]
    #[diagnostic(code(setter_lint::scope))]
    Scope {
        module: String,
        #[source]
        source: ResolveError,
    },
}

impl SetterDiagnostic {
    /// Schema key the finding is about, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            SetterDiagnostic::MissingField { key, .. }
            | SetterDiagnostic::TypeMismatch { key, .. }
            | SetterDiagnostic::Undetermined { key, .. }
            | SetterDiagnostic::Unresolved { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Every finding of a run, in discovery order.
#[derive(Debug, Default, Error, Diagnostic)]
#[error("found {count} broken setter(s)", count = .items.len())]
#[diagnostic(code(setter_lint::report))]
pub struct Diagnostics {
    #[related]
    items: Vec<SetterDiagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: SetterDiagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SetterDiagnostic> {
        self.items.iter()
    }

    pub fn into_result(self) -> Result<(), Diagnostics> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = SetterDiagnostic;
    type IntoIter = std::vec::IntoIter<SetterDiagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Name of the `*schema.ResourceData` parameter: second of
/// `(ctx, d, meta)`, first of `(d, meta)`.
fn data_holder(func: &FuncDecl) -> Result<Option<&str>, usize> {
    let names = func.param_names();
    match names.len() {
        3 => Ok(names[1]),
        2 => Ok(names[0]),
        arity => Err(arity),
    }
}

fn is_holder_set(fun: &Expr, holder: &str) -> bool {
    let ExprKind::Selector { x, sel } = &fun.kind else {
        return false;
    };
    sel == "Set" && x.as_ident().is_some_and(|ident| ident.name == holder)
}

pub struct SetterValidator<'a> {
    resolver: Resolver<'a>,
    overrides: &'a WrapperOverrides,
}

impl<'a> SetterValidator<'a> {
    pub fn new(program: &'a Program, ctx: &'a mut ResolutionContext, config: &'a LintConfig) -> Self {
        Self {
            resolver: Resolver::new(program, ctx),
            overrides: &config.wrapper_overrides,
        }
    }

    pub fn validate(&mut self, target: &ResourceDefinition) -> Result<(), Diagnostics> {
        let mut diagnostics = Diagnostics::default();
        self.check(target, &mut diagnostics);
        diagnostics.into_result()
    }

    fn check(&mut self, target: &ResourceDefinition, diagnostics: &mut Diagnostics) {
        let program = self.resolver.program();
        for func in &target.operating_fns {
            let holder = match data_holder(func) {
                Ok(Some(holder)) => holder,
                Ok(None) => {
                    warn!(function = %func.name, "function has anonymous schema.ResourceData argument");
                    continue;
                }
                Err(arity) => {
                    diagnostics.push(SetterDiagnostic::UnsupportedSignature {
                        location: program.sources.location(func.span),
                        function: func.name.clone(),
                        arity,
                    });
                    continue;
                }
            };

            let mut calls = Vec::new();
            inspect_stmts(&func.body, &mut |expr| match &expr.kind {
                ExprKind::Call { fun, args } if is_holder_set(fun, holder) => {
                    calls.push((expr, args));
                    false
                }
                _ => true,
            });
            debug!(function = %func.name, setters = calls.len(), "checking setters");

            for (call, args) in calls {
                let [key, value] = args.as_slice() else {
                    warn!(function = %func.name, "{holder}.Set call has invalid argument number");
                    continue;
                };
                // dynamic keys can't be checked
                let Some(key) = key.as_string_lit() else {
                    continue;
                };
                if let Some(diagnostic) = self.check_setter(target, key, value, call) {
                    diagnostics.push(diagnostic);
                }
            }
        }
    }

    fn check_setter(
        &mut self,
        target: &ResourceDefinition,
        key: &str,
        value: &Expr,
        call: &Expr,
    ) -> Option<SetterDiagnostic> {
        let location = self.resolver.program().sources.location(call.span);
        let Some(field) = target.schema.get(key) else {
            return Some(SetterDiagnostic::MissingField {
                location,
                key: key.to_string(),
                resource: target.name.clone(),
            });
        };
        let ty = match self.resolver.resolve_type(value, &target.module) {
            Ok(Type::Stub) => {
                return Some(SetterDiagnostic::Undetermined {
                    location,
                    key: key.to_string(),
                })
            }
            Ok(ty) => ty,
            Err(source) => {
                return Some(SetterDiagnostic::Unresolved {
                    location,
                    key: key.to_string(),
                    source,
                })
            }
        };
        let matched = self
            .resolver
            .extended_match(&ty, &field.expected, self.overrides)
            .unwrap_or_else(|err| {
                debug!(%err, "value can't be matched as a whole");
                false
            });
        (!matched).then(|| SetterDiagnostic::TypeMismatch {
            location,
            key: key.to_string(),
            found: ty.to_string(),
            expected: field.expected.to_string(),
        })
    }
}

/// Lints every resource generator of `program`.
pub fn validate_program(program: &Program, config: &LintConfig) -> Result<(), Diagnostics> {
    let mut ctx = ResolutionContext::new();
    let mut diagnostics = Diagnostics::default();
    for module in program.modules() {
        let generators = module_generators(module, config);
        if generators.is_empty() {
            continue;
        }
        if let Err(source) = ctx.scope(program, &module.id) {
            diagnostics.push(SetterDiagnostic::Scope {
                module: module.id.clone(),
                source,
            });
            continue;
        }
        debug!(module = %module.id, generators = generators.len(), "validating module");

        for generator in generators {
            match ResourceDefinition::load(program, module, &generator.func, config) {
                Ok(definition) => {
                    SetterValidator::new(program, &mut ctx, config).check(&definition, &mut diagnostics)
                }
                Err(source) => diagnostics.push(SetterDiagnostic::Definition {
                    location: program.sources.location(generator.func.span),
                    resource: generator.name().to_string(),
                    source,
                }),
            }
        }
    }
    diagnostics.into_result()
}
