use super::schema::ResourceSchema;
use crate::{
    config::LintConfig,
    errors::ResolveError,
    imports::{absolute_import, import_by_name},
    syntax::{Binding, Expr, ExprKind, FuncDecl, Module, Program, SourceFile, Stmt, UnaryOp},
};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("function `{function}` has no return statement")]
    NoReturn { function: String },
    #[error("number of returns is more than 1 in `{function}`")]
    MultipleReturns { function: String },
    #[error("unknown kind of return in `{function}`")]
    UnsupportedReturn { function: String },
    #[error("too complex assignment of `{name}`")]
    TooComplexAssignment { name: String },
    #[error("can't find schema definition in a `Schema` field")]
    InvalidSchema,
    #[error("the element #{index} is not a key-value element")]
    NotKeyValue { index: usize },
    #[error("the key of element #{index} is not a string literal")]
    NonStringKey { index: usize },
    #[error("invalid `Type` field of `{field}`")]
    InvalidTypeField { field: String },
    #[error("invalid declaration of field `{field}`")]
    UnsupportedField { field: String },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Alias under which `file` imports the package at `path`.
pub fn schema_import_alias(file: &SourceFile, path: &str) -> Option<String> {
    file.imports
        .iter()
        .find(|import| import.path == path)
        .map(|import| {
            import
                .alias
                .clone()
                .unwrap_or_else(|| import.last_segment().to_string())
        })
}

/// Functions shaped `func name(...) *alias.Resource`.
pub fn is_resource_generator(func: &FuncDecl, alias: &str) -> bool {
    if func.receiver.is_some() {
        return false;
    }
    let [result] = func.results.as_slice() else {
        return false;
    };
    if result.names.len() > 1 {
        return false;
    }
    let ExprKind::Star(pointee) = &result.ty.kind else {
        return false;
    };
    let ExprKind::Selector { x, sel } = &pointee.kind else {
        return false;
    };
    sel == "Resource" && x.as_ident().is_some_and(|ident| ident.name == alias)
}

/// A function building a resource definition.
#[derive(Clone, Debug)]
pub struct Generator {
    pub module: Rc<Module>,
    pub func: Rc<FuncDecl>,
}

impl Generator {
    pub fn name(&self) -> &str {
        &self.func.name
    }
}

pub fn module_generators(module: &Rc<Module>, config: &LintConfig) -> Vec<Generator> {
    module
        .functions
        .iter()
        .filter(|func| {
            module
                .file(func.span.file)
                .and_then(|file| schema_import_alias(file, &config.schema_import_path))
                .is_some_and(|alias| is_resource_generator(func, &alias))
        })
        .map(|func| Generator {
            module: module.clone(),
            func: func.clone(),
        })
        .collect()
}

/// Every generator of every module, in module id order.
pub fn generators(program: &Program, config: &LintConfig) -> Vec<Generator> {
    program
        .modules()
        .flat_map(|module| module_generators(module, config))
        .collect()
}

/// Schema and lifecycle functions of one resource, ready to be linted.
#[derive(Clone, Debug)]
pub struct ResourceDefinition {
    pub name: String,
    pub module: String,
    pub schema: ResourceSchema,
    pub operating_fns: Vec<Rc<FuncDecl>>,
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>, module: impl Into<String>, schema: ResourceSchema) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            schema,
            operating_fns: Vec::new(),
        }
    }

    pub fn load(
        program: &Program,
        module: &Module,
        func: &FuncDecl,
        config: &LintConfig,
    ) -> Result<Self, SchemaError> {
        let composite = returned_composite(func)?.ok_or_else(|| SchemaError::NoReturn {
            function: func.name.clone(),
        })?;
        let mut definition = Self::new(func.name.clone(), module.id.clone(), ResourceSchema::new());
        let ExprKind::CompositeLit { elts, .. } = &composite.kind else {
            return Err(SchemaError::UnsupportedReturn {
                function: func.name.clone(),
            });
        };

        for elt in elts {
            let ExprKind::KeyValue { key, value } = &elt.kind else {
                continue;
            };
            let Some(key) = key.as_ident() else {
                warn!(resource = %func.name, "failed to parse resource field key");
                continue;
            };
            if config.is_operating_function(&key.name) {
                match operating_function(module, value) {
                    Some(decl) => definition.operating_fns.push(decl),
                    None => warn!(resource = %func.name, field = %key.name, "can't parse operating function"),
                }
                continue;
            }
            if key.name == "Schema" {
                let ExprKind::CompositeLit { elts, .. } = &value.kind else {
                    return Err(SchemaError::InvalidSchema);
                };
                definition.schema = parse_schema(program, module, elts, config)?;
            }
        }
        debug!(
            resource = %definition.name,
            fields = definition.schema.len(),
            operating_fns = definition.operating_fns.len(),
            "loaded resource definition"
        );
        Ok(definition)
    }
}

fn operating_function(module: &Module, value: &Expr) -> Option<Rc<FuncDecl>> {
    let ident = value.as_ident()?;
    match &ident.binding {
        Some(Binding::Func(decl)) => Some(decl.clone()),
        Some(_) => None,
        // declared in another file of the module
        None => module.free_function(&ident.name).cloned(),
    }
}

/// Composite literal returned by the first top-level `return` of `func`,
/// either directly or through a variable holding it.
fn returned_composite(func: &FuncDecl) -> Result<Option<&Expr>, SchemaError> {
    let Some(results) = func.body.iter().find_map(|stmt| match stmt {
        Stmt::Return(results) => Some(results),
        _ => None,
    }) else {
        return Ok(None);
    };
    let [result] = results.as_slice() else {
        return Err(SchemaError::MultipleReturns {
            function: func.name.clone(),
        });
    };
    if let Some(composite) = composite_of(result) {
        return Ok(Some(composite));
    }
    let unsupported = || SchemaError::UnsupportedReturn {
        function: func.name.clone(),
    };
    let Some(Binding::Assign(assign)) = result.as_ident().and_then(|ident| ident.binding.as_ref()) else {
        return Err(unsupported());
    };
    let [value] = assign.rhs.as_slice() else {
        return Err(SchemaError::TooComplexAssignment {
            name: result.as_ident().map(|ident| ident.name.clone()).unwrap_or_default(),
        });
    };
    composite_of(value).map(Some).ok_or_else(unsupported)
}

fn composite_of(expr: &Expr) -> Option<&Expr> {
    match &expr.kind {
        ExprKind::CompositeLit { .. } => Some(expr),
        ExprKind::Unary {
            op: UnaryOp::Addr,
            x,
        }
        | ExprKind::Paren(x) => composite_of(x),
        _ => None,
    }
}

struct FieldShape {
    type_name: String,
    read_only: bool,
}

fn parse_schema(
    program: &Program,
    module: &Module,
    elts: &[Expr],
    config: &LintConfig,
) -> Result<ResourceSchema, SchemaError> {
    let mut schema = ResourceSchema::new();
    for (index, elt) in elts.iter().enumerate() {
        let ExprKind::KeyValue { key, value } = &elt.kind else {
            return Err(SchemaError::NotKeyValue { index });
        };
        let Some(name) = key.as_string_lit() else {
            return Err(SchemaError::NonStringKey { index });
        };
        match parse_field(program, module, name, value)? {
            Some(shape) => schema.insert(name, config.expected_for(&shape.type_name), shape.read_only),
            None => warn!(field = name, "can't process schema field"),
        }
    }
    Ok(schema)
}

fn parse_field(
    program: &Program,
    module: &Module,
    field: &str,
    value: &Expr,
) -> Result<Option<FieldShape>, SchemaError> {
    if let Some(composite) = composite_of(value) {
        return parse_composite(field, composite).map(Some);
    }
    let ExprKind::Call { fun, .. } = &value.kind else {
        return Err(SchemaError::UnsupportedField {
            field: field.to_string(),
        });
    };
    let Some(decl) = field_function(program, module, fun)? else {
        return Ok(None);
    };
    match returned_composite(&decl)? {
        Some(composite) => parse_composite(field, composite).map(Some),
        None => Ok(None),
    }
}

/// Declaration of a function building a schema field, local or imported.
fn field_function(
    program: &Program,
    module: &Module,
    fun: &Expr,
) -> Result<Option<Rc<FuncDecl>>, SchemaError> {
    match &fun.kind {
        ExprKind::Ident(ident) => match &ident.binding {
            Some(Binding::Func(decl)) => Ok(Some(decl.clone())),
            _ => Ok(module.free_function(&ident.name).cloned()),
        },
        ExprKind::Selector { x, sel } => {
            let Some(alias) = x.as_ident() else {
                return Ok(None);
            };
            let id = absolute_import(program, &alias.name, x.span.file, module)?;
            let target = import_by_name(program, module, &id)?;
            match target.free_function(sel) {
                Some(decl) => Ok(Some(decl.clone())),
                None => Err(SchemaError::from(ResolveError::UnknownFunction {
                    name: sel.clone(),
                    module: target.id.clone(),
                })),
            }
        }
        _ => Ok(None),
    }
}

fn parse_composite(field: &str, composite: &Expr) -> Result<FieldShape, SchemaError> {
    let unsupported = || SchemaError::UnsupportedField {
        field: field.to_string(),
    };
    let ExprKind::CompositeLit { elts, .. } = &composite.kind else {
        return Err(unsupported());
    };
    let mut type_name = None;
    let mut read_only = true;
    for elt in elts {
        let ExprKind::KeyValue { key, value } = &elt.kind else {
            return Err(unsupported());
        };
        let Some(key) = key.as_ident() else {
            return Err(unsupported());
        };
        match key.name.as_str() {
            "Type" => match &value.kind {
                ExprKind::Selector { sel, .. } => type_name = Some(sel.clone()),
                _ => {
                    return Err(SchemaError::InvalidTypeField {
                        field: field.to_string(),
                    })
                }
            },
            "Optional" | "Required" => {
                if !value.as_ident().is_some_and(|flag| flag.name == "false") {
                    read_only = false;
                }
            }
            _ => {}
        }
    }
    // untyped fields stay in the schema with an empty type
    let type_name = type_name.unwrap_or_else(|| {
        warn!(field, "schema field declares no `Type`");
        String::new()
    });
    Ok(FieldShape {
        type_name,
        read_only,
    })
}
