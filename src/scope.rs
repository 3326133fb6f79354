use crate::{
    errors::{ResolveError, ResolveResult},
    syntax::{Expr, ExprKind, FuncDecl, Module, Program, Span, TypeDecl, ValueSpec},
    types::{qualified_name, FuncType, Type},
};
use std::{
    collections::{hash_map::Entry, HashMap},
    rc::Rc,
};
use tracing::debug;

/// Key of a function in its module scope: `Receiver.Name`, or the bare name.
pub fn method_key(receiver: Option<&str>, name: &str) -> String {
    match receiver {
        Some(receiver) if !receiver.is_empty() => qualified_name(receiver, name),
        _ => name.to_string(),
    }
}

/// Shallow type name of a receiver or embedded field: `T`, `*T` or `pkg.T`.
pub fn type_name_only(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Ident(ident) => Some(ident.name.clone()),
        ExprKind::Star(inner) | ExprKind::Paren(inner) => type_name_only(inner),
        // generic receiver `T[K]`
        ExprKind::Index { x, .. } => type_name_only(x),
        ExprKind::Selector { x, sel } => {
            type_name_only(x).map(|owner| qualified_name(&owner, sel))
        }
        _ => None,
    }
}

pub fn receiver_name(func: &FuncDecl) -> Option<Option<String>> {
    match &func.receiver {
        None => Some(None),
        Some(receiver) => type_name_only(&receiver.ty).map(Some),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum AnonymousKind {
    Struct,
    Func,
}

/// Symbol table of one module plus the memoized resolutions made in it.
pub struct Scope {
    pub module: Rc<Module>,
    pub functions: HashMap<String, Rc<FuncDecl>>,
    pub declared_types: HashMap<String, Rc<TypeDecl>>,
    pub values: HashMap<String, Rc<ValueSpec>>,
    pub resolved_function_types: HashMap<String, FuncType>,
    /// Named and anonymous types by name. A `Simple` entry marks a type
    /// whose declaration is still being resolved.
    pub resolved_types: HashMap<String, Type>,
    pub(crate) anonymous: HashMap<(Span, AnonymousKind), String>,
}

impl Scope {
    pub fn build(module: Rc<Module>) -> ResolveResult<Self> {
        let mut functions = HashMap::new();
        for func in &module.functions {
            let receiver = receiver_name(func).ok_or_else(|| ResolveError::MalformedReceiver {
                function: func.name.clone(),
                module: module.id.clone(),
            })?;
            functions.insert(method_key(receiver.as_deref(), &func.name), func.clone());
        }

        let declared_types = module
            .types
            .iter()
            .map(|decl| (decl.name.clone(), decl.clone()))
            .collect();

        let mut values = HashMap::new();
        for spec in &module.values {
            for name in &spec.names {
                values.insert(name.clone(), spec.clone());
            }
        }

        debug!(
            module = %module.id,
            functions = functions.len(),
            "built module scope"
        );
        Ok(Self {
            module,
            functions,
            declared_types,
            values,
            resolved_function_types: HashMap::new(),
            resolved_types: HashMap::new(),
            anonymous: HashMap::new(),
        })
    }

    pub fn module_id(&self) -> &str {
        &self.module.id
    }

    /// Names of the types embedded directly into a struct declaration.
    pub fn embedded_type_names(&self, type_name: &str) -> Vec<String> {
        let Some(fields) = self
            .declared_types
            .get(type_name)
            .and_then(|decl| decl.struct_fields())
        else {
            return Vec::new();
        };
        fields
            .iter()
            .filter(|field| field.is_embedded())
            .filter_map(|field| match &field.ty.kind {
                ExprKind::Ident(ident) => Some(ident.name.clone()),
                ExprKind::Star(inner) => inner.as_ident().map(|ident| ident.name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// State shared by every resolution of one validation run.
#[derive(Default)]
pub struct ResolutionContext {
    scopes: HashMap<String, Scope>,
    failed: HashMap<String, ResolveError>,
    anonymous_counter: usize,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scope of `module_id`, building it on first use.
    pub fn scope(&mut self, program: &Program, module_id: &str) -> ResolveResult<&mut Scope> {
        if let Some(err) = self.failed.get(module_id) {
            return Err(err.clone());
        }
        match self.scopes.entry(module_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let module = program
                    .module(module_id)
                    .ok_or_else(|| ResolveError::UnknownModule {
                        module: module_id.to_string(),
                    })?;
                match Scope::build(module.clone()) {
                    Ok(scope) => Ok(entry.insert(scope)),
                    Err(err) => {
                        self.failed.insert(module_id.to_string(), err.clone());
                        Err(err)
                    }
                }
            }
        }
    }

    pub fn is_built(&self, module_id: &str) -> bool {
        self.scopes.contains_key(module_id)
    }

    pub(crate) fn next_anonymous_name(&mut self, prefix: &str) -> String {
        self.anonymous_counter += 1;
        format!("{prefix}{:08}", self.anonymous_counter)
    }
}
