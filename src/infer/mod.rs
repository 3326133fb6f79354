//! Structural type inference for expressions, across module boundaries.
//!
//! The resolver only needs enough precision to classify a value into a
//! category, so unknown expression shapes resolve to `Type::Stub` instead of
//! failing.

mod structs;

use crate::{
    builtins,
    errors::{ResolveError, ResolveResult},
    imports::{absolute_import, import_by_name},
    scope::{method_key, receiver_name, AnonymousKind, ResolutionContext, Scope},
    syntax::{
        BasicLit, Binding, ChanDir, Expr, ExprKind, FieldDecl, FuncDecl, FuncTypeExpr, Ident,
        LitKind, Module, Program, Span, TypeDecl, UnaryOp,
    },
    types::{Expected, FuncType, StructType, Type, WrapperOverrides, WrapperType},
};
use std::rc::Rc;
use tracing::debug;

pub struct Resolver<'a> {
    program: &'a Program,
    ctx: &'a mut ResolutionContext,
}

impl<'a> Resolver<'a> {
    pub fn new(program: &'a Program, ctx: &'a mut ResolutionContext) -> Self {
        Self { program, ctx }
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    fn scope(&mut self, module: &str) -> ResolveResult<&mut Scope> {
        self.ctx.scope(self.program, module)
    }

    fn module(&self, module: &str) -> ResolveResult<&'a Rc<Module>> {
        self.program
            .module(module)
            .ok_or_else(|| ResolveError::UnknownModule {
                module: module.to_string(),
            })
    }

    /// Infers the type of `expr` as seen from `module`.
    pub fn resolve_type(&mut self, expr: &Expr, module: &str) -> ResolveResult<Type> {
        match &expr.kind {
            ExprKind::Ident(ident) => self.resolve_ident(ident, module),
            ExprKind::BasicLit(lit) => literal_type(lit),
            ExprKind::Selector { x, sel } => self.resolve_selector(x, sel, module),
            ExprKind::Call { fun, args } => self.resolve_call(fun, args, module),
            ExprKind::Index { x, .. } => match peel_wrappers(self.resolve_type(x, module)?) {
                Type::Array(item) => Ok(*item),
                Type::Map(map) => Ok(*map.value),
                other => Err(ResolveError::InvalidIndex {
                    ty: other.qualified_name(),
                }),
            },
            ExprKind::Slice { x } | ExprKind::Star(x) | ExprKind::Paren(x) => {
                self.resolve_type(x, module)
            }
            ExprKind::Unary { op, x } => self.resolve_unary(*op, x, module),
            ExprKind::Binary { op, x, .. } => {
                if op.yields_bool() {
                    Ok(Type::builtin("bool"))
                } else {
                    self.resolve_type(x, module)
                }
            }
            ExprKind::TypeAssert { x, ty } => match ty {
                Some(ty) => self.resolve_type(ty, module),
                None => self.resolve_type(x, module),
            },
            ExprKind::CompositeLit { ty, .. } => match ty {
                Some(ty) => self.resolve_type(ty, module),
                None => Ok(Type::Stub),
            },
            ExprKind::FuncLit { ty, .. } | ExprKind::FuncType(ty) => {
                self.anonymous_func(ty, expr.span, module)
            }
            ExprKind::ArrayType { elem } => Ok(Type::array(self.resolve_type(elem, module)?)),
            ExprKind::Ellipsis(Some(elem)) => Ok(Type::array(self.resolve_type(elem, module)?)),
            ExprKind::MapType { key, value } => {
                let value = self.resolve_type(value, module)?;
                let key = self.resolve_type(key, module)?;
                Type::map(key, value)
            }
            ExprKind::ChanType { dir, value } => match dir {
                ChanDir::Send => Err(ResolveError::SendOnlyChannel),
                ChanDir::Recv | ChanDir::Both => self.resolve_type(value, module),
            },
            ExprKind::StructType { fields } => self.anonymous_struct(fields, expr.span, module),
            ExprKind::InterfaceType => Ok(Type::Interface),
            // Not value expressions; nothing structural to report.
            ExprKind::KeyValue { .. } | ExprKind::Ellipsis(None) | ExprKind::Bad => Ok(Type::Stub),
        }
    }

    fn resolve_ident(&mut self, ident: &Ident, module: &str) -> ResolveResult<Type> {
        let name = ident.name.as_str();
        match &ident.binding {
            None if builtins::is_builtin(name) => Ok(Type::builtin(name)),
            None => Ok(Type::simple(name, Some(module))),
            Some(Binding::Assign(stmt)) => {
                let position = stmt
                    .lhs
                    .iter()
                    .position(|lhs| lhs.as_ident().is_some_and(|lhs| lhs.name == name))
                    .ok_or_else(|| ResolveError::MissingAssignmentTarget { name: name.into() })?;
                self.resolve_assigned(name, position, &stmt.rhs, module)
            }
            Some(Binding::Type(decl)) => self.resolve_type_decl(decl, module),
            Some(Binding::Field(field)) => self.resolve_type(&field.ty, module),
            Some(Binding::Value(spec)) => {
                if let Some(ty) = &spec.ty {
                    return self.resolve_type(ty, module);
                }
                let position = spec
                    .names
                    .iter()
                    .position(|declared| declared == name)
                    .ok_or_else(|| ResolveError::MissingAssignmentTarget { name: name.into() })?;
                self.resolve_assigned(name, position, &spec.values, module)
            }
            Some(Binding::Func(decl)) => self.function_type(decl, module).map(Type::Func),
        }
    }

    /// Type of the value landing at `position` of an assignment's left side.
    fn resolve_assigned(
        &mut self,
        name: &str,
        position: usize,
        rhs: &[Expr],
        module: &str,
    ) -> ResolveResult<Type> {
        let [value] = rhs else {
            return Err(ResolveError::TooComplexAssignment {
                name: name.into(),
                count: rhs.len(),
            });
        };
        match &value.kind {
            ExprKind::Call { fun, args } => {
                let signature = self.call_signature(fun, args, module)?;
                signature
                    .results
                    .get(position)
                    .cloned()
                    .ok_or(ResolveError::MissingResult {
                        function: signature.name,
                        position,
                    })
            }
            _ => self.resolve_type(value, module),
        }
    }

    fn resolve_unary(&mut self, op: UnaryOp, x: &Expr, module: &str) -> ResolveResult<Type> {
        match op {
            UnaryOp::Addr | UnaryOp::Recv | UnaryOp::Neg | UnaryOp::Plus | UnaryOp::Xor => {
                self.resolve_type(x, module)
            }
            UnaryOp::Not => Ok(Type::builtin("bool")),
            UnaryOp::Range => match peel_wrappers(self.resolve_type(x, module)?) {
                Type::Array(item) => Ok(*item),
                other => Err(ResolveError::InvalidRange {
                    ty: other.qualified_name(),
                }),
            },
        }
    }

    fn resolve_call(&mut self, fun: &Expr, args: &[Expr], module: &str) -> ResolveResult<Type> {
        let signature = self.call_signature(fun, args, module)?;
        signature
            .results
            .into_iter()
            .next()
            .ok_or(ResolveError::MissingResult {
                function: signature.name,
                position: 0,
            })
    }

    /// Signature of whatever `fun` calls; conversions to a named or builtin
    /// type yield that type as their only result.
    fn call_signature(&mut self, fun: &Expr, args: &[Expr], module: &str) -> ResolveResult<FuncType> {
        if let Some(ident) = fun.as_ident() {
            if ident.binding.is_none() && builtins::is_builtin_func(&ident.name) {
                let result = match ident.name.as_str() {
                    "make" | "new" | "append" => match args.first() {
                        Some(arg) => self.resolve_type(arg, module)?,
                        None => Type::Stub,
                    },
                    "len" | "cap" | "copy" => Type::builtin("int"),
                    "real" | "imag" => Type::builtin("float"),
                    _ => Type::Stub,
                };
                return Ok(FuncType {
                    name: ident.name.clone(),
                    owner: module.to_string(),
                    receiver: None,
                    args: Vec::new(),
                    results: vec![result],
                });
            }
        }
        match self.resolve_type(fun, module)? {
            Type::Func(func) => Ok(func),
            conversion @ (Type::Simple(_) | Type::Wrapper(_)) => Ok(FuncType {
                name: conversion.name(),
                owner: conversion.owner().unwrap_or(module).to_string(),
                receiver: None,
                args: Vec::new(),
                results: vec![conversion],
            }),
            other => Err(ResolveError::NotCallable {
                ty: other.qualified_name(),
            }),
        }
    }

    fn resolve_selector(&mut self, x: &Expr, sel: &str, module: &str) -> ResolveResult<Type> {
        if let Some(ident) = x.as_ident().filter(|ident| ident.binding.is_none()) {
            let current = self.module(module)?;
            match absolute_import(self.program, &ident.name, x.span.file, current) {
                Ok(target) => {
                    let target = import_by_name(self.program, current, &target)?;
                    debug!(from = module, to = %target.id, member = sel, "cross-module lookup");
                    return self.resolve_member(sel, &target.id);
                }
                Err(err) => {
                    // A package-level name declared in another file of the
                    // module carries no binding either.
                    if !self.has_top_level(&ident.name, module)? {
                        return Err(err);
                    }
                    let x_type = self.resolve_member(&ident.name, module)?;
                    return self.member_type(&x_type, sel, module);
                }
            }
        }
        let x_type = self.resolve_type(x, module)?;
        self.member_type(&x_type, sel, module)
    }

    fn has_top_level(&mut self, name: &str, module: &str) -> ResolveResult<bool> {
        let scope = self.scope(module)?;
        Ok(scope.functions.contains_key(name)
            || scope.declared_types.contains_key(name)
            || scope.values.contains_key(name))
    }

    /// Resolves a top-level name of `module`.
    pub fn resolve_member(&mut self, name: &str, module: &str) -> ResolveResult<Type> {
        let scope = self.scope(module)?;
        if scope.functions.contains_key(name) {
            return self.cached_function_type(name, module).map(Type::Func);
        }
        if let Some(decl) = scope.declared_types.get(name).cloned() {
            return self.resolve_type_decl(&decl, module);
        }
        if let Some(spec) = scope.values.get(name).cloned() {
            if let Some(ty) = &spec.ty {
                return self.resolve_type(ty, module);
            }
            let position = spec
                .names
                .iter()
                .position(|declared| declared == name)
                .unwrap_or(0);
            return self.resolve_assigned(name, position, &spec.values, module);
        }
        if builtins::is_builtin(name) {
            return Ok(Type::builtin(name));
        }
        Ok(Type::simple(name, Some(module)))
    }

    /// Type of a named declaration: a wrapper over whatever it declares.
    ///
    /// The name is cached as a placeholder before the body is resolved, so
    /// self-referencing declarations see a named `Simple` reference instead
    /// of recursing.
    pub fn resolve_type_decl(&mut self, decl: &Rc<TypeDecl>, module: &str) -> ResolveResult<Type> {
        let scope = self.scope(module)?;
        if let Some(cached) = scope.resolved_types.get(&decl.name) {
            return Ok(cached.clone());
        }
        scope
            .resolved_types
            .insert(decl.name.clone(), Type::simple(decl.name.clone(), Some(module)));

        let wrapped = match decl.struct_fields() {
            Some(fields) => self.fields_to_map(fields, module).map(|fields| {
                Type::Struct(StructType {
                    name: decl.name.clone(),
                    owner: module.to_string(),
                    fields: Rc::new(fields),
                })
            }),
            None => self.resolve_type(&decl.ty, module),
        };
        let wrapped = match wrapped {
            Ok(wrapped) => wrapped,
            Err(err) => {
                self.scope(module)?.resolved_types.remove(&decl.name);
                return Err(err);
            }
        };

        let ty = Type::Wrapper(WrapperType {
            name: decl.name.clone(),
            owner: module.to_string(),
            wrapped: Box::new(wrapped),
        });
        self.scope(module)?
            .resolved_types
            .insert(decl.name.clone(), ty.clone());
        Ok(ty)
    }

    /// Function type of a declaration, cached under its method key.
    pub fn function_type(&mut self, decl: &FuncDecl, module: &str) -> ResolveResult<FuncType> {
        let receiver = receiver_name(decl).ok_or_else(|| ResolveError::MalformedReceiver {
            function: decl.name.clone(),
            module: module.to_string(),
        })?;
        let key = method_key(receiver.as_deref(), &decl.name);
        if let Some(cached) = self.scope(module)?.resolved_function_types.get(&key) {
            return Ok(cached.clone());
        }
        let mut func = self.function_signature(decl, receiver, module)?;
        func.name = key.clone();
        self.scope(module)?
            .resolved_function_types
            .insert(key, func.clone());
        Ok(func)
    }

    /// Function type of the declaration registered under `key` in `module`.
    pub fn cached_function_type(&mut self, key: &str, module: &str) -> ResolveResult<FuncType> {
        let scope = self.scope(module)?;
        if let Some(cached) = scope.resolved_function_types.get(key) {
            return Ok(cached.clone());
        }
        let decl = scope
            .functions
            .get(key)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownFunction {
                name: key.to_string(),
                module: module.to_string(),
            })?;
        self.function_type(&decl, module)
    }

    fn function_signature(
        &mut self,
        decl: &FuncDecl,
        receiver: Option<String>,
        module: &str,
    ) -> ResolveResult<FuncType> {
        // Arguments never take part in matching, so unresolvable ones are kept
        // as stubs instead of failing the whole signature.
        let args = self.field_types(&decl.params, module, true)?;
        let results = self.field_types(&decl.results, module, false)?;
        Ok(FuncType {
            name: decl.name.clone(),
            owner: module.to_string(),
            receiver,
            args,
            results,
        })
    }

    fn field_types(
        &mut self,
        fields: &[Rc<FieldDecl>],
        module: &str,
        lenient: bool,
    ) -> ResolveResult<Vec<Type>> {
        let mut types = Vec::new();
        for field in fields {
            let ty = match self.resolve_type(&field.ty, module) {
                Ok(ty) => ty,
                Err(err) if lenient => {
                    debug!(%err, "argument type left unresolved");
                    Type::Stub
                }
                Err(err) => return Err(err),
            };
            let count = field.names.len().max(1);
            types.extend(std::iter::repeat(ty).take(count));
        }
        Ok(types)
    }

    fn anonymous_name(&mut self, span: Span, kind: AnonymousKind, module: &str) -> ResolveResult<(String, bool)> {
        if let Some(name) = self.scope(module)?.anonymous.get(&(span, kind)) {
            return Ok((name.clone(), true));
        }
        let prefix = match kind {
            AnonymousKind::Struct => "struct",
            AnonymousKind::Func => "func",
        };
        let name = self.ctx.next_anonymous_name(prefix);
        self.scope(module)?
            .anonymous
            .insert((span, kind), name.clone());
        Ok((name, false))
    }

    fn anonymous_struct(
        &mut self,
        fields: &[Rc<FieldDecl>],
        span: Span,
        module: &str,
    ) -> ResolveResult<Type> {
        let (name, known) = self.anonymous_name(span, AnonymousKind::Struct, module)?;
        if known {
            if let Some(cached) = self.scope(module)?.resolved_types.get(&name) {
                return Ok(cached.clone());
            }
        }
        self.scope(module)?
            .resolved_types
            .insert(name.clone(), Type::simple(name.clone(), Some(module)));
        let fields = match self.fields_to_map(fields, module) {
            Ok(fields) => fields,
            Err(err) => {
                self.scope(module)?.resolved_types.remove(&name);
                return Err(err);
            }
        };
        let ty = Type::Struct(StructType {
            name: name.clone(),
            owner: module.to_string(),
            fields: Rc::new(fields),
        });
        self.scope(module)?.resolved_types.insert(name, ty.clone());
        Ok(ty)
    }

    fn anonymous_func(&mut self, ty: &FuncTypeExpr, span: Span, module: &str) -> ResolveResult<Type> {
        let (name, known) = self.anonymous_name(span, AnonymousKind::Func, module)?;
        if known {
            if let Some(cached) = self.scope(module)?.resolved_function_types.get(&name) {
                return Ok(Type::Func(cached.clone()));
            }
        }
        let func = FuncType {
            name: name.clone(),
            owner: module.to_string(),
            receiver: None,
            args: self.field_types(&ty.params, module, true)?,
            results: self.field_types(&ty.results, module, false)?,
        };
        self.scope(module)?
            .resolved_function_types
            .insert(name, func.clone());
        Ok(Type::Func(func))
    }

    /// Resolves a type's own declared name inside `module`.
    pub fn resolve_local_type(&mut self, name: &str, module: &str) -> ResolveResult<Type> {
        let scope = self.scope(module)?;
        if let Some(decl) = scope.declared_types.get(name).cloned() {
            return self.resolve_type_decl(&decl, module);
        }
        if scope.functions.contains_key(name) {
            return self.cached_function_type(name, module).map(Type::Func);
        }
        Err(ResolveError::UnknownDeclaration {
            name: name.to_string(),
            module: module.to_string(),
        })
    }

    /// `Type::matches`, retried once against the type's declaration when the
    /// literal comparison fails.
    pub fn extended_match(
        &mut self,
        ty: &Type,
        expected: &Expected,
        overrides: &WrapperOverrides,
    ) -> ResolveResult<bool> {
        if ty.matches(expected, overrides)? {
            return Ok(true);
        }
        let Some(owner) = ty.owner() else {
            return Ok(false);
        };
        match self.resolve_local_type(&ty.name(), owner) {
            Ok(resolved) => resolved.matches(expected, overrides),
            Err(err) => {
                debug!(%err, ty = %ty, "no local declaration to retry the match with");
                Ok(false)
            }
        }
    }
}

fn literal_type(lit: &BasicLit) -> ResolveResult<Type> {
    match lit.kind {
        LitKind::String => Ok(Type::builtin("string")),
        LitKind::Int => Ok(Type::builtin("int")),
        LitKind::Float => Ok(Type::builtin("float")),
        LitKind::Map => Ok(Type::builtin("map")),
        LitKind::Char | LitKind::Imag => Err(ResolveError::UnsupportedLiteral {
            kind: format!("{:?}", lit.kind),
        }),
    }
}

/// Strips named wrappers down to the structural type underneath.
pub(crate) fn peel_wrappers(ty: Type) -> Type {
    match ty {
        Type::Wrapper(wrapper) => peel_wrappers(*wrapper.wrapped),
        other => other,
    }
}
