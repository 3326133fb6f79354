use super::{peel_wrappers, Resolver};
use crate::{
    errors::{ResolveError, ResolveResult},
    scope::{method_key, type_name_only},
    syntax::FieldDecl,
    types::{FuncType, SimpleType, Type},
};
use std::{collections::BTreeMap, rc::Rc};

/// Splits `module.Name` into its parts; unqualified names stay in `module`.
fn split_qualified<'n>(name: &'n str, module: &'n str) -> (&'n str, &'n str) {
    let last_segment = name.rsplit('/').next().unwrap_or(name);
    if !last_segment.contains('.') {
        return (name, module);
    }
    match name.rsplit_once('.') {
        Some((owner, name)) => (name, owner),
        None => (name, module),
    }
}

impl<'a> Resolver<'a> {
    /// Field map of the struct declared as `type_name`, including the fields
    /// promoted from its direct embeds.
    pub fn struct_fields(
        &mut self,
        type_name: &str,
        module: &str,
    ) -> ResolveResult<Rc<BTreeMap<String, Type>>> {
        let (type_name, module) = split_qualified(type_name, module);
        let decl = self
            .scope(module)?
            .declared_types
            .get(type_name)
            .filter(|decl| decl.struct_fields().is_some())
            .cloned()
            .ok_or_else(|| ResolveError::UnknownStruct {
                name: type_name.to_string(),
                module: module.to_string(),
            })?;
        match peel_wrappers(self.resolve_type_decl(&decl, module)?) {
            Type::Struct(strct) => Ok(strct.fields),
            // still being resolved further up the stack
            _ => Ok(Rc::new(BTreeMap::new())),
        }
    }

    pub(crate) fn fields_to_map(
        &mut self,
        fields: &[Rc<FieldDecl>],
        module: &str,
    ) -> ResolveResult<BTreeMap<String, Type>> {
        let mut own = BTreeMap::new();
        let mut promoted = BTreeMap::new();
        for field in fields {
            let ty = self.resolve_type(&field.ty, module)?;
            if !field.is_embedded() {
                for name in &field.names {
                    own.insert(name.clone(), ty.clone());
                }
                continue;
            }
            let Some(base) = type_name_only(&field.ty) else {
                continue;
            };
            let base = base.rsplit('.').next().unwrap_or(&base).to_string();
            for (name, member) in self.embedded_fields(&ty)?.iter() {
                promoted
                    .entry(name.clone())
                    .or_insert_with(|| member.clone());
            }
            own.insert(base, ty);
        }
        for (name, member) in promoted {
            own.entry(name).or_insert(member);
        }
        Ok(own)
    }

    /// Fields an embedded type promotes into its embedder. Embeds named by
    /// an unbound identifier are looked up by name in their owner.
    fn embedded_fields(&mut self, ty: &Type) -> ResolveResult<Rc<BTreeMap<String, Type>>> {
        match peel_wrappers(ty.clone()) {
            Type::Struct(strct) => Ok(strct.fields),
            Type::Simple(SimpleType {
                name,
                owner: Some(owner),
            }) => match self.struct_fields(&name, &owner) {
                Err(ResolveError::UnknownStruct { .. }) => Ok(Rc::new(BTreeMap::new())),
                fields => fields,
            },
            _ => Ok(Rc::new(BTreeMap::new())),
        }
    }

    /// Finds `method` on `receiver` or, failing that, on one of its direct
    /// embeds in declaration order.
    pub fn method_for(&mut self, method: &str, receiver: &str, module: &str) -> ResolveResult<FuncType> {
        let (receiver, module) = split_qualified(receiver, module);
        let scope = self.scope(module)?;
        let mut candidates = vec![receiver.to_string()];
        candidates.extend(scope.embedded_type_names(receiver));

        let found = candidates.into_iter().find_map(|candidate| {
            let key = method_key(Some(candidate.as_str()), method);
            scope
                .functions
                .contains_key(&key)
                .then_some((candidate, key))
        });
        let Some((candidate, key)) = found else {
            return Err(ResolveError::MissingMethod {
                method: method.to_string(),
                receiver: receiver.to_string(),
            });
        };
        let mut func = self.cached_function_type(&key, module)?;
        func.receiver = Some(candidate);
        Ok(func)
    }

    /// Type of `x.member` given the type of `x`.
    pub fn member_type(&mut self, ty: &Type, member: &str, module: &str) -> ResolveResult<Type> {
        match ty {
            Type::Array(_) => Err(ResolveError::ArrayMember {
                member: member.to_string(),
            }),
            Type::Struct(strct) => match strct.fields.get(member) {
                Some(field) => Ok(field.clone()),
                None => self
                    .method_for(member, &strct.name, &strct.owner)
                    .map(Type::Func),
            },
            Type::Wrapper(wrapper) => {
                if let Type::Struct(strct) = peel_wrappers(ty.clone()) {
                    if let Some(field) = strct.fields.get(member) {
                        return Ok(field.clone());
                    }
                }
                self.method_for(member, &wrapper.name, &wrapper.owner)
                    .map(Type::Func)
            }
            Type::Simple(simple) => {
                let owner = simple.owner.as_deref().unwrap_or(module);
                let fields = match self.struct_fields(&simple.name, owner) {
                    Ok(fields) => fields,
                    Err(ResolveError::UnknownStruct { .. }) => Rc::new(BTreeMap::new()),
                    Err(err) => return Err(err),
                };
                match fields.get(member) {
                    Some(field) => Ok(field.clone()),
                    None => self.method_for(member, &simple.name, owner).map(Type::Func),
                }
            }
            Type::Map(_) | Type::Func(_) | Type::Interface | Type::Stub => {
                Err(ResolveError::NoMembers {
                    ty: ty.qualified_name(),
                })
            }
        }
    }
}
