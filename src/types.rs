use crate::{
    builtins,
    errors::{ResolveError, ResolveResult},
};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    rc::Rc,
};

/// Structural categories a schema field can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    String,
    Int,
    Float,
    Bool,
    Array,
    Map,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::String => "string",
            Category::Int => "int",
            Category::Float => "float",
            Category::Bool => "bool",
            Category::Array => "array",
            Category::Map => "map",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a checked value has to match: a category, or exactly one named type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    Category(Category),
    Named(String),
}

impl Expected {
    pub fn as_str(&self) -> &str {
        match self {
            Expected::Category(category) => category.as_str(),
            Expected::Named(name) => name,
        }
    }
}

impl From<Category> for Expected {
    fn from(category: Category) -> Self {
        Expected::Category(category)
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualified wrapper name -> category it behaves as.
pub type WrapperOverrides = HashMap<String, Category>;

/// Joins an owner and a member name unless the member is already qualified.
pub fn qualified_name(owner: &str, name: &str) -> String {
    if owner.is_empty() {
        return name.to_string();
    }
    let last_segment = name.rsplit('/').next().unwrap_or(name);
    if last_segment.contains('.') {
        return name.to_string();
    }
    format!("{owner}.{name}")
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimpleType {
    pub name: String,
    pub owner: Option<String>,
}

impl SimpleType {
    pub fn qualified_name(&self) -> String {
        qualified_name(self.owner.as_deref().unwrap_or(""), &self.name)
    }

    fn matches(&self, expected: &Expected) -> bool {
        if let Some(category) = builtins::normalize(&self.name) {
            return category == expected.as_str();
        }
        self.qualified_name() == expected.as_str()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapType {
    pub key: SimpleType,
    pub value: Box<Type>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructType {
    pub name: String,
    pub owner: String,
    pub fields: Rc<BTreeMap<String, Type>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FuncType {
    pub name: String,
    pub owner: String,
    pub receiver: Option<String>,
    pub args: Vec<Type>,
    pub results: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WrapperType {
    pub name: String,
    pub owner: String,
    pub wrapped: Box<Type>,
}

impl WrapperType {
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.owner, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Simple(SimpleType),
    Array(Box<Type>),
    Map(MapType),
    Struct(StructType),
    Func(FuncType),
    Wrapper(WrapperType),
    Interface,
    Stub,
}

impl Type {
    pub fn simple(name: impl Into<String>, owner: Option<&str>) -> Self {
        Type::Simple(SimpleType {
            name: name.into(),
            owner: owner.map(str::to_string),
        })
    }

    /// A predeclared type, never bound to a module.
    pub fn builtin(name: &str) -> Self {
        Type::simple(builtins::normalize(name).unwrap_or(name), None)
    }

    pub fn array(item: Type) -> Self {
        Type::Array(Box::new(item))
    }

    pub fn map(key: Type, value: Type) -> ResolveResult<Self> {
        match key {
            Type::Simple(key) => Ok(Type::Map(MapType {
                key,
                value: Box::new(value),
            })),
            other => Err(ResolveError::NonSimpleMapKey {
                key: other.qualified_name(),
            }),
        }
    }

    /// Unqualified name, as declared.
    pub fn name(&self) -> String {
        match self {
            Type::Simple(simple) => simple.name.clone(),
            Type::Array(item) => format!("array:{}", item.name()),
            Type::Map(map) => format!("map[{}]{}", map.key.name, map.value.name()),
            Type::Struct(strct) => strct.name.clone(),
            Type::Func(func) => func.name.clone(),
            Type::Wrapper(wrapper) => wrapper.name.clone(),
            Type::Interface => "interface{}".into(),
            Type::Stub => "stub".into(),
        }
    }

    /// Module that declared the type, if any.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Type::Simple(simple) => simple.owner.as_deref(),
            Type::Array(item) => item.owner(),
            Type::Struct(strct) => Some(&strct.owner),
            Type::Func(func) => Some(&func.owner),
            Type::Wrapper(wrapper) => Some(&wrapper.owner),
            Type::Map(_) | Type::Interface | Type::Stub => None,
        }
    }

    pub fn qualified_name(&self) -> String {
        match self {
            Type::Simple(simple) => simple.qualified_name(),
            Type::Array(item) => format!("array:{}", item.qualified_name()),
            Type::Map(map) => format!(
                "map[{}]{}",
                map.key.qualified_name(),
                map.value.qualified_name()
            ),
            Type::Struct(strct) => qualified_name(&strct.owner, &strct.name),
            Type::Func(func) => qualified_name(&func.owner, &func.name),
            Type::Wrapper(wrapper) => wrapper.qualified_name(),
            Type::Interface | Type::Stub => self.name(),
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self, Type::Stub)
    }

    /// Structural compatibility with an expected category or named type.
    ///
    /// Structs can't be compared as a whole: callers have to pick a member
    /// first, otherwise `StructCategory` is returned.
    pub fn matches(&self, expected: &Expected, overrides: &WrapperOverrides) -> ResolveResult<bool> {
        match self {
            Type::Simple(simple) => Ok(simple.matches(expected)),
            Type::Array(_) => Ok(*expected == Expected::Category(Category::Array)),
            Type::Map(_) => Ok(*expected == Expected::Category(Category::Map)),
            Type::Wrapper(wrapper) => match overrides.get(&wrapper.qualified_name()) {
                Some(category) => Ok(category.as_str() == expected.as_str()),
                None => wrapper.wrapped.matches(expected, overrides),
            },
            Type::Func(func) => match func.results.first() {
                Some(result) => result.matches(expected, overrides),
                None => Ok(false),
            },
            Type::Interface => Ok(true),
            Type::Stub => Ok(false),
            Type::Struct(strct) => Err(ResolveError::StructCategory {
                name: qualified_name(&strct.owner, &strct.name),
                expected: expected.to_string(),
            }),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "github.com/hashicorp/terraform-plugin-sdk/v2/helper/schema";

    fn matches(ty: &Type, category: Category) -> bool {
        ty.matches(&category.into(), &WrapperOverrides::new())
            .expect("matchable type")
    }

    #[test]
    fn numeric_synonyms_match_their_category() {
        for name in ["float", "float32", "float64"] {
            let ty = Type::simple(name, None);
            assert!(matches(&ty, Category::Float), "{name} should be a float");
            assert!(!matches(&ty, Category::Int));
        }
        for name in ["int", "int32", "int64"] {
            assert!(matches(&Type::simple(name, None), Category::Int));
        }
        assert!(matches(&Type::simple("true", None), Category::Bool));
    }

    #[test]
    fn bound_simple_compares_qualified_name() {
        let ty = Type::simple("Status", Some("example.com/provider/api"));
        assert!(!matches(&ty, Category::String));
        let named = Expected::Named("example.com/provider/api.Status".into());
        assert!(ty.matches(&named, &WrapperOverrides::new()).expect("simple"));
    }

    #[test]
    fn arrays_only_match_array() {
        for item in [Type::builtin("string"), Type::Interface, Type::Stub] {
            let ty = Type::array(item);
            assert!(matches(&ty, Category::Array));
            assert!(!matches(&ty, Category::Map));
        }
    }

    #[test]
    fn map_requires_simple_key() {
        let ok = Type::map(Type::builtin("string"), Type::Interface).expect("simple key");
        assert!(matches(&ok, Category::Map));
        assert!(!matches(&ok, Category::Array));

        let err = Type::map(Type::array(Type::builtin("int")), Type::Interface);
        assert!(matches!(err, Err(ResolveError::NonSimpleMapKey { .. })));
    }

    #[test]
    fn wrapper_override_wins_over_wrapped_type() {
        let wrapper = Type::Wrapper(WrapperType {
            name: "Set".into(),
            owner: SCHEMA.into(),
            wrapped: Box::new(Type::builtin("string")),
        });
        let mut overrides = WrapperOverrides::new();
        overrides.insert(format!("{SCHEMA}.Set"), Category::Array);

        let array = Expected::Category(Category::Array);
        let string = Expected::Category(Category::String);
        assert!(wrapper.matches(&array, &overrides).expect("wrapper"));
        assert!(!wrapper.matches(&string, &overrides).expect("wrapper"));
        assert!(wrapper
            .matches(&string, &WrapperOverrides::new())
            .expect("wrapper"));
    }

    #[test]
    fn interface_matches_everything_and_stub_nothing() {
        for category in [Category::String, Category::Array, Category::Map] {
            assert!(matches(&Type::Interface, category));
            assert!(!matches(&Type::Stub, category));
        }
    }

    #[test]
    fn struct_is_not_a_category() {
        let strct = Type::Struct(StructType {
            name: "Config".into(),
            owner: "example.com/provider".into(),
            fields: Rc::new(BTreeMap::new()),
        });
        let result = strct.matches(&Category::String.into(), &WrapperOverrides::new());
        assert!(matches!(result, Err(ResolveError::StructCategory { .. })));
    }

    #[test]
    fn qualified_names_are_not_requalified() {
        assert_eq!(qualified_name("", "Foo"), "Foo");
        assert_eq!(qualified_name("pkg", "Foo"), "pkg.Foo");
        assert_eq!(qualified_name("pkg", "other/mod.Foo"), "other/mod.Foo");
        assert_eq!(qualified_name("example.com/a", "Foo"), "example.com/a.Foo");
    }
}
