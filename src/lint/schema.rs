use crate::types::Expected;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub expected: Expected,
    /// Neither `Optional` nor `Required`: only the provider sets it.
    pub read_only: bool,
}

/// Field name -> declaration, as found in a resource's `Schema` map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceSchema {
    fields: BTreeMap<String, Field>,
}

impl ResourceSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, expected: impl Into<Expected>, read_only: bool) -> Self {
        self.insert(name, expected, read_only);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, expected: impl Into<Expected>, read_only: bool) {
        self.fields.insert(
            name.into(),
            Field {
                expected: expected.into(),
                read_only,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields a user can configure.
    pub fn argument_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, field)| !field.read_only)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Every field, configurable or computed.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}
