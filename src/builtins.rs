//! Predeclared identifiers of the checked language.

const BUILTIN_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

const BUILTIN_VALUES: &[&str] = &["true", "false", "iota", "nil"];

const BUILTIN_FUNCS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover",
];

const FLOATS: &[&str] = &["float", "float64", "float32"];
const INTS: &[&str] = &["int", "int64", "int32"];
const BOOLS: &[&str] = &["bool", "true", "false"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name) || BUILTIN_VALUES.contains(&name) || BUILTIN_FUNCS.contains(&name)
}

pub fn is_builtin_func(name: &str) -> bool {
    BUILTIN_FUNCS.contains(&name)
}

/// Collapses numeric and boolean synonyms into their category name.
pub fn normalize(name: &str) -> Option<&'static str> {
    if FLOATS.contains(&name) {
        Some("float")
    } else if INTS.contains(&name) {
        Some("int")
    } else if BOOLS.contains(&name) {
        Some("bool")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_synonyms_collapse() {
        assert_eq!(normalize("float32"), Some("float"));
        assert_eq!(normalize("int64"), Some("int"));
        assert_eq!(normalize("true"), Some("bool"));
        assert_eq!(normalize("string"), None);
    }

    #[test]
    fn builtins_cover_types_values_and_functions() {
        assert!(is_builtin("string"));
        assert!(is_builtin("nil"));
        assert!(is_builtin("make"));
        assert!(is_builtin_func("append"));
        assert!(!is_builtin_func("string"));
        assert!(!is_builtin("Resource"));
    }
}
