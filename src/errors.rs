use thiserror::Error;

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("module `{module}` is not loaded")]
    UnknownModule { module: String },
    #[error("can't resolve import `{alias}` used in `{module}`")]
    UnknownImport { alias: String, module: String },
    #[error("malformed receiver of function `{function}` in `{module}`")]
    MalformedReceiver { function: String, module: String },
    #[error("can't find `{name}` on the left side of its assignment")]
    MissingAssignmentTarget { name: String },
    #[error("too complex assignment of `{name}`: {count} values on the right side")]
    TooComplexAssignment { name: String, count: usize },
    #[error("can't find declaration `{name}` in `{module}`")]
    UnknownDeclaration { name: String, module: String },
    #[error("can't find function declaration `{name}` in `{module}`")]
    UnknownFunction { name: String, module: String },
    #[error("no struct with name `{name}` is found in `{module}`")]
    UnknownStruct { name: String, module: String },
    #[error("can't find method `{method}` of `{receiver}`")]
    MissingMethod { method: String, receiver: String },
    #[error("array values have no member `{member}`")]
    ArrayMember { member: String },
    #[error("type `{ty}` has no members")]
    NoMembers { ty: String },
    #[error("can't use non-simple type `{key}` as a map key")]
    NonSimpleMapKey { key: String },
    #[error("can't use non-callable type `{ty}` in a call")]
    NotCallable { ty: String },
    #[error("function `{function}` has no result at position {position}")]
    MissingResult { function: String, position: usize },
    #[error("invalid range expression type `{ty}`")]
    InvalidRange { ty: String },
    #[error("can't index a value of type `{ty}`")]
    InvalidIndex { ty: String },
    #[error("unresolved basic literal type: {kind}")]
    UnsupportedLiteral { kind: String },
    #[error("channel is send-only, no data can be received from it")]
    SendOnlyChannel,
    #[error("struct `{name}` can't be matched against `{expected}` as a whole")]
    StructCategory { name: String, expected: String },
}
