use crate::syntax::span::{FileId, SourceMap, Span};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    rc::Rc,
};

/// Every module handed over by the loader, keyed by module id.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub sources: SourceMap,
    modules: BTreeMap<String, Rc<Module>>,
}

impl Program {
    pub fn new(sources: SourceMap) -> Self {
        Self {
            sources,
            modules: BTreeMap::new(),
        }
    }

    pub fn add_module(&mut self, module: Module) -> Rc<Module> {
        let module = Rc::new(module);
        self.modules.insert(module.id.clone(), module.clone());
        module
    }

    pub fn module(&self, id: &str) -> Option<&Rc<Module>> {
        self.modules.get(id)
    }

    /// Modules in id order.
    pub fn modules(&self) -> impl Iterator<Item = &Rc<Module>> {
        self.modules.values()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Module {
    pub id: String,
    /// Declared short name, the default import alias.
    pub name: String,
    pub files: Vec<SourceFile>,
    pub functions: Vec<Rc<FuncDecl>>,
    pub types: Vec<Rc<TypeDecl>>,
    pub values: Vec<Rc<ValueSpec>>,
    /// Dependency identifier (import path) -> module id.
    pub dependencies: HashMap<String, String>,
}

impl Module {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.id == id)
    }

    pub fn free_function(&self, name: &str) -> Option<&Rc<FuncDecl>> {
        self.functions
            .iter()
            .find(|func| func.receiver.is_none() && func.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct SourceFile {
    pub id: FileId,
    pub imports: Vec<ImportSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSpec {
    pub path: String,
    pub alias: Option<String>,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
        }
    }

    pub fn aliased(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn last_segment(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: Option<Receiver>,
    pub params: Vec<Rc<FieldDecl>>,
    pub results: Vec<Rc<FieldDecl>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FuncDecl {
    /// Parameter names in declaration order; unnamed parameters yield `None`.
    pub fn param_names(&self) -> Vec<Option<&str>> {
        let mut names = Vec::new();
        for param in &self.params {
            if param.names.is_empty() {
                names.push(None);
            } else {
                names.extend(param.names.iter().map(|name| Some(name.as_str())));
            }
        }
        names
    }
}

#[derive(Clone, Debug)]
pub struct Receiver {
    pub name: Option<String>,
    pub ty: Expr,
}

/// A parameter, result or struct field group: `a, b int`, or an unnamed
/// (embedded) entry when `names` is empty.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub ty: Expr,
    pub span: Span,
}

impl FieldDecl {
    pub fn named(name: impl Into<String>, ty: Expr) -> Rc<Self> {
        let span = ty.span;
        Rc::new(Self {
            names: vec![name.into()],
            ty,
            span,
        })
    }

    pub fn unnamed(ty: Expr) -> Rc<Self> {
        let span = ty.span;
        Rc::new(Self {
            names: Vec::new(),
            ty,
            span,
        })
    }

    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: String,
    pub ty: Expr,
    pub span: Span,
}

impl TypeDecl {
    pub fn struct_fields(&self) -> Option<&[Rc<FieldDecl>]> {
        match &self.ty.kind {
            ExprKind::StructType { fields } => Some(fields),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ValueSpec {
    pub names: Vec<String>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub rhs: Vec<Expr>,
    pub define: bool,
    pub span: Span,
}

/// The declaration an identifier resolves to inside its file.
#[derive(Clone)]
pub enum Binding {
    Assign(Rc<AssignStmt>),
    Type(Rc<TypeDecl>),
    Field(Rc<FieldDecl>),
    Value(Rc<ValueSpec>),
    Func(Rc<FuncDecl>),
}

// Declarations may reference themselves through their bodies, so only the
// declaration kind and name are printed.
impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Assign(stmt) => write!(f, "Assign(line {})", stmt.span.line),
            Binding::Type(decl) => write!(f, "Type({})", decl.name),
            Binding::Field(field) => write!(f, "Field({:?})", field.names),
            Binding::Value(spec) => write!(f, "Value({:?})", spec.names),
            Binding::Func(func) => write!(f, "Func({})", func.name),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ident {
    pub name: String,
    pub binding: Option<Binding>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
    /// The `map` keyword token.
    Map,
}

#[derive(Clone, Debug)]
pub struct BasicLit {
    pub kind: LitKind,
    pub value: String,
}

impl BasicLit {
    pub fn unquoted(&self) -> Option<&str> {
        if self.kind != LitKind::String {
            return None;
        }
        Some(self.value.trim_matches(|c| c == '"' || c == '`'))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `&x`
    Addr,
    /// `range x`
    Range,
    /// `<-x`
    Recv,
    Not,
    Neg,
    Plus,
    Xor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogAnd,
    LogOr,
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
}

impl BinaryOp {
    pub fn yields_bool(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::LogAnd
                | BinaryOp::LogOr
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug, Default)]
pub struct FuncTypeExpr {
    pub params: Vec<Rc<FieldDecl>>,
    pub results: Vec<Rc<FieldDecl>>,
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Ident(Ident),
    BasicLit(BasicLit),
    Selector {
        x: Box<Expr>,
        sel: String,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        x: Box<Expr>,
    },
    Star(Box<Expr>),
    Unary {
        op: UnaryOp,
        x: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    Paren(Box<Expr>),
    TypeAssert {
        x: Box<Expr>,
        ty: Option<Box<Expr>>,
    },
    CompositeLit {
        ty: Option<Box<Expr>>,
        elts: Vec<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    FuncLit {
        ty: FuncTypeExpr,
        body: Vec<Stmt>,
    },
    ArrayType {
        elem: Box<Expr>,
    },
    MapType {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    ChanType {
        dir: ChanDir,
        value: Box<Expr>,
    },
    StructType {
        fields: Vec<Rc<FieldDecl>>,
    },
    FuncType(FuncTypeExpr),
    InterfaceType,
    Ellipsis(Option<Box<Expr>>),
    /// A node the parser could not make sense of.
    Bad,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(
            ExprKind::Ident(Ident {
                name: name.into(),
                binding: None,
            }),
            span,
        )
    }

    pub fn bound(name: impl Into<String>, binding: Binding, span: Span) -> Self {
        Self::new(
            ExprKind::Ident(Ident {
                name: name.into(),
                binding: Some(binding),
            }),
            span,
        )
    }

    pub fn selector(x: Expr, sel: impl Into<String>) -> Self {
        let span = x.span;
        Self::new(
            ExprKind::Selector {
                x: Box::new(x),
                sel: sel.into(),
            },
            span,
        )
    }

    pub fn call(fun: Expr, args: Vec<Expr>) -> Self {
        let span = fun.span;
        Self::new(
            ExprKind::Call {
                fun: Box::new(fun),
                args,
            },
            span,
        )
    }

    pub fn lit(kind: LitKind, value: impl Into<String>, span: Span) -> Self {
        Self::new(
            ExprKind::BasicLit(BasicLit {
                kind,
                value: value.into(),
            }),
            span,
        )
    }

    pub fn string_lit(value: &str, span: Span) -> Self {
        Self::lit(LitKind::String, format!("\"{value}\""), span)
    }

    pub fn star(inner: Expr) -> Self {
        let span = inner.span;
        Self::new(ExprKind::Star(Box::new(inner)), span)
    }

    pub fn unary(op: UnaryOp, inner: Expr) -> Self {
        let span = inner.span;
        Self::new(
            ExprKind::Unary {
                op,
                x: Box::new(inner),
            },
            span,
        )
    }

    pub fn array_of(elem: Expr) -> Self {
        let span = elem.span;
        Self::new(
            ExprKind::ArrayType {
                elem: Box::new(elem),
            },
            span,
        )
    }

    pub fn map_of(key: Expr, value: Expr) -> Self {
        let span = key.span;
        Self::new(
            ExprKind::MapType {
                key: Box::new(key),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn composite(ty: Option<Expr>, elts: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::CompositeLit {
                ty: ty.map(Box::new),
                elts,
            },
            span,
        )
    }

    pub fn key_value(key: Expr, value: Expr) -> Self {
        let span = key.span;
        Self::new(
            ExprKind::KeyValue {
                key: Box::new(key),
                value: Box::new(value),
            },
            span,
        )
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    pub fn as_string_lit(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::BasicLit(lit) => lit.unquoted(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Expr(Expr),
    Assign(Rc<AssignStmt>),
    Var(Vec<Rc<ValueSpec>>),
    Return(Vec<Expr>),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        x: Expr,
        body: Vec<Stmt>,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        cases: Vec<CaseClause>,
    },
    Block(Vec<Stmt>),
    Defer(Expr),
    Go(Expr),
    IncDec(Expr),
    Branch,
}

#[derive(Clone, Debug)]
pub struct CaseClause {
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
}
