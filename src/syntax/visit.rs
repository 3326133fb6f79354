use crate::syntax::ast::{Expr, ExprKind, Stmt};

/// Depth-first walk over every expression reachable from `stmts`.
///
/// The callback sees a node before its children; returning `false` skips
/// the children of that node.
pub fn inspect_stmts<'a, F>(stmts: &'a [Stmt], f: &mut F)
where
    F: FnMut(&'a Expr) -> bool,
{
    for stmt in stmts {
        inspect_stmt(stmt, f);
    }
}

pub fn inspect_stmt<'a, F>(stmt: &'a Stmt, f: &mut F)
where
    F: FnMut(&'a Expr) -> bool,
{
    match stmt {
        Stmt::Expr(expr) | Stmt::Defer(expr) | Stmt::Go(expr) | Stmt::IncDec(expr) => {
            inspect_expr(expr, f)
        }
        Stmt::Assign(assign) => {
            for expr in assign.lhs.iter().chain(&assign.rhs) {
                inspect_expr(expr, f);
            }
        }
        Stmt::Var(specs) => {
            for spec in specs {
                if let Some(ty) = &spec.ty {
                    inspect_expr(ty, f);
                }
                for value in &spec.values {
                    inspect_expr(value, f);
                }
            }
        }
        Stmt::Return(results) => {
            for expr in results {
                inspect_expr(expr, f);
            }
        }
        Stmt::If {
            init,
            cond,
            then,
            otherwise,
        } => {
            if let Some(init) = init {
                inspect_stmt(init, f);
            }
            inspect_expr(cond, f);
            inspect_stmts(then, f);
            if let Some(otherwise) = otherwise {
                inspect_stmt(otherwise, f);
            }
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                inspect_stmt(init, f);
            }
            if let Some(cond) = cond {
                inspect_expr(cond, f);
            }
            if let Some(post) = post {
                inspect_stmt(post, f);
            }
            inspect_stmts(body, f);
        }
        Stmt::Range {
            key,
            value,
            x,
            body,
        } => {
            for expr in [key, value].into_iter().flatten() {
                inspect_expr(expr, f);
            }
            inspect_expr(x, f);
            inspect_stmts(body, f);
        }
        Stmt::Switch { init, tag, cases } => {
            if let Some(init) = init {
                inspect_stmt(init, f);
            }
            if let Some(tag) = tag {
                inspect_expr(tag, f);
            }
            for case in cases {
                for expr in &case.exprs {
                    inspect_expr(expr, f);
                }
                inspect_stmts(&case.body, f);
            }
        }
        Stmt::Block(stmts) => inspect_stmts(stmts, f),
        Stmt::Branch => {}
    }
}

pub fn inspect_expr<'a, F>(expr: &'a Expr, f: &mut F)
where
    F: FnMut(&'a Expr) -> bool,
{
    if !f(expr) {
        return;
    }
    match &expr.kind {
        ExprKind::Selector { x, .. }
        | ExprKind::Slice { x }
        | ExprKind::Star(x)
        | ExprKind::Unary { x, .. }
        | ExprKind::Paren(x) => inspect_expr(x, f),
        ExprKind::Call { fun, args } => {
            inspect_expr(fun, f);
            for arg in args {
                inspect_expr(arg, f);
            }
        }
        ExprKind::Index { x, index } => {
            inspect_expr(x, f);
            inspect_expr(index, f);
        }
        ExprKind::Binary { x, y, .. } => {
            inspect_expr(x, f);
            inspect_expr(y, f);
        }
        ExprKind::TypeAssert { x, ty } => {
            inspect_expr(x, f);
            if let Some(ty) = ty {
                inspect_expr(ty, f);
            }
        }
        ExprKind::CompositeLit { ty, elts } => {
            if let Some(ty) = ty {
                inspect_expr(ty, f);
            }
            for elt in elts {
                inspect_expr(elt, f);
            }
        }
        ExprKind::KeyValue { key, value } => {
            inspect_expr(key, f);
            inspect_expr(value, f);
        }
        ExprKind::FuncLit { body, .. } => inspect_stmts(body, f),
        ExprKind::ArrayType { elem } => inspect_expr(elem, f),
        ExprKind::MapType { key, value } => {
            inspect_expr(key, f);
            inspect_expr(value, f);
        }
        ExprKind::ChanType { value, .. } => inspect_expr(value, f),
        ExprKind::Ellipsis(Some(elem)) => inspect_expr(elem, f),
        ExprKind::Ident(_)
        | ExprKind::BasicLit(_)
        | ExprKind::StructType { .. }
        | ExprKind::FuncType(_)
        | ExprKind::InterfaceType
        | ExprKind::Ellipsis(None)
        | ExprKind::Bad => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{ast::LitKind, span::Span};

    #[test]
    fn pruned_call_hides_its_arguments() {
        let span = Span::default();
        let inner = Expr::call(Expr::ident("inner", span), vec![]);
        let outer = Expr::call(Expr::ident("outer", span), vec![inner]);
        let body = vec![Stmt::Block(vec![Stmt::Expr(outer)])];

        let mut calls = Vec::new();
        inspect_stmts(&body, &mut |expr| {
            if let ExprKind::Call { fun, .. } = &expr.kind {
                calls.push(fun.as_ident().map(|i| i.name.clone()));
                return false;
            }
            true
        });
        assert_eq!(calls, vec![Some("outer".to_string())]);
    }

    #[test]
    fn walks_into_nested_statements() {
        let span = Span::default();
        let lit = Expr::lit(LitKind::Int, "1", span);
        let body = vec![Stmt::If {
            init: None,
            cond: Expr::ident("ok", span),
            then: vec![Stmt::Return(vec![lit])],
            otherwise: Some(Box::new(Stmt::Block(vec![Stmt::Expr(Expr::ident(
                "fallback", span,
            ))]))),
        }];

        let mut seen = 0;
        inspect_stmts(&body, &mut |_| {
            seen += 1;
            true
        });
        assert_eq!(seen, 3);
    }
}
