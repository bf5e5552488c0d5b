//! Shared utilities for visitor implementations

use ruff_python_ast::{Arguments, Expr, Number};

/// Value of a keyword argument that must be a literal constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralArg {
    /// Keyword not supplied, or supplied as `None`
    Absent,
    /// String, number or boolean literal, rendered as Python's `str()` would
    Literal(String),
    /// Any other expression form
    NonLiteral,
}

impl LiteralArg {
    pub const fn is_non_literal(&self) -> bool {
        matches!(self, Self::NonLiteral)
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Literal(value) => Some(value),
            Self::Absent | Self::NonLiteral => None,
        }
    }
}

/// Extract a string value from an expression if it's a string literal
pub fn extract_string_from_expr(expr: &Expr) -> Option<String> {
    if let Expr::StringLiteral(string_lit) = expr {
        Some(string_lit.value.to_str().to_string())
    } else {
        None
    }
}

/// Text of a scalar constant: strings, numbers and booleans
pub fn extract_constant_from_expr(expr: &Expr) -> Option<String> {
    match expr {
        Expr::StringLiteral(_) => extract_string_from_expr(expr),
        Expr::BooleanLiteral(boolean) => Some(if boolean.value { "True" } else { "False" }.to_string()),
        Expr::NumberLiteral(number) => Some(match &number.value {
            Number::Int(int) => int.to_string(),
            Number::Float(float) => format!("{float:?}"),
            Number::Complex { real, imag } if *real == 0.0 => format!("{imag:?}j"),
            Number::Complex { real, imag } => format!("({real:?}+{imag:?}j)"),
        }),
        _ => None,
    }
}

/// Classify the keyword argument `name` of a call
pub fn literal_keyword(arguments: &Arguments, name: &str) -> LiteralArg {
    let Some(keyword) = arguments.find_keyword(name) else {
        return LiteralArg::Absent;
    };
    match &keyword.value {
        Expr::NoneLiteral(_) => LiteralArg::Absent,
        value => extract_constant_from_expr(value).map_or(LiteralArg::NonLiteral, LiteralArg::Literal),
    }
}

/// Short human-readable name of an expression kind, for diagnostics
pub const fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::Name(_) => "name",
        Expr::Attribute(_) => "attribute",
        Expr::Call(_) => "call",
        Expr::StringLiteral(_) => "string literal",
        Expr::FString(_) => "f-string",
        Expr::BinOp(_) => "binary operation",
        Expr::NumberLiteral(_) => "number literal",
        Expr::Subscript(_) => "subscript",
        Expr::Lambda(_) => "lambda",
        Expr::Tuple(_) => "tuple",
        Expr::List(_) => "list",
        Expr::Dict(_) => "dict",
        _ => "expression",
    }
}
