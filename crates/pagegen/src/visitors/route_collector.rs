//! Route registration visitor for routing-table modules
//!
//! Finds every `url(path, handler, ...)` call in a module (at any nesting
//! depth) and classifies it as a mapped route, a skipped registration, or an
//! unsupported shape that the caller treats as fatal.

use ruff_python_ast::{
    Expr, ExprCall, ModModule,
    visitor::{Visitor, walk_expr},
};
use ruff_text_size::{Ranged, TextSize};

use super::utils::{expr_kind, extract_string_from_expr};

/// Callee names that identify route registrations and redirects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSyntax {
    pub route_marker: String,
    pub redirect_marker: String,
}

impl Default for RouteSyntax {
    fn default() -> Self {
        Self {
            route_marker: "url".to_string(),
            redirect_marker: "redirect".to_string(),
        }
    }
}

/// Why a route registration was not mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Path built from several string fragments
    MultiFragmentPath,
    /// Handler produced by the redirect marker
    Redirect,
    /// Handler produced by some other factory call
    UnknownFunction,
}

impl SkipReason {
    pub const fn describe(self) -> &'static str {
        match self {
            Self::MultiFragmentPath => "multi-arg path skipped",
            Self::Redirect => "redirect path skipped",
            Self::UnknownFunction => "unknown function skipped",
        }
    }
}

/// Outcome of classifying one route registration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteCall {
    Mapped {
        handler: String,
        pattern: String,
        offset: TextSize,
    },
    Skipped {
        reason: SkipReason,
        offset: TextSize,
    },
    UnsupportedPath {
        found: &'static str,
        offset: TextSize,
    },
    UnsupportedHandler {
        found: &'static str,
        offset: TextSize,
    },
}

/// Visitor that collects route registration calls in source order
#[derive(Debug)]
pub struct RouteCollector<'s> {
    syntax: &'s RouteSyntax,
    calls: Vec<RouteCall>,
}

impl<'s> RouteCollector<'s> {
    pub const fn new(syntax: &'s RouteSyntax) -> Self {
        Self {
            syntax,
            calls: Vec::new(),
        }
    }

    /// Collect every route registration in a module
    pub fn collect(module: &ModModule, syntax: &'s RouteSyntax) -> Vec<RouteCall> {
        let mut collector = Self::new(syntax);
        collector.visit_body(&module.body);
        collector.calls
    }

    fn is_marker_call(call: &ExprCall, marker: &str) -> bool {
        matches!(&*call.func, Expr::Name(name) if name.id.as_str() == marker)
    }

    fn classify(&self, call: &ExprCall) -> Option<RouteCall> {
        if !Self::is_marker_call(call, &self.syntax.route_marker) {
            return None;
        }
        let [path, handler, ..] = &*call.arguments.args else {
            return None;
        };
        let offset = call.start();

        if matches!(path, Expr::BinOp(_)) {
            return Some(RouteCall::Skipped {
                reason: SkipReason::MultiFragmentPath,
                offset,
            });
        }

        let handler_name = match handler {
            Expr::Call(inner) => {
                let reason = if Self::is_marker_call(inner, &self.syntax.redirect_marker) {
                    SkipReason::Redirect
                } else {
                    SkipReason::UnknownFunction
                };
                return Some(RouteCall::Skipped { reason, offset });
            }
            Expr::Attribute(attr) => attr.attr.as_str().to_string(),
            Expr::Name(name) => name.id.to_string(),
            other => {
                return Some(RouteCall::UnsupportedHandler {
                    found: expr_kind(other),
                    offset: other.start(),
                });
            }
        };

        let Some(pattern) = extract_string_from_expr(path) else {
            return Some(RouteCall::UnsupportedPath {
                found: expr_kind(path),
                offset: path.start(),
            });
        };

        Some(RouteCall::Mapped {
            handler: handler_name,
            pattern,
            offset,
        })
    }
}

impl<'a> Visitor<'a> for RouteCollector<'_> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if let Expr::Call(call) = expr
            && let Some(route) = self.classify(call)
        {
            self.calls.push(route);
        }

        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn collect(code: &str) -> Vec<RouteCall> {
        let parsed = parse_module(code).expect("Failed to parse");
        let module = parsed.into_syntax();
        RouteCollector::collect(&module, &RouteSyntax::default())
    }

    fn mapped(calls: &[RouteCall]) -> Vec<(&str, &str)> {
        calls
            .iter()
            .filter_map(|call| match call {
                RouteCall::Mapped {
                    handler, pattern, ..
                } => Some((handler.as_str(), pattern.as_str())),
                _ => None,
            })
            .collect()
    }

    fn skipped(calls: &[RouteCall]) -> Vec<SkipReason> {
        calls
            .iter()
            .filter_map(|call| match call {
                RouteCall::Skipped { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plain_and_attribute_handlers() {
        let code = r#"
from merchant import handlers

routes = [
    url(r"/profile", UserProfileHandler),
    url(r"/settings", handlers.SettingsHandler, name="settings"),
]
"#;
        let calls = collect(code);
        assert_eq!(
            mapped(&calls),
            vec![
                ("UserProfileHandler", "/profile"),
                ("SettingsHandler", "/settings"),
            ]
        );
    }

    #[test]
    fn test_skip_precedence() {
        let code = r#"
routes = [
    url(PREFIX + "/orders", redirect("/x")),
    url(r"/old-home", redirect("/home")),
    url(r"/factory", make_handler("x")),
    url(r"/nested", factory.build()),
]
"#;
        let calls = collect(code);
        assert!(mapped(&calls).is_empty());
        assert_eq!(
            skipped(&calls),
            vec![
                SkipReason::MultiFragmentPath,
                SkipReason::Redirect,
                SkipReason::UnknownFunction,
                SkipReason::UnknownFunction,
            ]
        );
    }

    #[test]
    fn test_ignores_other_calls_and_short_argument_lists() {
        let code = r#"
url(r"/only-path")
route(r"/other", OtherHandler)
app.url(r"/method", MethodHandler)
"#;
        assert!(collect(code).is_empty());
    }

    #[test]
    fn test_finds_calls_nested_in_functions() {
        let code = r#"
def get_routes():
    return [url(r"/inner", InnerHandler)]
"#;
        assert_eq!(mapped(&collect(code)), vec![("InnerHandler", "/inner")]);
    }

    #[test]
    fn test_unsupported_shapes() {
        let calls = collect("url(ORDERS_PATH, OrdersHandler)\nurl(r\"/x\", handlers[0])\n");
        assert_eq!(calls.len(), 2);
        assert!(matches!(
            calls[0],
            RouteCall::UnsupportedPath { found: "name", .. }
        ));
        assert!(matches!(
            calls[1],
            RouteCall::UnsupportedHandler {
                found: "subscript",
                ..
            }
        ));
    }

    #[test]
    fn test_custom_markers() {
        let syntax = RouteSyntax {
            route_marker: "route".to_string(),
            redirect_marker: "moved".to_string(),
        };
        let parsed = parse_module("route('/a', A)\nroute('/b', moved('/a'))\n").unwrap();
        let calls = RouteCollector::collect(&parsed.into_syntax(), &syntax);
        assert_eq!(mapped(&calls), vec![("A", "/a")]);
        assert_eq!(skipped(&calls), vec![SkipReason::Redirect]);
    }
}
