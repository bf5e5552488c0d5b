//! Handler registration visitor
//!
//! A handler module registers a page container through a call carrying a
//! `container="Name"` keyword. Two call shapes are recognized:
//!
//! ```python
//! UserProfileHandler = register(container="UserProfile", package="merchant.profile")
//! register(container="UserProfile", package="merchant.profile")
//! ```
//!
//! The first binds the handler identifier used to look up the route; the second
//! only exists in modules that never had a route table. Both normalize into a
//! [`RegistrationCandidate`].

use ruff_python_ast::{
    Expr, ExprCall, ModModule, Stmt,
    visitor::{Visitor, walk_stmt},
};
use ruff_text_size::{Ranged, TextSize};

use super::utils::{LiteralArg, extract_string_from_expr, literal_keyword};

/// How the registration call appears in the module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallShape {
    /// `Target = call(...)`; `None` when the target is not a single simple name
    Assigned { target: Option<String> },
    /// Bare `call(...)` statement
    Bare,
}

/// A call whose `container` keyword names the target container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationCandidate {
    pub shape: CallShape,
    pub package: LiteralArg,
    pub initial_query: LiteralArg,
    pub offset: TextSize,
}

/// Visitor that collects every registration of one container
#[derive(Debug)]
pub struct RegistrationCollector<'c> {
    container: &'c str,
    matches: Vec<RegistrationCandidate>,
}

impl<'c> RegistrationCollector<'c> {
    pub const fn new(container: &'c str) -> Self {
        Self {
            container,
            matches: Vec::new(),
        }
    }

    /// Collect registrations of `container` in source order
    pub fn collect(module: &ModModule, container: &'c str) -> Vec<RegistrationCandidate> {
        let mut collector = Self::new(container);
        collector.visit_body(&module.body);
        collector.matches
    }

    fn single_name_target(targets: &[Expr]) -> Option<String> {
        match targets {
            [Expr::Name(name)] => Some(name.id.to_string()),
            _ => None,
        }
    }

    fn inspect_call(&mut self, call: &ExprCall, shape: CallShape) {
        // Every keyword is classified before matching, so a malformed `package`
        // listed ahead of `container` is still reported for the match.
        let package = literal_keyword(&call.arguments, "package");
        let initial_query = literal_keyword(&call.arguments, "initial_query");

        let is_match = call
            .arguments
            .find_keyword("container")
            .and_then(|keyword| extract_string_from_expr(&keyword.value))
            .is_some_and(|name| name == self.container);
        if !is_match {
            return;
        }

        self.matches.push(RegistrationCandidate {
            shape,
            package,
            initial_query,
            offset: call.start(),
        });
    }
}

impl<'a> Visitor<'a> for RegistrationCollector<'_> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Assign(assign) => {
                if let Expr::Call(call) = &*assign.value {
                    let target = Self::single_name_target(&assign.targets);
                    self.inspect_call(call, CallShape::Assigned { target });
                }
            }
            Stmt::AnnAssign(ann_assign) => {
                if let Some(value) = &ann_assign.value
                    && let Expr::Call(call) = &**value
                {
                    let target = Self::single_name_target(std::slice::from_ref(&*ann_assign.target));
                    self.inspect_call(call, CallShape::Assigned { target });
                }
            }
            Stmt::Expr(expr_stmt) => {
                if let Expr::Call(call) = &*expr_stmt.value {
                    self.inspect_call(call, CallShape::Bare);
                }
            }
            _ => {}
        }

        walk_stmt(self, stmt);
    }
}
