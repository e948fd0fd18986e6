//! Role gate: decides whether a session may open a page.
//!
//! The gate is advisory; the backend enforces permissions on every call.

use crate::domain::Role;
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Allow,
    /// Nobody is signed in
    Login,
    /// Signed in with a role the page does not admit
    Landing { to: &'static str, warning: String },
}

/// An empty `allowed` set admits any signed-in user.
pub fn check(context: Option<&SessionContext>, allowed: &[Role]) -> GateDecision {
    let Some(context) = context else {
        return GateDecision::Login;
    };
    if allowed.is_empty() || allowed.contains(&context.role) {
        return GateDecision::Allow;
    }
    GateDecision::Landing {
        to: context.role.landing_path(),
        warning: format!(
            "This page is not available to {} accounts.",
            context.role.as_str()
        ),
    }
}
