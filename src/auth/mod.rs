//! Sign-in, signup, and the role gate in front of every page.

pub mod gate;
pub mod handlers;
pub mod middleware;

pub use gate::{check, GateDecision};
pub use handlers::*;
pub use middleware::{AuthContext, OptionalAuth};
