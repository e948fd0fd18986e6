//! Authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::gate::{self, GateDecision};
use crate::api::Credentials;
use crate::domain::Role;
use crate::nav::NavContext;
use crate::session::{Alert, SessionContext, SESSION_COOKIE_NAME};
use crate::state::AppState;

/// Authenticated request context.
/// Add this as a handler parameter to require a signed-in user.
/// Redirects to /login if not authenticated.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session_id: String,
    pub user: SessionContext,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| Redirect::to("/login").into_response())?;

        let session_id = jar
            .get(SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or_else(|| Redirect::to("/login").into_response())?;

        let user = state
            .sessions
            .context(&session_id)
            .ok_or_else(|| Redirect::to("/login").into_response())?;

        Ok(AuthContext { session_id, user })
    }
}

impl AuthContext {
    /// Check the signed-in role against `roles` (empty admits everyone).
    ///
    /// On a mismatch a warning is queued for the next page and the response
    /// redirects to the role's own landing page.
    pub fn require(&self, state: &AppState, roles: &[Role]) -> Result<(), Response> {
        match gate::check(Some(&self.user), roles) {
            GateDecision::Allow => Ok(()),
            GateDecision::Login => Err(Redirect::to("/login").into_response()),
            GateDecision::Landing { to, warning } => {
                tracing::warn!(
                    "{} ({}) denied a page for {:?}",
                    self.user.user_id,
                    self.user.role.as_str(),
                    roles
                );
                state.sessions.set_flash(&self.session_id, Alert::warning(warning));
                Err(Redirect::to(to).into_response())
            }
        }
    }

    pub fn credentials(&self) -> Credentials {
        self.user.credentials()
    }

    pub fn nav(&self, path: &str) -> NavContext {
        NavContext::for_path(Some(&self.user), path)
    }

    pub fn take_flash(&self, state: &AppState) -> Option<Alert> {
        state.sessions.take_flash(&self.session_id)
    }

    pub fn flash(&self, state: &AppState, alert: Alert) {
        state.sessions.set_flash(&self.session_id, alert);
    }
}

/// Optional authentication extractor.
/// Returns Some(AuthContext) if authenticated, None otherwise.
/// Use for pages that work both with and without authentication.
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthContext::from_request_parts(parts, state).await {
            Ok(auth) => Ok(OptionalAuth(Some(auth))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
