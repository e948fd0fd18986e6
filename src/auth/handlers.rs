//! Authentication handlers for login, signup, and logout.

use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use super::middleware::OptionalAuth;
use crate::api::auth::Registration;
use crate::domain::Role;
use crate::session::{SessionContext, SESSION_COOKIE_NAME};
use crate::state::AppState;
use crate::validation::{self, SignupInput};

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub id: String,
    pub version: &'static str,
}

#[derive(Template)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub form: SignupForm,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub country: String,
    /// Checkbox: present when ticked
    #[serde(default)]
    pub is_teacher: Option<String>,
    /// Hidden field set once the availability check passed
    #[serde(default)]
    pub checked_id: String,
}

impl SignupForm {
    fn input(&self) -> SignupInput<'_> {
        SignupInput {
            id: &self.id,
            password: &self.password,
            password_confirm: &self.password_confirm,
            name: &self.name,
            email: &self.email,
            phone: &self.phone,
            country: &self.country,
            is_teacher: self.is_teacher.is_some(),
            checked_id: Some(self.checked_id.as_str()).filter(|id| !id.is_empty()),
        }
    }

    /// Passwords are never echoed back into the page
    fn without_passwords(mut self) -> Self {
        self.password.clear();
        self.password_confirm.clear();
        self
    }

    pub fn teacher_checked(&self) -> bool {
        self.is_teacher.is_some()
    }
}

fn login_template(error: Option<String>, notice: Option<String>, id: String) -> Html<String> {
    let template = LoginTemplate {
        error,
        notice,
        id,
        version: env!("CARGO_PKG_VERSION"),
    };
    Html(template.render().unwrap_or_default())
}

fn signup_template(error: Option<String>, notice: Option<String>, form: SignupForm) -> Html<String> {
    let template = SignupTemplate {
        error,
        notice,
        form: form.without_passwords(),
    };
    Html(template.render().unwrap_or_default())
}

fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .secure(state.config.session.secure_cookie)
        .max_age(time::Duration::hours(state.config.session.expiry_hours))
        .build()
}

/// Drop the server-side session and expire the cookie
pub fn clear_session(state: &AppState, jar: CookieJar) -> CookieJar {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.sessions.remove(cookie.value());
    }
    let expired = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build();
    jar.remove(expired)
}

/// GET /login - Show login page
pub async fn login_page(OptionalAuth(auth): OptionalAuth) -> Response {
    if let Some(auth) = auth {
        return Redirect::to(auth.user.role.landing_path()).into_response();
    }
    login_template(None, None, String::new()).into_response()
}

/// POST /login - Sign in against the backend
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let id = match validation::validate_login(&form.id, &form.password) {
        Ok(id) => id,
        Err(e) => return login_template(Some(e.to_string()), None, form.id).into_response(),
    };

    let success = match state.api.login(&id, &form.password).await {
        Ok(success) => success,
        Err(e) => {
            e.log("Login failed");
            return login_template(Some(e.user_message()), None, id).into_response();
        }
    };

    let role = success.user.role;
    let session_id = state.sessions.create(SessionContext {
        user_id: success.user.uid.clone(),
        role,
        name: success.user.name.clone(),
        backend_cookies: success.cookies,
        level: None,
    });
    tracing::info!("{} signed in as {}", success.user.uid, role.as_str());

    (
        jar.add(session_cookie(&state, session_id)),
        Redirect::to(role.landing_path()),
    )
        .into_response()
}

/// GET /logout - Sign out and clear session
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (clear_session(&state, jar), Redirect::to("/login"))
}

/// GET /signup - Show signup page
pub async fn signup_page() -> Html<String> {
    signup_template(None, None, SignupForm::default())
}

/// POST /signup/check-id - Ask the backend whether the id is free
pub async fn signup_check_id(
    State(state): State<AppState>,
    Form(mut form): Form<SignupForm>,
) -> Html<String> {
    let id = form.id.trim().to_string();
    form.checked_id.clear();
    if id.is_empty() {
        return signup_template(Some("ID is required.".to_string()), None, form);
    }

    match state.api.check_id(&id).await {
        Ok(true) => {
            form.id = id.clone();
            form.checked_id = id;
            signup_template(None, Some("This ID is available.".to_string()), form)
        }
        Ok(false) => signup_template(Some("This ID is already taken.".to_string()), None, form),
        Err(e) => {
            e.log("ID check failed");
            signup_template(Some(e.user_message()), None, form)
        }
    }
}

/// POST /signup - Create an account
pub async fn signup_submit(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Response {
    let valid = match validation::validate_signup(&form.input()) {
        Ok(valid) => valid,
        Err(e) => return signup_template(Some(e.to_string()), None, form).into_response(),
    };

    let registration = Registration {
        id: valid.id,
        password: valid.password,
        name: valid.name,
        email: valid.email,
        phone: valid.phone,
        country: valid.country,
        role: valid.role,
    };
    if let Err(e) = state.api.register(&registration).await {
        e.log("Signup failed");
        return signup_template(Some(e.user_message()), None, form).into_response();
    }

    tracing::info!("Registered {} as {}", registration.id, registration.role.as_str());
    let notice = if registration.role == Role::Teacher {
        "Account created. A teacher account can sign in once an administrator approves it."
    } else {
        "Account created. Please sign in."
    };
    login_template(None, Some(notice.to_string()), registration.id).into_response()
}

