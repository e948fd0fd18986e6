//! Profile and settings pages, available to every role.

use askama::Template;
use axum::{
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
  Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::{api_alert, chrome, flash_redirect};
use crate::api::user::{Profile, ProfileUpdate, StudySettings};
use crate::auth::{clear_session, AuthContext};
use crate::nav::NavContext;
use crate::session::Alert;
use crate::state::AppState;
use crate::validation;

const DEFAULT_DAILY_GOAL: u32 = 10;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub role_label: &'static str,
  pub profile: Profile,
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
  pub nav: NavContext,
  pub alert: Option<Alert>,
  pub daily_goal: u32,
  pub review_wrong: bool,
}

#[derive(Deserialize)]
pub struct ProfileForm {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub phone: String,
  #[serde(default)]
  pub country: String,
}

#[derive(Deserialize)]
pub struct SettingsForm {
  pub daily_goal: u32,
  /// Checkbox: present when ticked
  #[serde(default)]
  pub review_wrong: Option<String>,
}

#[derive(Deserialize)]
pub struct PasswordForm {
  pub old_password: String,
  pub new_password: String,
  pub new_password_confirm: String,
}

#[derive(Deserialize)]
pub struct WithdrawForm {
  #[serde(default)]
  pub confirm: Option<String>,
}

async fn load_profile(state: &AppState, auth: &AuthContext, alert: &mut Option<Alert>) -> Profile {
  match state.api.profile(&auth.user.user_id, &auth.credentials()).await {
    Ok(profile) => profile,
    Err(e) => {
      *alert = Some(api_alert(&e, "Profile fetch failed"));
      Profile {
        uid: auth.user.user_id.clone(),
        name: auth.user.name.clone(),
        ..Profile::default()
      }
    }
  }
}

/// GET /profile
pub async fn profile_page(State(state): State<AppState>, auth: AuthContext) -> Response {
  let (nav, mut alert) = chrome(&state, &auth, "/profile");
  let profile = load_profile(&state, &auth, &mut alert).await;
  let template = ProfileTemplate {
    nav,
    alert,
    role_label: auth.user.role.label(),
    profile,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /profile
pub async fn update_profile(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<ProfileForm>,
) -> Response {
  if let Err(e) = validation::validate_profile(&form.email) {
    return flash_redirect(&state, &auth, Alert::warning(e.to_string()), "/profile");
  }
  let update = ProfileUpdate {
    email: form.email.trim().to_string(),
    phone: form.phone.trim().to_string(),
    country: form.country.trim().to_string(),
  };
  let alert = match state
    .api
    .update_profile(&auth.user.user_id, &update, &auth.credentials())
    .await
  {
    Ok(()) => Alert::success("Profile updated."),
    Err(e) => api_alert(&e, "Profile update failed"),
  };
  flash_redirect(&state, &auth, alert, "/profile")
}

/// GET /settings
pub async fn settings_page(State(state): State<AppState>, auth: AuthContext) -> Response {
  let (nav, mut alert) = chrome(&state, &auth, "/settings");
  let profile = load_profile(&state, &auth, &mut alert).await;
  let template = SettingsTemplate {
    nav,
    alert,
    daily_goal: profile.daily_goal.unwrap_or(DEFAULT_DAILY_GOAL),
    review_wrong: profile.review_wrong.unwrap_or(true),
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /settings
pub async fn update_settings(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<SettingsForm>,
) -> Response {
  let daily_goal = match validation::validate_daily_goal(form.daily_goal) {
    Ok(goal) => goal,
    Err(e) => return flash_redirect(&state, &auth, Alert::warning(e.to_string()), "/settings"),
  };
  let settings = StudySettings {
    daily_goal,
    review_wrong: form.review_wrong.is_some(),
  };
  let alert = match state
    .api
    .update_settings(&auth.user.user_id, &settings, &auth.credentials())
    .await
  {
    Ok(()) => Alert::success("Settings saved."),
    Err(e) => api_alert(&e, "Settings update failed"),
  };
  flash_redirect(&state, &auth, alert, "/settings")
}

/// POST /settings/password
pub async fn change_password(
  State(state): State<AppState>,
  auth: AuthContext,
  Form(form): Form<PasswordForm>,
) -> Response {
  if let Err(e) = validation::validate_password_change(
    &form.old_password,
    &form.new_password,
    &form.new_password_confirm,
  ) {
    return flash_redirect(&state, &auth, Alert::warning(e.to_string()), "/settings");
  }
  let alert = match state
    .api
    .change_password(
      &auth.user.user_id,
      &form.old_password,
      &form.new_password,
      &auth.credentials(),
    )
    .await
  {
    Ok(()) => {
      tracing::info!("{} changed their password", auth.user.user_id);
      Alert::success("Password changed.")
    }
    Err(e) => api_alert(&e, "Password change failed"),
  };
  flash_redirect(&state, &auth, alert, "/settings")
}

/// POST /settings/withdraw - Delete the account and sign out
pub async fn withdraw(
  State(state): State<AppState>,
  auth: AuthContext,
  jar: CookieJar,
  Form(form): Form<WithdrawForm>,
) -> Response {
  if form.confirm.is_none() {
    return flash_redirect(
      &state,
      &auth,
      Alert::warning("Tick the confirmation box to delete your account."),
      "/settings",
    );
  }
  if let Err(e) = state.api.withdraw(&auth.user.user_id, &auth.credentials()).await {
    let alert = api_alert(&e, "Withdrawal failed");
    return flash_redirect(&state, &auth, alert, "/settings");
  }
  tracing::info!("{} withdrew their account", auth.user.user_id);
  (clear_session(&state, jar), Redirect::to("/login")).into_response()
}
