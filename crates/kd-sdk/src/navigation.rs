//! Navigation Authority
//!
//! Decides whether the shell may enter a route given the stored token and
//! scope, and maps API failures to the navigation the shell should perform.

use crate::credentials::{CredentialStore, Credentials};
use crate::error::Error;
use kd_common::Role;
use std::sync::Arc;
use tracing::{debug, error};

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";

/// Outcome of a navigation check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    /// `unauthorized` is set when the login page should explain why
    RedirectToLogin { unauthorized: bool },
    RedirectToHome,
}

/// A named route with an optional required scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: &'static str,
    /// Path pattern; `:name` segments match any single segment
    pub pattern: &'static str,
    pub required_role: Option<Role>,
}

impl Route {
    pub const fn public(name: &'static str, pattern: &'static str) -> Self {
        Self { name, pattern, required_role: None }
    }

    pub const fn guarded(name: &'static str, pattern: &'static str, role: Role) -> Self {
        Self { name, pattern, required_role: Some(role) }
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut expected = self.pattern.split('/').filter(|s| !s.is_empty());
        let mut actual = path.split('/').filter(|s| !s.is_empty());
        loop {
            match (expected.next(), actual.next()) {
                (None, None) => return true,
                (Some(p), Some(a)) if p.starts_with(':') || p == a => continue,
                _ => return false,
            }
        }
    }
}

/// Decide access for a route that requires `required` given the stored session
pub fn authorize(required: Option<Role>, credentials: &Credentials) -> NavigationDecision {
    let Some(role) = required else {
        return NavigationDecision::Allow;
    };

    match (&credentials.access_token, &credentials.scope) {
        (Some(_), Some(scope)) if role.matches(scope) => NavigationDecision::Allow,
        (Some(_), Some(_)) => NavigationDecision::RedirectToHome,
        _ => NavigationDecision::RedirectToLogin { unauthorized: true },
    }
}

/// The application's route table
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Routes of the marketplace shell. Dashboards and the company job
    /// pages are reachable without a scope.
    pub fn standard() -> Self {
        use Role::{Admin, Company, Student};
        Self::new(vec![
            Route::public("Home", "/"),
            Route::public("Login", LOGIN_ROUTE),
            Route::guarded("admin_dashboard", "/admin/dashboard", Admin),
            Route::guarded("admin_users", "/admin/users", Admin),
            Route::guarded("admin_settings", "/admin/settings", Admin),
            Route::public("student_dashboard", "/student/dashboard"),
            Route::guarded("student_profile", "/student/profile", Student),
            Route::guarded("student_jobs", "/student/jobs", Student),
            Route::guarded("student_settings", "/student/settings", Student),
            Route::guarded("student_applications", "/student/applications", Student),
            Route::guarded("student_interviews", "/student/interviews", Student),
            Route::public("CompanyDashboard", "/company/dashboard"),
            Route::public("CompanyJobs", "/company/jobs"),
            Route::public("CompanyCreateJob", "/company/jobs/create"),
            Route::guarded("CompanyEditJob", "/company/jobs/edit/:id", Company),
            Route::guarded("CompanyJobCandidates", "/company/jobs/:id/candidates", Company),
            Route::guarded("CompanyCandidates", "/company/candidates", Company),
            Route::guarded("CompanyInvitations", "/company/interviews", Company),
            Route::guarded("company_post_job", "/company/post-job", Company),
            Route::guarded("CompanyProfile", "/company/settings", Company),
        ])
    }

    /// First route matching `path`, in table order
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.name == name)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Route guard backed by the credential store
#[derive(Debug, Clone)]
pub struct Navigator {
    routes: RouteTable,
    store: Arc<dyn CredentialStore>,
}

impl Navigator {
    pub fn new(routes: RouteTable, store: Arc<dyn CredentialStore>) -> Self {
        Self { routes, store }
    }

    /// Check a navigation to `path`. Unknown paths are sent home.
    pub fn navigate(&self, path: &str) -> NavigationDecision {
        let Some(route) = self.routes.resolve(path) else {
            debug!(path, "No route matches, redirecting home");
            return NavigationDecision::RedirectToHome;
        };

        let decision = authorize(route.required_role, &self.store.credentials());
        debug!(path, route = route.name, ?decision, "Navigation checked");
        decision
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

// ============================================================================
// API error routing
// ============================================================================

/// Navigation and message for a failed API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRoute {
    pub decision: Option<NavigationDecision>,
    pub message: String,
}

/// Map an API error to the navigation the shell should perform.
///
/// Credential cleanup on 401 is owned by the client's session handling;
/// this only decides where to go.
pub fn route_api_error(err: &Error) -> ErrorRoute {
    let (decision, message) = match err.status() {
        Some(401) => (
            Some(NavigationDecision::RedirectToLogin { unauthorized: false }),
            "Session expired, please log in again".to_string(),
        ),
        Some(403) => (Some(NavigationDecision::RedirectToHome), "Access forbidden".to_string()),
        Some(404) => (Some(NavigationDecision::RedirectToHome), "Resource not found".to_string()),
        Some(500) => (Some(NavigationDecision::RedirectToHome), "Internal server error".to_string()),
        Some(status) => (None, format!("API error ({status}): {}", error_detail(err))),
        None if err.is_network() => (None, "Network error - please check your connection".to_string()),
        None => (None, format!("Request error: {err}")),
    };

    if decision.is_some() {
        error!(status = ?err.status(), %message, "API call failed");
    } else {
        error!(%message, "API call failed");
    }

    ErrorRoute { decision, message }
}

/// Prefer the server's `message` field when the body is JSON
fn error_detail(err: &Error) -> String {
    let body = match err {
        Error::Validation { message, .. }
        | Error::Server { message, .. }
        | Error::Status { message, .. } => message.as_str(),
        _ => return err.to_string(),
    };

    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| if body.is_empty() { "Unknown error".to_string() } else { body.to_string() })
}
