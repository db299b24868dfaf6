use crate::{
    error::{RouteNotFound, RouteTableError},
    models::{AuthRequirement, PageDescriptor, Role, RouteSummary},
};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Route
///
/// A declarative path-to-view mapping annotated with its authorization requirement.
/// `component` is an opaque reference the web client resolves to a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: &'static str,
    pub name: Option<&'static str>,
    pub component: &'static str,
    pub requirement: AuthRequirement,
}

impl Route {
    pub const fn public(path: &'static str, name: &'static str, component: &'static str) -> Self {
        Self {
            path,
            name: Some(name),
            component,
            requirement: AuthRequirement::None,
        }
    }

    pub const fn authenticated(path: &'static str, component: &'static str) -> Self {
        Self {
            path,
            name: None,
            component,
            requirement: AuthRequirement::Authenticated,
        }
    }

    pub const fn with_role(path: &'static str, component: &'static str, role: Role) -> Self {
        Self {
            path,
            name: None,
            component,
            requirement: AuthRequirement::AuthenticatedWithRole(role),
        }
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            path: self.path.to_string(),
            name: self.name.map(str::to_string),
            component: self.component.to_string(),
            requirement: self.requirement,
        }
    }

    pub fn page(&self) -> PageDescriptor {
        PageDescriptor {
            path: self.path.to_string(),
            name: self.name.map(str::to_string),
            component: self.component.to_string(),
        }
    }
}

/// The application's page catalogue, in match order.
pub static APP_ROUTES: &[Route] = &[
    Route::public(LOGIN_PATH, "Login", "LoginView"),
    Route::public("/register", "Register", "RegisterView"),
    Route::public(HOME_PATH, "Home", "HomeView"),
    Route::public("/about", "About", "AboutView"),
    Route::with_role("/account-elder", "ElderAccountView", Role::Elder),
    Route::with_role("/free-help", "FreeHelpView", Role::Elder),
    Route::with_role("/recent-activities", "RecentActivitiesView", Role::Elder),
    Route::with_role("/account-volunteer", "VolunteerAccountView", Role::Volunteer),
    Route::with_role("/volunteer-area", "VolunteerAreaView", Role::Volunteer),
    Route::with_role("/admin-panel", "AdminPanelView", Role::Admin),
];

/// RouteTable
///
/// Fixed, ordered sequence of routes built once at startup. There is no mutation API;
/// share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Validates and freezes a route list. Duplicate paths are allowed; the first wins.
    pub fn new(routes: Vec<Route>) -> Result<Self, RouteTableError> {
        if let Some(bad) = routes.iter().find(|r| !r.path.starts_with('/')) {
            return Err(RouteTableError::InvalidPath(bad.path.to_string()));
        }
        Ok(Self { routes })
    }

    /// The built-in catalogue. Infallible since every entry in `APP_ROUTES` is absolute.
    pub fn app() -> Self {
        Self {
            routes: APP_ROUTES.to_vec(),
        }
    }

    /// lookup
    ///
    /// First-match lookup using the web router's default matching: ASCII
    /// case-insensitive, optional trailing slash, query string and fragment ignored.
    pub fn lookup(&self, path: &str) -> Result<&Route, RouteNotFound> {
        let wanted = normalize(path);
        self.routes
            .iter()
            .find(|route| normalize(route.path).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RouteNotFound {
                path: path.to_string(),
            })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn summaries(&self) -> Vec<RouteSummary> {
        self.routes.iter().map(Route::summary).collect()
    }
}

fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
