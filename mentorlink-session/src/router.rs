//! Role-based destination routing

use mentorlink_core::{Role, Route};
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::unpoison;

/// Moves the user to a destination view
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Maps the server-reported role to a destination and navigates there
#[derive(Clone)]
pub struct RoleRouter {
    navigator: Arc<dyn Navigator>,
}

impl RoleRouter {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }

    /// Destination for a role; unknown roles land on the generic dashboard
    pub fn route_for(role: &Role) -> Route {
        match role {
            Role::Student => Route::StudentDashboard,
            Role::Mentor => Route::MentorDashboard,
            Role::Subadmin => Route::SubadminDashboard,
            Role::Superadmin => Route::SuperadminDashboard,
            Role::Other(_) => Route::Dashboard,
        }
    }

    pub fn navigate(&self, role: &Role) -> Route {
        let route = Self::route_for(role);
        info!(role = %role, route = %route, "Navigating");
        self.navigator.navigate(route);
        route
    }
}

/// Navigator that only remembers where it was sent
#[derive(Debug, Default)]
pub struct NavigationHistory {
    routes: Mutex<Vec<Route>>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        unpoison(self.routes.lock()).last().copied()
    }

    pub fn history(&self) -> Vec<Route> {
        unpoison(self.routes.lock()).clone()
    }
}

impl Navigator for NavigationHistory {
    fn navigate(&self, route: Route) {
        unpoison(self.routes.lock()).push(route);
    }
}
