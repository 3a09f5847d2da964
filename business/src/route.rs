//! Routes of the admin area and the navigation capability.

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

use log::info;
use serde::{Deserialize, Serialize};

/// Landing page after a successful sign-in.
pub const ADMIN_ROUTE: &str = "/admin";

pub const LOGIN_ROUTE: &str = "/admin/login";

/// Represents a page of the admin area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    /// Login page - shown when user is not authenticated
    #[default]
    Login,
    /// Admin dashboard - shown when user is authenticated
    Admin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => LOGIN_ROUTE,
            Self::Admin => ADMIN_ROUTE,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Moves the user to another page.
pub trait Navigator: Send + Sync + Debug {
    fn navigate(&self, route: Route);
}

/// [`Navigator`] that only remembers where it was sent.
///
/// Headless frontends use it to find out where a flow ended up.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    visited: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The last route navigated to, if any.
    pub fn current(&self) -> Option<Route> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        info!("Navigating to {route}");
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_default_is_login() {
        assert_eq!(Route::default(), Route::Login);
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Admin.path(), ADMIN_ROUTE);
        assert_eq!(Route::Admin.path(), "/admin");
        assert_eq!(Route::Login.path(), "/admin/login");
        assert_eq!(Route::Admin.to_string(), "/admin");
    }

    #[test]
    fn test_route_equality() {
        assert_eq!(Route::Login, Route::Login);
        assert_ne!(Route::Login, Route::Admin);
    }

    #[test]
    fn test_history_navigator_records_in_order() {
        let navigator = HistoryNavigator::new();
        assert_eq!(navigator.current(), None);

        navigator.navigate(Route::Login);
        navigator.navigate(Route::Admin);

        assert_eq!(navigator.history(), vec![Route::Login, Route::Admin]);
        assert_eq!(navigator.current(), Some(Route::Admin));
    }
}
