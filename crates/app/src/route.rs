//! Client-side route table
//!
//! The table is fixed at startup. Path matching mirrors the browser runtime
//! in `client.rs`: trailing slashes are ignored and matching is
//! case-insensitive.

use serde::Serialize;

use crate::view::View;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: &'static str,
    pub view: View,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// `/` renders Home, `/about` renders About.
    pub fn standard() -> Self {
        Self {
            routes: vec![
                Route { path: "/", view: View::Home },
                Route { path: "/about", view: View::About },
            ],
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The route rendered when the app is opened at its root.
    pub fn default_route(&self) -> &Route {
        &self.routes[0]
    }

    /// Find the route for a browser path. `None` leaves the outlet empty
    /// while the chrome still renders.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let wanted = normalize_path(path);
        self.routes.iter().find(|r| r.path == wanted)
    }

    pub fn is_route(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Canonical form of a location path: query and fragment dropped, trailing
/// slashes trimmed, lowercased. The root stays `/`.
pub fn normalize_path(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_ascii_lowercase()
    }
}
