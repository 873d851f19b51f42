//! Route views
//!
//! Each view is a pure rendering of static markup. Views hold no state and
//! are mounted into the shell's content outlet by the client runtime.

use serde::Serialize;

/// Outbound link shown on the home view.
pub const GOOGLE_URL: &str = "https://google.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Home,
    About,
}

impl View {
    /// Label used for the view's navigation link.
    pub fn label(&self) -> &'static str {
        match self {
            View::Home => "Home",
            View::About => "About",
        }
    }

    pub fn render(&self) -> String {
        match self {
            // target=_blank without noopener would hand the new tab a window.opener
            View::Home => format!(
                r#"<a class="App-link" href="{}" target="_blank" rel="noopener noreferrer">Go to Google</a>"#,
                GOOGLE_URL
            ),
            View::About => {
                r#"<div class="About"><h2>About Us</h2><p>This is the about page.</p></div>"#.to_string()
            }
        }
    }
}
