//! Application shell: persistent chrome and the entry HTML document

use crate::route::RouteTable;

/// Fixed message rendered above the navigation bar.
pub const MESSAGE: &str = "I AM HERE TO WORK FOR YOU";

/// Default document title.
pub const DEFAULT_TITLE: &str = "Vite + React";

/// Attribute marking the element the active view is rendered into.
pub const OUTLET_ATTR: &str = "data-outlet";

/// Persistent markup around the content outlet: logo, message, nav.
#[derive(Debug, Clone)]
pub struct Chrome<'a> {
    pub logo_src: &'a str,
    pub routes: &'a RouteTable,
}

impl Chrome<'_> {
    pub fn render(&self) -> String {
        let nav = self
            .routes
            .routes()
            .iter()
            .map(|r| format!(r#"<a href="{}" data-link>{}</a>"#, r.path, r.view.label()))
            .collect::<Vec<_>>()
            .join(" | ");

        format!(
            concat!(
                r#"<div class="App"><header class="App-header">"#,
                r#"<img src="{logo}" class="App-logo" alt="logo">"#,
                r#"<p>{message}</p>"#,
                r#"<nav>{nav}</nav>"#,
                r#"<div {outlet}></div>"#,
                r#"</header></div>"#
            ),
            logo = escape_html(self.logo_src),
            message = MESSAGE,
            nav = nav,
            outlet = OUTLET_ATTR,
        )
    }
}

/// The single entry document. The body only carries the mount point; the
/// client runtime renders everything else.
#[derive(Debug, Clone)]
pub struct ShellDocument<'a> {
    pub title: &'a str,
    pub favicon_href: &'a str,
    pub stylesheet_href: &'a str,
    pub script_src: &'a str,
}

impl ShellDocument<'_> {
    pub fn render(&self) -> String {
        format!(
            r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <link rel="icon" type="image/svg+xml" href="{favicon}" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{title}</title>
    <script type="module" crossorigin src="{script}"></script>
    <link rel="stylesheet" crossorigin href="{stylesheet}">
  </head>
  <body>
    <div id="root"></div>
  </body>
</html>
"#,
            favicon = escape_html(self.favicon_href),
            title = escape_html(self.title),
            script = escape_html(self.script_src),
            stylesheet = escape_html(self.stylesheet_href),
        )
    }
}

/// Escape text for use in element content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
