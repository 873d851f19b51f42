//! Browser runtime
//!
//! The generated script is `const APP = <json>;` followed by a small fixed
//! router. The JSON carries the rendered chrome and one markup string per
//! route, so all user-visible content is produced on the Rust side.

use serde::Serialize;
use std::collections::BTreeMap;

use paddock_common::Result;

use crate::route::RouteTable;
use crate::shell::{Chrome, OUTLET_ATTR};

#[derive(Debug, Serialize)]
struct AppDefinition {
    chrome: String,
    outlet: &'static str,
    routes: BTreeMap<&'static str, String>,
}

/// Build the client script for a route table and logo path.
pub fn client_script(routes: &RouteTable, logo_src: &str) -> Result<String> {
    let app = AppDefinition {
        chrome: Chrome { logo_src, routes }.render(),
        outlet: OUTLET_ATTR,
        routes: routes
            .routes()
            .iter()
            .map(|r| (r.path, r.view.render()))
            .collect(),
    };

    let json = serde_json::to_string(&app)?;
    Ok(format!("const APP = {};\n{}", json, ROUTER_JS))
}

// Keep normalize() in step with route::normalize_path.
const ROUTER_JS: &str = r#"
const root = document.getElementById('root');

function normalize(path) {
  const trimmed = path.replace(/\/+$/, '');
  return trimmed === '' ? '/' : trimmed.toLowerCase();
}

function render() {
  const current = normalize(window.location.pathname);
  const outlet = root.querySelector('[' + APP.outlet + ']');
  const view = APP.routes[current];
  outlet.innerHTML = view === undefined ? '' : view;

  for (const link of root.querySelectorAll('a[data-link]')) {
    if (normalize(link.getAttribute('href')) === current) {
      link.setAttribute('aria-current', 'page');
    } else {
      link.removeAttribute('aria-current');
    }
  }
}

function navigate(to) {
  if (normalize(to) !== normalize(window.location.pathname)) {
    window.history.pushState({}, '', to);
  }
  render();
}

root.innerHTML = APP.chrome;

root.addEventListener('click', (event) => {
  const link = event.target.closest('a[data-link]');
  if (!link || event.defaultPrevented || event.button !== 0) return;
  if (event.metaKey || event.ctrlKey || event.shiftKey || event.altKey) return;
  event.preventDefault();
  navigate(link.getAttribute('href'));
});

window.addEventListener('popstate', render);

render();
"#;
