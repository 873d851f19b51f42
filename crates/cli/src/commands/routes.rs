//! `paddock routes`: print the client route table

use serde::Serialize;

use paddock_app::{Route, RouteTable};

use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Serialize)]
struct RouteRow<'a> {
    path: &'a str,
    view: &'a str,
    default: bool,
}

impl TableDisplay for RouteRow<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Path", "View", "Default"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.path.to_string(),
            self.view.to_string(),
            if self.default { "yes".to_string() } else { String::new() },
        ]
    }
}

fn rows(table: &RouteTable) -> Vec<RouteRow<'_>> {
    let default: &Route = table.default_route();
    table
        .routes()
        .iter()
        .map(|r| RouteRow {
            path: r.path,
            view: r.view.label(),
            default: r == default,
        })
        .collect()
}

pub fn execute(format: OutputFormat) -> anyhow::Result<()> {
    output::print_list(&rows(&RouteTable::standard()), format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows() {
        let table = RouteTable::standard();
        let rows = rows(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].path, "/");
        assert!(rows[0].default);
        assert_eq!(rows[1].view, "About");
        assert!(!rows[1].default);
    }
}
