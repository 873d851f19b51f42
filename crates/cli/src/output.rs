//! Output formatting for CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Render a list of items
pub fn render_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> anyhow::Result<String> {
    if items.is_empty() {
        return Ok("No items found.".to_string());
    }

    let out = match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(items)?,
        OutputFormat::Yaml => serde_yaml::to_string(items)?,
        OutputFormat::Plain => items
            .iter()
            .map(|item| {
                T::headers()
                    .iter()
                    .zip(item.row())
                    .map(|(header, value)| format!("{}: {}", header, value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n---\n"),
    };
    Ok(out)
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render_list(items, format)?);
    Ok(())
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        size: u64,
    }

    impl TableDisplay for Row {
        fn headers() -> Vec<&'static str> {
            vec!["Name", "Size"]
        }

        fn row(&self) -> Vec<String> {
            vec![self.name.to_string(), self.size.to_string()]
        }
    }

    #[test]
    fn test_plain_output() {
        let rows = [Row { name: "a", size: 1 }, Row { name: "b", size: 2 }];
        let out = render_list(&rows, OutputFormat::Plain).unwrap();
        assert_eq!(out, "Name: a\nSize: 1\n---\nName: b\nSize: 2");
    }

    #[test]
    fn test_json_output() {
        let rows = [Row { name: "a", size: 1 }];
        let out = render_list(&rows, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["size"], 1);
    }

    #[test]
    fn test_table_output_has_headers() {
        let rows = [Row { name: "horse.webp", size: 34 }];
        let out = render_list(&rows, OutputFormat::Table).unwrap();
        assert!(out.contains("Name"));
        assert!(out.contains("horse.webp"));
    }

    #[test]
    fn test_empty_list() {
        let rows: [Row; 0] = [];
        assert_eq!(render_list(&rows, OutputFormat::Json).unwrap(), "No items found.");
    }
}
