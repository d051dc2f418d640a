//! Rendering for `--output`.
//!
//! `json`, `json-compact` and `yaml` serialize the data as returned by the
//! router. `table` and `plain` are human views built per command.

use std::io::{self, Write};

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;

/// Serialized form for the machine-readable formats, `None` for the
/// human ones.
fn structured<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> Option<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Table | OutputFormat::Plain => return None,
    };
    Some(rendered.unwrap_or_else(|e| format!("<serialization failed: {e}>")))
}

/// Many items: a rounded table of `to_row` rows, or one `line` per item.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    if let Some(out) = structured(format, data) {
        return out;
    }
    if matches!(format, OutputFormat::Plain) {
        return data.iter().map(line).collect::<Vec<_>>().join("\n");
    }
    let rows: Vec<R> = data.iter().map(to_row).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One item: `detail` for tables, `line` for plain.
pub fn render_single<T: Serialize>(
    format: OutputFormat,
    data: &T,
    detail: impl Fn(&T) -> String,
    line: impl Fn(&T) -> String,
) -> String {
    match structured(format, data) {
        Some(out) => out,
        None if matches!(format, OutputFormat::Plain) => line(data),
        None => detail(data),
    }
}

/// Router JSON without a fixed shape. Table and plain print it pretty.
pub fn render_value(format: OutputFormat, data: &serde_json::Value) -> String {
    structured(format, data)
        .or_else(|| structured(OutputFormat::Json, data))
        .unwrap_or_default()
}

/// Write to stdout unless `quiet` or there is nothing to show.
pub fn print_output(rendered: &str, quiet: bool) {
    if quiet || rendered.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{rendered}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Machine {
        index: usize,
        on: bool,
    }

    #[derive(Tabled)]
    struct MachineRow {
        #[tabled(rename = "#")]
        index: usize,
    }

    fn machines() -> Vec<Machine> {
        vec![
            Machine { index: 0, on: true },
            Machine { index: 1, on: false },
        ]
    }

    fn render(format: OutputFormat) -> String {
        render_list(
            format,
            &machines(),
            |m| MachineRow { index: m.index },
            |m| format!("{} {}", m.index, m.on),
        )
    }

    #[test]
    fn plain_is_one_line_per_item() {
        assert_eq!(render(OutputFormat::Plain), "0 true\n1 false");
    }

    #[test]
    fn table_has_header() {
        let out = render(OutputFormat::Table);
        assert!(out.contains('#'));
        assert!(out.lines().count() > 2);
    }

    #[test]
    fn compact_json_is_single_line() {
        assert_eq!(
            render(OutputFormat::JsonCompact),
            r#"[{"index":0,"on":true},{"index":1,"on":false}]"#
        );
    }

    #[test]
    fn loose_values_print_as_json_in_table_mode() {
        let value = serde_json::json!({ "mode": "VDSL2" });
        let out = render_value(OutputFormat::Table, &value);
        assert!(out.contains("\"mode\": \"VDSL2\""));
        assert_eq!(render_value(OutputFormat::Yaml, &value).trim(), "mode: VDSL2");
    }
}
