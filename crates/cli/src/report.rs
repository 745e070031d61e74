//! Report sink: terminal summary and the saved JSON report.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

use sentinel_recon::model::{ComparisonSummary, MismatchedRow, MissingRow};
use sentinel_recon::{ComparisonResult, Row, Strategy};

const RULE_WIDTH: usize = 60;

/// One finished comparison, ready to render.
pub struct Report<'a> {
    pub generated_at: DateTime<Local>,
    pub table: &'a str,
    pub result: &'a ComparisonResult,
    pub max_details: usize,
}

#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub table: &'a str,
    pub strategy_used: Strategy,
    pub summary: ComparisonSummary,
    pub details: JsonDetails<'a>,
}

#[derive(Serialize)]
pub struct JsonDetails<'a> {
    pub missing_in_target: &'a [MissingRow],
    pub missing_in_source: &'a [MissingRow],
    pub mismatched_rows: &'a [MismatchedRow],
}

fn capped<T>(items: &[T], max: usize) -> &[T] {
    &items[..items.len().min(max)]
}

impl<'a> Report<'a> {
    pub fn new(table: &'a str, result: &'a ComparisonResult, max_details: usize) -> Self {
        Self { generated_at: Local::now(), table, result, max_details }
    }

    pub fn to_json(&self) -> JsonReport<'a> {
        let r = self.result;
        JsonReport {
            generated_at: self.generated_at.to_rfc3339(),
            table: self.table,
            strategy_used: r.strategy_used,
            summary: r.summary(),
            details: JsonDetails {
                missing_in_target: capped(&r.missing_in_target, self.max_details),
                missing_in_source: capped(&r.missing_in_source, self.max_details),
                mismatched_rows: capped(&r.mismatched_rows, self.max_details),
            },
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_json())
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json_string().map_err(io::Error::other)?;
        std::fs::write(path, json)
    }

    // ------------------------------------------------------------------
    // Terminal
    // ------------------------------------------------------------------

    pub fn write_summary(&self, out: &mut dyn Write) -> io::Result<()> {
        let r = self.result;
        let s = r.summary();
        let rule = "-".repeat(RULE_WIDTH);

        writeln!(out)?;
        writeln!(out, "data-sentinel report  {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(out, "table:    {}", self.table)?;
        writeln!(out, "strategy: {}", r.strategy_used)?;
        writeln!(out, "{rule}")?;

        let counts = [
            ("Source rows", s.total_source_rows),
            ("Target rows", s.total_target_rows),
            ("Missing in target", s.missing_in_target),
            ("Missing in source", s.missing_in_source),
            ("Mismatched rows", s.mismatched_rows),
        ];
        let width = counts.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        writeln!(out, "  {:<width$}  {:>8}", "Check", "Count")?;
        for (label, count) in counts {
            writeln!(out, "  {label:<width$}  {count:>8}")?;
        }
        writeln!(out, "{rule}")?;

        if !r.mismatched_rows.is_empty() {
            self.section_header(out, "Column mismatches", r.mismatched_rows.len())?;
            for row in capped(&r.mismatched_rows, self.max_details) {
                writeln!(out, "  key {} ({})", row.key, row.key_column)?;
                for m in &row.mismatches {
                    writeln!(out, "    {}: '{}' -> '{}'", m.column, m.source_value, m.target_value)?;
                }
            }
        }

        if !r.missing_in_target.is_empty() {
            self.section_header(out, "Missing in target", r.missing_in_target.len())?;
            for row in capped(&r.missing_in_target, self.max_details) {
                writeln!(out, "  key {} -> {}", row.key, format_row(&row.row))?;
            }
        }

        if !r.missing_in_source.is_empty() {
            self.section_header(out, "Missing in source", r.missing_in_source.len())?;
            for row in capped(&r.missing_in_source, self.max_details) {
                writeln!(out, "  key {} -> {}", row.key, format_row(&row.row))?;
            }
        }

        writeln!(out)?;
        writeln!(out, "{rule}")?;
        writeln!(out, "{}", verdict(r))?;
        writeln!(out, "{rule}")?;
        Ok(())
    }

    fn section_header(&self, out: &mut dyn Write, title: &str, total: usize) -> io::Result<()> {
        writeln!(out)?;
        if total > self.max_details {
            writeln!(out, "{title} (showing {} of {total}):", self.max_details)
        } else {
            writeln!(out, "{title}:")
        }
    }
}

pub fn verdict(result: &ComparisonResult) -> String {
    match result.total_issues() {
        0 => "Tables are identical. No differences found.".to_string(),
        n => format!("{n} issue(s) found across both tables."),
    }
}

fn format_row(row: &Row) -> String {
    let cells: Vec<String> = row.iter().map(|(col, v)| format!("{col}: {v}")).collect();
    format!("{{{}}}", cells.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_recon::{reconcile, ReconOptions, Value};

    fn employee(id: i64, name: &str, salary: i64) -> Row {
        [("id", Value::Integer(id)), ("name", Value::from(name)), ("salary", Value::Integer(salary))]
            .into_iter()
            .collect()
    }

    fn sample() -> ComparisonResult {
        let source = vec![employee(1, "Alice", 50000), employee(2, "Bob", 60000), employee(4, "Diana", 70000)];
        let target = vec![employee(1, "Alice", 55000), employee(2, "Bob", 60000), employee(6, "Frank", 72000)];
        reconcile(&source, &target, &ReconOptions::primary_key("id")).unwrap()
    }

    fn render(report: &Report<'_>) -> String {
        let mut buf = Vec::new();
        report.write_summary(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn summary_lists_every_section() {
        let result = sample();
        let text = render(&Report::new("employees", &result, 200));

        assert!(text.contains("table:    employees"));
        assert!(text.contains("strategy: Primary Key"));
        assert!(text.contains("salary: '50000' -> '55000'"));
        assert!(text.contains("key 4 -> {id: 4, name: Diana, salary: 70000}"));
        assert!(text.contains("key 6 -> {id: 6, name: Frank, salary: 72000}"));
        assert!(text.contains("3 issue(s) found"));
    }

    #[test]
    fn identical_verdict() {
        let rows = vec![employee(1, "Alice", 1)];
        let result = reconcile(&rows, &rows, &ReconOptions::primary_key("id")).unwrap();
        let text = render(&Report::new("employees", &result, 200));
        assert!(text.contains("Tables are identical"));
        assert!(!text.contains("Column mismatches"));
    }

    #[test]
    fn details_are_capped() {
        let source: Vec<Row> = (0..5).map(|i| employee(i, "x", 1)).collect();
        let result = reconcile(&source, &[], &ReconOptions::primary_key("id")).unwrap();
        let report = Report::new("employees", &result, 2);

        let json = serde_json::to_value(report.to_json()).unwrap();
        assert_eq!(json["summary"]["missing_in_target"], 5);
        assert_eq!(json["details"]["missing_in_target"].as_array().unwrap().len(), 2);

        let text = render(&report);
        assert!(text.contains("Missing in target (showing 2 of 5):"));
        assert!(!text.contains("key 2 ->"));
    }

    #[test]
    fn json_shape() {
        let result = sample();
        let json = serde_json::to_value(Report::new("employees", &result, 200).to_json()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["generated_at", "table", "strategy_used", "summary", "details"]);
        assert_eq!(json["strategy_used"], "primary_key");
        assert_eq!(json["summary"]["total_source_rows"], 3);
        assert_eq!(json["details"]["mismatched_rows"][0]["key"], "1");
    }

    #[test]
    fn save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let result = sample();
        Report::new("employees", &result, 200).save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["table"], "employees");
    }
}
