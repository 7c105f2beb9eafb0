use std::fmt::Write as _;

/// Everything one target produced, collected by a worker and printed by the
/// coordinator in submission order regardless of which worker finished first
/// (spec §4.6's "deterministic output despite concurrent workers").
#[derive(Debug, Clone, Default)]
pub struct TargetReport {
    pub directory: String,
    pub schema_name: String,
    pub statements: Vec<String>,
    pub skipped: Vec<String>,
    pub unsupported_tables: Vec<String>,
    pub error: Option<String>,
}

impl TargetReport {
    #[must_use]
    pub fn header(&self) -> String {
        format!("{} ({})", self.directory, self.schema_name)
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "-- {}", self.header());

        if let Some(error) = &self.error {
            let _ = writeln!(out, "-- ERROR: {error}");
            return out;
        }
        for table in &self.unsupported_tables {
            let _ = writeln!(out, "-- {table}: unsupported for diff, skipping");
        }
        for statement in &self.skipped {
            let _ = writeln!(out, "-- {statement}");
        }
        for statement in &self.statements {
            let _ = writeln!(out, "{statement};");
        }
        if self.statements.is_empty() && self.unsupported_tables.is_empty() && self.skipped.is_empty() {
            let _ = writeln!(out, "-- (nothing to do)");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_says_nothing_to_do() {
        let report = TargetReport {
            directory: "schemas/orders".to_string(),
            schema_name: "orders".to_string(),
            ..TargetReport::default()
        };
        assert!(report.render().contains("nothing to do"));
    }

    #[test]
    fn error_report_short_circuits_other_sections() {
        let report = TargetReport {
            directory: "schemas/orders".to_string(),
            schema_name: "orders".to_string(),
            statements: vec!["ALTER TABLE `t1` ADD COLUMN `x` int".to_string()],
            error: Some("connection refused".to_string()),
            ..TargetReport::default()
        };
        let rendered = report.render();
        assert!(rendered.contains("ERROR: connection refused"));
        assert!(!rendered.contains("ALTER TABLE"));
    }
}
