// Check report rendering
use crate::domain::check::{CheckContext, CheckSeverity};

/// Render the ordered check record: one line per check, then a summary.
pub fn render(checks: &CheckContext) -> String {
    let mut out = String::new();
    for entry in checks.entries() {
        let marker = if entry.passed { "ok  " } else { "FAIL" };
        let severity = match (entry.passed, entry.severity) {
            (false, CheckSeverity::Hard) => " [hard]",
            _ => "",
        };
        out.push_str(&format!("{marker}  {}{severity}\n", entry.description));
    }

    let total = checks.entries().len();
    let failed = checks.failure_count();
    out.push_str(&format!("\n{total} checks, {failed} failed\n"));
    out
}
