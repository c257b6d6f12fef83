//! Recover record identifiers from pasted SQL or log output.

use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write;
use std::ops::Range;
use std::sync::OnceLock;

fn uuid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
            .expect("valid uuid pattern")
    })
}

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\d{7,}\b").expect("valid numeric pattern"))
}

/// UUIDs first, then numeric ids of 7+ digits, each once, in order of appearance.
///
/// Digit runs inside a UUID are not reported as numeric ids.
pub fn extract_ids(text: &str) -> Vec<String> {
    let uuid_spans: Vec<Range<usize>> = uuid_pattern().find_iter(text).map(|m| m.range()).collect();
    let inside_uuid = |span: &Range<usize>| {
        uuid_spans
            .iter()
            .any(|u| u.start <= span.start && span.end <= u.end)
    };

    let uuids = uuid_pattern().find_iter(text).map(|m| m.as_str());
    let numeric = numeric_pattern()
        .find_iter(text)
        .filter(|m| !inside_uuid(&m.range()))
        .map(|m| m.as_str());

    let mut seen = HashSet::new();
    uuids
        .chain(numeric)
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Output block: count, `--ids` list, JSON array, ready-to-run command.
pub fn render(ids: &[String]) -> String {
    let joined = ids.join(",");
    let json = serde_json::to_string_pretty(ids).unwrap_or_else(|_| "[]".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Found {} IDs:\n", ids.len());
    let _ = writeln!(out, "Comma-separated (for --ids flag):");
    let _ = writeln!(out, "{}\n", joined);
    let _ = writeln!(out, "JSON array:");
    let _ = writeln!(out, "{}\n", json);
    let _ = writeln!(out, "To delete these files, run:");
    let _ = writeln!(out, "directus-sweeper --execute --ids \"{}\"", joined);
    out
}
