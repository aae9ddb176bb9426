//! Human-readable rendering of tool results.

use std::fmt::Write as _;
use std::time::Duration;

use crate::index::{ContentSearchResult, IndexedFile};

/// Render content search results grouped by file, with line numbers and
/// optional context.
pub fn format_search_results(results: &[ContentSearchResult], total_matches: usize) -> String {
    if results.is_empty() {
        return "No matches found.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Found {} matches in {} files:\n",
        total_matches,
        results.len()
    );

    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "── {} ──", result.relative_path);

        for m in &result.matches {
            for ctx_line in &m.context_before {
                let _ = writeln!(out, "  {}", ctx_line);
            }
            let _ = writeln!(out, "  {}: {}", m.line_number, m.line_text);
            for ctx_line in &m.context_after {
                let _ = writeln!(out, "  {}", ctx_line);
            }
        }
    }

    out
}

/// Render file search results, either full metadata rows or bare paths.
pub fn format_file_results(results: &[IndexedFile], name_only: bool) -> String {
    if results.is_empty() {
        return "No files matched.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Found {} files:\n", results.len());

    for file in results {
        if name_only {
            let _ = writeln!(out, "{}", file.relative_path);
        } else {
            let _ = writeln!(
                out,
                "  {}  ({}, {}, {} lines)",
                file.relative_path,
                file.language,
                format_file_size(file.size_bytes),
                file.line_count,
            );
        }
    }

    out
}

/// Render a file's content with numbered lines, similar to the built-in
/// Read tool.
pub fn format_file_content(file_path: &str, content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let line_count = lines.len();

    let mut out = String::new();
    let _ = writeln!(out, "── {} ({} lines) ──", file_path, line_count);
    for (i, line) in lines.iter().enumerate() {
        let _ = writeln!(out, "{}: {}", i + 1, line);
    }
    out
}

/// Bytes as a human-readable size.
pub fn format_file_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// A duration as a compact human-readable string.
pub fn format_duration(d: Duration) -> String {
    let total_seconds = d.as_secs();
    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }
    let total_minutes = total_seconds / 60;
    let remainder_seconds = total_seconds % 60;
    if total_minutes < 60 {
        return format!("{}m{}s", total_minutes, remainder_seconds);
    }
    let hours = total_minutes / 60;
    let remainder_minutes = total_minutes % 60;
    format!("{}h{}m", hours, remainder_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LineMatch;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn search_result() -> ContentSearchResult {
        ContentSearchResult {
            relative_path: "src/main.go".to_string(),
            matches: vec![LineMatch {
                line_number: 4,
                line_text: "\tfmt.Println(\"hello\")".to_string(),
                context_before: vec!["func main() {".to_string()],
                context_after: vec!["}".to_string()],
            }],
        }
    }

    #[test]
    fn test_format_search_results() {
        let out = format_search_results(&[search_result()], 1);
        assert!(out.contains("Found 1 matches in 1 files:"));
        assert!(out.contains("── src/main.go ──"));
        assert!(out.contains("  4: \tfmt.Println(\"hello\")"));
        assert!(out.contains("  func main() {"));
        assert!(out.contains("  }"));
    }

    #[test]
    fn test_format_search_results_empty() {
        assert_eq!(format_search_results(&[], 0), "No matches found.");
    }

    #[test]
    fn test_format_file_results() {
        let file = IndexedFile {
            path: PathBuf::from("/p/src/main.go"),
            relative_path: "src/main.go".to_string(),
            language: "Go".to_string(),
            size_bytes: 2048,
            mod_time: SystemTime::now(),
            line_count: 42,
        };
        let out = format_file_results(std::slice::from_ref(&file), false);
        assert!(out.contains("Found 1 files:"));
        assert!(out.contains("src/main.go"));
        assert!(out.contains("Go"));
        assert!(out.contains("2.0 KB"));
        assert!(out.contains("42 lines"));

        let names = format_file_results(&[file], true);
        assert!(names.contains("src/main.go"));
        assert!(!names.contains("42 lines"));
    }

    #[test]
    fn test_format_file_results_empty() {
        assert_eq!(format_file_results(&[], false), "No files matched.");
    }

    #[test]
    fn test_format_file_content_numbers_lines() {
        let out = format_file_content("main.go", "a\nb\nc");
        assert!(out.starts_with("── main.go (3 lines) ──\n"));
        assert!(out.contains("1: a\n"));
        assert!(out.contains("3: c\n"));
    }

    #[test]
    fn test_format_file_content_reconstructs_source_lines() {
        let content = "package main\n\nfunc main() {}\n";
        let out = format_file_content("main.go", content);
        let body: Vec<&str> = out.lines().skip(1).collect();
        let expected: Vec<String> = content
            .split('\n')
            .enumerate()
            .map(|(i, line)| format!("{}: {}", i + 1, line))
            .collect();
        assert_eq!(body, expected);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3720)), "1h2m");
    }
}
