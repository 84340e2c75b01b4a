use colored::Colorize;
use similar::{ChangeTag, TextDiff};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Diffs
// ============================================================================

/// Changed lines between two texts, each prefixed with `- ` or `+ `
pub fn diff_lines(old: &str, new: &str) -> Vec<(ChangeTag, String)> {
    let diff = TextDiff::from_lines(old, new);
    diff.iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .map(|change| {
            let sign = if change.tag() == ChangeTag::Delete { "-" } else { "+" };
            let line = format!("{sign} {change}");
            (change.tag(), line.trim_end_matches('\n').to_string())
        })
        .collect()
}

/// Print a colored line diff, or a note when there is nothing to show
pub fn print_diff(old: &str, new: &str) {
    let lines = diff_lines(old, new);
    if lines.is_empty() {
        println!("    {}", "(unchanged)".dimmed());
        return;
    }
    for (tag, line) in lines {
        match tag {
            ChangeTag::Delete => println!("    {}", line.red()),
            _ => println!("    {}", line.green()),
        }
    }
}

/// Shorten a list for display: `a, b, c (+2 more)`
pub fn summarize_list(items: &[String], max: usize) -> String {
    if items.len() <= max {
        return items.join(", ");
    }
    format!("{} (+{} more)", items[..max].join(", "), items.len() - max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_lines_only_changes() {
        let lines = diff_lines("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(
            lines,
            vec![
                (ChangeTag::Delete, "- b".to_string()),
                (ChangeTag::Insert, "+ B".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_lines_identical() {
        assert!(diff_lines("same\n", "same\n").is_empty());
    }

    #[test]
    fn test_diff_lines_new_file() {
        let lines = diff_lines("", "x\ny\n");
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|(tag, _)| *tag == ChangeTag::Insert));
    }

    #[test]
    fn test_summarize_list() {
        let items: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(summarize_list(&items, 5), "a, b, c, d");
        assert_eq!(summarize_list(&items, 2), "a, b (+2 more)");
        assert_eq!(summarize_list(&[], 2), "");
    }
}
