use anyhow::Result;
use cephkit::InvocationResult;
use colored::Colorize;

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

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Results
// ============================================================================

/// One-word status for a result.
pub fn status(result: &InvocationResult, check_mode: bool) -> &'static str {
    match (result.failed, result.changed, check_mode) {
        (true, _, _) => "failed",
        (false, true, true) => "would change",
        (false, true, false) => "changed",
        (false, false, _) => "ok",
    }
}

/// Print one reconciliation result for humans.
pub fn print_result(label: &str, result: &InvocationResult, check_mode: bool, quiet: bool) {
    let status = status(result, check_mode);
    match status {
        "failed" => error(&format!("{label}: {}", status.red())),
        "ok" if quiet => {}
        "ok" => success(&format!("{label}: {status}")),
        _ => println!("{} {label}: {}", "→".cyan(), status.yellow()),
    }

    if quiet && !result.failed {
        return;
    }

    if !result.cmd.is_empty() {
        dim(&format!("$ {}", result.cmd));
    }
    if let Some(rc) = result.rc {
        kv("rc", &rc.to_string());
    }
    kv("delta", &cephkit::report::format_delta(result.duration));
    if let Some(msg) = &result.msg {
        kv("msg", msg);
    }
    if result.failed && !result.stderr.is_empty() {
        for line in result.stderr.lines() {
            dim(line);
        }
    } else if !result.stdout.is_empty() && !result.changed {
        for line in result.stdout.lines() {
            dim(line);
        }
    }
}

/// Print results as pretty JSON.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Size Parsing
// ============================================================================

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;
const TB: u64 = GB * 1024;

/// Parse human-readable size string (e.g., "100MB", "1GB", "500")
///
/// Supports suffixes: B, KB, MB, GB, TB (case-insensitive)
/// Returns bytes as u64
pub fn parse_size(size_str: &str) -> Result<u64, String> {
    let size_str = size_str.trim().to_uppercase();

    if size_str.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if let Some(num) = size_str.strip_suffix("TB") {
        (num, TB)
    } else if let Some(num) = size_str.strip_suffix("GB") {
        (num, GB)
    } else if let Some(num) = size_str.strip_suffix("MB") {
        (num, MB)
    } else if let Some(num) = size_str.strip_suffix("KB") {
        (num, KB)
    } else if let Some(num) = size_str.strip_suffix('B') {
        (num, 1u64)
    } else {
        (size_str.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number in size: '{}'", num_str.trim()))?;

    if num < 0.0 {
        return Err(format!("Size cannot be negative: {num}"));
    }

    Ok((num * multiplier as f64) as u64)
}

/// Parse a quota size: `-1` for unlimited, otherwise a [`parse_size`] value
pub fn parse_quota_size(size_str: &str) -> Result<i64, String> {
    if size_str.trim() == "-1" {
        return Ok(-1);
    }
    let bytes = parse_size(size_str)?;
    i64::try_from(bytes).map_err(|_| format!("Size too large: {size_str}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cephkit::report::{Outcome, Timer};
    use cephkit::{CommandPlan, RawOutput};

    fn ran(rc: i32, changed: bool) -> InvocationResult {
        Timer::start().finish(Outcome::Ran {
            cmd: CommandPlan::from(vec!["ceph".to_string(), "health".to_string()]),
            output: RawOutput::new(rc, "", ""),
            changed,
        })
    }

    #[test]
    fn test_status() {
        assert_eq!(status(&ran(0, false), false), "ok");
        assert_eq!(status(&ran(0, true), false), "changed");
        assert_eq!(status(&ran(1, true), false), "failed");

        let planned = Timer::start().finish(Outcome::Planned {
            cmd: CommandPlan::default(),
        });
        assert_eq!(status(&planned, true), "would change");
    }

    #[test]
    fn test_parse_size_bytes() {
        assert_eq!(parse_size("500").unwrap(), 500);
        assert_eq!(parse_size("500B").unwrap(), 500);
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("100mb").unwrap(), 100 * MB);
        assert_eq!(parse_size("1.5GB").unwrap(), (1.5 * GB as f64) as u64);
        assert_eq!(parse_size("2TB").unwrap(), 2 * TB);
        assert_eq!(parse_size("  10 GB  ").unwrap(), 10 * GB);
    }

    #[test]
    fn test_parse_size_errors() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("-5GB").is_err());
    }

    #[test]
    fn test_parse_quota_size() {
        assert_eq!(parse_quota_size("-1").unwrap(), -1);
        assert_eq!(parse_quota_size("4KB").unwrap(), 4096);
        assert!(parse_quota_size("-2").is_err());
    }
}
