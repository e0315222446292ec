//! Listing output for `voltree ls`.

use std::fmt::Write;

use voltree_browser::DirEntry;

/// One line per entry, children indented below their directory.
///
/// ```text
/// d 755        - world/
///   - 644     1024 level.dat
/// - 644       11 server.properties
/// ```
pub fn listing_text(entries: &[DirEntry]) -> String {
    let mut out = String::new();
    write_entries(&mut out, entries, 0);
    out
}

fn write_entries(out: &mut String, entries: &[DirEntry], level: usize) {
    for entry in entries {
        let kind = if entry.kind.is_dir() { 'd' } else { '-' };
        let perms = entry
            .permissions
            .map(|p| format!("{:03o}", p & 0o777))
            .unwrap_or_else(|| "---".to_string());
        let size = entry
            .size
            .filter(|_| entry.kind.is_file())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let slash = if entry.kind.is_dir() { "/" } else { "" };

        let _ = writeln!(
            out,
            "{indent}{kind} {perms} {size:>8} {name}{slash}",
            indent = "  ".repeat(level),
            name = entry.name,
        );

        if let Some(children) = &entry.children {
            write_entries(out, children, level + 1);
        }
    }
}

/// Progress line for zip downloads, redrawn in place on stderr.
pub fn progress_line(done: usize, total: usize) -> String {
    format!("\rzipping [{done}/{total}]")
}
