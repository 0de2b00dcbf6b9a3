//! Single-line transfer progress for clone and fetch.

use std::io::{self, Write};

/// Rewrites one terminal line with `\r` as transfer counters advance.
///
/// Whether anything was printed is tracked per operation and handed back by
/// [`ProgressLine::finish`], which also terminates the line.
pub struct ProgressLine<'w> {
    out: &'w mut dyn Write,
    printed: bool,
    last: Option<(usize, usize)>,
}

impl<'w> ProgressLine<'w> {
    pub fn new(out: &'w mut dyn Write) -> Self {
        Self {
            out,
            printed: false,
            last: None,
        }
    }

    /// Render `current/total` objects. Write errors are ignored; progress is cosmetic.
    pub fn update(&mut self, current: usize, total: usize, message: &str) {
        if self.last == Some((current, total)) {
            return;
        }
        self.last = Some((current, total));

        let percent = percent(current, total)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "...".to_string());
        let _ = write!(
            self.out,
            "\rReceiving objects: {:>3}% ({}/{}), {}",
            percent, current, total, message
        );
        let _ = self.out.flush();
        self.printed = true;
    }

    /// End the progress line with a newline if anything was printed.
    ///
    /// Returns whether progress was printed during this operation.
    pub fn finish(self) -> io::Result<bool> {
        if self.printed {
            self.out.write_all(b"\n")?;
            self.out.flush()?;
        }
        Ok(self.printed)
    }
}

/// Whole percentage of `current` out of `total`; `None` while the total is unknown.
pub fn percent(current: usize, total: usize) -> Option<usize> {
    if total == 0 {
        return None;
    }
    Some(current.min(total) * 100 / total)
}

/// Human readable byte count for the trailing progress message.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
