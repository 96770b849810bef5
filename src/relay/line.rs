//! Rendering of a routed line for the wire and for deferral.

use std::fmt;

use chrono::NaiveDateTime;

/// Marker placed before lines written to the fallback.
pub const DEFERRED_MARKER: &str = "DELAYED";
const DEFERRED_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A formatted log line plus the token that routes it at the collector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingLine {
    token: String,
    line: String,
}

impl PendingLine {
    /// Trailing line breaks are removed; the transport adds its own.
    pub fn new(token: impl Into<String>, line: impl Into<String>) -> Self {
        let mut line = line.into();
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Self {
            token: token.into(),
            line,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    /// Wire form: `<token> <line>`, or the bare line without a token.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Fallback form: `<token> DELAYED at <YYYY-MM-DD HH:MM:SS> <line>`.
    ///
    /// The token stays first so the line routes correctly when replayed.
    pub fn render_deferred(&self, at: NaiveDateTime) -> String {
        let stamp = at.format(DEFERRED_STAMP_FORMAT);
        if self.token.is_empty() {
            format!("{DEFERRED_MARKER} at {stamp} {}", self.line)
        } else {
            format!("{} {DEFERRED_MARKER} at {stamp} {}", self.token, self.line)
        }
    }
}

impl fmt::Display for PendingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.token.is_empty() {
            f.write_str(&self.line)
        } else {
            write!(f, "{} {}", self.token, self.line)
        }
    }
}
