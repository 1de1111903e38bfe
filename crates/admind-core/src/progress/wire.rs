//! Line codec for progress events.
//!
//! The CLI layer ships command output to remote clients as a line-oriented
//! stream in which progress lines are interleaved with ordinary log/text
//! lines. Each progress event renders as one tagged line:
//!
//! ```text
//! PROGRESS 20% copying files
//! PROGRESS 40% backup.archive: writing archive
//! PROGRESS 3 scanned 3 modules
//! ```
//!
//! i.e. `PROGRESS <value>[%] [<scope>:] [message]` — the `%` marks a
//! percentage value, the scope (omitted for the root scope) is a dotted
//! path terminated by `:`. [`parse_line`] returns `None` for anything that
//! is not a progress line, so a well-formed parser can run over mixed
//! output and ignore the rest.

use admind_commons::{ProgressMessage, ProgressScope};

const TAG: &str = "PROGRESS ";

/// Render one event as a tagged line (no trailing newline).
pub fn render_line(message: &ProgressMessage) -> String {
    let mut line = String::from(TAG);
    line.push_str(&message.value.to_string());
    if message.percentage {
        line.push('%');
    }
    if !message.scope.is_root() {
        line.push(' ');
        line.push_str(message.scope.as_str());
        line.push(':');
    }
    if let Some(text) = &message.message {
        if !text.is_empty() {
            line.push(' ');
            line.push_str(text);
        }
    }
    line
}

/// Parse a tagged progress line back into an event. `None` for any line
/// that does not carry the tag or does not scan as a progress tuple.
pub fn parse_line(line: &str) -> Option<ProgressMessage> {
    let rest = line.strip_prefix(TAG)?;
    let mut parts = rest.splitn(2, ' ');

    let value_token = parts.next()?;
    let (value_str, percentage) = match value_token.strip_suffix('%') {
        Some(v) => (v, true),
        None => (value_token, false),
    };
    let value: u32 = value_str.parse().ok()?;

    let remainder = parts.next().unwrap_or("");
    let (scope, message) = split_scope(remainder);
    Some(ProgressMessage {
        scope,
        value,
        percentage,
        message,
    })
}

// A leading token ending in ':' whose body is a plain dotted identifier is
// the scope; everything else is message text.
fn split_scope(remainder: &str) -> (ProgressScope, Option<String>) {
    if let Some((head, tail)) = remainder.split_once(' ') {
        if let Some(scope) = scope_token(head) {
            return (scope, non_empty(tail));
        }
    } else if let Some(scope) = scope_token(remainder) {
        return (scope, None);
    }
    (ProgressScope::root(), non_empty(remainder))
}

fn scope_token(token: &str) -> Option<ProgressScope> {
    let body = token.strip_suffix(':')?;
    if body.is_empty()
        || !body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return None;
    }
    Some(ProgressScope::new(body))
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
