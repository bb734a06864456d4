//! Rendering a voice note summary as a collapsible callout.
//!
//! ```text
//! >[!Tip]- 14:05: Reflecting on negotiations
//! > "Today I met the envoy and we reached a preliminary agreement."
//! ```

use chrono::NaiveTime;

use crate::domain::NoteSummary;

/// Callout type used for summaries (collapsed by default via `-`)
pub const CALLOUT_TYPE: &str = "Tip";

/// Render `summary` as callout lines, without terminators.
///
/// Multi-line summaries stay inside the callout: every line is quoted.
pub fn render_summary(summary: &NoteSummary, time: NaiveTime) -> Vec<String> {
    let title = single_line(&summary.short_summary);
    let mut lines = vec![format!(
        ">[!{}]- {}: {}",
        CALLOUT_TYPE,
        time.format("%H:%M"),
        title
    )];

    let body = format!("\"{}\"", summary.summary.trim());
    lines.extend(body.lines().map(|line| {
        let line = line.trim_end();
        if line.is_empty() {
            ">".to_string()
        } else {
            format!("> {}", line)
        }
    }));

    lines
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
