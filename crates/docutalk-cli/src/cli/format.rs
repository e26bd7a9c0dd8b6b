//! Display formatting shared by the commands.

use console::style;

use docutalk_core::credits::CreditSnapshot;

/// Human-readable duration: `"12.5 seconds"` below a minute, otherwise
/// `"2 minutes and 5.0 seconds"`.
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    if seconds < 60.0 {
        return format!("{seconds:.1} seconds");
    }

    let minutes = (seconds / 60.0).floor() as u64;
    // Round to one decimal the same way the display does.
    let remaining = ((seconds % 60.0) * 10.0).round() / 10.0;
    let minute_label = if minutes > 1 { "minutes" } else { "minute" };

    if remaining > 0.0 {
        let second_label = if remaining > 1.0 { "seconds" } else { "second" };
        format!("{minutes} {minute_label} and {remaining:.1} {second_label}")
    } else {
        format!("{minutes} {minute_label}")
    }
}

/// `"1263 / 2500"`, or `"- / 2500"` while the balance is unknown.
pub fn credits_fraction(snapshot: &CreditSnapshot) -> String {
    let total = snapshot
        .total
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    let remaining = snapshot
        .remaining()
        .map_or_else(|| "-".to_string(), |r| r.to_string());
    format!("{remaining} / {total}")
}

/// Styled credit line: green with plenty left, yellow under a fifth, red
/// when depleted.
pub fn styled_credits(snapshot: &CreditSnapshot) -> String {
    let text = credits_fraction(snapshot);
    match (snapshot.remaining(), snapshot.total) {
        (Some(r), _) if r <= 0 => style(text).red().bold().to_string(),
        (Some(r), Some(t)) if t > 0 && r * 5 < t => style(text).yellow().to_string(),
        (Some(_), _) => style(text).green().to_string(),
        _ => style(text).dim().to_string(),
    }
}

/// Truncate to `max` characters, adding an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
