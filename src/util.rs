/// Whole seconds as `mm:ss`; minutes keep growing past an hour
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn format_millis(ms: u64) -> String {
    if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let tenths = (ms % 60_000) / 100;
        format!("{}:{:02}.{}", ms / 60_000, tenths / 10, tenths % 10)
    }
}

/// Truncate to `max_width` terminal columns, marking the cut with an ellipsis
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
