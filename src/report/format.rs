/// `1234567` -> `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Signed variant used for deltas: `+1,200`, `-35`, `0`.
pub fn signed_thousands(n: i64) -> String {
    let body = thousands(n.unsigned_abs());
    match n.signum() {
        1 => format!("+{}", body),
        -1 => format!("-{}", body),
        _ => body,
    }
}

pub fn growth_arrow(growth: f64) -> &'static str {
    if growth > 0.0 {
        "↑"
    } else if growth < 0.0 {
        "↓"
    } else {
        "→"
    }
}

pub fn status_marker(growth: f64) -> &'static str {
    if growth > 0.5 {
        "🟢"
    } else if growth > 0.0 {
        "🟡"
    } else {
        "🔴"
    }
}

pub fn days_label(days: Option<f64>) -> String {
    match days {
        Some(d) => format!("{:.1}", d),
        None => "N/A".to_string(),
    }
}

/// Table cells cannot contain a bare pipe.
pub fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Truncates to `max` characters, appending `...` when something was cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}
