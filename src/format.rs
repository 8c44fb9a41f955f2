//! Display helpers for monetary values.

/// Render an amount stored in cents as US dollars, e.g. `123456` becomes
/// `$1,234.56` and `-5` becomes `-$0.05`.
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let magnitude = cents.unsigned_abs();
    let dollars = group_thousands(magnitude / 100);
    format!("{sign}${dollars}.{:02}", magnitude % 100)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
