/// Render an amount with `.` as the thousands separator, e.g. `1250000` as `1.250.000`.
pub fn format_price(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// `format_price` followed by the currency suffix shown on the storefront.
pub fn format_price_vnd(amount: i64) -> String {
    format!("{} VND", format_price(amount))
}
