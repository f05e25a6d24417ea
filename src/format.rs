// Display helpers for CLI output and reports

/// `$12.30` style amount with two decimals. Negative amounts keep their sign
/// after the symbol: `$-1.50`.
pub fn format_currency(amount: f64, symbol: &str) -> String {
    format!("{}{:.2}", symbol, amount)
}

/// `94.8%` style percentage
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}
