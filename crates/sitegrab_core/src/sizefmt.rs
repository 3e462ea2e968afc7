const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Renders a byte count with a binary-unit scale.
///
/// Values under 1024 render as an integer byte count (`"0 B"`,
/// `"512 B"`); larger values are divided by 1024 until the scaled value
/// lands in [1, 1024) and are rendered with two decimals (`"1.50 KB"`).
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut scaled = bytes as f64;
    let mut unit = 0;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    format!("{scaled:.2} {}", UNITS[unit])
}
