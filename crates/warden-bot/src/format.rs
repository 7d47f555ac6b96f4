//! Human-readable rendering of traffic figures.

use ledger_store::Traffic;

/// Decimal byte size with one fractional digit above 1000 bytes.
pub fn format_bytes(bytes: u64) -> String {
    let num = bytes as f64;
    if bytes < 1_000 {
        format!("{}B", bytes)
    } else if bytes < 1_000_000 {
        format!("{:.1}KB", num / 1e3)
    } else if bytes < 1_000_000_000 {
        format!("{:.1}MB", num / 1e6)
    } else {
        format!("{:.1}GB", num / 1e9)
    }
}

/// `down <b>..</b> up <b>..</b>` line used by every traffic listing.
pub fn format_traffic(traffic: &Traffic) -> String {
    format!(
        "down <b>{}</b> up <b>{}</b>",
        format_bytes(traffic.downlink),
        format_bytes(traffic.uplink)
    )
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}
