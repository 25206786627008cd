//! Width token parsing at the request boundary

use tracing::warn;

/// Parse one width token into a pixel count.
///
/// Integers are taken as-is and decimals are truncated toward zero.
/// Blank, non-numeric, zero and negative tokens yield `None`.
pub fn parse_width(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Ok(width) = token.parse::<u32>() {
        return (width > 0).then_some(width);
    }

    let value = token.parse::<f64>().ok()?;
    if !value.is_finite() || value < 1.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value.trunc() as u32)
}

/// Effective widths of a request, in first-seen order.
///
/// Invalid tokens, widths above `max_width` and repeats are dropped; the
/// caller decides what an empty result means.
pub fn effective_widths<S: AsRef<str>>(tokens: &[S], max_width: u32) -> Vec<u32> {
    let mut widths = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        match parse_width(token) {
            Some(width) if width > max_width => {
                warn!("Dropping width {}: above the {}px limit", width, max_width);
            }
            Some(width) => {
                if !widths.contains(&width) {
                    widths.push(width);
                }
            }
            None if token.trim().is_empty() => {}
            None => warn!("Dropping invalid width token {:?}", token),
        }
    }

    widths
}
