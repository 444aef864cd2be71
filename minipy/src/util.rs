//! Shared utility functions
//!
//! Byte-string helpers used by the string methods, and number formatting
//! shared by `str()`, `print` and the disassembler.

// ============================================================================
// Byte strings
// ============================================================================

/// Position of the first occurrence of `needle` in `haystack`.
/// An empty needle matches at 0.
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Split on every occurrence of a non-empty separator.
/// Always yields at least one piece.
pub fn split_bytes<'a>(source: &'a [u8], separator: &[u8]) -> Vec<&'a [u8]> {
    let mut pieces = Vec::new();
    let mut rest = source;
    if separator.is_empty() {
        return vec![source];
    }
    while let Some(at) = find_bytes(rest, separator) {
        pieces.push(&rest[..at]);
        rest = &rest[at + separator.len()..];
    }
    pieces.push(rest);
    pieces
}

/// Replace every non-overlapping occurrence of `from`, scanning left to right.
/// Replacement text is never rescanned.
pub fn replace_bytes(source: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return source.to_vec();
    }
    let mut out = Vec::with_capacity(source.len());
    let mut rest = source;
    while let Some(at) = find_bytes(rest, from) {
        out.extend_from_slice(&rest[..at]);
        out.extend_from_slice(to);
        rest = &rest[at + from.len()..];
    }
    out.extend_from_slice(rest);
    out
}

/// Strip ASCII whitespace from both ends
pub fn trim_bytes(source: &[u8]) -> &[u8] {
    source.trim_ascii()
}

// ============================================================================
// Numbers
// ============================================================================

/// Render a number the way `%g` does with six significant digits:
/// `3`, `0.5`, `1e+06`, `1.5e-07`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Rounding to six significant digits decides the exponent.
    let scientific = format!("{value:.5e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            strip_fraction_zeros(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (5 - exponent) as usize;
        strip_fraction_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
