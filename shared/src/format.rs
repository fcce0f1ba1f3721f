use std::fmt::Write;

/// Ascending, each unit 1000x the previous one.
const COMPACT_UNITS: [(f64, &str); 5] = [
    (1.0, ""),
    (1.0e3, "K"),
    (1.0e6, "M"),
    (1.0e9, "B"),
    (1.0e12, "T"),
];

/// Longest label before truncation kicks in.
pub const ABBREVIATE_MAX_LEN: usize = 15;

const NAME_PREFIXES: [(&str, &str); 8] = [
    ("Municipiul", "Mun."),
    ("Orașul", "Or."),
    ("Oraşul", "Or."),
    ("Oraș", "Or."),
    ("Oraş", "Or."),
    ("Comuna", "Com."),
    ("Județul", "Jud."),
    ("Judeţul", "Jud."),
];

/// Compact amount notation: `950`, `1.2K`, `3.4M`, `12B`.
pub fn format_compact(amount: f64) -> String {
    let mut out = String::with_capacity(8);
    write_compact(&mut out, amount);
    out
}

pub fn write_compact(buf: &mut String, amount: f64) {
    buf.clear();
    if !amount.is_finite() {
        buf.push_str("N/A");
        return;
    }
    let abs = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };
    let mut idx = COMPACT_UNITS
        .iter()
        .rposition(|(unit, _)| abs >= *unit)
        .unwrap_or(0);
    let round_in = |idx: usize| (abs / COMPACT_UNITS[idx].0 * 10.0).round() / 10.0;
    let mut rounded = round_in(idx);
    // 999_950 rounds to 1000K; carry into the next unit.
    if rounded >= 1000.0 && idx + 1 < COMPACT_UNITS.len() {
        idx += 1;
        rounded = round_in(idx);
    }
    let suffix = COMPACT_UNITS[idx].1;
    if rounded.fract() == 0.0 {
        let _ = write!(buf, "{sign}{rounded:.0}{suffix}");
    } else {
        let _ = write!(buf, "{sign}{rounded:.1}{suffix}");
    }
}

/// Shorten administrative prefixes ("Municipiul Cluj-Napoca" → "Mun. Cluj-Napoca")
/// and truncate whatever is still longer than `max_len` characters.
pub fn abbreviate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let mut abbreviated = name.to_string();
    for (full, short) in NAME_PREFIXES {
        if let Some(rest) = strip_prefix_ci(&abbreviated, full)
            && rest.starts_with(char::is_whitespace)
        {
            abbreviated = format!("{short} {}", rest.trim_start());
            break;
        }
    }

    if abbreviated.chars().count() > max_len {
        let mut truncated: String = abbreviated.chars().take(max_len.saturating_sub(1)).collect();
        truncated.push('\u{2026}');
        return truncated;
    }
    abbreviated
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.to_lowercase() == prefix.to_lowercase() {
        text.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_amounts() {
        assert_eq!(format_compact(0.0), "0");
        assert_eq!(format_compact(950.0), "950");
        assert_eq!(format_compact(1_234.0), "1.2K");
        assert_eq!(format_compact(3_400_000.0), "3.4M");
        assert_eq!(format_compact(12_000_000_000.0), "12B");
        assert_eq!(format_compact(-1_500.0), "-1.5K");
        assert_eq!(format_compact(f64::NAN), "N/A");
    }

    #[test]
    fn rounding_up_carries_into_next_unit() {
        assert_eq!(format_compact(999_950.0), "1M");
        assert_eq!(format_compact(999.96), "1K");
        assert_eq!(format_compact(999_999_999.0), "1B");
        assert_eq!(format_compact(-999_950.0), "-1M");
        assert_eq!(format_compact(999_940.0), "999.9K");
        assert_eq!(format_compact(0.04), "0");
    }

    #[test]
    fn short_names_are_untouched() {
        assert_eq!(abbreviate_name("Cluj-Napoca", ABBREVIATE_MAX_LEN), "Cluj-Napoca");
    }

    #[test]
    fn known_prefixes_are_abbreviated() {
        assert_eq!(abbreviate_name("Municipiul Arad", 12), "Mun. Arad");
        assert_eq!(abbreviate_name("comuna Florești", 13), "Com. Florești");
        assert_eq!(abbreviate_name("Oraşul Sebeş", 10), "Or. Sebeş");
    }

    #[test]
    fn long_names_are_truncated_with_ellipsis() {
        let out = abbreviate_name("Municipiul Drobeta-Turnu Severin", ABBREVIATE_MAX_LEN);
        assert_eq!(out.chars().count(), ABBREVIATE_MAX_LEN);
        assert!(out.starts_with("Mun. Drobeta"));
        assert!(out.ends_with('\u{2026}'));
    }
}
