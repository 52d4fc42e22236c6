// =============================================================================
// Display formatting helpers for USD amounts, counts, and percent changes
// =============================================================================
//
// Two USD tiers exist on purpose: the scoring metrics use the finer
// `format_usd` ($2.45T / $18.20B / $847.0M / $12K), while the brief prose uses
// the coarser `format_usd_coarse` ($2.45T / $18.2B / $847M).

/// Format a USD amount for metric tables.
pub fn format_usd(n: f64) -> String {
    if n >= 1e12 {
        format!("${:.2}T", n / 1e12)
    } else if n >= 1e9 {
        format!("${:.2}B", n / 1e9)
    } else if n >= 1e6 {
        format!("${:.1}M", n / 1e6)
    } else if n >= 1e3 {
        format!("${:.0}K", n / 1e3)
    } else {
        format!("${:.0}", n)
    }
}

/// Format a USD amount for narrative prose.
pub fn format_usd_coarse(n: f64) -> String {
    if n >= 1e12 {
        format!("${:.2}T", n / 1e12)
    } else if n >= 1e9 {
        format!("${:.1}B", n / 1e9)
    } else if n >= 1e6 {
        format!("${:.0}M", n / 1e6)
    } else {
        format!("${}", group_thousands(n.round() as u64))
    }
}

/// Format an integer count with thousands separators (e.g. "17,342").
pub fn format_count(n: u64) -> String {
    group_thousands(n)
}

/// Format a percent change with an explicit plus sign on positive values.
/// Negative values already carry their minus sign; zero stays unsigned.
pub fn signed_pct(x: f64, decimals: usize) -> String {
    if x > 0.0 {
        format!("+{:.*}%", decimals, x)
    } else {
        format!("{:.*}%", decimals, x)
    }
}

fn group_thousands(n: u64) -> String {
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

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_tiers() {
        assert_eq!(format_usd(2_450_000_000_000.0), "$2.45T");
        assert_eq!(format_usd(18_200_000_000.0), "$18.20B");
        assert_eq!(format_usd(847_000_000.0), "$847.0M");
        assert_eq!(format_usd(12_000.0), "$12K");
        assert_eq!(format_usd(950.0), "$950");
    }

    #[test]
    fn usd_coarse_tiers() {
        assert_eq!(format_usd_coarse(2_450_000_000_000.0), "$2.45T");
        assert_eq!(format_usd_coarse(18_240_000_000.0), "$18.2B");
        assert_eq!(format_usd_coarse(847_400_000.0), "$847M");
        assert_eq!(format_usd_coarse(12_345.0), "$12,345");
    }

    #[test]
    fn counts_are_grouped() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(17_342), "17,342");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn signed_pct_plus_only_on_positive() {
        assert_eq!(signed_pct(1.23, 1), "+1.2%");
        assert_eq!(signed_pct(-1.23, 1), "-1.2%");
        assert_eq!(signed_pct(0.0, 1), "0.0%");
        assert_eq!(signed_pct(0.015, 3), "+0.015%");
    }
}
