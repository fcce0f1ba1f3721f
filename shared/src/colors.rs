use std::fmt;

/// HSL color with hue in degrees and saturation/lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// CSS `hsl(h, s%, l%)` string.
    pub fn css(&self) -> String {
        self.to_string()
    }

    fn lerp(from: Hsl, to: Hsl, t: f64) -> Hsl {
        Hsl::new(
            from.h + (to.h - from.h) * t,
            from.s + (to.s - from.s) * t,
            from.l + (to.l - from.l) * t,
        )
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.h, self.s, self.l)
    }
}

/// Light yellow → yellow → orange → orange-red → red.
pub const HEATMAP_STOPS: [(f64, Hsl); 5] = [
    (0.00, Hsl::new(60.0, 100.0, 90.0)),
    (0.25, Hsl::new(55.0, 100.0, 75.0)),
    (0.50, Hsl::new(40.0, 100.0, 60.0)),
    (0.75, Hsl::new(20.0, 100.0, 55.0)),
    (1.00, Hsl::new(0.0, 100.0, 50.0)),
];

/// Map a normalized value onto the heatmap ramp. Input is clamped to `[0, 1]`;
/// stop positions return the stop color unchanged.
pub fn heatmap_color(value: f64) -> Hsl {
    let value = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    };
    for window in HEATMAP_STOPS.windows(2) {
        let (left_pos, left) = window[0];
        let (right_pos, right) = window[1];
        if value == left_pos {
            return left;
        }
        if value <= right_pos {
            let span = (right_pos - left_pos).max(f64::EPSILON);
            if value == right_pos {
                return right;
            }
            return Hsl::lerp(left, right, (value - left_pos) / span);
        }
    }
    HEATMAP_STOPS[HEATMAP_STOPS.len() - 1].1
}

/// Rescale `value` from `[min, max]` into `[0, 1]`, clamping outliers.
/// A degenerate range maps zero to 0 and anything else to the midpoint.
pub fn normalize_value(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return if value == 0.0 { 0.0 } else { 0.5 };
    }
    let clamped = value.clamp(min.min(max), max.max(min));
    (clamped - min) / (max - min)
}

/// Value range between two percentiles (0..=100) of `values`, used as a
/// robust input range for the color scale.
pub fn percentile_range(values: &[f64], lower_pct: f64, upper_pct: f64) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mut sorted: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();
    sorted.sort_by(f64::total_cmp);

    let last = (sorted.len() - 1) as f64;
    let lower_idx = ((lower_pct / 100.0) * last).floor().clamp(0.0, last) as usize;
    let upper_idx = ((upper_pct / 100.0) * last).ceil().clamp(0.0, last) as usize;
    let (min, max) = (sorted[lower_idx], sorted[upper_idx]);
    if min != max {
        return (min, max);
    }

    let (actual_min, actual_max) = (sorted[0], sorted[sorted.len() - 1]);
    if actual_min != actual_max {
        return (actual_min, actual_max);
    }
    if actual_min == 0.0 {
        return (0.0, 1.0);
    }
    (actual_min * 0.9, actual_max * 1.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn heatmap_color_matches_stops_exactly() {
        assert_eq!(heatmap_color(0.0), HEATMAP_STOPS[0].1);
        assert_eq!(heatmap_color(0.25), HEATMAP_STOPS[1].1);
        assert_eq!(heatmap_color(0.5), HEATMAP_STOPS[2].1);
        assert_eq!(heatmap_color(1.0), HEATMAP_STOPS[4].1);
        assert_eq!(heatmap_color(0.0).css(), "hsl(60, 100%, 90%)");
        assert_eq!(heatmap_color(1.0).css(), "hsl(0, 100%, 50%)");
    }

    #[test]
    fn heatmap_color_clamps_out_of_range_input() {
        assert_eq!(heatmap_color(-3.0), HEATMAP_STOPS[0].1);
        assert_eq!(heatmap_color(7.0), HEATMAP_STOPS[4].1);
        assert_eq!(heatmap_color(f64::NAN), HEATMAP_STOPS[0].1);
    }

    #[test]
    fn heatmap_color_interpolates_monotonically_within_segment() {
        let mut prev = heatmap_color(0.5);
        for step in 1..=25 {
            let cur = heatmap_color(0.5 + step as f64 * 0.01);
            assert!(cur.h <= prev.h, "hue rose at step {step}");
            assert!(cur.s <= prev.s, "saturation rose at step {step}");
            assert!(cur.l <= prev.l, "lightness rose at step {step}");
            prev = cur;
        }
        let mid = heatmap_color(0.625);
        assert_close(mid.h, 30.0);
        assert_close(mid.l, 57.5);
    }

    #[test]
    fn normalize_value_handles_degenerate_range() {
        assert_eq!(normalize_value(0.0, 5.0, 5.0), 0.0);
        assert_eq!(normalize_value(3.0, 5.0, 5.0), 0.5);
        assert_eq!(normalize_value(15.0, 0.0, 10.0), 1.0);
        assert_eq!(normalize_value(-5.0, 0.0, 10.0), 0.0);
        assert_close(normalize_value(2.5, 0.0, 10.0), 0.25);
    }

    #[test]
    fn percentile_range_edge_cases() {
        assert_eq!(percentile_range(&[], 5.0, 95.0), (0.0, 0.0));
        assert_eq!(percentile_range(&[0.0, 0.0], 5.0, 95.0), (0.0, 1.0));
        let (lo, hi) = percentile_range(&[10.0, 10.0, 10.0], 5.0, 95.0);
        assert_close(lo, 9.0);
        assert_close(hi, 11.0);

        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        assert_eq!(percentile_range(&values, 5.0, 95.0), (5.0, 95.0));
    }
}
