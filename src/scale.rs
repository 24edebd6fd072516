use std::collections::BTreeMap;

use tracing::debug;

use crate::cohort::EntitySummary;

pub const RADIUS_RANGE: (f32, f32) = (20.0, 55.0);
pub const FALLBACK_RADIUS: f32 = 10.0;
const EXPONENT: f64 = 2.0;

// Sign-preserving so the map stays monotonic below zero.
fn raise(value: f64) -> f64 {
    if value < 0.0 {
        -(-value).powf(EXPONENT)
    } else {
        value.powf(EXPONENT)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeScale {
    min: f64,
    max: f64,
}

impl SizeScale {
    pub fn from_summaries<'a>(summaries: impl IntoIterator<Item = &'a EntitySummary>) -> Self {
        let (min, max) = summaries
            .into_iter()
            .map(|summary| summary.primary_total)
            .filter(|total| total.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), total| {
                (min.min(total), max.max(total))
            });
        if min.is_finite() && max.is_finite() {
            size_scale(min, max)
        } else {
            size_scale(0.0, 0.0)
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn is_degenerate(&self) -> bool {
        (self.max - self.min).abs() <= f64::EPSILON
    }

    pub fn radius(&self, metric: f64) -> f32 {
        let (low, high) = RADIUS_RANGE;
        if self.is_degenerate() {
            return (low + high) * 0.5;
        }

        let unit = self.min.abs().max(self.max.abs());
        let start = raise(self.min / unit);
        let span = raise(self.max / unit) - start;
        let t = (raise(metric / unit) - start) / span;
        if t.is_nan() {
            return low;
        }
        low + (high - low) * t.clamp(0.0, 1.0) as f32
    }
}

pub fn size_scale(min: f64, max: f64) -> SizeScale {
    SizeScale {
        min: min.min(max),
        max: max.max(min),
    }
}

// A zero total never goes through the scale and gets the fallback radius.
pub fn encode_radii(summaries: &BTreeMap<u32, EntitySummary>) -> BTreeMap<u32, f32> {
    let scale = SizeScale::from_summaries(summaries.values());
    let (min, max) = scale.domain();
    debug!(min, max, degenerate = scale.is_degenerate(), "size scale fitted");
    summaries
        .values()
        .map(|summary| {
            let radius = if summary.primary_total == 0.0 {
                FALLBACK_RADIUS
            } else {
                scale.radius(summary.primary_total)
            };
            (summary.id, radius)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::GroupLabel;

    fn summary(id: u32, total: f64) -> EntitySummary {
        EntitySummary {
            id,
            group: GroupLabel::GroupA,
            primary_total: total,
            secondary_mean: None,
            tertiary_mean: None,
        }
    }

    fn summaries(totals: &[f64]) -> BTreeMap<u32, EntitySummary> {
        totals
            .iter()
            .enumerate()
            .map(|(index, total)| (index as u32, summary(index as u32, *total)))
            .collect()
    }

    #[test]
    fn radii_strictly_increase_inside_range() {
        let radii = encode_radii(&summaries(&[10.0, 50.0, 90.0]));

        assert!(radii[&0] < radii[&1]);
        assert!(radii[&1] < radii[&2]);
        assert_eq!(radii[&0], 20.0);
        assert_eq!(radii[&2], 55.0);
        for radius in radii.values() {
            assert!((20.0..=55.0).contains(radius));
        }
    }

    #[test]
    fn power_curve_uses_squared_domain() {
        let scale = size_scale(10.0, 90.0);
        let expected = 20.0 + 35.0 * ((50.0_f64.powi(2) - 100.0) / (8100.0 - 100.0)) as f32;
        assert!((scale.radius(50.0) - expected).abs() < 1e-4);
    }

    #[test]
    fn zero_total_gets_fallback_radius_regardless_of_domain() {
        let radii = encode_radii(&summaries(&[0.0, 10.0, 50.0, 90.0]));
        assert_eq!(radii[&0], FALLBACK_RADIUS);
        assert_eq!(radii[&1], size_scale(0.0, 90.0).radius(10.0));

        let radii = encode_radii(&summaries(&[0.0, 1_000_000.0]));
        assert_eq!(radii[&0], FALLBACK_RADIUS);
    }

    #[test]
    fn out_of_domain_values_clamp_to_range_ends() {
        let scale = size_scale(10.0, 90.0);
        assert_eq!(scale.radius(-500.0), 20.0);
        assert_eq!(scale.radius(5.0), 20.0);
        assert_eq!(scale.radius(1e9), 55.0);
    }

    #[test]
    fn degenerate_domain_maps_everything_to_midpoint() {
        let scale = size_scale(42.0, 42.0);
        assert!(scale.is_degenerate());
        assert_eq!(scale.radius(42.0), 37.5);
        assert_eq!(scale.radius(0.5), 37.5);
        assert_eq!(scale.radius(1e6), 37.5);

        let radii = encode_radii(&summaries(&[7.0, 7.0, 7.0]));
        assert!(radii.values().all(|radius| *radius == 37.5));
    }

    #[test]
    fn mapping_is_monotonic_across_the_domain() {
        let scale = size_scale(-40.0, 120.0);
        let mut previous = scale.radius(-40.0);
        let mut value = -40.0;
        while value <= 120.0 {
            let radius = scale.radius(value);
            assert!(radius >= previous, "radius dropped at {value}");
            previous = radius;
            value += 0.5;
        }
    }

    #[test]
    fn huge_finite_domain_stays_inside_range() {
        let scale = size_scale(0.0, 1e160);
        assert_eq!(scale.radius(1e160), 55.0);
        assert_eq!(scale.radius(0.0), 20.0);
        let middle = scale.radius(5e159);
        assert!((20.0..55.0).contains(&middle));

        let scale = size_scale(-1e300, 1e300);
        assert_eq!(scale.radius(-1e300), 20.0);
        assert_eq!(scale.radius(1e300), 55.0);
        assert!(scale.radius(0.0).is_finite());
    }

    #[test]
    fn infinite_total_takes_the_top_of_the_range() {
        let radii = encode_radii(&summaries(&[10.0, 90.0, f64::INFINITY, f64::NEG_INFINITY]));

        assert_eq!(radii[&0], 20.0);
        assert_eq!(radii[&1], 55.0);
        assert_eq!(radii[&2], 55.0);
        assert_eq!(radii[&3], 20.0);
        assert_eq!(size_scale(10.0, 90.0).radius(f64::NAN), 20.0);
    }

    #[test]
    fn empty_input_produces_degenerate_scale() {
        let scale = SizeScale::from_summaries(std::iter::empty());
        assert!(scale.is_degenerate());
        assert_eq!(scale.domain(), (0.0, 0.0));
    }
}
