//! Capacity-factor estimation from a residual load-duration curve.
//!
//! For contexts where full hourly simulation is unnecessary: the 8760
//! residual load values are bucketed into a small number of thresholds of
//! decreasing magnitude, forming a piecewise-linear duration curve of
//! (threshold, fraction-of-year-above) points. The fraction of the year a
//! producer would run then follows from the area under that curve across
//! the producer's cumulative-capacity interval in the merit order.

use ef_core::{Curve, FRAMES_PER_YEAR, Real};

use crate::participant::{Producer, ProducerKind};

/// Number of buckets used when building a table.
pub const DEFAULT_STEPS: usize = 10;

/// A piecewise-linear load-duration curve.
///
/// Points are (load threshold, fraction of the year the load exceeds the
/// threshold), ascending in threshold. The fraction is non-increasing.
#[derive(Debug, Clone)]
pub struct LoadDurationTable {
    points: Vec<(Real, Real)>,
}

impl LoadDurationTable {
    pub fn from_residual_load(curve: &Curve) -> Self {
        Self::with_steps(curve, DEFAULT_STEPS)
    }

    pub fn with_steps(curve: &Curve, steps: usize) -> Self {
        let peak = curve.max();
        if !(peak > 0.0) || steps == 0 {
            return Self {
                points: vec![(0.0, 0.0)],
            };
        }

        // Bucket thresholds run from the peak down to zero; stored ascending.
        let mut points = Vec::with_capacity(steps + 1);
        for k in (0..=steps).rev() {
            let threshold = peak * k as Real / steps as Real;
            let above = curve.iter().filter(|&v| v > threshold).count();
            points.push((threshold, above as Real / FRAMES_PER_YEAR as Real));
        }
        points.reverse();
        Self { points }
    }

    /// Fraction of the year the load exceeds `x`, linearly interpolated.
    pub fn fraction_above(&self, x: Real) -> Real {
        let first = self.points[0];
        if x <= first.0 {
            return first.1;
        }
        let last = self.points[self.points.len() - 1];
        if x >= last.0 {
            return 0.0;
        }
        for window in self.points.windows(2) {
            let (x0, y0) = window[0];
            let (x1, y1) = window[1];
            if x <= x1 {
                let t = (x - x0) / (x1 - x0);
                return y0 + t * (y1 - y0);
            }
        }
        0.0
    }

    /// Area under the duration curve between two capacity positions,
    /// integrated as a shoelace polygon over the curve's vertices.
    pub fn area_between(&self, start: Real, end: Real) -> Real {
        if end <= start {
            return 0.0;
        }

        // Polygon: down the baseline from end to start, up to the curve,
        // then along the curve's interior vertices back to end.
        let mut vertices = vec![(start, 0.0), (start, self.fraction_above(start))];
        for &(x, y) in &self.points {
            if x > start && x < end {
                vertices.push((x, y));
            }
        }
        vertices.push((end, self.fraction_above(end)));
        vertices.push((end, 0.0));

        let mut twice_area = 0.0;
        for i in 0..vertices.len() {
            let (x0, y0) = vertices[i];
            let (x1, y1) = vertices[(i + 1) % vertices.len()];
            twice_area += x0 * y1 - x1 * y0;
        }
        (twice_area / 2.0).abs()
    }

    /// Estimated fraction of the year a producer occupying the capacity
    /// interval [start, end] would run, capped by its availability.
    pub fn capacity_factor(&self, start: Real, end: Real, availability: Real) -> Real {
        if end <= start {
            return 0.0;
        }
        let mean_fraction = self.area_between(start, end) / (end - start);
        mean_fraction.min(availability).max(0.0)
    }
}

/// Demand minus known must-run production, clamped non-negative.
pub fn residual_load(demand: &Curve, must_run: &[&Curve]) -> Curve {
    let mut residual = demand.clone();
    for curve in must_run {
        residual.subtract_curve(curve);
    }
    let values: Vec<Real> = residual.iter().map(|v| v.max(0.0)).collect();
    Curve::from_values("residual load", values).expect("same length as input")
}

/// A producer's estimated standing in the merit order.
#[derive(Debug, Clone)]
pub struct CapacityFactorEstimate {
    pub key: String,
    /// 0-based position by ascending marginal cost.
    pub merit_order_position: usize,
    /// Cumulative installed capacity below this producer, MW.
    pub start: Real,
    /// `start` plus this producer's installed capacity, MW.
    pub end: Real,
    pub capacity_factor: Real,
    pub full_load_hours: Real,
}

/// Assign merit-order positions by cumulative installed capacity and
/// estimate each dispatchable producer's capacity factor from the table.
pub fn estimate_capacity_factors(
    table: &LoadDurationTable,
    producers: &[Producer],
) -> Vec<CapacityFactorEstimate> {
    let mut dispatchables: Vec<&Producer> = producers
        .iter()
        .filter(|p| p.kind == ProducerKind::Dispatchable)
        .collect();
    dispatchables.sort_by(|a, b| a.marginal_costs.total_cmp(&b.marginal_costs));

    let mut estimates = Vec::with_capacity(dispatchables.len());
    let mut cumulative = 0.0;
    for (position, producer) in dispatchables.iter().enumerate() {
        let start = cumulative;
        let end = start + producer.installed_capacity();
        cumulative = end;

        let capacity_factor = table.capacity_factor(start, end, producer.availability);
        estimates.push(CapacityFactorEstimate {
            key: producer.key.clone(),
            merit_order_position: position,
            start,
            end,
            capacity_factor,
            full_load_hours: capacity_factor * FRAMES_PER_YEAR as Real,
        });
    }
    estimates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_load_gives_full_fraction_below_level() {
        let table = LoadDurationTable::from_residual_load(&Curve::constant(100.0));
        // Load is always above anything below 100 and never above 100.
        assert!((table.fraction_above(0.0) - 1.0).abs() < 1e-9);
        assert!((table.fraction_above(50.0) - 1.0).abs() < 1e-9);
        assert_eq!(table.fraction_above(100.0), 0.0);
    }

    #[test]
    fn flat_load_area_is_rectangular() {
        let table = LoadDurationTable::from_residual_load(&Curve::constant(100.0));
        // Between 0 and 50 MW the curve sits at 1.0 except at the very top.
        let area = table.area_between(0.0, 50.0);
        assert!((area - 50.0).abs() < 1.0);
    }

    #[test]
    fn base_load_beats_peak_load() {
        // Half the year at 100 MW, half at 20 MW.
        let mut load = Curve::zeroes();
        for frame in 0..FRAMES_PER_YEAR {
            load.set(frame, if frame % 2 == 0 { 100.0 } else { 20.0 });
        }
        let table = LoadDurationTable::from_residual_load(&load);

        let base = table.capacity_factor(0.0, 20.0, 1.0);
        let peak = table.capacity_factor(80.0, 100.0, 1.0);
        assert!(base > peak);
        assert!(base > 0.8);
        assert!(peak <= 0.6);
    }

    #[test]
    fn empty_residual_load_is_degenerate() {
        let table = LoadDurationTable::from_residual_load(&Curve::zeroes());
        assert_eq!(table.fraction_above(0.0), 0.0);
        assert_eq!(table.capacity_factor(0.0, 100.0, 1.0), 0.0);
    }

    #[test]
    fn positions_follow_cumulative_capacity() {
        let producers = vec![
            Producer::dispatchable("dear", 50.0, 1.0, 1.0, 40.0),
            Producer::dispatchable("cheap", 100.0, 1.0, 0.9, 10.0),
        ];
        let table = LoadDurationTable::from_residual_load(&Curve::constant(120.0));
        let estimates = estimate_capacity_factors(&table, &producers);

        assert_eq!(estimates[0].key, "cheap");
        assert_eq!(estimates[0].merit_order_position, 0);
        assert_eq!(estimates[0].start, 0.0);
        assert_eq!(estimates[0].end, 100.0);
        assert_eq!(estimates[1].key, "dear");
        assert_eq!(estimates[1].start, 100.0);
        assert_eq!(estimates[1].end, 150.0);

        // The cheap plant sits fully under the load and is capped by its
        // availability; the dear plant's tail sticks out above the load.
        assert!((estimates[0].capacity_factor - 0.9).abs() < 1e-9);
        assert!(estimates[1].capacity_factor < 0.9);
    }

    #[test]
    fn residual_subtracts_and_clamps() {
        let demand = Curve::constant(100.0);
        let must_run = Curve::constant(120.0);
        let residual = residual_load(&demand, &[&must_run]);
        assert_eq!(residual.get(0), 0.0);
    }
}
