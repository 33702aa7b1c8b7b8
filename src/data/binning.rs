// ============================================================
// Layer 4 — Radial Binning
// ============================================================
// Averages the reception ratio of all points that fall into
// equal-width distance bins.
//
// For bin i with edges [e_i, e_{i+1}):
//   mean  = Σ y / n
//   error = σ / √n      (population σ, only when n > 1)
//
// Empty bins keep mean = error = count = 0 so every profile has
// the same number of points.

use serde::{Deserialize, Serialize};

use crate::domain::radial_graph::GraphKey;

/// Binning of the distance axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BinSpec {
    pub n_bins: usize,
    pub lo:     f64,
    pub hi:     f64,
}

impl Default for BinSpec {
    fn default() -> Self {
        Self { n_bins: 20, lo: 0.0015, hi: 0.0415 }
    }
}

impl BinSpec {
    /// `n_bins + 1` evenly spaced edges from `lo` to `hi`.
    pub fn edges(&self) -> Vec<f64> {
        let step = (self.hi - self.lo) / self.n_bins as f64;
        (0..=self.n_bins)
            .map(|i| if i == self.n_bins { self.hi } else { self.lo + step * i as f64 })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedProfile {
    pub centers: Vec<f64>,
    pub means:   Vec<f64>,
    pub errors:  Vec<f64>,
    pub counts:  Vec<usize>,
}

/// Bin `values` by `positions` according to `spec`.
pub fn bin_profile(positions: &[f64], values: &[f64], spec: &BinSpec) -> BinnedProfile {
    let edges   = spec.edges();
    let centers = edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();

    let mut means  = vec![0.0; spec.n_bins];
    let mut errors = vec![0.0; spec.n_bins];
    let mut counts = vec![0usize; spec.n_bins];

    for (i, w) in edges.windows(2).enumerate() {
        let (bin_min, bin_max) = (w[0], w[1]);
        let bin_values: Vec<f64> = positions
            .iter()
            .zip(values)
            .filter(|(x, _)| **x >= bin_min && **x < bin_max)
            .map(|(_, y)| *y)
            .collect();

        let n = bin_values.len();
        if n == 0 {
            continue;
        }

        let mean = bin_values.iter().sum::<f64>() / n as f64;
        means[i]  = mean;
        counts[i] = n;
        if n > 1 {
            let variance = bin_values.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / n as f64;
            errors[i] = variance.sqrt() / (n as f64).sqrt();
        }
    }

    BinnedProfile { centers, means, errors, counts }
}

/// Binned profile of one sensor grid.
#[derive(Debug, Clone)]
pub struct GridProfile {
    pub key:     GraphKey,
    pub profile: BinnedProfile,
}

/// All grid profiles simulated with one deadtime.
#[derive(Debug, Clone)]
pub struct DeadtimeProfiles {
    pub deadtime_ns: f64,
    /// Sorted by grid size, largest first.
    pub grids:       Vec<GridProfile>,
}

/// Group profiles by deadtime (ascending); inside a group the
/// finest grid comes first.
pub fn group_by_deadtime(profiles: Vec<GridProfile>) -> Vec<DeadtimeProfiles> {
    let mut groups: Vec<DeadtimeProfiles> = Vec::new();
    for p in profiles {
        match groups.iter_mut().find(|g| g.deadtime_ns == p.key.deadtime_ns) {
            Some(g) => g.grids.push(p),
            None    => groups.push(DeadtimeProfiles { deadtime_ns: p.key.deadtime_ns, grids: vec![p] }),
        }
    }

    groups.sort_by(|a, b| a.deadtime_ns.total_cmp(&b.deadtime_ns));
    for g in &mut groups {
        g.grids.sort_by(|a, b| b.key.grid_size.cmp(&a.key.grid_size));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_default_edges_and_centers() {
        let spec  = BinSpec::default();
        let edges = spec.edges();
        assert_eq!(edges.len(), 21);
        assert!((edges[0] - 0.0015).abs() < EPS);
        assert!((edges[1] - 0.0035).abs() < EPS);
        assert!((edges[20] - 0.0415).abs() < EPS);

        let profile = bin_profile(&[], &[], &spec);
        assert_eq!(profile.centers.len(), 20);
        assert!((profile.centers[0] - 0.0025).abs() < EPS);
        assert!(profile.counts.iter().all(|&c| c == 0));
        assert!(profile.means.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_mean_and_standard_error() {
        let spec = BinSpec { n_bins: 2, lo: 0.0, hi: 2.0 };
        let profile = bin_profile(&[0.1, 0.5, 0.9, 1.5], &[1.0, 2.0, 3.0, 7.0], &spec);

        assert_eq!(profile.counts, vec![3, 1]);
        assert!((profile.means[0] - 2.0).abs() < EPS);
        // population σ of {1,2,3} = √(2/3), divided by √3
        let expected = (2.0f64 / 3.0).sqrt() / 3.0f64.sqrt();
        assert!((profile.errors[0] - expected).abs() < EPS);
        // A single point has no spread
        assert!((profile.means[1] - 7.0).abs() < EPS);
        assert_eq!(profile.errors[1], 0.0);
    }

    #[test]
    fn test_bins_are_half_open() {
        let spec = BinSpec { n_bins: 2, lo: 0.0, hi: 2.0 };
        // 1.0 belongs to the upper bin; 2.0 and -0.1 are outside
        let profile = bin_profile(&[1.0, 2.0, -0.1], &[5.0, 9.0, 9.0], &spec);
        assert_eq!(profile.counts, vec![0, 1]);
        assert!((profile.means[1] - 5.0).abs() < EPS);
    }

    #[test]
    fn test_group_by_deadtime_orders_groups_and_grids() {
        let profile = bin_profile(&[], &[], &BinSpec::default());
        let gp = |deadtime_ns: f64, grid_size: u32| GridProfile {
            key: GraphKey { deadtime_ns, grid_size },
            profile: profile.clone(),
        };

        let groups = group_by_deadtime(vec![
            gp(30.0, 25),
            gp(5.0, 20),
            gp(30.0, 100),
            gp(5.0, 50),
            gp(0.0, 100),
        ]);

        let deadtimes: Vec<f64> = groups.iter().map(|g| g.deadtime_ns).collect();
        assert_eq!(deadtimes, vec![0.0, 5.0, 30.0]);
        let grids: Vec<u32> = groups[2].grids.iter().map(|g| g.key.grid_size).collect();
        assert_eq!(grids, vec![100, 25]);
        let grids: Vec<u32> = groups[1].grids.iter().map(|g| g.key.grid_size).collect();
        assert_eq!(grids, vec![50, 20]);
    }
}
