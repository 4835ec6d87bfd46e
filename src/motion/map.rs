use anyhow::{Result, ensure};

/// Piecewise-linear interpolation from an input domain to an output range.
///
/// Mirrors the shape of the scroll transforms used all over the site:
/// `PiecewiseMap::new(&[0.0, 500.0], &[0.0, 200.0])` for the hero parallax,
/// multi-breakpoint forms for staged reveals. Inputs outside the domain are
/// clamped to the edge range values unless `unclamped()` was requested, in
/// which case the boundary segment extrapolates linearly (the velocity
/// marquee relies on that past 100% progress).
#[derive(Debug, Clone)]
pub struct PiecewiseMap {
    domain: Vec<f32>,
    range: Vec<f32>,
    clamp: bool,
}

impl PiecewiseMap {
    /// Domain breakpoints must be strictly increasing and paired 1:1 with
    /// range breakpoints.
    pub fn new(domain: &[f32], range: &[f32]) -> Result<Self> {
        ensure!(domain.len() >= 2, "mapping needs at least two breakpoints");
        ensure!(
            domain.len() == range.len(),
            "domain and range breakpoint counts differ"
        );
        ensure!(
            domain.windows(2).all(|w| w[0] < w[1]),
            "domain breakpoints must be strictly increasing"
        );
        Ok(Self {
            domain: domain.to_vec(),
            range: range.to_vec(),
            clamp: true,
        })
    }

    pub fn unclamped(mut self) -> Self {
        self.clamp = false;
        self
    }

    pub fn map(&self, x: f32) -> f32 {
        let n = self.domain.len();
        if self.clamp {
            if x <= self.domain[0] {
                return self.range[0];
            }
            if x >= self.domain[n - 1] {
                return self.range[n - 1];
            }
        }

        // Pick the single segment containing x; boundary segments extend
        // outward when unclamped.
        let mut seg = n - 2;
        for i in 0..n - 1 {
            if x < self.domain[i + 1] {
                seg = i;
                break;
            }
        }
        let (d0, d1) = (self.domain[seg], self.domain[seg + 1]);
        let (r0, r1) = (self.range[seg], self.range[seg + 1]);
        if x == d0 {
            return r0;
        }
        if x == d1 {
            return r1;
        }
        let t = (x - d0) / (d1 - d0);
        r0 + (r1 - r0) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_edges_return_exact_boundary_values() {
        let m = PiecewiseMap::new(&[0.0, 1.0], &[0.0, 200.0]).unwrap();
        assert_eq!(m.map(-3.0), 0.0);
        assert_eq!(m.map(0.0), 0.0);
        assert_eq!(m.map(1.0), 200.0);
        assert_eq!(m.map(42.0), 200.0);
    }

    #[test]
    fn unclamped_extrapolates_past_the_edges() {
        // velocityFactor = useTransform(v, [0, 1000], [0, 5], { clamp: false })
        let m = PiecewiseMap::new(&[0.0, 1000.0], &[0.0, 5.0])
            .unwrap()
            .unclamped();
        assert!((m.map(2000.0) - 10.0).abs() < 1e-5);
        assert!((m.map(-1000.0) + 5.0).abs() < 1e-5);
    }

    #[test]
    fn interior_breakpoints_map_exactly() {
        let m = PiecewiseMap::new(&[0.0, 0.1, 0.6, 0.9], &[1.0, 0.0, 0.75, 1.0]).unwrap();
        assert_eq!(m.map(0.1), 0.0);
        assert_eq!(m.map(0.6), 0.75);
        assert_eq!(m.map(0.9), 1.0);
    }

    #[test]
    fn segments_do_not_double_apply() {
        // Staged reveal: 0->0.1 fades text out, 0.1->0.6 reveals a card,
        // 0.6->0.9 fades in a button. Each input is shaped by one segment.
        let m = PiecewiseMap::new(&[0.0, 0.1, 0.6, 0.9], &[0.0, 1.0, 1.0, 0.0]).unwrap();
        assert!((m.map(0.05) - 0.5).abs() < 1e-6);
        assert!((m.map(0.35) - 1.0).abs() < 1e-6);
        assert!((m.map(0.75) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn inverted_ranges_interpolate_downward() {
        // opacityText = useTransform(scrollY, [0, 300], [1, 0])
        let m = PiecewiseMap::new(&[0.0, 300.0], &[1.0, 0.0]).unwrap();
        assert!((m.map(150.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rejects_malformed_breakpoints() {
        assert!(PiecewiseMap::new(&[0.0], &[1.0]).is_err());
        assert!(PiecewiseMap::new(&[0.0, 0.0], &[0.0, 1.0]).is_err());
        assert!(PiecewiseMap::new(&[0.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
    }
}
