//! One-dimensional interpolation kernels.
//!
//! Both kernels assume strictly increasing `xs` and only ever evaluate inside
//! `[xs[0], xs[n-1]]`; callers handle the out-of-range case. Validation of the
//! nodes lives in `surface::interpolate`.

/// Index `i` such that `xs[i] <= x <= xs[i + 1]`, or `None` outside the range.
pub fn bracket(xs: &[f64], x: f64) -> Option<usize> {
    let n = xs.len();
    if n < 2 || !(x >= xs[0] && x <= xs[n - 1]) {
        return None;
    }

    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xs[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(lo)
}

/// Piecewise-linear interpolation. `None` outside `[xs[0], xs[n-1]]`.
pub fn linear(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    let i = bracket(xs, x)?;
    let (x0, x1) = (xs[i], xs[i + 1]);
    let (y0, y1) = (ys[i], ys[i + 1]);
    if x == x0 {
        return Some(y0);
    }
    if x == x1 {
        return Some(y1);
    }
    let w = (x - x0) / (x1 - x0);
    Some(y0 + w * (y1 - y0))
}

/// Monotone-preserving cubic Hermite spline (Fritsch–Carlson).
///
/// Tangents start from the three-point average of secants and are scaled
/// back into the monotone region `α² + β² ≤ 9` per interval. Flat segments
/// get zero tangents so the curve never overshoots a plateau.
#[derive(Debug, Clone)]
pub struct MonotoneCubic {
    xs: Vec<f64>,
    ys: Vec<f64>,
    tangents: Vec<f64>,
}

impl MonotoneCubic {
    /// Build the spline. Requires `xs.len() == ys.len() >= 2`.
    pub fn new(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n < 2 || ys.len() != n {
            return None;
        }

        let delta: Vec<f64> = (0..n - 1)
            .map(|i| (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]))
            .collect();

        let mut tangents = vec![0.0; n];
        tangents[0] = delta[0];
        tangents[n - 1] = delta[n - 2];
        for i in 1..n - 1 {
            // A sign change in the secants is a local extremum: flatten it.
            tangents[i] = if delta[i - 1] * delta[i] <= 0.0 {
                0.0
            } else {
                0.5 * (delta[i - 1] + delta[i])
            };
        }

        for i in 0..n - 1 {
            if delta[i].abs() < 1e-30 {
                tangents[i] = 0.0;
                tangents[i + 1] = 0.0;
                continue;
            }
            let alpha = tangents[i] / delta[i];
            let beta = tangents[i + 1] / delta[i];
            let r2 = alpha * alpha + beta * beta;
            if r2 > 9.0 {
                let tau = 3.0 / r2.sqrt();
                tangents[i] = tau * alpha * delta[i];
                tangents[i + 1] = tau * beta * delta[i];
            }
        }

        Some(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            tangents,
        })
    }

    /// Evaluate at `x`. `None` outside the node range.
    pub fn eval(&self, x: f64) -> Option<f64> {
        let lo = bracket(&self.xs, x)?;
        let hi = lo + 1;
        if x == self.xs[lo] {
            return Some(self.ys[lo]);
        }
        if x == self.xs[hi] {
            return Some(self.ys[hi]);
        }

        let h = self.xs[hi] - self.xs[lo];
        let t = (x - self.xs[lo]) / h;
        let h00 = (1.0 + 2.0 * t) * (1.0 - t) * (1.0 - t);
        let h10 = t * (1.0 - t) * (1.0 - t);
        let h01 = t * t * (3.0 - 2.0 * t);
        let h11 = t * t * (t - 1.0);

        Some(
            h00 * self.ys[lo]
                + h10 * h * self.tangents[lo]
                + h01 * self.ys[hi]
                + h11 * h * self.tangents[hi],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_finds_interval() {
        let xs = [1.0, 2.0, 5.0, 10.0];
        assert_eq!(bracket(&xs, 1.0), Some(0));
        assert_eq!(bracket(&xs, 3.0), Some(1));
        assert_eq!(bracket(&xs, 10.0), Some(2));
        assert_eq!(bracket(&xs, 0.5), None);
        assert_eq!(bracket(&xs, 10.5), None);
        assert_eq!(bracket(&xs, f64::NAN), None);
    }

    #[test]
    fn linear_midpoint() {
        let v = linear(&[1.0, 3.0], &[10.5, 11.2], 2.0).unwrap();
        assert!((v - 10.85).abs() < 1e-12);
        assert_eq!(linear(&[1.0, 3.0], &[10.5, 11.2], 5.0), None);
    }

    #[test]
    fn monotone_exact_on_nodes() {
        let xs = [0.5, 1.0, 2.0, 3.0, 5.0];
        let ys = [10.0, 10.4, 10.9, 11.0, 11.6];
        let s = MonotoneCubic::new(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            assert_eq!(s.eval(x), Some(y));
        }
    }

    #[test]
    fn monotone_preserves_monotonicity() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 0.1, 0.5, 2.0, 4.0];
        let s = MonotoneCubic::new(&xs, &ys).unwrap();
        let mut prev = f64::NEG_INFINITY;
        for i in 0..=100 {
            let x = 4.0 * (i as f64) / 100.0;
            let v = s.eval(x).unwrap();
            assert!(v >= prev - 1e-12, "not monotone at x={x}: {v} < {prev}");
            prev = v;
        }
    }

    #[test]
    fn monotone_two_points_is_linear() {
        let s = MonotoneCubic::new(&[1.0, 3.0], &[10.5, 11.2]).unwrap();
        assert!((s.eval(2.0).unwrap() - 10.85).abs() < 1e-12);
        assert_eq!(s.eval(0.5), None);
    }

    #[test]
    fn monotone_does_not_overshoot_hump() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [10.0, 12.0, 10.0];
        let s = MonotoneCubic::new(&xs, &ys).unwrap();
        for i in 0..=100 {
            let x = 1.0 + 2.0 * (i as f64) / 100.0;
            let v = s.eval(x).unwrap();
            assert!((10.0 - 1e-12..=12.0 + 1e-12).contains(&v), "overshoot at x={x}: {v}");
        }
    }
}
