use nalgebra as na;
use num_traits::{Float, NumCast};

use crate::error::Error;

pub fn quadratic_ls<T: na::ComplexField + Float>(
    x: &na::DVector<T>,
    y: &na::DVector<T>,
) -> Option<na::Matrix3x1<T>> {
    let n: T = NumCast::from(x.len())?;

    let s_x1 = x.sum();
    let x2 = x.map(|x| x * x);
    let s_x2 = x2.sum();
    let x3 = x2.zip_map(x, |a, b| a * b);
    let s_x3 = x3.sum();
    let x4 = x3.zip_map(x, |a, b| a * b);
    let s_x4 = x4.sum();
    let s_x2y = x2.zip_map(y, |x, y| x * y).sum();
    let s_xy = x.zip_map(y, |x, y| x * y).sum();
    let s_y = y.sum();

    let a = na::Matrix3::new(s_x4, s_x3, s_x2, s_x3, s_x2, s_x1, s_x2, s_x1, n);
    let b = na::Matrix3x1::new(s_x2y, s_xy, s_y);

    let qr_result = a.qr();
    let qty = qr_result.q().transpose() * b;

    qr_result.r().solve_upper_triangular(&qty)
}

/// `y = a·t² + b·t + c` with `t = x - origin`.
///
/// Fitting around the mean x keeps the normal equations well conditioned
/// for pixel-sized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parabola {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub origin: f64,
}

impl Parabola {
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        let t = x - self.origin;
        (self.a * t + self.b) * t + self.c
    }

    /// Coefficients of the same curve in plain `x`.
    pub fn coefficients(&self) -> (f64, f64, f64) {
        let o = self.origin;

        (
            self.a,
            self.b - 2.0 * self.a * o,
            self.a * o * o - self.b * o + self.c,
        )
    }
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup_by(|a, b| (*a - *b).abs() < 1e-3);
    sorted.len()
}

/// Least-squares `y = f(x)` parabola through `points`.
///
/// Fails with `DegenerateFit` when fewer than three distinct x values are
/// present or the solve does not produce finite coefficients.
pub fn fit_parabola(points: &[na::Point2<f32>]) -> Result<Parabola, Error> {
    let xs: Vec<f64> = points.iter().map(|p| p.x as f64).collect();

    if distinct_count(&xs) < 3 {
        return Err(Error::DegenerateFit);
    }

    let origin = xs.iter().sum::<f64>() / xs.len() as f64;
    let x = na::DVector::from_iterator(xs.len(), xs.iter().map(|x| x - origin));
    let y = na::DVector::from_iterator(points.len(), points.iter().map(|p| p.y as f64));

    let params = quadratic_ls(&x, &y).ok_or(Error::DegenerateFit)?;

    if params.iter().any(|p| !p.is_finite()) {
        return Err(Error::DegenerateFit);
    }

    Ok(Parabola {
        a: params[0],
        b: params[1],
        c: params[2],
        origin,
    })
}

/// Trailing moving average: each output point is the mean of itself and up
/// to `window - 1` predecessors.
pub fn trailing_mean(points: &[na::Point2<f32>], window: usize) -> Vec<na::Point2<f32>> {
    let window = window.max(1);

    (0..points.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &points[start..=i];
            let sum = slice
                .iter()
                .fold(na::Vector2::zeros(), |acc: na::Vector2<f32>, p| acc + p.coords);

            (sum / slice.len() as f32).into()
        })
        .collect()
}

/// Median of the values; the mean of the two middle values for even lengths.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;

    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// `n` evenly spaced values over `[start, end]`, both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 {
        (end - start) / (n - 1) as f64
    } else {
        0.0
    };

    (0..n).map(move |i| start + step * i as f64)
}
