//! Closed-form real root solvers for quadratic and cubic polynomials.
//!
//! Roots are returned ascending with repeated roots collapsed. A discriminant
//! within the relative epsilon of [`Tolerance::discriminant`] counts as zero.

use std::f64::consts::PI;

use crate::Tolerance;

/// Real roots of `a·x² + b·x + c = 0`, ascending.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    solve_quadratic_with(a, b, c, &Tolerance::default())
}

pub fn solve_quadratic_with(a: f64, b: f64, c: f64, tol: &Tolerance) -> Vec<f64> {
    if a == 0.0 {
        // Degenerates to b·x + c = 0.
        return if b == 0.0 { Vec::new() } else { vec![-c / b] };
    }

    let discriminant = b * b - 4.0 * a * c;
    let scale = (b * b).max((4.0 * a * c).abs());
    if tol.is_negligible(discriminant, scale) {
        return vec![-b / (2.0 * a)];
    }
    if discriminant < 0.0 {
        return Vec::new();
    }

    // Avoid cancellation between -b and the square root.
    let sign = if b < 0.0 { -1.0 } else { 1.0 };
    let q = -0.5 * (b + sign * discriminant.sqrt());
    let mut roots = vec![q / a, c / q];
    roots.sort_by(f64::total_cmp);
    roots
}

/// Real roots of `a·x³ + b·x² + c·x + d = 0`, ascending.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    solve_cubic_with(a, b, c, d, &Tolerance::default())
}

pub fn solve_cubic_with(a: f64, b: f64, c: f64, d: f64, tol: &Tolerance) -> Vec<f64> {
    if a == 0.0 {
        return solve_quadratic_with(b, c, d, tol);
    }

    // Monic form x³ + A·x² + B·x + C, then substitute x = t - A/3 to reach
    // the depressed cubic t³ + p·t + q.
    let (ca, cb, cc) = (b / a, c / a, d / a);
    let shift = ca / 3.0;
    let p = cb - ca * ca / 3.0;
    let q = 2.0 * ca * ca * ca / 27.0 - ca * cb / 3.0 + cc;

    let half_q = q / 2.0;
    let third_p = p / 3.0;
    let discriminant = half_q * half_q + third_p * third_p * third_p;
    let scale = (half_q * half_q).max((third_p * third_p * third_p).abs());

    let depressed: Vec<f64> = if tol.is_negligible(p, cb.abs().max(ca * ca))
        && tol.is_negligible(q, cc.abs().max(ca.abs() * cb.abs()))
    {
        vec![0.0]
    } else if tol.is_negligible(discriminant, scale) {
        // One simple and one double root.
        vec![3.0 * q / p, -3.0 * q / (2.0 * p)]
    } else if discriminant > 0.0 {
        let root = discriminant.sqrt();
        vec![(-half_q + root).cbrt() + (-half_q - root).cbrt()]
    } else {
        // Three distinct real roots; trigonometric form.
        let m = 2.0 * (-third_p).sqrt();
        let arg = (3.0 * q / (p * m)).clamp(-1.0, 1.0);
        let theta = arg.acos() / 3.0;
        (0..3)
            .map(|k| m * (theta - 2.0 * PI * k as f64 / 3.0).cos())
            .collect()
    };

    let mut roots: Vec<f64> = depressed.into_iter().map(|t| t - shift).collect();
    roots.sort_by(f64::total_cmp);
    // Collapse duplicates relative to the magnitude of the whole root set.
    let root_scale = roots.iter().fold(0.0f64, |m, r| m.max(r.abs()));
    roots.dedup_by(|x, y| tol.is_negligible(*x - *y, root_scale));
    roots
}
