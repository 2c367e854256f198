//! Closed-form polynomial root finding
//!
//! Linear through quartic equations are solved analytically in complex
//! arithmetic: Cardano for cubics, Ferrari (via a resolvent cubic) for
//! quartics. Only roots whose imaginary part lies within `ROOT_EPSILON` are
//! reported, ordered by how close to the real axis they landed.
//!
//! Degenerate leading coefficients fall through to the next lower degree.

use std::ops::{Add, Div, Mul, Sub};

use num_complex::Complex64;

use crate::consts::ROOT_EPSILON;

/// Newton refinement steps applied to every accepted root
const POLISH_ITERATIONS: usize = 4;

/// A value bracketed by one unit in the last place on each side.
///
/// Only used to decide whether the Ferrari term `B` is zero within the
/// rounding noise of its own computation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Interval {
    lo: f64,
    hi: f64,
}

impl Interval {
    fn new(value: f64) -> Self {
        Self {
            lo: next_down(value),
            hi: next_up(value),
        }
    }

    fn bounds(lo: f64, hi: f64) -> Self {
        Self {
            lo: next_down(lo),
            hi: next_up(hi),
        }
    }

    fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }
}

impl Add for Interval {
    type Output = Interval;
    fn add(self, rhs: Interval) -> Interval {
        Interval::bounds(self.lo + rhs.lo, self.hi + rhs.hi)
    }
}

impl Sub for Interval {
    type Output = Interval;
    fn sub(self, rhs: Interval) -> Interval {
        Interval::bounds(self.lo - rhs.hi, self.hi - rhs.lo)
    }
}

impl Mul for Interval {
    type Output = Interval;
    fn mul(self, rhs: Interval) -> Interval {
        let products = [
            self.lo * rhs.lo,
            self.lo * rhs.hi,
            self.hi * rhs.lo,
            self.hi * rhs.hi,
        ];
        let lo = products.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = products.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Interval::bounds(lo, hi)
    }
}

impl Div for Interval {
    type Output = Interval;
    fn div(self, rhs: Interval) -> Interval {
        if rhs.contains(0.0) {
            return Interval {
                lo: f64::NEG_INFINITY,
                hi: f64::INFINITY,
            };
        }
        self * Interval {
            lo: 1.0 / rhs.hi,
            hi: 1.0 / rhs.lo,
        }
    }
}

fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

fn next_down(x: f64) -> f64 {
    -next_up(-x)
}

/// True when `lead` is too small to matter next to the other coefficients
fn negligible(lead: f64, rest: &[f64]) -> bool {
    let scale = rest.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    lead == 0.0 || lead.abs() <= scale * 1e-12
}

fn cbrt(z: Complex64) -> Complex64 {
    if z.norm() == 0.0 {
        return Complex64::new(0.0, 0.0);
    }
    let (r, theta) = z.to_polar();
    Complex64::from_polar(r.cbrt(), theta / 3.0)
}

/// Evaluate a polynomial given highest-degree-first coefficients
pub fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, c| acc * x + c)
}

fn derivative_at(coefficients: &[f64], x: f64) -> f64 {
    let degree = coefficients.len().saturating_sub(1);
    coefficients
        .iter()
        .take(degree)
        .enumerate()
        .fold(0.0, |acc, (i, c)| acc * x + c * (degree - i) as f64)
}

/// Refine a root with a few Newton steps, keeping the best estimate seen
fn polish(coefficients: &[f64], root: f64) -> f64 {
    let mut best = root;
    let mut best_residual = evaluate(coefficients, root).abs();
    let mut x = root;
    for _ in 0..POLISH_ITERATIONS {
        let slope = derivative_at(coefficients, x);
        if slope == 0.0 || !slope.is_finite() {
            break;
        }
        x -= evaluate(coefficients, x) / slope;
        let residual = evaluate(coefficients, x).abs();
        if residual < best_residual {
            best = x;
            best_residual = residual;
        }
    }
    best
}

/// Keep near-real roots, nearest to the real axis first, refined against `coefficients`
fn real_roots(mut roots: Vec<Complex64>, coefficients: &[f64]) -> Vec<f64> {
    roots.retain(|r| r.re.is_finite() && r.im.abs() < ROOT_EPSILON);
    roots.sort_by(|a, b| a.im.abs().total_cmp(&b.im.abs()));
    roots
        .into_iter()
        .map(|r| polish(coefficients, r.re))
        .collect()
}

fn linear_complex(a: f64, b: f64) -> Vec<Complex64> {
    if a == 0.0 {
        return Vec::new();
    }
    vec![Complex64::new(-b / a, 0.0)]
}

fn quadratic_complex(a: f64, b: f64, c: f64) -> Vec<Complex64> {
    if negligible(a, &[b, c]) {
        return linear_complex(b, c);
    }
    let root = Complex64::new(b * b - 4.0 * a * c, 0.0).sqrt();
    vec![(-b + root) / (2.0 * a), (-b - root) / (2.0 * a)]
}

fn cubic_complex(a: f64, b: f64, c: f64, d: f64) -> Vec<Complex64> {
    if negligible(a, &[b, c, d]) {
        return quadratic_complex(b, c, d);
    }

    let delta0 = b * b - 3.0 * a * c;
    let delta1 = 2.0 * b * b * b - 9.0 * a * b * c + 27.0 * a * a * d;
    let disc = Complex64::new(delta1 * delta1 - 4.0 * delta0 * delta0 * delta0, 0.0).sqrt();

    let mut big_c = cbrt((delta1 + disc) / 2.0);
    if big_c.norm() < 1e-12 {
        big_c = cbrt((delta1 - disc) / 2.0);
    }
    if big_c.norm() < 1e-12 {
        // Triple root
        let x = Complex64::new(-b / (3.0 * a), 0.0);
        return vec![x, x, x];
    }

    let xi = Complex64::new(-0.5, 3.0_f64.sqrt() / 2.0);
    let mut rotation = Complex64::new(1.0, 0.0);
    let mut roots = Vec::with_capacity(3);
    for _ in 0..3 {
        let ck = rotation * big_c;
        roots.push(-(b + ck + delta0 / ck) / (3.0 * a));
        rotation *= xi;
    }
    roots
}

/// Whether the depressed-quartic odd term vanishes within rounding noise
fn odd_term_is_zero(a: f64, b: f64, c: f64, d: f64) -> bool {
    let (a, b, c, d) = (
        Interval::new(a),
        Interval::new(b),
        Interval::new(c),
        Interval::new(d),
    );
    let two = Interval::new(2.0);
    let eight = Interval::new(8.0);
    let big_b = b * b * b / (eight * a * a * a) - b * c / (two * a * a) + d / a;
    big_b.contains(0.0)
}

fn quartic_complex(a: f64, b: f64, c: f64, d: f64, e: f64) -> Vec<Complex64> {
    if negligible(a, &[b, c, d, e]) {
        return cubic_complex(b, c, d, e);
    }

    let shift = Complex64::new(-b / (4.0 * a), 0.0);
    let big_a = -3.0 * b * b / (8.0 * a * a) + c / a;
    let big_b = b * b * b / (8.0 * a * a * a) - b * c / (2.0 * a * a) + d / a;
    let big_c = -3.0 * b.powi(4) / (256.0 * a.powi(4)) + c * b * b / (16.0 * a.powi(3))
        - b * d / (4.0 * a * a)
        + e / a;

    let biquadratic = |shift: Complex64| {
        let disc = Complex64::new(big_a * big_a - 4.0 * big_c, 0.0).sqrt();
        let mut roots = Vec::with_capacity(4);
        for s in [1.0, -1.0] {
            let y = ((-big_a + s * disc) / 2.0).sqrt();
            roots.push(shift + y);
            roots.push(shift - y);
        }
        roots
    };

    if odd_term_is_zero(a, b, c, d) {
        return biquadratic(shift);
    }

    let p = -big_a * big_a / 12.0 - big_c;
    let q = -big_a.powi(3) / 108.0 + big_a * big_c / 3.0 - big_b * big_b / 8.0;
    let r = -q / 2.0 + Complex64::new(q * q / 4.0 + p.powi(3) / 27.0, 0.0).sqrt();
    let u = cbrt(r);

    let y = if u.norm() < 1e-12 {
        -5.0 / 6.0 * big_a - cbrt(Complex64::new(q, 0.0))
    } else {
        -5.0 / 6.0 * big_a + u - p / (3.0 * u)
    };

    let w = (big_a + 2.0 * y).sqrt();
    if w.norm() < 1e-12 {
        return biquadratic(shift);
    }

    let mut roots = Vec::with_capacity(4);
    for s in [1.0, -1.0] {
        let inner = (-(3.0 * big_a + 2.0 * y + s * 2.0 * big_b / w)).sqrt();
        roots.push(shift + (s * w + inner) / 2.0);
        roots.push(shift + (s * w - inner) / 2.0);
    }
    roots
}

/// Real root of `a·x + b = 0`; none when `a` is zero
pub fn solve_linear(a: f64, b: f64) -> Vec<f64> {
    real_roots(linear_complex(a, b), &[a, b])
}

/// Real roots of `a·x² + b·x + c = 0`
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    real_roots(quadratic_complex(a, b, c), &[a, b, c])
}

/// Real roots of `a·x³ + b·x² + c·x + d = 0`
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    real_roots(cubic_complex(a, b, c, d), &[a, b, c, d])
}

/// Real roots of `a·x⁴ + b·x³ + c·x² + d·x + e = 0`
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> Vec<f64> {
    real_roots(quartic_complex(a, b, c, d, e), &[a, b, c, d, e])
}

/// Smallest root in `[lo, hi]`, if any
pub fn min_root_in(roots: &[f64], lo: f64, hi: f64) -> Option<f64> {
    roots
        .iter()
        .copied()
        .filter(|r| *r >= lo && *r <= hi)
        .min_by(|a, b| a.total_cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_roots(found: &[f64], expected: &[f64], tol: f64) {
        for e in expected {
            assert!(
                found.iter().any(|f| (f - e).abs() < tol),
                "expected root {e} in {found:?}"
            );
        }
    }

    #[test]
    fn test_linear() {
        assert_eq!(solve_linear(2.0, -4.0), vec![2.0]);
        assert!(solve_linear(0.0, 3.0).is_empty());
    }

    #[test]
    fn test_quadratic_real_and_complex() {
        let roots = solve_quadratic(1.0, -3.0, 2.0);
        assert_eq!(roots.len(), 2);
        assert_roots(&roots, &[1.0, 2.0], 1e-9);

        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_quadratic_degenerates_to_linear() {
        let roots = solve_quadratic(0.0, 2.0, -1.0);
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 0.5).abs() < 1e-12);
        assert!(solve_quadratic(0.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn test_cubic_three_real_roots() {
        // (x - 1)(x + 2)(x - 3)
        let roots = solve_cubic(1.0, -2.0, -5.0, 6.0);
        assert_eq!(roots.len(), 3);
        assert_roots(&roots, &[1.0, -2.0, 3.0], 1e-6);
    }

    #[test]
    fn test_cubic_one_real_root() {
        // (x - 2)(x² + 1)
        let roots = solve_cubic(1.0, -2.0, 1.0, -2.0);
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cubic_triple_root() {
        // (x - 1)³
        let roots = solve_cubic(1.0, -3.0, 3.0, -1.0);
        assert_eq!(roots.len(), 3);
        for r in roots {
            assert!((r - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_quartic_biquadratic() {
        // (x² - 1)(x² - 4)
        assert!(odd_term_is_zero(1.0, 0.0, -5.0, 0.0));
        let roots = solve_quartic(1.0, 0.0, -5.0, 0.0, 4.0);
        assert_eq!(roots.len(), 4);
        assert_roots(&roots, &[-2.0, -1.0, 1.0, 2.0], 1e-9);
    }

    #[test]
    fn test_quartic_general() {
        // (x - 1)(x - 2)(x - 3)(x + 4)
        let coeffs = [1.0, -2.0, -13.0, 38.0, -24.0];
        assert!(!odd_term_is_zero(coeffs[0], coeffs[1], coeffs[2], coeffs[3]));
        let roots = solve_quartic(coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4]);
        assert_eq!(roots.len(), 4);
        assert_roots(&roots, &[1.0, 2.0, 3.0, -4.0], 1e-6);
    }

    #[test]
    fn test_quartic_no_real_roots() {
        // (x² + 1)(x² + 4)
        assert!(solve_quartic(1.0, 0.0, 5.0, 0.0, 4.0).is_empty());
        // (x² + 2x + 5)(x² - 2x + 2)
        assert!(solve_quartic(1.0, 0.0, 3.0, -6.0, 10.0).is_empty());
    }

    #[test]
    fn test_quartic_degenerates_to_quadratic() {
        let roots = solve_quartic(0.0, 0.0, 1.0, -3.0, 2.0);
        assert_roots(&roots, &[1.0, 2.0], 1e-9);
    }

    #[test]
    fn test_interval_arithmetic_brackets() {
        let third = Interval::new(1.0) / Interval::new(3.0);
        assert!(third.contains(1.0 / 3.0));
        let back = third * Interval::new(3.0);
        assert!(back.contains(1.0));
        let zero = Interval::new(0.1) - Interval::new(0.1);
        assert!(zero.contains(0.0));
        let wide = Interval::new(1.0) / Interval::new(0.0);
        assert!(wide.contains(1e300));
    }

    #[test]
    fn test_min_root_in_window() {
        let roots = [-1.0, 0.25, 3.0, 0.5];
        assert_eq!(min_root_in(&roots, 0.0, 1.0), Some(0.25));
        assert_eq!(min_root_in(&roots, 4.0, 5.0), None);
    }

    proptest! {
        #[test]
        fn prop_quartic_roots_satisfy_polynomial(
            lead in prop_oneof![0.5f64..4.0, -4.0f64..-0.5],
            r0 in -6.0f64..6.0,
            g1 in 0.5f64..3.0,
            g2 in 0.5f64..3.0,
            g3 in 0.5f64..3.0,
        ) {
            let r = [r0, r0 + g1, r0 + g1 + g2, r0 + g1 + g2 + g3];
            // Expand lead·Π(x - rᵢ)
            let mut coeffs = vec![lead];
            for root in r {
                let mut next = coeffs.clone();
                next.push(0.0);
                for (i, c) in coeffs.iter().enumerate() {
                    next[i + 1] -= c * root;
                }
                coeffs = next;
            }
            let found = solve_quartic(coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4]);
            prop_assert_eq!(found.len(), 4);
            for x in &found {
                prop_assert!(evaluate(&coeffs, *x).abs() < 1e-3, "f({}) too large", x);
            }
            for expected in r {
                prop_assert!(found.iter().any(|f| (f - expected).abs() < 1e-4));
            }
        }
    }
}
