//! Damped driven pendulum
//!
//! Rope swings follow the closed-form underdamped oscillator
//!
//! ```text
//! θ(t) = e^(-bt)·(c₃·cos αt + c₄·sin αt) + A/ω²
//! ```
//!
//! where `A` is the player's angular drive. The drive is clamped each frame
//! so the next peak never passes the configured maximum angle, by bisecting
//! over the drive value. All angles are radians.

use std::f64::consts::PI;

/// Offset keeping the drive bracket clear of the peak-time discontinuity
const BRACKET_OFFSET: f64 = 1e-4;
const BISECTION_PRECISION: f64 = 1e-14;
const BISECTION_MAX_ITERATIONS: usize = 100;

/// Oscillator constants for one rope length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pendulum {
    /// Natural frequency ω
    pub omega: f64,
    /// Damping rate b
    pub damping: f64,
    /// Damped frequency α
    pub alpha: f64,
}

impl Pendulum {
    /// Damped so an undriven swing dies out after about `dead_swings` swings
    pub fn new(gravity: f32, radius: f32, dead_swings: f32) -> Self {
        let omega = (gravity as f64 / radius as f64).sqrt();
        let n = dead_swings as f64;
        let damping = 5.0 * omega / (PI * PI * n * n + 25.0).sqrt();
        let alpha = (omega * omega - damping * damping).max(0.0).sqrt();
        Self {
            omega,
            damping,
            alpha,
        }
    }

    /// No damping: swings forever with constant amplitude
    pub fn ideal(gravity: f32, radius: f32) -> Self {
        let omega = (gravity as f64 / radius as f64).sqrt();
        Self {
            omega,
            damping: 0.0,
            alpha: omega,
        }
    }

    /// Motion starting at `angle` / `angular_velocity` under constant `drive`
    pub fn oscillation(&self, angle: f64, angular_velocity: f64, drive: f64) -> Oscillation {
        let offset = drive / (self.omega * self.omega);
        let c3 = angle - offset;
        let c4 = (angular_velocity + self.damping * c3) / self.alpha;
        Oscillation {
            pendulum: *self,
            c3,
            c4,
            offset,
        }
    }

    /// Undamped swing through `angle` whose peak is exactly `max_angle`,
    /// heading in the direction of `direction`
    pub fn swing_to_peak(&self, angle: f64, direction: f64, max_angle: f64) -> Oscillation {
        let c3 = angle.clamp(-max_angle, max_angle);
        let c4 = direction.signum() * (max_angle * max_angle - c3 * c3).max(0.0).sqrt();
        Oscillation {
            pendulum: *self,
            c3,
            c4,
            offset: 0.0,
        }
    }

    /// Largest usable drive no greater than `drive` whose next peak stays
    /// within `max_angle`.
    ///
    /// Pushing against the swing while it falls back toward the bottom is
    /// ignored. If no drive can honour the limit the swing is left undriven.
    pub fn clamped_drive(
        &self,
        angle: f64,
        angular_velocity: f64,
        drive: f64,
        max_angle: f64,
    ) -> f64 {
        if angle * angular_velocity < 0.0 && drive * angular_velocity < 0.0 {
            return 0.0;
        }

        let peak = |a: f64| self.oscillation(angle, angular_velocity, a).next_peak();
        if peak(drive).abs() <= max_angle {
            return drive;
        }

        let target = if angular_velocity != 0.0 {
            angular_velocity.signum() * max_angle
        } else {
            angle.signum() * max_angle
        };
        let discontinuity = self.omega * self.omega * angle + self.damping * angular_velocity;
        let hi = discontinuity - discontinuity.signum() * BRACKET_OFFSET;

        match bisect(
            |a| peak(a) - target,
            0.0,
            hi,
            BISECTION_PRECISION,
            BISECTION_MAX_ITERATIONS,
        ) {
            Some(clamped) => clamped,
            None => {
                log::trace!("Swing drive clamp failed; leaving swing undriven");
                0.0
            }
        }
    }
}

/// One concrete solution of the oscillator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillation {
    pub pendulum: Pendulum,
    pub c3: f64,
    pub c4: f64,
    /// Equilibrium shift from the drive
    pub offset: f64,
}

impl Oscillation {
    fn decay(&self, t: f64) -> f64 {
        (-self.pendulum.damping * t).exp()
    }

    pub fn angle(&self, t: f64) -> f64 {
        let at = self.pendulum.alpha * t;
        self.decay(t) * (self.c3 * at.cos() + self.c4 * at.sin()) + self.offset
    }

    pub fn angular_velocity(&self, t: f64) -> f64 {
        let Pendulum { damping: b, alpha, .. } = self.pendulum;
        let at = alpha * t;
        let cos_term = (self.c4 * alpha - b * self.c3) * at.cos();
        let sin_term = (b * self.c4 + self.c3 * alpha) * at.sin();
        self.decay(t) * (cos_term - sin_term)
    }

    /// Time until the angular velocity next reaches zero
    pub fn next_peak_time(&self) -> f64 {
        let Pendulum { damping: b, alpha, .. } = self.pendulum;
        let y = self.c4 * alpha - b * self.c3;
        let x = b * self.c4 + self.c3 * alpha;
        if (y == 0.0 && x == 0.0) || alpha == 0.0 {
            return 0.0;
        }
        let tan = y / x;
        let phase = tan.atan() + if tan < 0.0 { PI } else { 0.0 };
        phase / alpha
    }

    pub fn next_peak(&self) -> f64 {
        self.angle(self.next_peak_time())
    }
}

/// Bracketed bisection; `None` without a sign change or without convergence
pub fn bisect(
    f: impl Fn(f64) -> f64,
    mut lo: f64,
    mut hi: f64,
    precision: f64,
    max_iterations: usize,
) -> Option<f64> {
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    if !f_lo.is_finite() || !f_hi.is_finite() {
        return None;
    }
    if f_lo == 0.0 {
        return Some(lo);
    }
    if f_hi == 0.0 {
        return Some(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return None;
    }

    for _ in 0..max_iterations {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 || 0.5 * (hi - lo).abs() < precision {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    None
}
