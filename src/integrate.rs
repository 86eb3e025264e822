//! Numerical integration and root finding.

use thiserror::Error;

/// Floating-point precision to use for integration.
#[allow(non_camel_case_types)]
pub type fin = f64;

/// Errors that can occur during root finding.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RootFindError {
    /// The function values at the interval ends have the same sign.
    #[error(
        "root is not bracketed by [{lower}, {upper}]: \
         f values {f_lower:e} and {f_upper:e} have the same sign"
    )]
    Bracketing {
        lower: fin,
        upper: fin,
        f_lower: fin,
        f_upper: fin,
    },

    /// The iteration count exceeded the given maximum.
    #[error(
        "false-position iteration did not converge within {max_iterations} iterations \
         (last estimate {last_estimate})"
    )]
    Convergence {
        last_estimate: fin,
        max_iterations: u32,
    },
}

/// Advances the state of an ordinary differential equation system by one step
/// of the classical 4th-order Runge-Kutta scheme.
///
/// # Parameters
///
/// - `rhs`: Closure evaluating the right-hand side `dy/ds` for a given state and path parameter.
/// - `y`: Current state of the system.
/// - `s`: Current value of the path parameter.
/// - `step`: Step length to advance the path parameter by.
///
/// # Returns
///
/// The state of the system at `s + step`.
///
/// # Type parameters
///
/// - `R`: Function type taking a state slice and a path parameter and returning the state derivative.
pub fn rk4_step<R>(rhs: &R, y: &[fin], s: fin, step: fin) -> Vec<fin>
where
    R: Fn(&[fin], fin) -> Vec<fin>,
{
    let half_step = 0.5 * step;

    let k1 = rhs(y, s);
    debug_assert_eq!(k1.len(), y.len());
    let k2 = rhs(&displaced(y, &k1, half_step), s + half_step);
    let k3 = rhs(&displaced(y, &k2, half_step), s + half_step);
    let k4 = rhs(&displaced(y, &k3, step), s + step);

    y.iter()
        .enumerate()
        .map(|(idx, &value)| {
            value + step * (k1[idx] + 2.0 * (k2[idx] + k3[idx]) + k4[idx]) / 6.0
        })
        .collect()
}

fn displaced(y: &[fin], derivative: &[fin], scale: fin) -> Vec<fin> {
    y.iter()
        .zip(derivative)
        .map(|(&value, &slope)| value + scale * slope)
        .collect()
}

/// Locates a root of the given function inside the given interval using
/// the false-position (regula falsi) method.
///
/// # Parameters
///
/// - `f`: Function to find a root of.
/// - `interval`: Interval ends bracketing the root (in either order).
/// - `tolerance`: Largest acceptable shrinkage of the bracket in the final iteration.
/// - `max_iterations`: Maximum number of iterations before giving up.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the root location and the number of iterations spent.
/// - `Err`: Contains a `RootFindError` describing why no root was found.
///
/// # Type parameters
///
/// - `R`: Mutable function type taking and returning a floating-point value.
pub fn find_root<R>(
    mut f: R,
    interval: (fin, fin),
    tolerance: fin,
    max_iterations: u32,
) -> Result<(fin, u32), RootFindError>
where
    R: FnMut(fin) -> fin,
{
    assert!(tolerance > 0.0, "Tolerance must be larger than zero.");
    assert!(
        max_iterations > 0,
        "Maximum number of iterations must be larger than zero."
    );

    let (a, b) = interval;
    let f_a = f(a);
    if f_a == 0.0 {
        return Ok((a, 0));
    }
    let f_b = f(b);
    if f_b == 0.0 {
        return Ok((b, 0));
    }
    if f_a.signum() == f_b.signum() {
        return Err(RootFindError::Bracketing {
            lower: a,
            upper: b,
            f_lower: f_a,
            f_upper: f_b,
        });
    }

    // Order the bracket so that f(lower) < 0 < f(upper)
    let (mut lower, mut f_lower, mut upper, mut f_upper) = if f_a < 0.0 {
        (a, f_a, b, f_b)
    } else {
        (b, f_b, a, f_a)
    };

    let mut iterations = 0;
    loop {
        let root = lower + (upper - lower) * f_lower / (f_lower - f_upper);
        let f_root = f(root);
        iterations += 1;

        // Replace the bracket end sharing the sign of the new estimate
        let shrinkage = if f_root < 0.0 {
            let shrinkage = (root - lower).abs();
            lower = root;
            f_lower = f_root;
            shrinkage
        } else {
            let shrinkage = (upper - root).abs();
            upper = root;
            f_upper = f_root;
            shrinkage
        };

        if f_root == 0.0 || shrinkage <= tolerance {
            return Ok((root, iterations));
        }
        if iterations >= max_iterations {
            return Err(RootFindError::Convergence {
                last_estimate: root,
                max_iterations,
            });
        }
    }
}
