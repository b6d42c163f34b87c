//! Segment interpolator: one Kochanek-Bartels cubic between two control points.
//!
//! The cubic is built from the 4-point context (previous, start, end, next). The
//! start point's outgoing and the end point's incoming TCB parameters shape the
//! tangents; the segment's curve adds its offset scaled by `end - start`.

use crate::control_point::{ControlPoint, Tcb};
use crate::curve::CurveConfig;
use crate::error::InterpError;
use crate::Result;

/// Basis matrix for the segment, from `a` (start, outgoing) and `b` (end, incoming).
pub fn basis_matrix(a: Tcb, b: Tcb) -> [[f64; 4]; 4] {
    let (ta, ca, ba) = (a.tension, a.continuity, a.bias);
    let (tb, cb, bb) = (b.tension, b.continuity, b.bias);
    let fa = (1.0 - ta) * (1.0 + ca) * (1.0 + ba);
    let fb = (1.0 - ta) * (1.0 - ca) * (1.0 - ba);
    let fc = (1.0 - tb) * (1.0 - cb) * (1.0 + bb);
    let fd = (1.0 - tb) * (1.0 + cb) * (1.0 - bb);

    let m = [
        [-fa, 4.0 + fa - fb - fc, -4.0 + fb + fc - fd, fd],
        [2.0 * fa, -6.0 - 2.0 * fa + 2.0 * fb + fc, 6.0 - 2.0 * fb - fc + fd, -fd],
        [-fa, fa - fb, fb, 0.0],
        [0.0, 2.0, 0.0, 0.0],
    ];
    m.map(|row| row.map(|v| v * 0.5))
}

/// Cubic coefficients `[c3, c2, c1, c0]` for four scalar control values.
#[inline]
pub fn coefficients(m: &[[f64; 4]; 4], values: [f64; 4]) -> [f64; 4] {
    m.map(|row| {
        row[0] * values[0] + row[1] * values[1] + row[2] * values[2] + row[3] * values[3]
    })
}

#[inline]
fn eval_cubic(c: &[f64; 4], t: f64) -> f64 {
    ((c[0] * t + c[1]) * t + c[2]) * t + c[3]
}

/// Interpolate `sample_count` values over `[0,1)` between `values[1]` and `values[2]`.
///
/// `values` holds the 4-point context; anything beyond the first four is ignored.
pub fn interpolate(
    values: &[f64],
    sample_count: usize,
    spline_out: Tcb,
    spline_in: Tcb,
    curve: &CurveConfig,
) -> Result<Vec<f64>> {
    let ctx = context4(values)?;
    let offsets = curve.offsets(sample_count)?;
    let m = basis_matrix(spline_out, spline_in);
    Ok(sample_with_offsets(&m, ctx, &offsets))
}

/// Vector form: interpolate every component of four control points.
///
/// Returns `[dimension][sample_count]`.
pub fn interpolate_points(
    points: &[&ControlPoint],
    sample_count: usize,
    curve: &CurveConfig,
) -> Result<Vec<Vec<f64>>> {
    if points.len() < 4 {
        return Err(InterpError::InsufficientControlPoints {
            actual: points.len(),
        });
    }
    let dim = points[1].dimension();
    for (index, p) in points.iter().take(4).enumerate() {
        if p.dimension() != dim {
            return Err(InterpError::DimensionMismatch {
                expected: dim,
                actual: p.dimension(),
                index,
            });
        }
    }

    let offsets = curve.offsets(sample_count)?;
    let m = basis_matrix(points[1].spline_out, points[2].spline_in);
    Ok((0..dim)
        .map(|d| {
            let ctx = [
                points[0].value[d],
                points[1].value[d],
                points[2].value[d],
                points[3].value[d],
            ];
            sample_with_offsets(&m, ctx, &offsets)
        })
        .collect())
}

fn context4(values: &[f64]) -> Result<[f64; 4]> {
    match values {
        [a, b, c, d, ..] => Ok([*a, *b, *c, *d]),
        _ => Err(InterpError::InsufficientControlPoints {
            actual: values.len(),
        }),
    }
}

fn sample_with_offsets(m: &[[f64; 4]; 4], ctx: [f64; 4], offsets: &[f64]) -> Vec<f64> {
    let c = coefficients(m, ctx);
    let span = ctx[2] - ctx[1];
    let n = offsets.len() as f64;
    offsets
        .iter()
        .enumerate()
        .map(|(i, off)| eval_cubic(&c, i as f64 / n) + off * span)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveKind;
    use approx::assert_abs_diff_eq;

    #[test]
    fn catmull_rom_matches_closed_form() {
        // Values [0, 0, 10, 10]: CR cubic is -10t^3 + 15t^2 + 5t.
        let out = interpolate(
            &[0.0, 0.0, 10.0, 10.0],
            50,
            Tcb::CATMULL_ROM,
            Tcb::CATMULL_ROM,
            &CurveConfig::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 50);
        assert_abs_diff_eq!(out[0], 0.0, epsilon = 1e-12);
        for (i, v) in out.iter().enumerate() {
            let t = i as f64 / 50.0;
            let expected = -10.0 * t * t * t + 15.0 * t * t + 5.0 * t;
            assert_abs_diff_eq!(*v, expected, epsilon = 1e-9);
        }
        // Smooth but not linear.
        assert!((out[25] - 5.0).abs() < 1e-9);
        assert!((out[10] - 2.0).abs() > 1e-3);
        let last = out[49];
        assert!(last > 9.8 && last < 10.0);
    }

    #[test]
    fn full_negative_continuity_is_linear() {
        let out = interpolate(
            &[3.0, 0.0, 10.0, -7.0],
            10,
            Tcb::LINEAR,
            Tcb::LINEAR,
            &CurveConfig::default(),
        )
        .unwrap();
        for (i, v) in out.iter().enumerate() {
            assert_abs_diff_eq!(*v, i as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn curve_offset_scales_with_span() {
        let par = CurveConfig::new(CurveKind::Par);
        let out = interpolate(&[0.0, 2.0, 6.0, 8.0], 4, Tcb::LINEAR, Tcb::LINEAR, &par).unwrap();
        for (i, v) in out.iter().enumerate() {
            let t = i as f64 / 4.0;
            assert_abs_diff_eq!(*v, 2.0 + 4.0 * t * t, epsilon = 1e-12);
        }
    }

    #[test]
    fn fewer_than_four_points_is_rejected() {
        let err = interpolate(
            &[0.0, 1.0, 2.0],
            8,
            Tcb::LINEAR,
            Tcb::LINEAR,
            &CurveConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, InterpError::InsufficientControlPoints { actual: 3 });

        let a = ControlPoint::scalar(0.0, 0);
        let err = interpolate_points(&[&a, &a], 4, &CurveConfig::default()).unwrap_err();
        assert_eq!(err, InterpError::InsufficientControlPoints { actual: 2 });
    }

    #[test]
    fn mixed_dimensions_are_structural_errors() {
        let a = ControlPoint::new([0.0, 1.0], 0);
        let b = ControlPoint::scalar(1.0, 10);
        let err = interpolate_points(&[&a, &a, &b, &a], 4, &CurveConfig::default()).unwrap_err();
        assert_eq!(err.category(), "structural");
    }

    #[test]
    fn vector_points_interpolate_per_component() {
        let p = [
            ControlPoint::new([0.0, 0.0], -10),
            ControlPoint::new([0.0, 10.0], 0),
            ControlPoint::new([10.0, 0.0], 10),
            ControlPoint::new([20.0, -10.0], 20),
        ];
        let refs: Vec<&ControlPoint> = p.iter().collect();
        let out = interpolate_points(&refs, 10, &CurveConfig::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_abs_diff_eq!(out[0][5], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1][5], 5.0, epsilon = 1e-12);
    }
}
