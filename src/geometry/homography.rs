//! Four-point projective transform estimation.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::error::ReadingError;

/// Twice the triangle area below which three points count as collinear.
const COLLINEAR_EPS: f64 = 1e-6;

/// A 2D point `[x, y]` in pixel coordinates.
pub type Point = [f64; 2];

/// Four corners ordered top-left, bottom-left, bottom-right, top-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    /// Axis-aligned rectangle with its top-left corner at `(x, y)`.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self([
            [x, y],
            [x, y + height],
            [x + width, y + height],
            [x + width, y],
        ])
    }

    /// Fails when any three corners are collinear.
    fn check_degenerate(&self, name: &str) -> Result<(), ReadingError> {
        const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
        for [a, b, c] in TRIPLES {
            let (pa, pb, pc) = (self.0[a], self.0[b], self.0[c]);
            let cross = (pb[0] - pa[0]) * (pc[1] - pa[1]) - (pb[1] - pa[1]) * (pc[0] - pa[0]);
            if !cross.is_finite() || cross.abs() < COLLINEAR_EPS {
                return Err(ReadingError::Geometry(format!(
                    "{name} quad has collinear corners {a}, {b}, {c}: {:?}",
                    self.0
                )));
            }
        }
        Ok(())
    }
}

/// A 3×3 projective transform normalized so that `h[2][2] == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    /// Estimates the transform mapping each corner of `src` onto the matching corner of `dst`.
    pub fn estimate(src: &Quad, dst: &Quad) -> Result<Self, ReadingError> {
        src.check_degenerate("source")?;
        dst.check_degenerate("destination")?;

        // u = (h0 x + h1 y + h2) / (h6 x + h7 y + 1)
        // v = (h3 x + h4 y + h5) / (h6 x + h7 y + 1)
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for (i, (s, d)) in src.0.iter().zip(dst.0.iter()).enumerate() {
            let (x, y) = (s[0], s[1]);
            let (u, v) = (d[0], d[1]);
            let r = 2 * i;
            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }

        let h = a.lu().solve(&b).ok_or_else(|| {
            ReadingError::Geometry(format!(
                "no projective transform maps {:?} onto {:?}",
                src.0, dst.0
            ))
        })?;
        if h.iter().any(|v| !v.is_finite()) {
            return Err(ReadingError::Geometry("transform is not finite".to_string()));
        }

        Ok(Self {
            matrix: Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0),
        })
    }

    /// Maps a point through the transform. Points sent to infinity come back as NaN.
    pub fn project(&self, p: Point) -> Point {
        let v = self.matrix * Vector3::new(p[0], p[1], 1.0);
        if v[2].abs() < 1e-15 {
            return [f64::NAN, f64::NAN];
        }
        [v[0] / v[2], v[1] / v[2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inverse(h: &Homography) -> Homography {
        Homography {
            matrix: h.matrix.try_inverse().unwrap(),
        }
    }

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a[0] - b[0]).abs() < 1e-6 && (a[1] - b[1]).abs() < 1e-6,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_strip_transform_hits_corners() {
        let src = Quad::rectangle(0.0, 0.0, 780.0, 156.0);
        let dst = Quad([[130.0, 380.0], [130.0, 455.0], [880.0, 460.0], [880.0, 390.0]]);
        let h = Homography::estimate(&src, &dst).unwrap();

        for (s, d) in src.0.iter().zip(dst.0.iter()) {
            assert_close(h.project(*s), *d);
        }
    }

    #[test]
    fn test_inverse_round_trips_corners() {
        let src = Quad([[10.0, 20.0], [15.0, 240.0], [410.0, 260.0], [400.0, 5.0]]);
        let dst = Quad::rectangle(0.0, 0.0, 300.0, 100.0);
        let h = Homography::estimate(&src, &dst).unwrap();
        let inv = inverse(&h);

        for (s, d) in src.0.iter().zip(dst.0.iter()) {
            assert_close(inv.project(*d), *s);
            assert_close(inv.project(h.project(*s)), *s);
        }
    }

    #[test]
    fn test_rectangles_give_scale_and_shift() {
        let src = Quad::rectangle(0.0, 0.0, 78.0, 156.0);
        let dst = Quad::rectangle(95.0, 0.0, 50.0, 156.0);
        let h = Homography::estimate(&src, &dst).unwrap();
        let m = h.matrix;

        assert!((m[(0, 0)] - 50.0 / 78.0).abs() < 1e-9);
        assert!((m[(0, 2)] - 95.0).abs() < 1e-9);
        assert!((m[(1, 1)] - 1.0).abs() < 1e-9);
        assert!(m[(2, 0)].abs() < 1e-12 && m[(2, 1)].abs() < 1e-12);
    }

    #[test]
    fn test_collinear_quad_is_rejected() {
        let src = Quad::rectangle(0.0, 0.0, 10.0, 10.0);
        let dst = Quad([[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [5.0, 0.0]]);
        let err = Homography::estimate(&src, &dst).unwrap_err();
        assert!(matches!(err, ReadingError::Geometry(_)));
    }

    #[test]
    fn test_zero_area_quad_is_rejected() {
        let src = Quad::rectangle(0.0, 0.0, 0.0, 156.0);
        let dst = Quad::rectangle(0.0, 0.0, 50.0, 156.0);
        assert!(matches!(
            Homography::estimate(&src, &dst),
            Err(ReadingError::Geometry(_))
        ));
    }
}
