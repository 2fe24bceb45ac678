//! Perspective (homography) estimation and warping.
//!
//! Maps the garment's rectangle onto the quadrilateral spanned by the neck
//! anchors. The 3×3 matrix is normalised so that `h33 = 1`:
//!
//! ```text
//! | h0 h1 h2 |   | x |   | w·x' |
//! | h3 h4 h5 | × | y | = | w·y' |
//! | h6 h7  1 |   | 1 |   |  w   |
//! ```

use image::{Rgba, RgbaImage};

const SINGULAR_EPS: f64 = 1e-12;

/// A projective transform between two planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: [f64; 9],
}

impl Homography {
    pub const IDENTITY: Homography = Homography {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub fn from_matrix(m: [f64; 9]) -> Self {
        Self { m }
    }

    pub fn matrix(&self) -> &[f64; 9] {
        &self.m
    }

    /// Exact transform taking each `src[i]` to `dst[i]`.
    ///
    /// Returns `None` when the source points are degenerate.
    pub fn from_quad(src: &[(f64, f64); 4], dst: &[(f64, f64); 4]) -> Option<Self> {
        // Each correspondence (x, y) -> (u, v) gives two rows:
        //   x·h0 + y·h1 + h2 - x·u·h6 - y·u·h7 = u
        //   x·h3 + y·h4 + h5 - x·v·h6 - y·v·h7 = v
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = src[i];
            let (u, v) = dst[i];
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
        }

        let h = solve_8x8(a)?;
        Some(Self {
            m: [h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0],
        })
    }

    /// Project a point. `None` if it maps to the line at infinity.
    pub fn apply(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let m = &self.m;
        let w = m[6] * x + m[7] * y + m[8];
        if w.abs() < SINGULAR_EPS {
            return None;
        }
        Some((
            (m[0] * x + m[1] * y + m[2]) / w,
            (m[3] * x + m[4] * y + m[5]) / w,
        ))
    }

    /// Inverse transform via the adjugate. `None` when singular.
    pub fn inverse(&self) -> Option<Self> {
        let [a, b, c, d, e, f, g, h, i] = self.m;
        let det = a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g);
        if det.abs() < SINGULAR_EPS {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Self {
            m: [
                (e * i - f * h) * inv_det,
                (c * h - b * i) * inv_det,
                (b * f - c * e) * inv_det,
                (f * g - d * i) * inv_det,
                (a * i - c * g) * inv_det,
                (c * d - a * f) * inv_det,
                (d * h - e * g) * inv_det,
                (b * g - a * h) * inv_det,
                (a * e - b * d) * inv_det,
            ],
        })
    }
}

/// Solve an 8×8 linear system given as an augmented 8×9 matrix, by Gaussian
/// elimination with partial pivoting.
#[allow(clippy::needless_range_loop)]
fn solve_8x8(mut m: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let mut max_row = col;
        let mut max_val = m[col][col].abs();
        for row in (col + 1)..8 {
            if m[row][col].abs() > max_val {
                max_val = m[row][col].abs();
                max_row = row;
            }
        }
        m.swap(col, max_row);

        let pivot = m[col][col];
        if pivot.abs() < SINGULAR_EPS {
            return None;
        }

        for row in (col + 1)..8 {
            let factor = m[row][col] / pivot;
            for j in col..9 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for i in (0..8).rev() {
        x[i] = m[i][8];
        for j in (i + 1)..8 {
            x[i] -= m[i][j] * x[j];
        }
        x[i] /= m[i][i];
    }

    Some(x)
}

/// Warp `src` through `h` into a fresh `width × height` buffer.
///
/// Every output pixel is mapped back into `src` and sampled bilinearly.
/// Samples falling outside `src` are fully transparent, so the result is
/// transparent everywhere the garment does not land.
pub fn warp_perspective(src: &RgbaImage, h: &Homography, width: u32, height: u32) -> RgbaImage {
    let mut out = RgbaImage::new(width, height);
    let Some(inv) = h.inverse() else {
        return out;
    };

    let (sw, sh) = (src.width() as i64, src.height() as i64);
    let sample = |x: i64, y: i64| -> [f32; 4] {
        if x >= 0 && x < sw && y >= 0 && y < sh {
            let p = src.get_pixel(x as u32, y as u32);
            [p[0] as f32, p[1] as f32, p[2] as f32, p[3] as f32]
        } else {
            [0.0; 4]
        }
    };

    for oy in 0..height {
        for ox in 0..width {
            let Some((sx, sy)) = inv.apply(f64::from(ox), f64::from(oy)) else {
                continue;
            };
            // Far outside the source: skip before the integer conversion.
            if sx < -1.0 || sy < -1.0 || sx >= sw as f64 || sy >= sh as f64 {
                continue;
            }

            let x0 = sx.floor() as i64;
            let y0 = sy.floor() as i64;
            let fx = (sx - x0 as f64) as f32;
            let fy = (sy - y0 as f64) as f32;

            let tl = sample(x0, y0);
            let tr = sample(x0 + 1, y0);
            let bl = sample(x0, y0 + 1);
            let br = sample(x0 + 1, y0 + 1);

            let mut px = [0u8; 4];
            for c in 0..4 {
                let val = tl[c] * (1.0 - fx) * (1.0 - fy)
                    + tr[c] * fx * (1.0 - fy)
                    + bl[c] * (1.0 - fx) * fy
                    + br[c] * fx * fy;
                px[c] = val.round().clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(ox, oy, Rgba(px));
        }
    }

    out
}
