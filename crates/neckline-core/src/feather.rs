//! Alpha feathering: separable Gaussian blur over a float alpha plane.

/// Normalised 1-D Gaussian kernel of `size` taps (`size` is forced odd).
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let size = if size % 2 == 0 { size + 1 } else { size.max(1) };
    let radius = (size / 2) as i32;
    let sigma = if sigma.is_finite() && sigma > 0.0 {
        f64::from(sigma)
    } else {
        // Non-positive sigma: derive it from the kernel size.
        0.3 * ((f64::from(size) - 1.0) * 0.5 - 1.0) + 0.8
    };
    let denom = 2.0 * sigma * sigma;

    let weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / sum) as f32).collect()
}

/// Reflect an out-of-range index back into `0..n` without repeating the
/// edge pixel (`-1 → 1`, `n → n - 2`).
fn reflect_101(mut i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Blur a row-major `width × height` plane with `kernel` along both axes.
pub fn blur_plane(plane: &[f32], width: u32, height: u32, kernel: &[f32]) -> Vec<f32> {
    let (w, h) = (width as usize, height as usize);
    debug_assert_eq!(plane.len(), w * h);
    if w == 0 || h == 0 || kernel.len() <= 1 {
        return plane.to_vec();
    }
    let radius = (kernel.len() / 2) as i64;

    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        let row = &plane[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kw) in kernel.iter().enumerate() {
                let sx = reflect_101(x as i64 + k as i64 - radius, w as i64);
                acc += kw * row[sx];
            }
            tmp[y * w + x] = acc;
        }
    }

    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kw) in kernel.iter().enumerate() {
                let sy = reflect_101(y as i64 + k as i64 - radius, h as i64);
                acc += kw * tmp[sy * w + x];
            }
            out[y * w + x] = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_normalised_and_symmetric() {
        let k = gaussian_kernel(15, 5.0);
        assert_eq!(k.len(), 15);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        for i in 0..7 {
            assert!((k[i] - k[14 - i]).abs() < 1e-7);
        }
        assert!(k[7] > k[6] && k[6] > k[0]);
    }

    #[test]
    fn test_even_size_rounded_up() {
        assert_eq!(gaussian_kernel(4, 1.0).len(), 5);
        assert_eq!(gaussian_kernel(0, 1.0).len(), 1);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-3, 5), 3);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-4, 1), 0);
        // Kernel wider than the plane.
        assert!(reflect_101(-9, 3) < 3);
    }

    #[test]
    fn test_constant_plane_unchanged() {
        let plane = vec![0.6f32; 20 * 10];
        let out = blur_plane(&plane, 20, 10, &gaussian_kernel(15, 5.0));
        assert!(out.iter().all(|v| (v - 0.6).abs() < 1e-5));
    }

    #[test]
    fn test_blur_softens_edge() {
        // Left half opaque, right half clear.
        let (w, h) = (40u32, 4u32);
        let plane: Vec<f32> = (0..w * h)
            .map(|i| if i % w < 20 { 1.0 } else { 0.0 })
            .collect();
        let out = blur_plane(&plane, w, h, &gaussian_kernel(15, 5.0));
        let row = &out[..w as usize];
        assert!((row[0] - 1.0).abs() < 1e-5);
        assert!(row[39].abs() < 1e-5);
        assert!(row[19] < 1.0 && row[19] > 0.5);
        assert!(row[20] > 0.0 && row[20] < 0.5);
        // Monotone falloff across the edge.
        assert!(row.windows(2).all(|p| p[0] >= p[1] - 1e-6));
    }
}
