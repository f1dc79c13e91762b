//! Separable gaussian blur over premultiplied RGBA8, used for drop shadows.
//!
//! Weights are quantized to Q16 and renormalized so a constant image stays bit-identical. Samples
//! beyond the buffer read transparent black, which lets a blurred silhouette fade out at the surface
//! border instead of smearing its edge pixels.

use crate::foundation::error::{CoverError, CoverResult};

/// Kernel half-width used for a given sigma.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Blur `src` (premultiplied RGBA8, `width * height * 4` bytes) with a gaussian of `sigma`.
pub fn gaussian_blur_premul(src: &[u8], width: u32, height: u32, sigma: f32) -> CoverResult<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CoverError::render("blur buffer size overflow"))?;
    if src.len() != len {
        return Err(CoverError::render("blur input does not match width*height*4"));
    }

    let radius = radius_for_sigma(sigma);
    if radius == 0 || len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; len];
    let mut out = vec![0u8; len];
    let (w, h) = (width as usize, height as usize);

    // rows
    convolve(src, &mut tmp, &kernel, h, w, w * 4, 4);
    // columns
    convolve(&tmp, &mut out, &kernel, w, h, 4, w * 4);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CoverResult<Vec<u32>> {
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return Err(CoverError::render("gaussian kernel sum is zero"));
    }

    let mut q: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = q.iter().map(|&v| i64::from(v)).sum();
    let mid = q.len() / 2;
    q[mid] = (i64::from(q[mid]) + (65536 - acc)).clamp(0, 65536) as u32;
    Ok(q)
}

/// Convolve `lines` independent lines of `samples` pixels each.
///
/// `line_stride` is the byte distance between consecutive lines, `step` the byte distance between
/// consecutive samples on one line.
fn convolve(
    src: &[u8],
    dst: &mut [u8],
    kernel: &[u32],
    lines: usize,
    samples: usize,
    line_stride: usize,
    step: usize,
) {
    let radius = (kernel.len() / 2) as isize;
    for line in 0..lines {
        let base = line * line_stride;
        for i in 0..samples {
            let mut acc = [0u64; 4];
            for (k, &kw) in kernel.iter().enumerate() {
                let j = i as isize + k as isize - radius;
                if j < 0 || j >= samples as isize {
                    continue;
                }
                let idx = base + j as usize * step;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = base + i * step;
            for (c, a) in acc.iter().enumerate() {
                dst[out + c] = ((a + 32768) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sigma_is_identity() {
        let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(gaussian_blur_premul(&src, 1, 2, 0.0).unwrap(), src);
        assert_eq!(radius_for_sigma(f32::NAN), 0);
    }

    #[test]
    fn kernel_sums_to_one() {
        for (r, s) in [(3, 1.0), (12, 4.0), (30, 10.0)] {
            let k = gaussian_kernel_q16(r, s).unwrap();
            assert_eq!(k.iter().sum::<u32>(), 65536);
            assert_eq!(k.len(), (2 * r + 1) as usize);
        }
    }

    #[test]
    fn interior_of_constant_image_is_preserved() {
        let (w, h) = (21u32, 21u32);
        let px = [10u8, 20, 30, 40];
        let src = px.repeat((w * h) as usize);
        let out = gaussian_blur_premul(&src, w, h, 1.0).unwrap();
        let center = ((10 * w + 10) * 4) as usize;
        assert_eq!(&out[center..center + 4], &px);
        // edges fade toward transparent
        assert!(out[3] < 40);
    }

    #[test]
    fn spreads_a_single_pixel() {
        let (w, h) = (9u32, 9u32);
        let mut src = vec![0u8; (w * h * 4) as usize];
        let center = ((4 * w + 4) * 4) as usize;
        src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);
        let out = gaussian_blur_premul(&src, w, h, 1.0).unwrap();
        assert!(out[center + 3] < 255);
        let right = center + 4;
        assert!(out[right + 3] > 0);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = gaussian_blur_premul(&[0u8; 5], 1, 1, 1.0).unwrap_err();
        assert!(err.to_string().starts_with("render error:"));
    }
}
