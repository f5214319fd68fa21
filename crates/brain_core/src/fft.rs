//! In-place radix-2 FFT used by the band power calculator.

use std::f32::consts::PI;

/// Forward (negative-angle) discrete Fourier transform of the complex
/// signal held in `re`/`im`, computed in place.
///
/// Radix-2 decimation in time: a bit-reversal permutation of both arrays
/// followed by `log2(n)` butterfly passes. The per-pass twiddle angle is
/// `-2π/len`; twiddle factors are generated by a cos/sin recurrence per
/// sub-block rather than per-element trig calls, bounding both error growth
/// and cost to O(n log n).
///
/// `re` and `im` must have the same power-of-two length. Callers are
/// responsible for padding or truncating to a valid size; this system only
/// ever calls it with n = 256.
pub fn fft_in_place(re: &mut [f32], im: &mut [f32]) {
    let n = re.len();
    debug_assert_eq!(n, im.len(), "real/imaginary lengths must match");
    debug_assert!(n.is_power_of_two(), "FFT length must be a power of two");

    // Bit-reversal permutation.
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
    }

    // Butterfly passes, sub-transform length doubling from 2 to n.
    let mut len = 2;
    while len <= n {
        let ang = -2.0 * PI / len as f32;
        let (w_im, w_re) = ang.sin_cos();
        for start in (0..n).step_by(len) {
            let half = len / 2;
            let mut cur_re = 1.0f32;
            let mut cur_im = 0.0f32;
            for k in 0..half {
                let a = start + k;
                let b = a + half;
                let t_re = re[b] * cur_re - im[b] * cur_im;
                let t_im = re[b] * cur_im + im[b] * cur_re;
                re[b] = re[a] - t_re;
                im[b] = im[a] - t_im;
                re[a] += t_re;
                im[a] += t_im;
                let next_re = cur_re * w_re - cur_im * w_im;
                cur_im = cur_re * w_im + cur_im * w_re;
                cur_re = next_re;
            }
        }
        len <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magnitude(re: f32, im: f32) -> f32 {
        (re * re + im * im).sqrt()
    }

    #[test]
    fn impulse_transforms_to_flat_spectrum() {
        for n in [8usize, 64, 256] {
            let mut re = vec![0.0f32; n];
            let mut im = vec![0.0f32; n];
            re[0] = 1.0;
            fft_in_place(&mut re, &mut im);
            for k in 0..n {
                assert!(
                    (magnitude(re[k], im[k]) - 1.0).abs() < 1e-4,
                    "bin {} of n={} not flat",
                    k,
                    n
                );
            }
        }
    }

    #[test]
    fn dc_signal_concentrates_in_bin_zero() {
        let n = 64;
        let mut re = vec![1.0f32; n];
        let mut im = vec![0.0f32; n];
        fft_in_place(&mut re, &mut im);
        assert!((re[0] - n as f32).abs() < 1e-3);
        for k in 1..n {
            assert!(magnitude(re[k], im[k]) < 1e-3, "leakage at bin {}", k);
        }
    }

    #[test]
    fn sinusoid_concentrates_at_its_bin_and_mirror() {
        let n = 256;
        let k0 = 10usize;
        let mut re: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * k0 as f32 * i as f32 / n as f32).sin())
            .collect();
        let mut im = vec![0.0f32; n];
        fft_in_place(&mut re, &mut im);

        // A real sinusoid splits its energy between bins k0 and n-k0.
        assert!(magnitude(re[k0], im[k0]) > n as f32 / 4.0);
        assert!(magnitude(re[n - k0], im[n - k0]) > n as f32 / 4.0);
        for k in 0..n {
            if k == k0 || k == n - k0 {
                continue;
            }
            assert!(
                magnitude(re[k], im[k]) < 1e-2 * n as f32,
                "unexpected energy at bin {}",
                k
            );
        }
    }
}
