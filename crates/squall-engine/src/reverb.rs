//! FFT convolution of the reverb-send bus with the shared impulse response.
//!
//! The kernel is immutable once built (see [`crate::noise::ImpulseResponse`]);
//! this module only reads it. Convolution is done in one FFT pass per
//! channel: offline rendering has the whole send bus in hand, so no
//! partitioning is needed.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::Arc;

use crate::graph::{MonoBus, StereoBus};
use crate::noise::ImpulseResponse;

/// Linear convolution via FFT. Output length is `signal + kernel - 1`.
pub fn fft_convolve(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }

    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = out_len.next_power_of_two();

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut a: Vec<Complex<f64>> = signal
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_len)
        .collect();
    let mut b: Vec<Complex<f64>> = kernel
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_len)
        .collect();

    forward.process(&mut a);
    forward.process(&mut b);

    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x *= *y;
    }

    inverse.process(&mut a);

    let scale = 1.0 / fft_len as f64;
    a[..out_len].iter().map(|c| c.re * scale).collect()
}

/// Convolves the mono send bus with a stereo kernel, producing a stereo wet
/// return truncated to `out_len` frames.
///
/// A mono kernel is applied to both channels; kernels with two or more
/// channels use channel 0 for left and channel 1 for right, which is the
/// host-convolver behavior the generators were written against.
pub fn render_wet_return(send: &MonoBus, ir: &Arc<ImpulseResponse>, out_len: usize) -> StereoBus {
    let mut wet = StereoBus::new(out_len);
    if send.is_empty() || ir.is_empty() {
        return wet;
    }

    let left_kernel = ir.channel(0);
    let left = fft_convolve(&send.samples, left_kernel);
    let right = if ir.num_channels() > 1 {
        fft_convolve(&send.samples, ir.channel(1))
    } else {
        left.clone()
    };

    // Normalize by kernel energy so the return level is roughly independent
    // of the kernel duration.
    let energy: f64 = left_kernel.iter().map(|s| s * s).sum::<f64>().max(1e-12);
    let norm = 1.0 / energy.sqrt();

    wet.add_stereo(&left, &right, 0, norm);
    wet
}
