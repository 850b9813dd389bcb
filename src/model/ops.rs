// Magic Wand - Operator Kernels
//
// Reference float32 implementations of the five registered operators over
// batch-1 NHWC tensors. Shapes were resolved when the artifact was parsed,
// so the kernels only index; they never allocate or fail.

use super::artifact::{Activation, Layer, Op, Shape, Weights, Window2d};

/// Run one layer, reading `input` and writing `output`. Both slices must be
/// exactly the layer's input/output lengths.
pub fn eval(layer: &Layer<'_>, input: &[f32], output: &mut [f32]) {
    debug_assert_eq!(input.len(), layer.input.len());
    debug_assert_eq!(output.len(), layer.output.len());

    match &layer.op {
        Op::Conv2D { window, weights, bias, activation } => {
            conv2d(input, layer.input, output, layer.output, window, weights, bias, *activation)
        }
        Op::DepthwiseConv2D { window, multiplier, weights, bias, activation } => depthwise_conv2d(
            input,
            layer.input,
            output,
            layer.output,
            window,
            *multiplier,
            weights,
            bias,
            *activation,
        ),
        Op::FullyConnected { weights, bias, activation } => {
            fully_connected(input, output, weights, bias, *activation)
        }
        Op::MaxPool2D { window } => max_pool2d(input, layer.input, output, layer.output, window),
        Op::Softmax { beta } => softmax(input, output, layer.output.c, *beta),
    }
}

/// Input coordinate read by kernel tap `k` of output position `o`, or
/// `None` when it falls in the padding.
#[inline]
fn tap(o: usize, stride: usize, k: usize, pad: usize, limit: usize) -> Option<usize> {
    (o * stride + k).checked_sub(pad).filter(|&i| i < limit)
}

#[allow(clippy::too_many_arguments)]
fn conv2d(
    input: &[f32],
    ins: Shape,
    output: &mut [f32],
    outs: Shape,
    win: &Window2d,
    weights: &Weights<'_>,
    bias: &Weights<'_>,
    activation: Activation,
) {
    for oy in 0..outs.h {
        for ox in 0..outs.w {
            for f in 0..outs.c {
                let mut acc = bias.get(f);
                for ky in 0..win.kh {
                    let Some(iy) = tap(oy, win.sh, ky, win.pad_top, ins.h) else {
                        continue;
                    };
                    for kx in 0..win.kw {
                        let Some(ix) = tap(ox, win.sw, kx, win.pad_left, ins.w) else {
                            continue;
                        };
                        let in_base = (iy * ins.w + ix) * ins.c;
                        let w_base = ((f * win.kh + ky) * win.kw + kx) * ins.c;
                        for ic in 0..ins.c {
                            acc += input[in_base + ic] * weights.get(w_base + ic);
                        }
                    }
                }
                output[(oy * outs.w + ox) * outs.c + f] = activation.apply(acc);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn depthwise_conv2d(
    input: &[f32],
    ins: Shape,
    output: &mut [f32],
    outs: Shape,
    win: &Window2d,
    multiplier: usize,
    weights: &Weights<'_>,
    bias: &Weights<'_>,
    activation: Activation,
) {
    for oy in 0..outs.h {
        for ox in 0..outs.w {
            for ic in 0..ins.c {
                for m in 0..multiplier {
                    let oc = ic * multiplier + m;
                    let mut acc = bias.get(oc);
                    for ky in 0..win.kh {
                        let Some(iy) = tap(oy, win.sh, ky, win.pad_top, ins.h) else {
                            continue;
                        };
                        for kx in 0..win.kw {
                            let Some(ix) = tap(ox, win.sw, kx, win.pad_left, ins.w) else {
                                continue;
                            };
                            acc += input[(iy * ins.w + ix) * ins.c + ic]
                                * weights.get((ky * win.kw + kx) * outs.c + oc);
                        }
                    }
                    output[(oy * outs.w + ox) * outs.c + oc] = activation.apply(acc);
                }
            }
        }
    }
}

fn fully_connected(
    input: &[f32],
    output: &mut [f32],
    weights: &Weights<'_>,
    bias: &Weights<'_>,
    activation: Activation,
) {
    let n = input.len();
    for (unit, out) in output.iter_mut().enumerate() {
        let row = unit * n;
        let acc = input
            .iter()
            .enumerate()
            .fold(bias.get(unit), |acc, (i, x)| acc + x * weights.get(row + i));
        *out = activation.apply(acc);
    }
}

fn max_pool2d(input: &[f32], ins: Shape, output: &mut [f32], outs: Shape, win: &Window2d) {
    for oy in 0..outs.h {
        for ox in 0..outs.w {
            for c in 0..outs.c {
                let mut best = f32::NEG_INFINITY;
                for ky in 0..win.kh {
                    let Some(iy) = tap(oy, win.sh, ky, win.pad_top, ins.h) else {
                        continue;
                    };
                    for kx in 0..win.kw {
                        let Some(ix) = tap(ox, win.sw, kx, win.pad_left, ins.w) else {
                            continue;
                        };
                        best = best.max(input[(iy * ins.w + ix) * ins.c + c]);
                    }
                }
                output[(oy * outs.w + ox) * outs.c + c] = best;
            }
        }
    }
}

/// Softmax over the innermost dimension, independently at every position.
fn softmax(input: &[f32], output: &mut [f32], depth: usize, beta: f32) {
    for (src, dst) in input.chunks_exact(depth).zip(output.chunks_exact_mut(depth)) {
        let max = src.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0;
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = ((s - max) * beta).exp();
            sum += *d;
        }
        for d in dst.iter_mut() {
            *d /= sum;
        }
    }
}
