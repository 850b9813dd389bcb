// Test helper: writes model artifacts in the on-flash layout so tests can
// describe small graphs instead of shipping binary fixtures.

use super::artifact::{out_dim, Activation, OpKind, Padding, Shape, MAGIC};
use crate::config::SCHEMA_VERSION;

#[derive(Debug, Clone)]
pub enum Layer {
    Conv2D {
        filters: usize,
        kernel: [usize; 2],
        stride: [usize; 2],
        padding: Padding,
        activation: Activation,
        weights: Option<Vec<f32>>,
        bias: Option<Vec<f32>>,
    },
    DepthwiseConv2D {
        multiplier: usize,
        kernel: [usize; 2],
        stride: [usize; 2],
        padding: Padding,
        activation: Activation,
        weights: Option<Vec<f32>>,
        bias: Option<Vec<f32>>,
    },
    FullyConnected {
        units: usize,
        activation: Activation,
        weights: Option<Vec<f32>>,
        bias: Option<Vec<f32>>,
    },
    MaxPool2D {
        pool: [usize; 2],
        stride: [usize; 2],
        padding: Padding,
    },
    Softmax {
        beta: f32,
    },
}

impl Layer {
    pub fn conv2d(
        filters: usize,
        kernel: [usize; 2],
        stride: [usize; 2],
        padding: Padding,
        activation: Activation,
    ) -> Self {
        Layer::Conv2D { filters, kernel, stride, padding, activation, weights: None, bias: None }
    }

    pub fn depthwise(
        multiplier: usize,
        kernel: [usize; 2],
        stride: [usize; 2],
        padding: Padding,
        activation: Activation,
    ) -> Self {
        Layer::DepthwiseConv2D {
            multiplier,
            kernel,
            stride,
            padding,
            activation,
            weights: None,
            bias: None,
        }
    }

    pub fn fully_connected(units: usize, activation: Activation) -> Self {
        Layer::FullyConnected { units, activation, weights: None, bias: None }
    }

    pub fn max_pool(pool: [usize; 2], stride: [usize; 2], padding: Padding) -> Self {
        Layer::MaxPool2D { pool, stride, padding }
    }

    pub fn softmax(beta: f32) -> Self {
        Layer::Softmax { beta }
    }

    /// Explicit weights and bias, in artifact order.
    pub fn with_params(mut self, w: &[f32], b: &[f32]) -> Self {
        match &mut self {
            Layer::Conv2D { weights, bias, .. }
            | Layer::DepthwiseConv2D { weights, bias, .. }
            | Layer::FullyConnected { weights, bias, .. } => {
                *weights = Some(w.to_vec());
                *bias = Some(b.to_vec());
            }
            Layer::MaxPool2D { .. } | Layer::Softmax { .. } => {}
        }
        self
    }
}

pub struct ArtifactBuilder {
    version: u32,
    dtype: u32,
    dims: Vec<u32>,
    output_len: u32,
    ops: Vec<u8>,
    op_count: u32,
    shape: Shape,
}

impl ArtifactBuilder {
    pub fn new(dims: &[u32], output_len: u32) -> Self {
        let shape = match dims {
            [1, h, w, c] => Shape::new(*h as usize, *w as usize, *c as usize),
            _ => Shape::new(0, 0, 0),
        };
        Self {
            version: SCHEMA_VERSION,
            dtype: 0,
            dims: dims.to_vec(),
            output_len,
            ops: Vec::new(),
            op_count: 0,
            shape,
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn input_type(mut self, code: u32) -> Self {
        self.dtype = code;
        self
    }

    /// Append an arbitrary opcode with raw u32 parameters.
    pub fn raw_op(mut self, opcode: u32, params: &[u32]) -> Self {
        self.op_count += 1;
        self.put_u32(opcode);
        for &p in params {
            self.put_u32(p);
        }
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.op_count += 1;
        let input = self.shape;
        match layer {
            Layer::Conv2D { filters, kernel, stride, padding, activation, weights, bias } => {
                self.put_u32(OpKind::Conv2D.opcode());
                self.put_u32(filters as u32);
                self.put_window(kernel, stride, padding);
                self.put_u32(activation_code(activation));
                let count = filters * kernel[0] * kernel[1] * input.c;
                self.put_f32s(weights.as_deref(), count);
                self.put_f32s(bias.as_deref(), filters);
                self.shape = self.pooled(input, kernel, stride, padding, filters);
            }
            Layer::DepthwiseConv2D { multiplier, kernel, stride, padding, activation, weights, bias } => {
                self.put_u32(OpKind::DepthwiseConv2D.opcode());
                self.put_u32(multiplier as u32);
                self.put_window(kernel, stride, padding);
                self.put_u32(activation_code(activation));
                let out_c = input.c * multiplier;
                self.put_f32s(weights.as_deref(), kernel[0] * kernel[1] * out_c);
                self.put_f32s(bias.as_deref(), out_c);
                self.shape = self.pooled(input, kernel, stride, padding, out_c);
            }
            Layer::FullyConnected { units, activation, weights, bias } => {
                self.put_u32(OpKind::FullyConnected.opcode());
                self.put_u32(units as u32);
                self.put_u32(activation_code(activation));
                self.put_f32s(weights.as_deref(), units * input.len());
                self.put_f32s(bias.as_deref(), units);
                self.shape = Shape::new(1, 1, units);
            }
            Layer::MaxPool2D { pool, stride, padding } => {
                self.put_u32(OpKind::MaxPool2D.opcode());
                self.put_window(pool, stride, padding);
                self.shape = self.pooled(input, pool, stride, padding, input.c);
            }
            Layer::Softmax { beta } => {
                self.put_u32(OpKind::Softmax.opcode());
                self.ops.extend_from_slice(&beta.to_le_bytes());
            }
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        for word in [self.version, self.dtype, self.dims.len() as u32] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for d in &self.dims {
            out.extend_from_slice(&d.to_le_bytes());
        }
        out.extend_from_slice(&self.output_len.to_le_bytes());
        out.extend_from_slice(&self.op_count.to_le_bytes());
        out.extend_from_slice(&self.ops);
        out
    }

    fn put_u32(&mut self, v: u32) {
        self.ops.extend_from_slice(&v.to_le_bytes());
    }

    fn put_f32s(&mut self, values: Option<&[f32]>, count: usize) {
        match values {
            Some(values) => {
                for v in values {
                    self.ops.extend_from_slice(&v.to_le_bytes());
                }
            }
            None => {
                for _ in 0..count {
                    self.ops.extend_from_slice(&0.0f32.to_le_bytes());
                }
            }
        }
    }

    fn put_window(&mut self, kernel: [usize; 2], stride: [usize; 2], padding: Padding) {
        for v in [kernel[0], kernel[1], stride[0], stride[1]] {
            self.put_u32(v as u32);
        }
        self.put_u32(match padding {
            Padding::Valid => 0,
            Padding::Same => 1,
        });
    }

    /// Best-effort shape tracking; invalid geometry collapses to empty and
    /// is left for the parser to reject.
    fn pooled(
        &self,
        input: Shape,
        kernel: [usize; 2],
        stride: [usize; 2],
        padding: Padding,
        c: usize,
    ) -> Shape {
        if stride[0] == 0 || stride[1] == 0 {
            return Shape::new(0, 0, c);
        }
        let h = out_dim(input.h, kernel[0], stride[0], padding).map_or(0, |(o, _)| o);
        let w = out_dim(input.w, kernel[1], stride[1], padding).map_or(0, |(o, _)| o);
        Shape::new(h, w, c)
    }
}

fn activation_code(activation: Activation) -> u32 {
    match activation {
        Activation::None => 0,
        Activation::Relu => 1,
        Activation::Relu6 => 2,
    }
}
