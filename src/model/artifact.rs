// Magic Wand - Model Artifact
//
// Parses the versioned model blob into a linear chain of layers with every
// tensor shape resolved up front. Weights are not copied: layers borrow them
// straight out of the artifact (flash on the device).
//
// Layout, all little-endian:
//
//   magic "WAND" | version u32 | input type u32 | rank u32 | dims[rank] u32
//   | output length u32 | operator count u32 | operators...
//
// Each operator is an opcode u32 followed by its parameters and then its
// weights and bias as f32 (see `OpKind`).

use core::fmt;

use heapless::Vec;

use super::error::SetupError;
use crate::config::{MAX_OPERATORS, SCHEMA_VERSION};

pub const MAGIC: [u8; 4] = *b"WAND";
pub const MAX_RANK: usize = 6;

// ---------------------------------------------------------------------------
// Tensor descriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Float32,
    Int8,
    UInt8,
    Unknown(u32),
}

impl ElementType {
    fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Float32,
            1 => Self::Int8,
            2 => Self::UInt8,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => f.write_str("float32"),
            Self::Int8 => f.write_str("int8"),
            Self::UInt8 => f.write_str("uint8"),
            Self::Unknown(code) => write!(f, "type#{code}"),
        }
    }
}

/// Declared type and dimensions of a tensor, as written in the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    pub dtype: ElementType,
    pub rank: usize,
    /// First `MAX_RANK` dimensions.
    pub dims: Vec<u32, MAX_RANK>,
}

impl TensorSpec {
    pub fn float32(dims: &[u32]) -> Self {
        Self {
            dtype: ElementType::Float32,
            rank: dims.len(),
            dims: dims.iter().copied().take(MAX_RANK).collect(),
        }
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.dims.as_slice())?;
        if self.rank > self.dims.len() {
            write!(f, " (rank {})", self.rank)?;
        }
        write!(f, " {}", self.dtype)
    }
}

/// Batch-1 NHWC shape of an activation tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub h: usize,
    pub w: usize,
    pub c: usize,
}

impl Shape {
    pub const fn new(h: usize, w: usize, c: usize) -> Self {
        Self { h, w, c }
    }

    pub const fn len(&self) -> usize {
        self.h * self.w * self.c
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn checked_len(h: usize, w: usize, c: usize) -> Option<usize> {
        h.checked_mul(w)?.checked_mul(c)
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// filters, kh, kw, sh, sw, padding, activation; weights `[filters][kh][kw][in_c]`.
    Conv2D,
    /// multiplier, kh, kw, sh, sw, padding, activation; weights `[kh][kw][in_c * multiplier]`.
    DepthwiseConv2D,
    /// units, activation; weights `[units][input length]`.
    FullyConnected,
    /// pool h, pool w, sh, sw, padding.
    MaxPool2D,
    /// beta (f32).
    Softmax,
}

impl OpKind {
    pub const ALL: [OpKind; 5] = [
        OpKind::Conv2D,
        OpKind::DepthwiseConv2D,
        OpKind::FullyConnected,
        OpKind::MaxPool2D,
        OpKind::Softmax,
    ];

    pub fn from_opcode(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn opcode(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Conv2D => "CONV_2D",
            Self::DepthwiseConv2D => "DEPTHWISE_CONV_2D",
            Self::FullyConnected => "FULLY_CONNECTED",
            Self::MaxPool2D => "MAX_POOL_2D",
            Self::Softmax => "SOFTMAX",
        })
    }
}

/// The set of operator kinds a runner is willing to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpResolver {
    registered: u8,
}

impl OpResolver {
    pub const fn new() -> Self {
        Self { registered: 0 }
    }

    /// Exactly the operators the gesture model is built from.
    pub fn magic_wand() -> Self {
        OpKind::ALL.iter().fold(Self::new(), |r, &k| r.with(k))
    }

    pub fn with(mut self, kind: OpKind) -> Self {
        self.registered |= 1 << kind.opcode();
        self
    }

    pub fn supports(&self, kind: OpKind) -> bool {
        self.registered & (1 << kind.opcode()) != 0
    }

    pub fn count(&self) -> u32 {
        self.registered.count_ones()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    Valid,
    Same,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    None,
    Relu,
    Relu6,
}

impl Activation {
    #[inline]
    pub fn apply(self, v: f32) -> f32 {
        match self {
            Self::None => v,
            Self::Relu => v.max(0.0),
            Self::Relu6 => v.clamp(0.0, 6.0),
        }
    }
}

/// Sliding-window geometry shared by convolutions and pooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window2d {
    pub kh: usize,
    pub kw: usize,
    pub sh: usize,
    pub sw: usize,
    /// Rows/columns of implicit padding before the first input element.
    pub pad_top: usize,
    pub pad_left: usize,
}

/// Little-endian f32 values borrowed from the artifact.
#[derive(Debug, Clone, Copy)]
pub struct Weights<'a>(&'a [u8]);

impl<'a> Weights<'a> {
    pub fn len(&self) -> usize {
        self.0.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> f32 {
        let b = &self.0[i * 4..i * 4 + 4];
        f32::from_le_bytes([b[0], b[1], b[2], b[3]])
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Op<'a> {
    Conv2D {
        window: Window2d,
        weights: Weights<'a>,
        bias: Weights<'a>,
        activation: Activation,
    },
    DepthwiseConv2D {
        window: Window2d,
        multiplier: usize,
        weights: Weights<'a>,
        bias: Weights<'a>,
        activation: Activation,
    },
    FullyConnected {
        weights: Weights<'a>,
        bias: Weights<'a>,
        activation: Activation,
    },
    MaxPool2D {
        window: Window2d,
    },
    Softmax {
        beta: f32,
    },
}

impl Op<'_> {
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Conv2D { .. } => OpKind::Conv2D,
            Op::DepthwiseConv2D { .. } => OpKind::DepthwiseConv2D,
            Op::FullyConnected { .. } => OpKind::FullyConnected,
            Op::MaxPool2D { .. } => OpKind::MaxPool2D,
            Op::Softmax { .. } => OpKind::Softmax,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    pub op: Op<'a>,
    pub input: Shape,
    pub output: Shape,
}

// ---------------------------------------------------------------------------
// Parsed model
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Graph<'a> {
    pub version: u32,
    pub input: Shape,
    pub output_len: usize,
    pub layers: Vec<Layer<'a>, MAX_OPERATORS>,
}

impl<'a> Graph<'a> {
    /// Parse `bytes`, checking the schema version, that the input tensor is
    /// exactly `expected_input`, and that every operator is registered in
    /// `resolver` and consistent with the shape flowing into it.
    pub fn parse(
        bytes: &'a [u8],
        expected_input: &TensorSpec,
        resolver: &OpResolver,
    ) -> Result<Self, SetupError> {
        let mut cur = Cursor::new(bytes);

        if cur.take(4)? != MAGIC {
            return Err(SetupError::BadMagic);
        }

        let version = cur.u32()?;
        if version != SCHEMA_VERSION {
            return Err(SetupError::SchemaVersionMismatch {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }

        let found = cur.tensor_spec()?;
        if found != *expected_input {
            return Err(SetupError::InputShapeMismatch {
                expected: expected_input.clone(),
                found,
            });
        }
        let input = nhwc(&found)?;

        let output_len = cur.u32()? as usize;
        let op_count = cur.u32()? as usize;
        if op_count == 0 {
            return Err(SetupError::Malformed("model has no operators"));
        }
        if op_count > MAX_OPERATORS {
            return Err(SetupError::TooManyOperators { max: MAX_OPERATORS });
        }

        let mut layers = Vec::new();
        let mut shape = input;
        for index in 0..op_count {
            let layer = cur.layer(index, shape, resolver)?;
            shape = layer.output;
            // Capacity was checked against op_count above.
            let _ = layers.push(layer);
        }

        if !cur.is_at_end() {
            return Err(SetupError::Malformed("trailing bytes after the last operator"));
        }

        Ok(Self {
            version,
            input,
            output_len,
            layers,
        })
    }

    /// Shape of the final tensor.
    pub fn output_shape(&self) -> Shape {
        self.layers.last().map(|l| l.output).unwrap_or(self.input)
    }

    /// Element counts of every tensor in execution order, input first.
    pub fn tensor_lens(&self) -> impl Iterator<Item = usize> + '_ {
        core::iter::once(self.input.len()).chain(self.layers.iter().map(|l| l.output.len()))
    }
}

fn nhwc(spec: &TensorSpec) -> Result<Shape, SetupError> {
    match spec.dims.as_slice() {
        &[1, h, w, c] => Ok(Shape::new(h as usize, w as usize, c as usize)),
        _ => Err(SetupError::Malformed("input tensor is not batch-1 NHWC")),
    }
}

// ---------------------------------------------------------------------------
// Byte cursor
// ---------------------------------------------------------------------------

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SetupError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(SetupError::Truncated { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, SetupError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32, SetupError> {
        self.u32().map(f32::from_bits)
    }

    fn weights(&mut self, count: usize, index: usize) -> Result<Weights<'a>, SetupError> {
        let bytes = count.checked_mul(4).ok_or(SetupError::InvalidOperator {
            index,
            reason: "weight tensor too large",
        })?;
        self.take(bytes).map(Weights)
    }

    fn tensor_spec(&mut self) -> Result<TensorSpec, SetupError> {
        let dtype = ElementType::from_code(self.u32()?);
        let rank = self.u32()? as usize;
        let mut dims = Vec::new();
        for _ in 0..rank {
            let d = self.u32()?;
            let _ = dims.push(d);
        }
        Ok(TensorSpec { dtype, rank, dims })
    }

    fn layer(
        &mut self,
        index: usize,
        input: Shape,
        resolver: &OpResolver,
    ) -> Result<Layer<'a>, SetupError> {
        let opcode = self.u32()?;
        let kind = OpKind::from_opcode(opcode)
            .filter(|k| resolver.supports(*k))
            .ok_or(SetupError::UnsupportedOperator { index, opcode })?;
        let invalid = |reason| SetupError::InvalidOperator { index, reason };

        let (op, output) = match kind {
            OpKind::Conv2D => {
                let filters = self.u32()? as usize;
                let (window, out_h, out_w) = self.window(input, index)?;
                let activation = self.activation(index)?;
                if filters == 0 {
                    return Err(invalid("zero filters"));
                }
                let per_filter = Shape::checked_len(window.kh, window.kw, input.c)
                    .ok_or(invalid("kernel too large"))?;
                let count = per_filter.checked_mul(filters).ok_or(invalid("kernel too large"))?;
                let weights = self.weights(count, index)?;
                let bias = self.weights(filters, index)?;
                (
                    Op::Conv2D { window, weights, bias, activation },
                    Shape::new(out_h, out_w, filters),
                )
            }
            OpKind::DepthwiseConv2D => {
                let multiplier = self.u32()? as usize;
                let (window, out_h, out_w) = self.window(input, index)?;
                let activation = self.activation(index)?;
                if multiplier == 0 {
                    return Err(invalid("zero depth multiplier"));
                }
                let out_c = input.c.checked_mul(multiplier).ok_or(invalid("kernel too large"))?;
                let count = Shape::checked_len(window.kh, window.kw, out_c)
                    .ok_or(invalid("kernel too large"))?;
                let weights = self.weights(count, index)?;
                let bias = self.weights(out_c, index)?;
                (
                    Op::DepthwiseConv2D { window, multiplier, weights, bias, activation },
                    Shape::new(out_h, out_w, out_c),
                )
            }
            OpKind::FullyConnected => {
                let units = self.u32()? as usize;
                let activation = self.activation(index)?;
                if units == 0 {
                    return Err(invalid("zero units"));
                }
                let count = input.len().checked_mul(units).ok_or(invalid("weights too large"))?;
                let weights = self.weights(count, index)?;
                let bias = self.weights(units, index)?;
                (
                    Op::FullyConnected { weights, bias, activation },
                    Shape::new(1, 1, units),
                )
            }
            OpKind::MaxPool2D => {
                let (window, out_h, out_w) = self.window(input, index)?;
                (Op::MaxPool2D { window }, Shape::new(out_h, out_w, input.c))
            }
            OpKind::Softmax => {
                let beta = self.f32()?;
                if !beta.is_finite() || beta <= 0.0 {
                    return Err(invalid("softmax beta must be positive"));
                }
                (Op::Softmax { beta }, input)
            }
        };

        if Shape::checked_len(output.h, output.w, output.c).is_none() {
            return Err(invalid("output tensor too large"));
        }

        Ok(Layer { op, input, output })
    }

    /// Reads kh, kw, sh, sw, padding and resolves the output size.
    fn window(&mut self, input: Shape, index: usize) -> Result<(Window2d, usize, usize), SetupError> {
        let kh = self.u32()? as usize;
        let kw = self.u32()? as usize;
        let sh = self.u32()? as usize;
        let sw = self.u32()? as usize;
        let padding = match self.u32()? {
            0 => Padding::Valid,
            1 => Padding::Same,
            _ => return Err(SetupError::InvalidOperator { index, reason: "unknown padding" }),
        };
        if kh == 0 || kw == 0 {
            return Err(SetupError::InvalidOperator { index, reason: "zero-sized window" });
        }
        if sh == 0 || sw == 0 {
            return Err(SetupError::InvalidOperator { index, reason: "zero stride" });
        }
        let (out_h, pad_top) = out_dim(input.h, kh, sh, padding)
            .ok_or(SetupError::InvalidOperator { index, reason: "window larger than input" })?;
        let (out_w, pad_left) = out_dim(input.w, kw, sw, padding)
            .ok_or(SetupError::InvalidOperator { index, reason: "window larger than input" })?;
        Ok((Window2d { kh, kw, sh, sw, pad_top, pad_left }, out_h, out_w))
    }

    fn activation(&mut self, index: usize) -> Result<Activation, SetupError> {
        match self.u32()? {
            0 => Ok(Activation::None),
            1 => Ok(Activation::Relu),
            2 => Ok(Activation::Relu6),
            _ => Err(SetupError::InvalidOperator { index, reason: "unknown activation" }),
        }
    }
}

/// Output length and leading padding along one axis, TensorFlow rules.
pub(crate) fn out_dim(input: usize, k: usize, stride: usize, padding: Padding) -> Option<(usize, usize)> {
    if input == 0 {
        return None;
    }
    match padding {
        Padding::Valid => {
            if input < k {
                None
            } else {
                Some(((input - k) / stride + 1, 0))
            }
        }
        Padding::Same => {
            let out = (input + stride - 1) / stride;
            let total = ((out - 1) * stride + k).saturating_sub(input);
            Some((out, total / 2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::builder::{ArtifactBuilder, Layer as B};

    fn expected() -> TensorSpec {
        TensorSpec::float32(&[1, 8, 3, 1])
    }

    fn parse(bytes: &[u8]) -> Result<Graph<'_>, SetupError> {
        Graph::parse(bytes, &expected(), &OpResolver::magic_wand())
    }

    #[test]
    fn valid_and_same_padding_sizes() {
        assert_eq!(out_dim(128, 8, 1, Padding::Valid), Some((121, 0)));
        assert_eq!(out_dim(121, 8, 8, Padding::Valid), Some((15, 0)));
        assert_eq!(out_dim(5, 3, 1, Padding::Same), Some((5, 1)));
        assert_eq!(out_dim(5, 2, 2, Padding::Same), Some((3, 0)));
        assert_eq!(out_dim(2, 3, 1, Padding::Valid), None);
    }

    #[test]
    fn resolves_shapes_through_the_chain() {
        let bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4)
            .layer(B::conv2d(2, [2, 1], [1, 1], Padding::Valid, Activation::Relu))
            .layer(B::max_pool([7, 1], [7, 1], Padding::Valid))
            .layer(B::fully_connected(4, Activation::None))
            .layer(B::softmax(1.0))
            .build();
        let graph = parse(&bytes).unwrap();

        let shapes: std::vec::Vec<Shape> = graph.layers.iter().map(|l| l.output).collect();
        assert_eq!(
            shapes,
            [Shape::new(7, 3, 2), Shape::new(1, 3, 2), Shape::new(1, 1, 4), Shape::new(1, 1, 4)]
        );
        assert_eq!(graph.tensor_lens().collect::<std::vec::Vec<_>>(), [24, 42, 6, 4, 4]);
        assert_eq!(graph.output_len, 4);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4).layer(B::softmax(1.0)).build();
        bytes[0] = b'X';
        assert_eq!(parse(&bytes).unwrap_err(), SetupError::BadMagic);
    }

    #[test]
    fn rejects_truncated_weights() {
        let bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4)
            .layer(B::fully_connected(4, Activation::None))
            .build();
        let cut = &bytes[..bytes.len() - 2];
        assert!(matches!(parse(cut), Err(SetupError::Truncated { .. })));
    }

    #[test]
    fn truncation_offset_names_the_field_cut_short() {
        let bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4).layer(B::softmax(1.0)).build();
        // Header: magic 0..4, version 4..8, input type 8..12.
        assert_eq!(parse(&bytes[..10]).unwrap_err(), SetupError::Truncated { offset: 8 });

        // Softmax beta is the final four bytes.
        let cut = &bytes[..bytes.len() - 1];
        assert_eq!(
            parse(cut).unwrap_err(),
            SetupError::Truncated { offset: bytes.len() - 4 }
        );
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4).layer(B::softmax(1.0)).build();
        bytes.push(0);
        assert!(matches!(parse(&bytes), Err(SetupError::Malformed(_))));
    }

    #[test]
    fn rejects_unknown_opcode() {
        let bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4).raw_op(9, &[]).build();
        assert_eq!(
            parse(&bytes).unwrap_err(),
            SetupError::UnsupportedOperator { index: 0, opcode: 9 }
        );
    }

    #[test]
    fn rejects_operator_missing_from_resolver() {
        let bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4)
            .layer(B::max_pool([2, 1], [2, 1], Padding::Valid))
            .layer(B::softmax(1.0))
            .build();
        let resolver = OpResolver::new().with(OpKind::MaxPool2D);
        let err = Graph::parse(&bytes, &expected(), &resolver).unwrap_err();
        assert_eq!(err, SetupError::UnsupportedOperator { index: 1, opcode: 4 });
    }

    #[test]
    fn rejects_window_larger_than_input() {
        let bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4)
            .layer(B::max_pool([9, 1], [1, 1], Padding::Valid))
            .build();
        assert!(matches!(
            parse(&bytes),
            Err(SetupError::InvalidOperator { index: 0, reason: "window larger than input" })
        ));
    }

    #[test]
    fn rejects_zero_stride() {
        let bytes = ArtifactBuilder::new(&[1, 8, 3, 1], 4)
            .layer(B::max_pool([2, 1], [0, 1], Padding::Valid))
            .build();
        assert!(matches!(
            parse(&bytes),
            Err(SetupError::InvalidOperator { reason: "zero stride", .. })
        ));
    }

    #[test]
    fn rejects_empty_model_and_too_many_operators() {
        let empty = ArtifactBuilder::new(&[1, 8, 3, 1], 4).build();
        assert!(matches!(parse(&empty), Err(SetupError::Malformed(_))));

        let mut builder = ArtifactBuilder::new(&[1, 8, 3, 1], 4);
        for _ in 0..=MAX_OPERATORS {
            builder = builder.layer(B::softmax(1.0));
        }
        assert_eq!(
            parse(&builder.build()).unwrap_err(),
            SetupError::TooManyOperators { max: MAX_OPERATORS }
        );
    }

    #[test]
    fn resolver_registers_exactly_five_kinds() {
        let resolver = OpResolver::magic_wand();
        assert_eq!(resolver.count(), 5);
        assert!(OpKind::ALL.iter().all(|k| resolver.supports(*k)));
        assert!(!OpResolver::new().supports(OpKind::Softmax));
    }

    #[test]
    fn tensor_spec_display() {
        let spec = TensorSpec::float32(&[1, 128, 3, 1]);
        assert_eq!(spec.to_string(), "[1, 128, 3, 1] float32");
    }
}
