// Magic Wand - Samples, Scores & Gestures

use core::fmt;

use crate::config::*;

// ---------------------------------------------------------------------------
// Accelerometer sample (scaled to model units)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Sample {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Sample {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; CHANNELS] = [Axis::X, Axis::Y, Axis::Z];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        })
    }
}

// ---------------------------------------------------------------------------
// Gesture classes
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    Wing,
    Ring,
    Slope,
}

impl Gesture {
    pub const ALL: [Gesture; GESTURE_COUNT] = [Gesture::Wing, Gesture::Ring, Gesture::Slope];

    /// Map a model output index to a gesture. The trailing "no gesture"
    /// class (and anything out of range) maps to `None`.
    pub fn from_class(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this gesture in the model's output vector.
    pub fn class_index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Wing => "WING",
            Self::Ring => "RING",
            Self::Slope => "SLOPE",
        }
    }

    /// The shape traced in the air, for serial consoles.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Wing => concat!(
                "*         *         *\n",
                " *       * *       *\n",
                "  *     *   *     *\n",
                "   *   *     *   *\n",
                "    * *       * *\n",
                "     *         *\n",
            ),
            Self::Ring => concat!(
                "          *\n",
                "       *     *\n",
                "     *         *\n",
                "    *           *\n",
                "     *         *\n",
                "       *     *\n",
                "          *\n",
            ),
            Self::Slope => concat!(
                "        *\n",
                "       *\n",
                "      *\n",
                "     *\n",
                "    *\n",
                "   *\n",
                "  *\n",
                " * * * * * * * *\n",
            ),
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Score vector - one raw output of the classifier
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores(pub [f32; CLASS_COUNT]);

impl Scores {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Index and value of the highest score. NaN never wins.
    pub fn top(&self) -> (usize, f32) {
        self.0
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .fold((NO_GESTURE_CLASS, f32::NEG_INFINITY), |best, (i, v)| {
                if v > best.1 {
                    (i, v)
                } else {
                    best
                }
            })
    }
}

impl From<[f32; CLASS_COUNT]> for Scores {
    fn from(raw: [f32; CLASS_COUNT]) -> Self {
        Self(raw)
    }
}
