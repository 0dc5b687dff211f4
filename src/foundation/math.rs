use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Smallest divisor magnitude the folded `Div` accepts.
pub const DELTA: f32 = 0.00001;

/// Clamp a divisor away from zero, keeping its sign (zero counts as positive).
pub fn safe_divisor(x: f32) -> f32 {
    if x.abs() < DELTA {
        if x < 0.0 { -DELTA } else { DELTA }
    } else {
        x
    }
}

/// RGBA value every uniform expression evaluates to.
///
/// Equality and hashing are bitwise so colors can key the uniform arena's hash-cons table.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct LinearColor {
    /// Red / x.
    pub r: f32,
    /// Green / y.
    pub g: f32,
    /// Blue / z.
    pub b: f32,
    /// Alpha / w.
    pub a: f32,
}

impl LinearColor {
    /// All channels zero.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// All channels one.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Build from four channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Replicate one value into every channel.
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// Channel by index (0..4); out-of-range reads yield 0.
    pub fn get(&self, i: usize) -> f32 {
        match i {
            0 => self.r,
            1 => self.g,
            2 => self.b,
            3 => self.a,
            _ => 0.0,
        }
    }

    /// Write a channel by index (0..4); out-of-range writes are ignored.
    pub fn set(&mut self, i: usize, v: f32) {
        match i {
            0 => self.r = v,
            1 => self.g = v,
            2 => self.b = v,
            3 => self.a = v,
            _ => {}
        }
    }

    /// Channels as an array.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Apply `f` per channel.
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b), f(self.a))
    }

    /// Combine two colors per channel.
    pub fn zip(self, other: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        Self::new(
            f(self.r, other.r),
            f(self.g, other.g),
            f(self.b, other.b),
            f(self.a, other.a),
        )
    }
}

impl PartialEq for LinearColor {
    fn eq(&self, other: &Self) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl Eq for LinearColor {}

impl Hash for LinearColor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.to_array() {
            c.to_bits().hash(state);
        }
    }
}

impl<'de> Deserialize<'de> for LinearColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Rgb([f32; 3]),
            Rgba([f32; 4]),
            Obj {
                r: f32,
                g: f32,
                b: f32,
                #[serde(default)]
                a: f32,
            },
        }

        match Repr::deserialize(deserializer)? {
            Repr::Rgb([r, g, b]) => Ok(Self::new(r, g, b, 0.0)),
            Repr::Rgba([r, g, b, a]) => Ok(Self::new(r, g, b, a)),
            Repr::Obj { r, g, b, a } => Ok(Self::new(r, g, b, a)),
        }
    }
}

/// `f32` compared and hashed by bit pattern.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct F32Key(pub f32);

impl PartialEq for F32Key {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for F32Key {}

impl Hash for F32Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
