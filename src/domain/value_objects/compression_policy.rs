use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Normalized encoder quality in (0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Quality(f64);

impl Quality {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !(value > 0.0 && value <= 1.0) {
            return Err(DomainError::InvalidQuality(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Quality on the 1..=100 scale most encoders expect
    pub fn as_percent(&self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Linear downscale factor in (0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Scale(f64);

impl Scale {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !(value > 0.0 && value <= 1.0) {
            return Err(DomainError::InvalidScale(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Scaled pixel length. Always floored so a smaller scale never yields
    /// a larger edge; clamped to one pixel so tiny inputs stay encodable.
    pub fn apply(&self, dimension: u32) -> u32 {
        ((dimension as f64 * self.0).floor() as u32).clamp(1, dimension.max(1))
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One (scale, quality) pair tried by the compression search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub scale: Scale,
    pub quality: Quality,
}

impl PolicyEntry {
    const fn fixed(scale: f64, quality: f64) -> Self {
        Self {
            scale: Scale(scale),
            quality: Quality(quality),
        }
    }

    pub fn new(scale: f64, quality: f64) -> Result<Self, DomainError> {
        Ok(Self {
            scale: Scale::new(scale)?,
            quality: Quality::new(quality)?,
        })
    }

    /// Target pixel dimensions for a source of `width` x `height`
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        (self.scale.apply(width), self.scale.apply(height))
    }
}

impl std::fmt::Display for PolicyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scale={} quality={}", self.scale, self.quality)
    }
}

/// Least destructive transforms first.
pub const DEFAULT_POLICY: [PolicyEntry; 14] = [
    PolicyEntry::fixed(1.0, 0.85),
    PolicyEntry::fixed(1.0, 0.70),
    PolicyEntry::fixed(1.0, 0.50),
    PolicyEntry::fixed(1.0, 0.30),
    PolicyEntry::fixed(0.8, 0.85),
    PolicyEntry::fixed(0.8, 0.70),
    PolicyEntry::fixed(0.8, 0.50),
    PolicyEntry::fixed(0.6, 0.85),
    PolicyEntry::fixed(0.6, 0.70),
    PolicyEntry::fixed(0.6, 0.50),
    PolicyEntry::fixed(0.4, 0.85),
    PolicyEntry::fixed(0.4, 0.70),
    PolicyEntry::fixed(0.3, 0.70),
    PolicyEntry::fixed(0.2, 0.80),
];

/// Last-resort encode used when no policy entry meets the budget
pub const EMERGENCY_ENTRY: PolicyEntry = PolicyEntry::fixed(0.15, 0.40);
