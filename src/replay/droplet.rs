//! Droplets, keyframes and interpolation
//!
//! A droplet is a sequence of [`Keyframe`]s appended in non-decreasing time
//! order. Playback never reads keyframes directly: it asks a droplet for its
//! [`DropletSnapshot`] at a given instant, which is interpolated between the
//! two surrounding keyframes with a cubic ease-in/ease-out curve.

use serde::{Deserialize, Serialize};

use crate::chip::Position;

/// Tolerance under which two keyframe times are considered simultaneous
pub const EPS: f64 = 1e-8;

/// Nominal half-extent of a resting droplet, in cells
pub const RADIUS: f64 = 0.4;

/// Sound cues fire this long before the keyframe they announce (seconds)
pub const SOUND_OFFSET: f64 = 0.3;

/// Duration of the coalescing phase of a merge (seconds)
pub const MERGE_INTERVAL: f64 = 1.6;

/// Duration of the stretching phase of a split (seconds)
pub const SPLIT_INTERVAL: f64 = 1.2;

/// Dense droplet identifier, assigned in creation order
pub type DropletId = usize;

/// RGB droplet color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel-wise integer mean
    pub fn average(self, other: Color) -> Color {
        let mean = |a: u8, b: u8| ((u16::from(a) + u16::from(b)) / 2) as u8;
        Color::new(mean(self.r, other.r), mean(self.g, other.g), mean(self.b, other.b))
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_channels([r, g, b]: [u8; 3]) -> Self {
        Color::new(r, g, b)
    }
}

// =================================================================================================
// Keyframes
// =================================================================================================

/// A timed droplet state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds
    pub t: f64,
    /// Cell the droplet is centred on
    pub cell: Position,
    /// Horizontal half-extent, in cells
    pub rx: f64,
    /// Vertical half-extent, in cells
    pub ry: f64,
    pub opacity: u8,
    pub color: Color,
}

impl Keyframe {
    /// Fully grown, opaque droplet resting on `cell`
    pub fn resting(t: f64, cell: Position, color: Color) -> Self {
        Self {
            t,
            cell,
            rx: RADIUS,
            ry: RADIUS,
            opacity: 0xff,
            color,
        }
    }

    /// Invisible, zero-sized droplet (materializing or vanished at a port)
    pub fn vanished(t: f64, cell: Position, color: Color) -> Self {
        Self {
            t,
            cell,
            rx: 0.0,
            ry: 0.0,
            opacity: 0,
            color,
        }
    }

    /// Same state at another time and place
    pub fn at(self, t: f64, cell: Position) -> Self {
        Self { t, cell, ..self }
    }

    /// True if the droplet rests at nominal size (not mid-transition, not gone)
    pub fn has_nominal_extents(&self) -> bool {
        (self.rx - RADIUS).abs() < EPS && (self.ry - RADIUS).abs() < EPS
    }
}

/// Interpolated droplet state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DropletSnapshot {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub rx: f64,
    pub ry: f64,
    pub opacity: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl From<&Keyframe> for DropletSnapshot {
    fn from(frame: &Keyframe) -> Self {
        Self {
            t: frame.t,
            x: f64::from(frame.cell.x),
            y: f64::from(frame.cell.y),
            rx: frame.rx,
            ry: frame.ry,
            opacity: f64::from(frame.opacity),
            r: f64::from(frame.color.r),
            g: f64::from(frame.color.g),
            b: f64::from(frame.color.b),
        }
    }
}

impl DropletSnapshot {
    /// Cell under the snapshot centre, truncated toward zero
    pub fn cell(&self) -> Position {
        Position::new(self.x as i32, self.y as i32)
    }
}

// =================================================================================================
// Interpolation
// =================================================================================================

/// Cubic ease-in/ease-out over `[0, 1]`
pub fn easing(p: f64) -> f64 {
    if p < 0.5 {
        (2.0 * p).powi(3) / 2.0
    } else {
        1.0 - (2.0 * (1.0 - p)).powi(3) / 2.0
    }
}

/// Eased state between two keyframes at time `t`
///
/// Keyframes closer than [`EPS`] in time yield `b` unchanged.
///
/// # Example
///
/// ```rust
/// use dmfb_rs::chip::Position;
/// use dmfb_rs::replay::{interpolate, Color, Keyframe};
///
/// let color = Color::new(10, 20, 30);
/// let a = Keyframe::resting(1.0, Position::new(0, 0), color);
/// let b = Keyframe::resting(2.0, Position::new(2, 0), color);
///
/// let mid = interpolate(&a, &b, 1.5);
/// assert!((mid.x - 1.0).abs() < 1e-12);
/// assert_eq!(mid.y, 0.0);
/// ```
pub fn interpolate(a: &Keyframe, b: &Keyframe, t: f64) -> DropletSnapshot {
    if (a.t - b.t).abs() < EPS {
        return DropletSnapshot::from(b);
    }

    let p = easing((t - a.t) / (b.t - a.t));
    let (from, to) = (DropletSnapshot::from(a), DropletSnapshot::from(b));
    let lerp = |u: f64, v: f64| u + (v - u) * p;

    DropletSnapshot {
        t,
        x: lerp(from.x, to.x),
        y: lerp(from.y, to.y),
        rx: lerp(from.rx, to.rx),
        ry: lerp(from.ry, to.ry),
        opacity: lerp(from.opacity, to.opacity),
        r: lerp(from.r, to.r),
        g: lerp(from.g, to.g),
        b: lerp(from.b, to.b),
    }
}

// =================================================================================================
// Droplet
// =================================================================================================

/// A droplet identity and its trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Droplet {
    pub id: DropletId,
    keyframes: Vec<Keyframe>,
}

impl Droplet {
    pub fn new(id: DropletId, keyframes: Vec<Keyframe>) -> Self {
        Self { id, keyframes }
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn last(&self) -> Option<&Keyframe> {
        self.keyframes.last()
    }

    pub(crate) fn push(&mut self, frame: Keyframe) {
        debug_assert!(self.last().is_none_or(|last| last.t <= frame.t + EPS));
        self.keyframes.push(frame);
    }

    /// First and last keyframe times
    pub fn lifespan(&self) -> Option<(f64, f64)> {
        Some((self.keyframes.first()?.t, self.keyframes.last()?.t))
    }

    /// State at time `t`, or `None` when the droplet is not on screen
    ///
    /// Before the first keyframe, at it exactly, and after the last one the
    /// droplet is absent.
    pub fn state_at(&self, t: f64) -> Option<DropletSnapshot> {
        let index = self.keyframes.partition_point(|frame| frame.t < t);
        if index == 0 || index == self.keyframes.len() {
            return None;
        }
        Some(interpolate(&self.keyframes[index - 1], &self.keyframes[index], t))
    }
}

// =================================================================================================
// Tests
// =================================================================================================
