//! Discrete zoom levels
//!
//! The viewer exposes a small fixed ladder of zoom steps. The controller
//! only ever moves one step at a time; the renderer maps the step to a
//! visual scale factor when it paints.

use serde::{Deserialize, Serialize};

/// Lowest zoom step
pub const ZOOM_MIN: u8 = 0;
/// Highest zoom step
pub const ZOOM_MAX: u8 = 4;
/// Zoom step used for a fresh session
pub const ZOOM_DEFAULT: u8 = 2;

/// Scale factor for each step, indexed by level
const SCALE_LADDER: [f32; (ZOOM_MAX - ZOOM_MIN + 1) as usize] = [0.5, 0.75, 1.0, 1.5, 2.0];

/// One step on the zoom ladder, always within `[ZOOM_MIN, ZOOM_MAX]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct ZoomLevel(u8);

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(ZOOM_DEFAULT)
    }
}

impl From<u8> for ZoomLevel {
    fn from(level: u8) -> Self {
        Self::clamped(i64::from(level))
    }
}

impl From<ZoomLevel> for u8 {
    fn from(level: ZoomLevel) -> Self {
        level.0
    }
}

impl ZoomLevel {
    /// Build a level, pulling out-of-range values to the nearest bound
    #[must_use]
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(i64::from(ZOOM_MIN), i64::from(ZOOM_MAX)) as u8)
    }

    /// Raw step value
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// One step closer, or `None` at the top of the ladder
    #[must_use]
    pub fn step_in(self) -> Option<Self> {
        (self.0 < ZOOM_MAX).then(|| Self(self.0 + 1))
    }

    /// One step further, or `None` at the bottom of the ladder
    #[must_use]
    pub fn step_out(self) -> Option<Self> {
        (self.0 > ZOOM_MIN).then(|| Self(self.0 - 1))
    }

    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 == ZOOM_MAX
    }

    #[must_use]
    pub fn is_min(self) -> bool {
        self.0 == ZOOM_MIN
    }

    /// Visual scale factor (1.0 = 100%)
    #[must_use]
    pub fn scale(self) -> f32 {
        SCALE_LADDER[usize::from(self.0 - ZOOM_MIN)]
    }

    /// Scale as a whole percentage, for status lines
    #[must_use]
    pub fn percent(self) -> u16 {
        (self.scale() * 100.0).round() as u16
    }
}
