//! Fit Engine: a display scale that makes rendered content occupy exactly one page.
//!
//! The engine never sees a rendering tree. It works in two phases: the caller lays
//! content out and reports the measured height, then the engine turns that height into
//! a scale. Compact styling (tighter margins and line height) is requested first, and
//! numeric scaling is the fallback because it costs legibility.
//!
//! `FitSession` tracks one editing session. Every recompute trigger issues a
//! `MeasurementTicket`; a measurement carrying an older ticket than the latest trigger
//! is ignored, so a slow layout pass cannot overwrite a newer one.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::layout::page::A4;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_MIN_SCALE: f32 = 0.6;
/// Sub-pixel rounding slack when comparing a measurement against the target.
pub const DEFAULT_TOLERANCE_PX: f32 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum FitConfigError {
    #[error("target height must be a positive number of pixels, got {0}")]
    InvalidTarget(f32),

    #[error("minimum scale must be in (0, 1], got {0}")]
    InvalidMinScale(f32),

    #[error("tolerance must be a non-negative number of pixels, got {0}")]
    InvalidTolerance(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitConfig {
    target_height_px: f32,
    min_scale: f32,
    tolerance_px: f32,
    compact_first: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            target_height_px: A4.height_px(),
            min_scale: DEFAULT_MIN_SCALE,
            tolerance_px: DEFAULT_TOLERANCE_PX,
            compact_first: true,
        }
    }
}

impl FitConfig {
    pub fn new(
        target_height_px: f32,
        min_scale: f32,
        tolerance_px: f32,
        compact_first: bool,
    ) -> Result<Self, FitConfigError> {
        if !target_height_px.is_finite() || target_height_px <= 0.0 {
            return Err(FitConfigError::InvalidTarget(target_height_px));
        }
        if !min_scale.is_finite() || min_scale <= 0.0 || min_scale > 1.0 {
            return Err(FitConfigError::InvalidMinScale(min_scale));
        }
        if !tolerance_px.is_finite() || tolerance_px < 0.0 {
            return Err(FitConfigError::InvalidTolerance(tolerance_px));
        }
        Ok(Self {
            target_height_px,
            min_scale,
            tolerance_px,
            compact_first,
        })
    }

    /// One A4 page with the given legibility floor.
    pub fn with_min_scale(min_scale: f32) -> Result<Self, FitConfigError> {
        let d = Self::default();
        Self::new(d.target_height_px, min_scale, d.tolerance_px, d.compact_first)
    }

    pub fn target_height_px(&self) -> f32 {
        self.target_height_px
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stateless evaluation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FitPhase {
    /// Intrinsic size, scale 1. Content may overflow the page boundary.
    Natural,
    /// Single-page mode with a scale below 1 in effect.
    Fitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FitVerdict {
    /// Fits at intrinsic size without compaction.
    Fits,
    /// Fits at intrinsic size once compact styling is applied.
    CompactFits,
    /// Scaled down to `target / measured`.
    Scaled,
    /// Would need a scale below the floor; held at the floor and still overflows.
    ClampedAtFloor,
}

/// What the caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FitDirective {
    /// Apply `scale` and stop.
    ApplyScale,
    /// Switch to compact styling, lay out again, and report the new height.
    ApplyCompactAndRemeasure,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitReport {
    pub scale: f32,
    pub phase: FitPhase,
    pub compact: bool,
    pub directive: FitDirective,
    /// measured / target; 0 when nothing was measured.
    pub fill_ratio: f32,
    /// How far content still overflows after scaling, as a fraction of the page.
    pub overflow_fraction: f32,
    pub verdict: FitVerdict,
}

/// `target / measured`, clamped to `[min_scale, 1]`.
///
/// Zero, negative, and non-finite heights read as "nothing to fit" and give 1.
pub fn compute_scale(measured_px: f32, config: &FitConfig) -> f32 {
    if !measured_px.is_finite() || measured_px <= 0.0 {
        return 1.0;
    }
    if measured_px <= config.target_height_px + config.tolerance_px {
        return 1.0;
    }
    (config.target_height_px / measured_px).max(config.min_scale)
}

/// Evaluates one measurement taken with or without compact styling applied.
pub fn evaluate_fit(measured_px: f32, compact_applied: bool, config: &FitConfig) -> FitReport {
    let scale = compute_scale(measured_px, config);
    let fill_ratio = if measured_px.is_finite() && measured_px > 0.0 {
        measured_px / config.target_height_px
    } else {
        0.0
    };
    // Decided on the unclamped ratio; `fill_ratio * scale` drifts off 1.0 in f32.
    let clamped = scale < 1.0 && config.target_height_px / measured_px < config.min_scale;
    let overflow_fraction = if clamped {
        (fill_ratio * scale - 1.0).max(0.0)
    } else {
        0.0
    };

    let verdict = if scale >= 1.0 {
        if compact_applied {
            FitVerdict::CompactFits
        } else {
            FitVerdict::Fits
        }
    } else if clamped {
        FitVerdict::ClampedAtFloor
    } else {
        FitVerdict::Scaled
    };

    let directive = if scale < 1.0 && config.compact_first && !compact_applied {
        FitDirective::ApplyCompactAndRemeasure
    } else {
        FitDirective::ApplyScale
    };

    FitReport {
        scale,
        phase: if scale < 1.0 {
            FitPhase::Fitting
        } else {
            FitPhase::Natural
        },
        compact: compact_applied,
        directive,
        fill_ratio,
        overflow_fraction,
        verdict,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session state machine
// ────────────────────────────────────────────────────────────────────────────

/// Identifies one layout pass. `compact` tells the caller which style variant to
/// lay out with before measuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementTicket {
    generation: u64,
    pub compact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitStep {
    /// The ticket was superseded by a later trigger, or single-page mode is off.
    Ignored,
    /// Lay out again with the ticket's style and report the new height.
    Remeasure(MeasurementTicket),
    /// Final scale for this trigger.
    Settled(FitReport),
}

#[derive(Debug)]
pub struct FitSession {
    config: FitConfig,
    single_page: bool,
    compact: bool,
    scale: f32,
    generation: u64,
}

impl FitSession {
    pub fn new(config: FitConfig) -> Self {
        Self {
            config,
            single_page: false,
            compact: false,
            scale: 1.0,
            generation: 0,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn compact(&self) -> bool {
        self.compact
    }

    pub fn phase(&self) -> FitPhase {
        if self.single_page && self.scale < 1.0 {
            FitPhase::Fitting
        } else {
            FitPhase::Natural
        }
    }

    /// Turning single-page mode off returns to Natural at once; turning it on asks for
    /// a measurement.
    pub fn set_single_page(&mut self, enabled: bool) -> Option<MeasurementTicket> {
        self.single_page = enabled;
        if enabled {
            return Some(self.next_ticket());
        }
        self.generation += 1;
        self.scale = 1.0;
        self.compact = false;
        debug!("Single-page mode off, scale reset");
        None
    }

    /// Any Document or Customisation edit. Only single-page mode needs a measurement.
    pub fn content_changed(&mut self) -> Option<MeasurementTicket> {
        self.single_page.then(|| self.next_ticket())
    }

    pub fn report_measurement(&mut self, ticket: MeasurementTicket, measured_px: f32) -> FitStep {
        if !self.single_page || ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                latest = self.generation,
                "Ignoring stale fit measurement"
            );
            return FitStep::Ignored;
        }

        let report = evaluate_fit(measured_px, ticket.compact, &self.config);
        if report.directive == FitDirective::ApplyCompactAndRemeasure {
            self.compact = true;
            return FitStep::Remeasure(self.next_ticket());
        }

        self.scale = report.scale;
        FitStep::Settled(report)
    }

    fn next_ticket(&mut self) -> MeasurementTicket {
        self.generation += 1;
        MeasurementTicket {
            generation: self.generation,
            compact: self.compact,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
