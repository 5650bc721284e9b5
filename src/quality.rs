//! PNG quality ranges and the fallback ladder.

use crate::constants::{DEFAULT_PNG_QUALITY_LADDER, MAX_PNG_QUALITY};
use crate::error::{CompressionError, Result};
use crate::tool::ToolStatus;
use std::fmt;
use std::str::FromStr;

/// A pngquant `--quality=<min>-<max>` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualityRange {
    min: u8,
    max: u8,
}

impl QualityRange {
    pub fn new(min: u8, max: u8) -> Result<Self> {
        if min > max || max > MAX_PNG_QUALITY {
            return Err(CompressionError::InvalidQualityRange(format!("{}-{}", min, max)));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// The full `--quality=...` argument
    pub fn as_arg(&self) -> String {
        format!("--quality={}", self)
    }
}

impl fmt::Display for QualityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

impl FromStr for QualityRange {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CompressionError::InvalidQualityRange(s.to_string());
        let (min, max) = s.trim().split_once('-').ok_or_else(invalid)?;
        let min = min.trim().parse::<u8>().map_err(|_| invalid())?;
        let max = max.trim().parse::<u8>().map_err(|_| invalid())?;
        Self::new(min, max).map_err(|_| invalid())
    }
}

/// Ordered, non-empty list of quality ranges, tried first to last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityLadder {
    rungs: Vec<QualityRange>,
}

impl QualityLadder {
    pub fn new(rungs: Vec<QualityRange>) -> Result<Self> {
        if rungs.is_empty() {
            return Err(CompressionError::EmptyQualityLadder);
        }
        Ok(Self { rungs })
    }

    pub fn rungs(&self) -> &[QualityRange] {
        &self.rungs
    }

    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    pub fn get(&self, rung: usize) -> Option<QualityRange> {
        self.rungs.get(rung).copied()
    }
}

impl Default for QualityLadder {
    fn default() -> Self {
        let rungs = DEFAULT_PNG_QUALITY_LADDER
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        Self { rungs }
    }
}

impl fmt::Display for QualityLadder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rungs: Vec<String> = self.rungs.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", rungs.join(","))
    }
}

impl FromStr for QualityLadder {
    type Err = CompressionError;

    /// Parse a comma-separated list such as `"50-70,40-60"`
    fn from_str(s: &str) -> Result<Self> {
        let rungs = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(QualityRange::from_str)
            .collect::<Result<Vec<_>>>()?;
        Self::new(rungs)
    }
}

/// Progress through a quality ladder for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderState {
    NotTried,
    /// Index of the rung currently being attempted
    Attempting(usize),
    Succeeded(usize),
    /// Every rung reported the quality floor as unreachable
    ExhaustedFallback,
}

impl LadderState {
    /// Enter the ladder. A ladder is never empty, so this always attempts rung 0.
    pub fn start(self) -> Self {
        match self {
            LadderState::NotTried => LadderState::Attempting(0),
            other => other,
        }
    }

    /// Transition after the attempt at the current rung finished.
    ///
    /// Fatal statuses are handled by the caller before advancing and leave
    /// the state unchanged here.
    pub fn advance(self, status: &ToolStatus, rungs: usize) -> Self {
        match (self, status) {
            (LadderState::Attempting(rung), ToolStatus::Success) => LadderState::Succeeded(rung),
            (LadderState::Attempting(rung), ToolStatus::Retryable(_)) if rung + 1 < rungs => {
                LadderState::Attempting(rung + 1)
            }
            (LadderState::Attempting(_), ToolStatus::Retryable(_)) => {
                LadderState::ExhaustedFallback
            }
            (state, _) => state,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LadderState::Succeeded(_) | LadderState::ExhaustedFallback)
    }
}
