//! # Initialization Stages
//!
//! One ordered stage field replaces per-step guard flags. A stage is entered
//! at most once per instance; entering a stage that is current or already
//! passed is rejected, which is what suppresses overlapping re-triggers.

use serde::Serialize;
use std::fmt;

/// Staged initialization of one checkout instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    LoadingSdk,
    OpeningSession,
    BuildingSurface,
    MountingSurface,
    Ready,
    /// A stage failed or the instance was torn down
    Halted,
}

/// A transition the stage machine refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageError {
    pub from: Stage,
    pub to: Stage,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal stage transition {:?} -> {:?}", self.from, self.to)
    }
}

impl std::error::Error for StageError {}

impl Stage {
    /// Whether `next` directly follows `self`.
    ///
    /// `Ready` follows `OpeningSession` when no card surface is needed.
    pub fn can_enter(self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (Halted, _) | (Ready, _) if next != Halted => false,
            (Halted, Halted) => false,
            (_, Halted) => true,
            (Idle, LoadingSdk)
            | (LoadingSdk, OpeningSession)
            | (OpeningSession, BuildingSurface)
            | (OpeningSession, Ready)
            | (BuildingSurface, MountingSurface)
            | (MountingSurface, Ready) => true,
            _ => false,
        }
    }

    /// Move to `next`, rejecting re-entry and skipped prerequisites.
    pub fn enter(&mut self, next: Stage) -> Result<(), StageError> {
        if !self.can_enter(next) {
            return Err(StageError {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    /// Whether this stage has been entered (in flight or done)
    pub fn has_reached(self, stage: Stage) -> bool {
        self != Stage::Halted && self >= stage
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Ready | Stage::Halted)
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::Idle
    }
}
