//! Pipeline stages, stage-tagged errors and progress messages

use std::fmt;
use thiserror::Error;
use tracing::info;
use transectaz_core::Error;

/// Position of a run in the fixed stage sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Renumbering,
    Computing,
    Pruning,
    Normalizing,
    Publishing,
    Done,
}

impl PipelineStage {
    /// Stages that do work, in execution order
    pub const SEQUENCE: [PipelineStage; 5] = [
        PipelineStage::Renumbering,
        PipelineStage::Computing,
        PipelineStage::Pruning,
        PipelineStage::Normalizing,
        PipelineStage::Publishing,
    ];

    /// The stage that follows this one
    pub fn next(self) -> PipelineStage {
        match self {
            PipelineStage::Renumbering => PipelineStage::Computing,
            PipelineStage::Computing => PipelineStage::Pruning,
            PipelineStage::Pruning => PipelineStage::Normalizing,
            PipelineStage::Normalizing => PipelineStage::Publishing,
            PipelineStage::Publishing | PipelineStage::Done => PipelineStage::Done,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Renumbering => "renumbering",
            PipelineStage::Computing => "computing directional mean",
            PipelineStage::Pruning => "pruning fields",
            PipelineStage::Normalizing => "normalizing units",
            PipelineStage::Publishing => "publishing layer",
            PipelineStage::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A run that stopped: the stage that failed and why
#[derive(Error, Debug)]
#[error("transect pipeline failed while {stage}: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub source: Error,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: Error) -> Self {
        Self { stage, source }
    }
}

/// Receiver of the advisory message sent after each completed stage
pub trait MessageSink {
    fn message(&mut self, stage: PipelineStage, text: &str);
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn message(&mut self, stage: PipelineStage, text: &str) {
        info!(%stage, "{}", text);
    }
}

/// Collects messages, mostly for tests
impl MessageSink for Vec<String> {
    fn message(&mut self, _stage: PipelineStage, text: &str) {
        self.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_sequence() {
        let mut stage = PipelineStage::Renumbering;
        let mut seen = vec![stage];
        while stage != PipelineStage::Publishing {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(seen, PipelineStage::SEQUENCE.to_vec());
        assert_eq!(PipelineStage::Publishing.next(), PipelineStage::Done);
        assert_eq!(PipelineStage::Done.next(), PipelineStage::Done);
    }

    #[test]
    fn test_error_names_stage() {
        let err = PipelineError::new(PipelineStage::Publishing, Error::NoActiveSession);
        assert_eq!(
            err.to_string(),
            "transect pipeline failed while publishing layer: No active map session to publish into"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
