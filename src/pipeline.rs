//! Ordered stage execution.
//!
//! The query and write flows are each a fixed list of stages.
//! A stage either lets the runner continue, finishes the flow early with
//! success, or fails; a failure stops every later stage.

use crate::error::PageTypeError;
use std::fmt::Debug;
use tracing::{debug, warn};

/// What the runner does after a stage succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Skip the remaining stages; the flow succeeded
    Finish,
}

/// Inspect one stage result and decide whether the runner proceeds.
///
/// Returns `Ok(true)` to run the next stage, `Ok(false)` to stop with
/// success, or the stage's error.
pub fn advance<S: Debug>(
    flow: &'static str,
    page_type: &str,
    stage: S,
    result: Result<Flow, PageTypeError>,
) -> Result<bool, PageTypeError> {
    match result {
        Ok(Flow::Continue) => {
            debug!(flow, page_type, stage = ?stage, "Stage complete");
            Ok(true)
        }
        Ok(Flow::Finish) => {
            debug!(flow, page_type, stage = ?stage, "Stage finished flow early");
            Ok(false)
        }
        Err(e) => {
            warn!(flow, page_type, stage = ?stage, error = %e, "Stage failed");
            Err(e)
        }
    }
}
