//! The stage interface.

use ef_core::CurveProvider;
use ef_graph::Graph;

use crate::error::PipelineResult;

/// Everything a stage needs, passed explicitly: the scenario graph and the
/// curve resolution service. No process-wide current-scenario state.
pub struct Context<'a> {
    pub graph: &'a mut Graph,
    pub curves: &'a dyn CurveProvider,
}

/// One statically-ordered pipeline stage.
///
/// The resolver calls the methods strictly in declaration order:
/// `setup_static` once, `run_frame` 8760 times, `setup_dynamic` once while
/// the working dataset still holds loop-time state, and `inject` once
/// after the original dataset has been restored.
pub trait Stage {
    fn name(&self) -> &str;

    /// Build participants from yearly totals, before the frame loop.
    fn setup_static(&mut self, cx: &mut Context<'_>) -> PipelineResult<()>;

    /// Compute one frame.
    fn run_frame(&mut self, cx: &mut Context<'_>, frame: usize) -> PipelineResult<()>;

    /// Resolve anything that depends on other stages' realized results.
    /// Runs after the loop, before the dataset restore.
    fn setup_dynamic(&mut self, _cx: &mut Context<'_>) -> PipelineResult<()> {
        Ok(())
    }

    /// Write results onto the restored yearly dataset.
    fn inject(&mut self, cx: &mut Context<'_>) -> PipelineResult<()>;
}
