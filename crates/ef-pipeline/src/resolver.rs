//! The unresolved-to-resolved state machine.

use ef_core::{CurveProvider, FRAMES_PER_YEAR};
use ef_graph::Graph;

use crate::error::{PipelineError, PipelineResult};
use crate::stage::{Context, Stage};
use crate::stages::{BalanceStage, DispatchStage, HeatStage};

/// Whether a scenario graph carries hourly-derived results yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Only yearly totals are known.
    Unresolved,
    /// Hourly curves have been injected and the final pass has run.
    Resolved,
}

/// Drives one graph through the time-resolution pipeline.
///
/// The stage order is fixed at construction: heat groups first, then the
/// dispatch orders (electricity, then district heat, then agriculture
/// heat), then the balancers. Every frame visits the stages in that order.
pub struct TimeResolver {
    stages: Vec<Box<dyn Stage>>,
    state: Resolution,
}

impl TimeResolver {
    pub fn new(
        heat: Vec<HeatStage>,
        dispatch: Vec<DispatchStage>,
        balance: Vec<BalanceStage>,
    ) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        stages.extend(heat.into_iter().map(|s| Box::new(s) as Box<dyn Stage>));
        stages.extend(dispatch.into_iter().map(|s| Box::new(s) as Box<dyn Stage>));
        stages.extend(balance.into_iter().map(|s| Box::new(s) as Box<dyn Stage>));
        Self {
            stages,
            state: Resolution::Unresolved,
        }
    }

    pub fn state(&self) -> Resolution {
        self.state
    }

    /// Run the whole transition sequence.
    ///
    /// `refresh` is the host's aggregate graph calculation; it runs once on
    /// the cloned dataset before the loop (the speculative first pass) and
    /// once on the restored dataset after injection (the final pass).
    ///
    /// Between `clone_dataset` and `restore_dataset`, the dataset is only
    /// mutated through the stages; any other mutation would corrupt the
    /// final pass.
    pub fn resolve<F>(
        &mut self,
        graph: &mut Graph,
        curves: &dyn CurveProvider,
        mut refresh: F,
    ) -> PipelineResult<()>
    where
        F: FnMut(&mut Graph) -> PipelineResult<()>,
    {
        if self.state == Resolution::Resolved {
            return Err(PipelineError::AlreadyResolved);
        }

        tracing::info!(stages = self.stages.len(), "time resolution starting");
        graph.clone_dataset();
        refresh(graph)?;

        let mut cx = Context { graph, curves };
        for stage in &mut self.stages {
            tracing::debug!(stage = stage.name(), "static setup");
            stage.setup_static(&mut cx)?;
        }

        for frame in 0..FRAMES_PER_YEAR {
            for stage in &mut self.stages {
                stage.run_frame(&mut cx, frame)?;
            }
        }

        for stage in &mut self.stages {
            tracing::debug!(stage = stage.name(), "dynamic setup");
            stage.setup_dynamic(&mut cx)?;
        }

        cx.graph.restore_dataset()?;

        for stage in &mut self.stages {
            tracing::debug!(stage = stage.name(), "injecting results");
            stage.inject(&mut cx)?;
        }

        refresh(cx.graph)?;
        self.state = Resolution::Resolved;
        tracing::info!("time resolution finished");
        Ok(())
    }
}
