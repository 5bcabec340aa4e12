//! Concrete stages wrapping the three calculators.

use ef_balance::{BalanceCalculator, BalanceConfig, BalanceParticipant};
use ef_dispatch::{DispatchConfig, MeritOrder, MeritParticipant};
use ef_heat::{HeatConfig, HeatGroup, HeatUnit};

use crate::error::PipelineResult;
use crate::stage::{Context, Stage};

/// One heat group as a pipeline stage.
pub struct HeatStage {
    group: HeatGroup,
    heat_carrier: String,
    configs: Vec<(String, HeatConfig)>,
}

impl HeatStage {
    pub fn new(
        group_name: impl Into<String>,
        heat_carrier: impl Into<String>,
        configs: Vec<(String, HeatConfig)>,
    ) -> Self {
        Self {
            group: HeatGroup::new(group_name),
            heat_carrier: heat_carrier.into(),
            configs,
        }
    }

    pub fn group(&self) -> &HeatGroup {
        &self.group
    }
}

impl Stage for HeatStage {
    fn name(&self) -> &str {
        &self.group.name
    }

    fn setup_static(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        for (key, config) in &self.configs {
            match ef_heat::participant_from_config(cx.graph, key, config, cx.curves)? {
                HeatUnit::Consumer(consumer) => self.group.add_consumer(consumer),
                HeatUnit::Participant(participant) => self.group.add_participant(participant),
            }
        }
        self.group.setup();
        Ok(())
    }

    fn run_frame(&mut self, _cx: &mut Context<'_>, frame: usize) -> PipelineResult<()> {
        self.group.run_frame(frame)?;
        Ok(())
    }

    fn setup_dynamic(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        // Realized curves land on the working dataset so later stages'
        // dynamic setup can read them before the restore.
        ef_heat::inject_results(cx.graph, &self.group, &self.heat_carrier, &self.configs)?;
        Ok(())
    }

    fn inject(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        ef_heat::inject_results(cx.graph, &self.group, &self.heat_carrier, &self.configs)?;
        Ok(())
    }
}

/// One merit order (electricity, district heat or agriculture heat) as a
/// pipeline stage.
pub struct DispatchStage {
    name: String,
    carrier: String,
    order: MeritOrder,
    configs: Vec<(String, DispatchConfig)>,
}

impl DispatchStage {
    pub fn new(
        name: impl Into<String>,
        carrier: impl Into<String>,
        configs: Vec<(String, DispatchConfig)>,
    ) -> Self {
        Self {
            name: name.into(),
            carrier: carrier.into(),
            order: MeritOrder::new(),
            configs,
        }
    }

    pub fn order(&self) -> &MeritOrder {
        &self.order
    }
}

impl Stage for DispatchStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup_static(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        for (key, config) in &self.configs {
            match ef_dispatch::participant_from_config(cx.graph, key, config, cx.curves)? {
                MeritParticipant::Producer(producer) => self.order.add_producer(producer)?,
                MeritParticipant::Consumer(consumer) => self.order.add_consumer(consumer),
            }
        }
        self.order.prepare();
        Ok(())
    }

    fn run_frame(&mut self, _cx: &mut Context<'_>, frame: usize) -> PipelineResult<()> {
        self.order.calculate_frame(frame)?;
        Ok(())
    }

    fn setup_dynamic(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        ef_dispatch::inject_results(cx.graph, &self.order, &self.carrier)?;
        Ok(())
    }

    fn inject(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        ef_dispatch::inject_results(cx.graph, &self.order, &self.carrier)?;
        Ok(())
    }
}

/// One balanced carrier as a pipeline stage.
///
/// Balancing is derived from the other stages' realized curves, so the
/// per-frame work happens in `setup_dynamic` rather than in `run_frame`.
pub struct BalanceStage {
    calc: BalanceCalculator,
}

impl BalanceStage {
    pub fn new(carrier: impl Into<String>, configs: Vec<(String, BalanceConfig)>) -> Self {
        let mut calc = BalanceCalculator::new(carrier);
        for (key, config) in configs {
            calc.add_participant(BalanceParticipant::from_config(key, config));
        }
        Self { calc }
    }

    pub fn calculator(&self) -> &BalanceCalculator {
        &self.calc
    }
}

impl Stage for BalanceStage {
    fn name(&self) -> &str {
        &self.calc.carrier
    }

    fn setup_static(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        self.calc.setup_static(cx.curves)?;
        Ok(())
    }

    fn run_frame(&mut self, _cx: &mut Context<'_>, _frame: usize) -> PipelineResult<()> {
        Ok(())
    }

    fn setup_dynamic(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        self.calc.setup_dynamic(cx.graph)?;
        self.calc.compute()?;
        Ok(())
    }

    fn inject(&mut self, cx: &mut Context<'_>) -> PipelineResult<()> {
        self.calc.inject(cx.graph)?;
        Ok(())
    }
}
