//! Stepwise merit-order dispatch.

use ef_core::{Curve, FRAMES_PER_YEAR, Real, guarded_div};

use crate::error::{DispatchError, DispatchResult};
use crate::participant::{Consumer, Producer, ProducerKind, Profitability, check_producer};

/// Price multiplier applied when demand exceeds total dispatchable
/// capacity: the scarcity price is the most expensive plant times this.
pub const PRICE_MARKUP: Real = 7.22;

/// Realized results for one producer after dispatch.
#[derive(Debug, Clone)]
pub struct ProducerReport {
    pub key: String,
    /// Yearly production, MWh.
    pub production: Real,
    pub full_load_hours: Real,
    pub marginal_costs: Real,
    pub revenue: Real,
    pub total_costs: Real,
    pub profit: Real,
    pub profit_per_unit: Real,
    pub profitability: Profitability,
}

/// The frozen dispatch plan: participant ordering does not change between
/// frames.
#[derive(Debug)]
struct Plan {
    /// Dispatchable indices ascending by marginal cost, ties in input order.
    order: Vec<usize>,
    /// Must-run and volatile indices, in input order.
    pinned: Vec<usize>,
    /// Scarcity price for frames where demand goes unmet.
    ceiling: Real,
}

/// An ordered list of producers and consumers for one carrier, dispatched
/// over all 8760 frames.
///
/// Either call [`calculate`](MeritOrder::calculate) to run the whole year,
/// or drive the loop externally with
/// [`calculate_frame`](MeritOrder::calculate_frame) when frames must
/// interleave with other calculators.
#[derive(Debug)]
pub struct MeritOrder {
    producers: Vec<Producer>,
    consumers: Vec<Consumer>,
    plan: Option<Plan>,
    price: Curve,
    frames_run: usize,
}

impl Default for MeritOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeritOrder {
    pub fn new() -> Self {
        Self {
            producers: Vec::new(),
            consumers: Vec::new(),
            plan: None,
            price: Curve::zeroes(),
            frames_run: 0,
        }
    }

    pub fn add_producer(&mut self, producer: Producer) -> DispatchResult<()> {
        check_producer(&producer)?;
        self.producers.push(producer);
        Ok(())
    }

    pub fn add_consumer(&mut self, consumer: Consumer) {
        self.consumers.push(consumer);
    }

    /// Freeze the participant ordering. Called implicitly by the first
    /// frame; adding participants afterwards has no effect.
    pub fn prepare(&mut self) {
        if self.plan.is_some() {
            return;
        }
        let mut order: Vec<usize> = Vec::new();
        let mut pinned: Vec<usize> = Vec::new();
        for (i, producer) in self.producers.iter().enumerate() {
            if producer.kind == ProducerKind::Dispatchable {
                order.push(i);
            } else {
                pinned.push(i);
            }
        }
        order.sort_by(|&a, &b| {
            self.producers[a]
                .marginal_costs
                .total_cmp(&self.producers[b].marginal_costs)
        });
        let ceiling = order
            .last()
            .map(|&i| self.producers[i].marginal_costs * PRICE_MARKUP)
            .unwrap_or(0.0);

        tracing::debug!(
            dispatchables = order.len(),
            pinned = pinned.len(),
            consumers = self.consumers.len(),
            "merit order prepared"
        );
        self.plan = Some(Plan {
            order,
            pinned,
            ceiling,
        });
    }

    /// Dispatch one frame: pinned producers run at their profile level,
    /// dispatchables are loaded in cost order until demand is met. The
    /// frame price is the marginal cost of the cheapest producer with
    /// spare capacity, or the scarcity ceiling when demand goes unmet.
    pub fn calculate_frame(&mut self, frame: usize) -> DispatchResult<()> {
        self.prepare();
        // Taken out and put back so producers can be loaded while the plan
        // is borrowed.
        let plan = self.plan.take().expect("prepared above");

        let demand: Real = self
            .consumers
            .iter()
            .map(|c| c.demand_at(frame))
            .sum::<Real>()
            .max(0.0);
        let mut remaining = demand;

        for &i in &plan.pinned {
            let load = self.producers[i].max_load_at(frame);
            self.producers[i].set_load(frame, load);
            remaining -= load;
        }
        remaining = remaining.max(0.0);

        let mut price_setter: Option<Real> = None;
        for &i in &plan.order {
            let capacity = self.producers[i].available_capacity();
            let take = remaining.min(capacity);
            self.producers[i].set_load(frame, take);
            remaining -= take;

            if price_setter.is_none() && take < capacity {
                price_setter = Some(self.producers[i].marginal_costs);
            }
        }

        let frame_price = if remaining > 1e-9 {
            plan.ceiling
        } else {
            price_setter.unwrap_or(0.0)
        };
        self.price.set(frame, frame_price);
        self.plan = Some(plan);
        self.frames_run += 1;
        Ok(())
    }

    /// Resolve all 8760 frames in one go.
    pub fn calculate(&mut self) -> DispatchResult<()> {
        for frame in 0..FRAMES_PER_YEAR {
            self.calculate_frame(frame)?;
        }
        Ok(())
    }

    /// Whether every frame has been dispatched.
    pub fn calculated(&self) -> bool {
        self.frames_run >= FRAMES_PER_YEAR
    }

    /// The hourly price curve. Only available once every frame ran.
    pub fn price_curve(&self) -> DispatchResult<&Curve> {
        if !self.calculated() {
            return Err(DispatchError::NotYetCalculated);
        }
        Ok(&self.price)
    }

    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    pub fn producer(&self, key: &str) -> DispatchResult<&Producer> {
        self.producers
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| DispatchError::UnknownProducer {
                key: key.to_string(),
            })
    }

    /// Total consumer demand as a curve, MW.
    pub fn demand_curve(&self) -> Curve {
        let mut total = Curve::zeroes();
        for consumer in &self.consumers {
            total.add_curve(&consumer.demand_curve());
        }
        total
    }

    /// Realized results for one producer. Only available after the year
    /// has been dispatched.
    pub fn report(&self, key: &str) -> DispatchResult<ProducerReport> {
        let price = self.price_curve()?;
        let producer = self.producer(key)?;

        let production = producer.production();
        let revenue = producer.revenue(price);
        let total_costs = producer.total_costs();
        let profit = revenue - total_costs;
        Ok(ProducerReport {
            key: producer.key.clone(),
            production,
            full_load_hours: producer.realized_full_load_hours(),
            marginal_costs: producer.marginal_costs,
            revenue,
            total_costs,
            profit,
            profit_per_unit: guarded_div(profit, producer.units),
            profitability: producer.profitability(price),
        })
    }

    /// Reports for every producer, in input order.
    pub fn reports(&self) -> DispatchResult<Vec<ProducerReport>> {
        self.producers
            .iter()
            .map(|p| self.report(&p.key))
            .collect()
    }
}
