//! Named heat groups.

use ef_core::{Curve, Real};

use crate::error::{HeatError, HeatResult};
use crate::participant::{HeatConsumer, HeatParticipant};

/// Greedy allocation of producer shares to consumer shares.
///
/// Walks producers in order and, for each, walks consumers assigning the
/// minimum of the producer's remaining share and the consumer's unmet
/// share, decrementing both running totals. Returns, per producer, the
/// fraction of total group demand it owes each consumer.
pub fn allocate_shares(producer_shares: &[Real], consumer_shares: &[Real]) -> Vec<Vec<Real>> {
    let mut unmet: Vec<Real> = consumer_shares.to_vec();
    let mut allocation = Vec::with_capacity(producer_shares.len());

    for &producer_share in producer_shares {
        let mut remaining = producer_share;
        let mut row = vec![0.0; consumer_shares.len()];
        for (i, unmet_share) in unmet.iter_mut().enumerate() {
            if remaining <= 0.0 {
                break;
            }
            let assigned = remaining.min(*unmet_share);
            row[i] = assigned;
            *unmet_share -= assigned;
            remaining -= assigned;
        }
        allocation.push(row);
    }
    allocation
}

/// One named group: consumers matched against an ordered list of storage
/// and producer participants, frame by frame.
#[derive(Debug)]
pub struct HeatGroup {
    pub name: String,
    consumers: Vec<HeatConsumer>,
    participants: Vec<HeatParticipant>,
    demand: Option<Curve>,
    deficit: Curve,
}

impl HeatGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            consumers: Vec::new(),
            participants: Vec::new(),
            demand: None,
            deficit: Curve::zeroes(),
        }
    }

    pub fn add_consumer(&mut self, consumer: HeatConsumer) {
        self.consumers.push(consumer);
    }

    /// Participants are asked in insertion order each frame.
    pub fn add_participant(&mut self, participant: HeatParticipant) {
        self.participants.push(participant);
    }

    /// Aggregate the consumers into one synthetic demand curve.
    pub fn setup(&mut self) {
        let mut demand = Curve::zeroes();
        for consumer in &self.consumers {
            demand.add_curve(consumer.demand_curve());
        }
        tracing::debug!(
            group = %self.name,
            consumers = self.consumers.len(),
            participants = self.participants.len(),
            total_demand = demand.sum(),
            "heat group set up"
        );
        self.demand = Some(demand);
    }

    /// Satisfy one frame's demand from the participants in order.
    pub fn run_frame(&mut self, frame: usize) -> HeatResult<()> {
        let demand = self.demand.as_ref().ok_or_else(|| HeatError::NotSetUp {
            group: self.name.clone(),
        })?;

        let mut remaining = demand.get(frame);
        for participant in &mut self.participants {
            remaining -= participant.request(frame, remaining);
        }
        self.deficit.set(frame, remaining.max(0.0));
        Ok(())
    }

    /// The synthetic consumer's demand curve. Only available after setup.
    pub fn demand_curve(&self) -> HeatResult<&Curve> {
        self.demand.as_ref().ok_or_else(|| HeatError::NotSetUp {
            group: self.name.clone(),
        })
    }

    /// Demand no participant could cover.
    pub fn deficit_curve(&self) -> &Curve {
        &self.deficit
    }

    pub fn consumers(&self) -> &[HeatConsumer] {
        &self.consumers
    }

    pub fn participants(&self) -> &[HeatParticipant] {
        &self.participants
    }

    pub fn participant(&self, key: &str) -> Option<&HeatParticipant> {
        self.participants.iter().find(|p| p.key() == key)
    }
}
