//! Balance participants and their configuration records.

use ef_core::{Curve, Real, units};
use ef_graph::{CurveKey, Graph};
use serde::{Deserialize, Serialize};

use crate::error::{BalanceError, BalanceResult};

/// The role a participant plays in the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Consumer,
    Producer,
    Storage,
    Import,
    Export,
    /// Produces the balanced carrier by converting another one
    /// (electrolysers and the like). Supply-side.
    Transformation,
}

/// Where a participant's hourly curve comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum CurveSourceConfig {
    /// Yearly total (MWh) spread over a named profile. Static: resolvable
    /// before the frame loop runs.
    Profiled { total: Real, profile: String },
    /// A node's realized output curve for a carrier. Dynamic: only
    /// available after the other calculators have injected results.
    NodeOutput { node: String, carrier: String },
    /// A node's realized input curve for a carrier. Dynamic.
    NodeInput { node: String, carrier: String },
}

impl CurveSourceConfig {
    /// Whether this source can be resolved before the frame loop.
    pub fn is_static(&self) -> bool {
        matches!(self, CurveSourceConfig::Profiled { .. })
    }

    /// Resolve a dynamic source by reading the realized curve back off the
    /// graph, converting MJ per frame to MWh.
    pub(crate) fn resolve_dynamic(&self, graph: &mut Graph) -> BalanceResult<Curve> {
        let (node_key, carrier_key, key) = match self {
            CurveSourceConfig::NodeOutput { node, carrier } => {
                (node, carrier, CurveKeyKind::Output)
            }
            CurveSourceConfig::NodeInput { node, carrier } => (node, carrier, CurveKeyKind::Input),
            CurveSourceConfig::Profiled { .. } => unreachable!("profiled sources are static"),
        };
        let carrier = graph.carrier_id(carrier_key)?;
        let node = graph.node_id(node_key)?;
        let curve_key = match key {
            CurveKeyKind::Output => CurveKey::CarrierOutput(carrier),
            CurveKeyKind::Input => CurveKey::CarrierInput(carrier),
        };
        let curve = graph
            .node_curve(node, curve_key)
            .ok_or_else(|| BalanceError::MissingSourceCurve {
                key: node_key.clone(),
                carrier: carrier_key.clone(),
            })?
            .scaled(1.0 / units::mwh_to_mj(1.0));
        Ok(curve)
    }
}

enum CurveKeyKind {
    Input,
    Output,
}

/// Typed configuration record for one balance participant, keyed by node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum BalanceConfig {
    Consumer { source: CurveSourceConfig },
    Producer { source: CurveSourceConfig },
    Transformation {
        source: CurveSourceConfig,
        /// Units of the balanced carrier produced per unit of the source
        /// curve.
        #[serde(default = "default_conversion")]
        conversion: Real,
    },
    Storage {
        /// Maximum storable energy, MWh. Derived from the cumulative
        /// surplus when omitted.
        #[serde(default)]
        volume: Option<Real>,
    },
    Import,
    Export,
}

fn default_conversion() -> Real {
    1.0
}

/// One balance participant.
#[derive(Debug, Clone)]
pub struct BalanceParticipant {
    pub key: String,
    pub role: Role,
    pub(crate) source: Option<CurveSourceConfig>,
    /// Scale applied to the resolved source curve.
    pub(crate) conversion: Real,
    pub(crate) curve: Option<Curve>,
    pub volume: Option<Real>,
}

impl BalanceParticipant {
    pub fn from_config(key: impl Into<String>, config: BalanceConfig) -> Self {
        let key = key.into();
        match config {
            BalanceConfig::Consumer { source } => {
                Self::with_source(key, Role::Consumer, source, 1.0)
            }
            BalanceConfig::Producer { source } => {
                Self::with_source(key, Role::Producer, source, 1.0)
            }
            BalanceConfig::Transformation { source, conversion } => {
                Self::with_source(key, Role::Transformation, source, conversion)
            }
            BalanceConfig::Storage { volume } => Self {
                key,
                role: Role::Storage,
                source: None,
                conversion: 1.0,
                curve: None,
                volume,
            },
            BalanceConfig::Import => Self {
                key,
                role: Role::Import,
                source: None,
                conversion: 1.0,
                curve: None,
                volume: None,
            },
            BalanceConfig::Export => Self {
                key,
                role: Role::Export,
                source: None,
                conversion: 1.0,
                curve: None,
                volume: None,
            },
        }
    }

    fn with_source(key: String, role: Role, source: CurveSourceConfig, conversion: Real) -> Self {
        Self {
            key,
            role,
            source: Some(source),
            conversion,
            curve: None,
            volume: None,
        }
    }

    /// The resolved hourly curve, if this participant carries one.
    pub fn curve(&self) -> Option<&Curve> {
        self.curve.as_ref()
    }

    /// Supply-side participants add to supply, consumers to demand.
    pub fn is_supply(&self) -> bool {
        matches!(self.role, Role::Producer | Role::Transformation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_roles_and_sources() {
        let config: BalanceConfig = serde_json::from_str(
            r#"{"type": "transformation",
                "source": {"kind": "node_input", "node": "electrolyser",
                           "carrier": "hydrogen"}}"#,
        )
        .unwrap();
        let participant = BalanceParticipant::from_config("electrolyser", config);
        assert_eq!(participant.role, Role::Transformation);
        assert!(participant.is_supply());
        assert!(!participant.source.as_ref().unwrap().is_static());
    }

    #[test]
    fn storage_volume_is_optional() {
        let config: BalanceConfig = serde_json::from_str(r#"{"type": "storage"}"#).unwrap();
        let participant = BalanceParticipant::from_config("cavern", config);
        assert_eq!(participant.volume, None);

        let config: BalanceConfig =
            serde_json::from_str(r#"{"type": "storage", "volume": 500.0}"#).unwrap();
        let participant = BalanceParticipant::from_config("cavern", config);
        assert_eq!(participant.volume, Some(500.0));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(serde_json::from_str::<BalanceConfig>(r#"{"type": "wizard"}"#).is_err());
    }
}
