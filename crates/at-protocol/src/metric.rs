//! System gauges and operation counters.

use serde::{Deserialize, Serialize};

/// The fixed set of gauges shown on the dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GaugeKind {
    Cpu,
    Memory,
    Network,
    /// Number of in-flight simulated operations.
    AsyncOps,
}

impl GaugeKind {
    pub const ALL: [GaugeKind; 4] = [
        GaugeKind::Cpu,
        GaugeKind::Memory,
        GaugeKind::Network,
        GaugeKind::AsyncOps,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GaugeKind::Cpu => "CPU",
            GaugeKind::Memory => "Memória",
            GaugeKind::Network => "Rede",
            GaugeKind::AsyncOps => "Ops Async",
        }
    }

    pub fn max(self) -> f64 {
        match self {
            GaugeKind::AsyncOps => 10.0,
            _ => 100.0,
        }
    }

    pub fn initial(self) -> f64 {
        match self {
            GaugeKind::Cpu => 15.0,
            GaugeKind::Memory => 32.0,
            GaugeKind::Network => 8.0,
            GaugeKind::AsyncOps => 0.0,
        }
    }

    /// Derived gauges mirror other state and are skipped by the random walk.
    pub fn is_derived(self) -> bool {
        matches!(self, GaugeKind::AsyncOps)
    }

    pub fn index(self) -> usize {
        match self {
            GaugeKind::Cpu => 0,
            GaugeKind::Memory => 1,
            GaugeKind::Network => 2,
            GaugeKind::AsyncOps => 3,
        }
    }
}

/// A bounded gauge reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Gauge {
    pub kind: GaugeKind,
    pub value: f64,
    pub max: f64,
}

impl Gauge {
    /// Value as a percentage of the maximum, in `0.0..=100.0`.
    pub fn percent(&self) -> f64 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.value / self.max * 100.0).clamp(0.0, 100.0)
    }
}

/// Point-in-time view of every gauge, in `GaugeKind::ALL` order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSnapshot {
    pub gauges: Vec<Gauge>,
}

impl MetricSnapshot {
    pub fn get(&self, kind: GaugeKind) -> Option<&Gauge> {
        self.gauges.iter().find(|g| g.kind == kind)
    }

    pub fn value(&self, kind: GaugeKind) -> f64 {
        self.get(kind).map(|g| g.value).unwrap_or_default()
    }
}

/// Aggregate outcome counts for simulated operations.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counters {
    pub succeeded: u64,
    pub failed: u64,
    pub active: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_labels_and_bounds() {
        assert_eq!(GaugeKind::Network.label(), "Rede");
        assert_eq!(GaugeKind::AsyncOps.max(), 10.0);
        assert_eq!(GaugeKind::Cpu.max(), 100.0);
        assert!(GaugeKind::AsyncOps.is_derived());
        assert!(!GaugeKind::Memory.is_derived());
    }

    #[test]
    fn index_matches_all_order() {
        for (i, kind) in GaugeKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn percent_scales_by_max() {
        let g = Gauge {
            kind: GaugeKind::AsyncOps,
            value: 2.0,
            max: 10.0,
        };
        assert_eq!(g.percent(), 20.0);
    }

    #[test]
    fn percent_zero_max() {
        let g = Gauge {
            kind: GaugeKind::Cpu,
            value: 5.0,
            max: 0.0,
        };
        assert_eq!(g.percent(), 0.0);
    }

    #[test]
    fn snapshot_lookup() {
        let snap = MetricSnapshot {
            gauges: vec![Gauge {
                kind: GaugeKind::Cpu,
                value: 60.0,
                max: 100.0,
            }],
        };
        assert_eq!(snap.value(GaugeKind::Cpu), 60.0);
        assert_eq!(snap.value(GaugeKind::Network), 0.0);
    }
}
