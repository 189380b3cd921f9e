use crate::model::{Channel, Tier};
use log::warn;
use serde::{Deserialize, Serialize};

/// Work hours needed to serve `volume` interactions:
/// `volume * aht_seconds / 3600 / concurrency`.
///
/// A non-positive concurrency produces zero workload rather than a division
/// by zero; negative volume or AHT count as zero.
pub fn workload_hours(volume: f64, aht_seconds: f64, concurrency: f64) -> f64 {
    if !concurrency.is_finite() || concurrency <= 0.0 {
        warn!("concurrency {concurrency} is not positive; workload forced to zero");
        return 0.0;
    }
    let volume = volume.max(0.0);
    let aht_seconds = aht_seconds.max(0.0);
    (volume * aht_seconds) / 3600.0 / concurrency
}

/// One channel's demand within a tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelWorkload {
    pub tier: Tier,
    pub channel: Channel,
    pub volume: f64,
    pub aht_seconds: f64,
}

impl ChannelWorkload {
    pub fn new(tier: Tier, channel: Channel, volume: f64, aht_seconds: f64) -> Self {
        Self {
            tier,
            channel,
            volume,
            aht_seconds,
        }
    }

    /// Same record with its volume multiplied by `1 + growth_rate`.
    pub fn grown(&self, growth_rate: f64) -> Self {
        Self {
            volume: self.volume * (1.0 + growth_rate),
            ..self.clone()
        }
    }

    pub fn hours(&self, concurrency: f64) -> f64 {
        workload_hours(self.volume, self.aht_seconds, concurrency)
    }
}

/// Sum of the workloads of every channel belonging to `tier`.
pub fn tier_workload(channels: &[ChannelWorkload], tier: Tier, concurrency: f64) -> f64 {
    channels
        .iter()
        .filter(|c| c.tier == tier)
        .map(|c| c.hours(concurrency))
        .sum()
}

/// Total volume of `tier` across its channels.
pub fn tier_volume(channels: &[ChannelWorkload], tier: Tier) -> f64 {
    channels
        .iter()
        .filter(|c| c.tier == tier)
        .map(|c| c.volume.max(0.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_matches_reference_scenario() {
        let hours = workload_hours(11691.0, 3731.0, 2.0);
        assert!((hours - 6058.21125).abs() < 1e-6);
    }

    #[test]
    fn tier_workload_sums_channels() {
        let channels = vec![
            ChannelWorkload::new(Tier::Primary, Channel::Email, 1000.0, 360.0),
            ChannelWorkload::new(Tier::Primary, Channel::Chat, 500.0, 720.0),
            ChannelWorkload::new(Tier::Secondary, Channel::Email, 99.0, 9999.0),
        ];
        // 100h + 100h at concurrency 1, halved at 2.
        assert!((tier_workload(&channels, Tier::Primary, 2.0) - 100.0).abs() < 1e-9);
        assert_eq!(tier_volume(&channels, Tier::Primary), 1500.0);
    }

    #[test]
    fn non_positive_concurrency_yields_zero() {
        assert_eq!(workload_hours(100.0, 300.0, 0.0), 0.0);
        assert_eq!(workload_hours(100.0, 300.0, -1.0), 0.0);
    }

    #[test]
    fn growth_scales_volume_only() {
        let base = ChannelWorkload::new(Tier::Secondary, Channel::Chat, 200.0, 1500.0);
        let grown = base.grown(0.10);
        assert!((grown.volume - 220.0).abs() < 1e-9);
        assert_eq!(grown.aht_seconds, 1500.0);
    }
}
