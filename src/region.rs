//! Region channel-plan contract consumed by the region-aware algorithm.
//!
//! The engine itself never inspects a channel plan; it only needs to know
//! the fastest enabled data rate it can reason about. That is derived here
//! from the host's region configuration service.

use lora_modulation::{Bandwidth, SpreadingFactor};

/// Modulation parameters of one uplink data rate index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataRateModulation {
    Lora { bandwidth: Bandwidth, spreading_factor: SpreadingFactor },
    Fsk { bit_rate: u32 },
}

/// A region's channel-plan configuration, as maintained by the host.
pub trait RegionConfiguration {
    /// Uplink data rate indices currently enabled by the channel plan.
    fn enabled_uplink_data_rates(&self) -> &[u8];

    /// Modulation parameters for a data rate index, or `None` when the index
    /// is not defined for this region.
    fn data_rate(&self, dr: u8) -> Option<DataRateModulation>;
}

/// Resolves the request's `region_config_id` to a [`RegionConfiguration`].
pub trait RegionLookup {
    fn get(&self, region_config_id: &str) -> Option<&dyn RegionConfiguration>;
}

/// The highest enabled data rate the step walk can reason about: LoRa
/// modulation on 125 kHz. Regions may enable FSK or 250 kHz data rates above
/// it, but the walk assumes the monotonic 125 kHz spreading-factor ladder.
pub fn max_lora_data_rate(configuration: &dyn RegionConfiguration) -> u8 {
    configuration
        .enabled_uplink_data_rates()
        .iter()
        .copied()
        .filter(|&dr| {
            matches!(
                configuration.data_rate(dr),
                Some(DataRateModulation::Lora { bandwidth: Bandwidth::_125KHz, .. })
            )
        })
        .max()
        .unwrap_or(0)
}
