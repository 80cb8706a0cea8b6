#![cfg_attr(not(test), no_std)]

//! Network-side Adaptive Data Rate (ADR) decision engine for LoRaWAN.
//!
//! Given a device's current radio parameters and a bounded window of uplink
//! reception history, an algorithm [`Handler`] computes the data rate,
//! TX-power index and redundancy count (NbTrans) the network should command
//! the device to use. Assembling the history window, encoding the resulting
//! `LinkADRReq` and scheduling evaluations are the host network server's
//! concern; each [`Handler::handle`] call is a pure function of its request.
//!
//! Two variants of the same decision core are shipped: [`DefaultAdr`] and the
//! region-aware [`LoraOnlyAdr`]. Both operate on LoRa 125 kHz data rates
//! only. Hosts with different deployment constraints can assemble their own
//! variant from [`Engine`].
//!
//! ## Feature flags
#![doc = document_features::document_features!(feature_label = r#"<span class="stab portability"><code>{feature}</code></span>"#)]

use heapless::Vec;

mod log;

mod engine;
pub use engine::{Engine, HistoryComparison, DEFAULT_REQUIRED_HISTORY_COUNT};

pub mod region;

mod algorithm;
pub use algorithm::{DefaultAdr, LoraOnlyAdr};

/// Capacity of the uplink history window. The host is expected to keep the
/// most recent uplinks only, discarding the oldest entry once full.
pub const MAX_UPLINK_HISTORY: usize = 20;

/// An ADR algorithm, registered with the host by [`id`](Handler::id) and
/// invoked once per uplink.
pub trait Handler {
    /// Machine-stable identifier under which the host registers the algorithm.
    fn id(&self) -> &'static str;

    /// Human-readable algorithm name.
    fn name(&self) -> &'static str;

    /// Run one ADR evaluation.
    fn handle(&self, request: &AdrRequest<'_>) -> Result<AdrResponse, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error {
    /// The request's `region_config_id` did not resolve to a known region
    /// configuration. There is no safe fallback DR ceiling, so the whole
    /// evaluation fails.
    UnknownRegionConfig,
}

/// Reception metadata of one uplink, newest entries appended last.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UplinkMetadata {
    /// Uplink frame counter.
    pub f_cnt: u32,
    /// Best SNR (dB) across the gateways that received this uplink.
    pub max_snr: f32,
    /// Best RSSI (dBm) across the gateways that received this uplink.
    pub max_rssi: i16,
    /// Number of gateways that received this uplink.
    pub gateway_count: u8,
    /// TX-power index the device was using when this uplink was sent.
    pub tx_power_index: u8,
}

/// One ADR evaluation request. Constructed by the host per uplink and
/// discarded after the [`Handler::handle`] call.
///
/// The serde field names (camelCase) are the wire contract with the host.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AdrRequest<'a> {
    /// Whether the device has ADR enabled. When false, the evaluation
    /// returns the current parameters unchanged.
    pub adr: bool,
    /// Current uplink data rate index.
    pub dr: u8,
    /// Lowest data rate index the device may be commanded to.
    ///
    /// Carried on the wire for contract completeness; the shipped algorithms
    /// do not step below DR 0 regardless.
    pub min_dr: u8,
    /// Device/regulatory data rate ceiling.
    pub max_dr: u8,
    /// Current TX-power index (0 = maximum power; a larger index is less
    /// power).
    pub tx_power_index: u8,
    /// Regulatory TX-power index ceiling.
    pub max_tx_power_index: u8,
    /// Current redundancy count, nominally 1..=3.
    pub nb_trans: u8,
    /// Minimum SNR (dB) required to reliably demodulate the current DR.
    pub required_snr_for_dr: f32,
    /// Extra safety margin (dB) configured for this installation.
    pub installation_margin: f32,
    /// Region configuration key, resolved through
    /// [`region::RegionLookup`]. Only the region-aware variant reads it.
    #[cfg_attr(feature = "serde", serde(borrow, default))]
    pub region_config_id: &'a str,
    /// Reception history of the most recent uplinks, oldest first.
    pub uplink_history: Vec<UplinkMetadata, MAX_UPLINK_HISTORY>,
}

/// Radio parameters the network should command the device to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AdrResponse {
    pub dr: u8,
    pub tx_power_index: u8,
    pub nb_trans: u8,
}

impl AdrResponse {
    /// A response that keeps the device's current parameters.
    pub fn unchanged(request: &AdrRequest<'_>) -> Self {
        Self {
            dr: request.dr,
            tx_power_index: request.tx_power_index,
            nb_trans: request.nb_trans,
        }
    }
}
