//! The shipped ADR algorithm variants.

use crate::engine::{Engine, HistoryComparison, DEFAULT_REQUIRED_HISTORY_COUNT};
use crate::log::trace;
use crate::region::{self, RegionLookup};
use crate::{AdrRequest, AdrResponse, Error, Handler};

/// The default ADR algorithm.
///
/// Uses the device's configured `max_dr` as the DR ceiling and allows the
/// TX-power walk all the way down to index 0.
pub struct DefaultAdr {
    engine: Engine,
}

impl DefaultAdr {
    pub const fn new() -> Self {
        Self {
            engine: Engine::new(DEFAULT_REQUIRED_HISTORY_COUNT, 0, HistoryComparison::AtLeast),
        }
    }
}

impl Default for DefaultAdr {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for DefaultAdr {
    fn id(&self) -> &'static str {
        "default-custom"
    }

    fn name(&self) -> &'static str {
        "Default ADR algorithm (LoRa only) custom"
    }

    fn handle(&self, request: &AdrRequest<'_>) -> Result<AdrResponse, Error> {
        if !request.adr {
            return Ok(AdrResponse::unchanged(request));
        }
        Ok(self.engine.run(request, request.max_dr))
    }
}

/// Region-aware variant for RN2483-class devices.
///
/// Some regions configure `max_dr` on a data rate the step walk cannot use
/// (FSK, or LoRa on 250 kHz), so the DR ceiling is narrowed to the fastest
/// enabled LoRa 125 kHz data rate of the region resolved through `P`.
/// The TX-power walk stops at index 1 rather than 0.
pub struct LoraOnlyAdr<P> {
    engine: Engine,
    regions: P,
}

impl<P: RegionLookup> LoraOnlyAdr<P> {
    pub const fn new(regions: P) -> Self {
        Self {
            engine: Engine::new(DEFAULT_REQUIRED_HISTORY_COUNT, 1, HistoryComparison::Exact),
            regions,
        }
    }
}

impl<P: RegionLookup> Handler for LoraOnlyAdr<P> {
    fn id(&self) -> &'static str {
        "alitecs-rn2483-adr"
    }

    fn name(&self) -> &'static str {
        "ALITECS RN2483 ADR algorithm (LoRa only)"
    }

    fn handle(&self, request: &AdrRequest<'_>) -> Result<AdrResponse, Error> {
        if !request.adr {
            return Ok(AdrResponse::unchanged(request));
        }

        let configuration = self
            .regions
            .get(request.region_config_id)
            .ok_or(Error::UnknownRegionConfig)?;
        let max_dr = request.max_dr.min(region::max_lora_data_rate(configuration));
        trace!("effective max dr: {}", max_dr);

        Ok(self.engine.run(request, max_dr))
    }
}
