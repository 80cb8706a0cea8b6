//! The decision core shared by all shipped algorithm variants.
//!
//! The historical implementations of this algorithm diverged in two details:
//! the index at which the TX-power walk stops, and whether the per-power-level
//! history check requires exactly or at least the required count. Both are
//! explicit [`Engine`] parameters here instead of separate code paths.

use crate::log::debug;
use crate::{AdrRequest, AdrResponse, UplinkMetadata};

/// Number of uplinks that must be observed before the engine trusts its
/// packet-loss estimate or allows a TX-power increase.
pub const DEFAULT_REQUIRED_HISTORY_COUNT: usize = 20;

/// SNR margin (dB) consumed by one DR/TX-power step.
const STEP_SIZE_DB: f32 = 3.0;

/// New NbTrans, indexed by packet-loss bucket and `current NbTrans - 1`.
/// Low loss pulls the redundancy down toward 1 to save airtime; high loss
/// pushes it toward 3.
const NB_TRANS_TABLE: [[u8; 3]; 4] = [
    [1, 1, 2], // loss < 5%
    [1, 2, 3], // loss < 10%
    [2, 3, 3], // loss < 30%
    [3, 3, 3], // loss >= 30%
];

/// How the count of uplinks received at the current TX-power index is
/// compared against the required history count when a TX-power increase is
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum HistoryComparison {
    /// Proceed only when exactly the required count was observed.
    Exact,
    /// Proceed once at least the required count was observed.
    AtLeast,
}

/// The parameterized ADR decision core.
///
/// [`run`](Engine::run) is a pure function of the request and the effective
/// max DR; resolving that ceiling (possibly region-narrowed) and the
/// ADR-enabled check are the calling [`Handler`](crate::Handler)'s job.
#[derive(Debug, Clone)]
pub struct Engine {
    required_history_count: usize,
    tx_power_floor: u8,
    history_comparison: HistoryComparison,
}

impl Engine {
    pub const fn new(
        required_history_count: usize,
        tx_power_floor: u8,
        history_comparison: HistoryComparison,
    ) -> Self {
        Self { required_history_count, tx_power_floor, history_comparison }
    }

    /// Run one evaluation against `max_dr`, the effective data rate ceiling.
    pub fn run(&self, request: &AdrRequest<'_>, max_dr: u8) -> AdrResponse {
        let mut response = AdrResponse::unchanged(request);

        // Lower the DR only if it exceeds the max allowed DR.
        if response.dr > max_dr {
            response.dr = max_dr;
        }

        response.nb_trans =
            nb_trans(request.nb_trans, self.packet_loss_rate(&request.uplink_history));

        let snr_margin = max_snr(&request.uplink_history)
            - request.required_snr_for_dr
            - request.installation_margin;
        // Truncation toward zero: a margin of -5 dB is a single step down.
        let n_step = (snr_margin / STEP_SIZE_DB) as i32;
        debug!("snr margin: {}, steps: {}", snr_margin, n_step);

        // Negative steps raise the TX power. Hold off until enough uplinks
        // were received at the current power level, to avoid up/down/up
        // oscillation while history is still accumulating there.
        if n_step < 0 && !self.sufficient_history_at_power(request) {
            debug!("deferring tx power increase until history accumulates");
            return response;
        }

        let (tx_power_index, dr) = self.ideal_tx_power_and_dr(
            n_step,
            response.tx_power_index,
            response.dr,
            request.max_tx_power_index,
            max_dr,
        );
        response.tx_power_index = tx_power_index;
        response.dr = dr;
        response
    }

    /// Packet-loss percentage over the history window, derived from frame
    /// counter gaps. Returns 0.0 until the window is full enough to trust.
    fn packet_loss_rate(&self, history: &[UplinkMetadata]) -> f32 {
        if history.len() < self.required_history_count {
            return 0.0;
        }

        let mut lost_packets: u32 = 0;
        let mut previous_f_cnt = 0;
        for (i, uplink) in history.iter().enumerate() {
            if i > 0 {
                // Consecutive uplinks are expected to differ by exactly one
                // frame counter. Out-of-order entries count as no loss.
                let delta = i64::from(uplink.f_cnt) - i64::from(previous_f_cnt) - 1;
                lost_packets += delta.max(0) as u32;
            }
            previous_f_cnt = uplink.f_cnt;
        }

        lost_packets as f32 / history.len() as f32 * 100.0
    }

    fn sufficient_history_at_power(&self, request: &AdrRequest<'_>) -> bool {
        let count = request
            .uplink_history
            .iter()
            .filter(|uplink| uplink.tx_power_index == request.tx_power_index)
            .count();
        match self.history_comparison {
            HistoryComparison::Exact => count == self.required_history_count,
            HistoryComparison::AtLeast => count >= self.required_history_count,
        }
    }

    /// Walk DR and TX-power index one step at a time until the step count is
    /// consumed. Exactly one of the two fields changes per iteration, and the
    /// walk direction never changes mid-walk.
    fn ideal_tx_power_and_dr(
        &self,
        mut n_step: i32,
        mut tx_power_index: u8,
        mut dr: u8,
        max_tx_power_index: u8,
        max_dr: u8,
    ) -> (u8, u8) {
        while n_step != 0 {
            if n_step > 0 {
                if dr < max_dr {
                    // Increase the DR.
                    dr += 1;
                } else if tx_power_index < max_tx_power_index {
                    // Decrease the TX power (a higher index is less power).
                    tx_power_index += 1;
                }
                n_step -= 1;
            } else {
                if tx_power_index > self.tx_power_floor {
                    // Increase the TX power (a lower index is more power).
                    tx_power_index -= 1;
                } else {
                    // Already at the power floor; buy the remaining link
                    // budget with a lower DR.
                    dr = dr.saturating_sub(1);
                }
                n_step += 1;
            }
        }
        (tx_power_index, dr)
    }
}

/// Best SNR observed anywhere in the window. With no history this is low
/// enough that the margin can never turn positive.
fn max_snr(history: &[UplinkMetadata]) -> f32 {
    history.iter().fold(-999.0, |max, uplink| max.max(uplink.max_snr))
}

fn nb_trans(current_nb_trans: u8, pkt_loss_rate: f32) -> u8 {
    let nb_trans = current_nb_trans.clamp(1, 3) as usize;
    let bucket = if pkt_loss_rate < 5.0 {
        0
    } else if pkt_loss_rate < 10.0 {
        1
    } else if pkt_loss_rate < 30.0 {
        2
    } else {
        3
    };
    NB_TRANS_TABLE[bucket][nb_trans - 1]
}
