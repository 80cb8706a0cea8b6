use heapless::Vec;
use lorawan_adr::{
    AdrRequest, AdrResponse, DefaultAdr, Handler, UplinkMetadata, MAX_UPLINK_HISTORY,
};

fn uplink(f_cnt: u32, max_snr: f32, tx_power_index: u8) -> UplinkMetadata {
    UplinkMetadata { f_cnt, max_snr, max_rssi: -110, gateway_count: 2, tx_power_index }
}

#[test]
fn device_close_to_gateway_steps_up() {
    // A single strong uplink: loss stays at the optimistic 0% (window not
    // full), NbTrans stays at 1, and a 15 dB margin yields five steps.
    let req = AdrRequest {
        adr: true,
        dr: 1,
        min_dr: 0,
        max_dr: 5,
        tx_power_index: 0,
        max_tx_power_index: 15,
        nb_trans: 1,
        required_snr_for_dr: -17.5,
        installation_margin: 10.0,
        region_config_id: "",
        uplink_history: Vec::from_slice(&[uplink(10, 7.5, 0)]).unwrap(),
    };

    let resp = DefaultAdr::new().handle(&req).unwrap();
    // Four steps raise the DR to its ceiling, the fifth lowers TX power.
    assert_eq!(resp, AdrResponse { dr: 5, tx_power_index: 1, nb_trans: 1 });
}

#[test]
fn lossy_link_raises_power_and_redundancy() {
    // A full window at the current power level, with seven packets lost
    // (35%) and weak SNR. NbTrans jumps to 3 and the -17 dB margin walks
    // power up first, then the DR down.
    let mut uplink_history: Vec<UplinkMetadata, MAX_UPLINK_HISTORY> = Vec::new();
    for i in 0..20u32 {
        // A gap of eight after the twelfth uplink: seven packets lost.
        let f_cnt = if i < 12 { i } else { i + 7 };
        uplink_history.push(uplink(f_cnt, -12.0, 2)).unwrap();
    }

    let req = AdrRequest {
        adr: true,
        dr: 3,
        min_dr: 0,
        max_dr: 5,
        tx_power_index: 2,
        max_tx_power_index: 15,
        nb_trans: 1,
        required_snr_for_dr: -5.0,
        installation_margin: 10.0,
        region_config_id: "",
        uplink_history,
    };

    let resp = DefaultAdr::new().handle(&req).unwrap();
    assert_eq!(resp.nb_trans, 3);
    // Five steps down: TX power 2 -> 0, then DR 3 -> 0.
    assert_eq!(resp.tx_power_index, 0);
    assert_eq!(resp.dr, 0);
}

#[test]
fn output_respects_ceilings_for_large_margins() {
    let req = AdrRequest {
        adr: true,
        dr: 4,
        min_dr: 0,
        max_dr: 5,
        tx_power_index: 0,
        max_tx_power_index: 3,
        nb_trans: 1,
        required_snr_for_dr: -20.0,
        installation_margin: 0.0,
        region_config_id: "",
        uplink_history: Vec::from_slice(&[uplink(1, 12.0, 0)]).unwrap(),
    };

    // margin = 32 dB => ten steps, far more than the ceilings allow.
    let resp = DefaultAdr::new().handle(&req).unwrap();
    assert_eq!(resp.dr, 5);
    assert_eq!(resp.tx_power_index, 3);
}

#[cfg(feature = "serde")]
mod wire {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_deserializes_from_host_field_names() {
        // Extra host fields (devEui, regionName, ...) are ignored.
        let raw = r#"{
            "regionName": "eu868",
            "regionConfigId": "eu868",
            "devEui": "0102030405060708",
            "macVersion": "1.0.3",
            "adr": true,
            "dr": 1,
            "txPowerIndex": 0,
            "nbTrans": 1,
            "minDr": 0,
            "maxDr": 5,
            "maxTxPowerIndex": 15,
            "requiredSnrForDr": -17.5,
            "installationMargin": 10,
            "uplinkHistory": [
                {"fCnt": 10, "maxSnr": 7.5, "maxRssi": -110, "txPowerIndex": 0, "gatewayCount": 3}
            ]
        }"#;

        let req: AdrRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.region_config_id, "eu868");
        assert_eq!(req.dr, 1);
        assert_eq!(req.max_tx_power_index, 15);
        assert_eq!(req.required_snr_for_dr, -17.5);
        assert_eq!(req.uplink_history.len(), 1);
        assert_eq!(req.uplink_history[0].f_cnt, 10);
        assert_eq!(req.uplink_history[0].gateway_count, 3);

        let resp = DefaultAdr::new().handle(&req).unwrap();
        assert_eq!(
            serde_json::to_value(resp).unwrap(),
            json!({"dr": 5, "txPowerIndex": 1, "nbTrans": 1})
        );
    }
}
