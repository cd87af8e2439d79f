//! Edge case tests
//!
//! Tests for unusual but valid switch data, and for the malformed data the
//! decoder must refuse.

use gs1200_exporter::error::ExporterError;
use gs1200_exporter::gs1200::{extract, payload, vlan, Endpoint, VlanEntry};
use gs1200_exporter::metrics::{DeviceMetric, MetricsCollector};
use gs1200_exporter::projection::{self, Observation};

const SYSTEM_JS: &str = include_str!("fixtures/system_data.js");
const LINK_JS: &str = include_str!("fixtures/link_data.js");
const VLAN_JS: &str = include_str!("fixtures/VLAN_1Q_List_data.js");

fn decode_all(system: &str, link: &str, vlans: &str) -> Result<Vec<Observation>, ExporterError> {
    let system = payload::decode(Endpoint::System, system)?;
    let link = payload::decode(Endpoint::Link, link)?;
    let vlans = payload::decode(Endpoint::Vlan, vlans)?;
    let state = extract::extract(&system, &link, &vlans)?;
    Ok(projection::project(&state))
}

fn speeds(observations: &[Observation]) -> Vec<&Observation> {
    observations
        .iter()
        .filter(|o| o.metric == DeviceMetric::Speed)
        .collect()
}

#[test]
fn test_all_ports_untagged_in_default_vlan() {
    // Given: Eight ports, all untagged members of VLAN 1
    let vlans = "var qvlans = [[1, 255, 0]];";

    // When: Projecting
    let observations = decode_all(SYSTEM_JS, LINK_JS, vlans).unwrap();

    // Then: Every port reports primary VLAN 1 and no tagged VLANs
    let speeds = speeds(&observations);
    assert_eq!(speeds.len(), 8);
    for speed in speeds {
        assert_eq!(speed.label("pvlan"), Some("1"));
        assert_eq!(speed.label("vlans"), Some(""));
    }
}

#[test]
fn test_speed_is_reported_in_bits_per_second() {
    // Given: Port 3 linked at 1000 Mbps
    let link = LINK_JS.replace(
        "var speed = new Array('1000','0','0'",
        "var speed = new Array('1000','0','1000'",
    );

    // When: Projecting
    let observations = decode_all(SYSTEM_JS, &link, VLAN_JS).unwrap();

    // Then: Port 3 reports 1e9 and ports that are down report 0
    let speeds = speeds(&observations);
    assert_eq!(speeds[2].label("port"), Some("port 3"));
    assert_eq!(speeds[2].value, 1e9);
    assert_eq!(speeds[1].value, 0.0);
}

#[test]
fn test_port_without_primary_vlan_reports_zero() {
    // Given: Port 2 is only a tagged member of VLAN 10
    let vlans = "var qvlans = [['1', '0xfd', '0x00'], ['10', '0x00', '0x02']];";

    // When: Projecting
    let observations = decode_all(SYSTEM_JS, LINK_JS, vlans).unwrap();

    // Then: Its primary VLAN label is 0
    let speeds = speeds(&observations);
    assert_eq!(speeds[1].label("pvlan"), Some("0"));
    assert_eq!(speeds[1].label("vlans"), Some("10"));
}

#[test]
fn test_empty_vlan_table() {
    let observations = decode_all(SYSTEM_JS, LINK_JS, "var qvlans = [];").unwrap();

    let vlan_count = observations.last().unwrap();
    assert_eq!(vlan_count.metric, DeviceMetric::NumVlans);
    assert_eq!(vlan_count.value, 0.0);
    assert_eq!(vlan_count.label("vlans"), Some(""));
}

#[test]
fn test_conflicting_untagged_claims_last_wins() {
    let vlans = [
        VlanEntry {
            id: 5,
            untagged_mask: 0b1,
            tagged_mask: 0,
        },
        VlanEntry {
            id: 7,
            untagged_mask: 0b1,
            tagged_mask: 0,
        },
    ];

    assert_eq!(vlan::resolve(0, &vlans).primary, Some(7));
}

#[test]
fn test_html_payload_is_always_session_invalid() {
    // Given: Any endpoint answered with a web page
    for endpoint in Endpoint::ALL {
        for page in [
            "<html><body>login</body></html>",
            "<HTML>\n<script>var x = 1;</script>\n</HTML>",
            "var Max_port = 8; </html>",
        ] {
            // When: Decoding
            let err = payload::decode(endpoint, page).unwrap_err();

            // Then: It is reported as a lost session, not a parse error
            assert!(
                matches!(err, ExporterError::SessionInvalid { .. }),
                "{endpoint}: {err}"
            );
        }
    }
}

#[test]
fn test_executable_code_is_rejected() {
    for script in [
        "var speed = alert(1);",
        "var speed = [1, 2]; document.location = 'x';",
        "var speed = 1 + 2;",
        "var speed = function() { return 1; };",
    ] {
        let err = payload::decode(Endpoint::Link, script).unwrap_err();
        assert!(
            matches!(err, ExporterError::MalformedPayload { .. }),
            "{script}: {err}"
        );
    }
}

#[test]
fn test_deeply_nested_arrays_are_rejected() {
    let script = format!("var Stats = {}{};", "[".repeat(200), "]".repeat(200));

    let err = payload::decode(Endpoint::Link, &script).unwrap_err();

    assert!(matches!(err, ExporterError::MalformedPayload { .. }));
}

#[test]
fn test_short_port_array_is_count_mismatch() {
    // Given: Eight ports but only five speeds
    let link = LINK_JS.replace(
        "var speed = new Array('1000','0','0','0','100','0','0','1000');",
        "var speed = new Array('1000','0','0','0','100');",
    );

    // When: Extracting
    let err = decode_all(SYSTEM_JS, &link, VLAN_JS).unwrap_err();

    // Then: Both counts are reported
    match err {
        ExporterError::FieldCountMismatch {
            field,
            expected,
            actual,
            ..
        } => {
            assert_eq!(field, "speed");
            assert_eq!(expected, 8);
            assert_eq!(actual, 5);
        }
        other => panic!("expected FieldCountMismatch, got {other}"),
    }
}

#[test]
fn test_missing_port_count_is_missing_field() {
    let system = SYSTEM_JS.replace("var Max_port = '8';", "");

    let err = decode_all(&system, LINK_JS, VLAN_JS).unwrap_err();

    assert!(matches!(err, ExporterError::MissingField { ref field, .. } if field == "Max_port"));
}

#[test]
fn test_non_numeric_port_count_is_type_mismatch() {
    let system = SYSTEM_JS.replace("var Max_port = '8';", "var Max_port = 'eight';");

    let err = decode_all(&system, LINK_JS, VLAN_JS).unwrap_err();

    assert!(matches!(err, ExporterError::TypeMismatch { .. }));
}

#[test]
fn test_out_of_range_vlan_id_is_type_mismatch() {
    let err = decode_all(SYSTEM_JS, LINK_JS, "var qvlans = [['4095', '0x01', '0x00']];").unwrap_err();

    assert!(matches!(err, ExporterError::TypeMismatch { .. }));
}

#[test]
fn test_very_large_counters() {
    // Given: A counter near the top of the 64-bit range
    let link = LINK_JS.replace(
        "[0, 123456789, 0, 1, 0, 0, 987654321, 0, 0, 0, 1]",
        "[0, 9007199254740991, 0, 0, 0, 0, 0, 0, 0, 0, 0]",
    );

    // When: Projecting
    let observations = decode_all(SYSTEM_JS, &link, VLAN_JS).unwrap();

    // Then: The value survives as a gauge
    let tx: Vec<f64> = observations
        .iter()
        .filter(|o| o.metric == DeviceMetric::PacketsTx)
        .map(|o| o.value)
        .collect();
    assert_eq!(tx[7], 9_007_199_254_740_991.0);
}

#[test]
fn test_label_values_with_special_characters() {
    // Given: A model name with quotes, a backslash and a newline
    let metrics = MetricsCollector::new().expect("Failed to create metrics");
    metrics
        .publish(&[Observation {
            metric: DeviceMetric::NumPorts,
            labels: vec![
                "GS1200 \"8\"".to_string(),
                "V1\\2".to_string(),
                "10.0.0.2".to_string(),
                "aa:bb".to_string(),
                "line\nbreak".to_string(),
            ],
            value: 8.0,
        }])
        .unwrap();

    // When: Rendering metrics
    let rendered = metrics.render().expect("Failed to render");

    // Then: Label values are escaped in the exposition format
    assert!(rendered.contains("model=\"GS1200 \\\"8\\\"\""));
    assert!(rendered.contains("firmware=\"V1\\\\2\""));
    assert!(rendered.contains("loop=\"line\\nbreak\""));
}
