//! Property tests for the row pipeline

use ospf_linkd::{
    DiscoveryConfig, InMemoryRegistry, LinkDiscovery, PlainTextParser, StaticSession,
};
use proptest::prelude::*;
use std::sync::Arc;
use topo_types::{annotation_keys, DeviceId, PortDescription, PortNumber};

/// Every 10.0.0.x router is registered, so only the row itself decides
/// whether a link comes out.
fn discovery() -> LinkDiscovery {
    let registry = InMemoryRegistry::new();
    for host in 0..=255u8 {
        let id: DeviceId = format!("netconf:10.0.0.{}:22", host).parse().unwrap();
        registry.register_device(
            id,
            vec![
                PortDescription::new(PortNumber::new(1), true)
                    .with_annotation(annotation_keys::PORT_IP, format!("172.16.0.{}/24", host)),
            ],
        );
    }
    LinkDiscovery::new(
        "netconf:10.255.0.1:22".parse().unwrap(),
        Arc::new(StaticSession::new("")),
        Arc::new(PlainTextParser),
        Arc::new(registry),
        DiscoveryConfig::default(),
    )
}

fn non_full_state() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("DOWN".to_string()),
        Just("INIT/DROTHER".to_string()),
        Just("2WAY/DROTHER".to_string()),
        Just("EXSTART/DR".to_string()),
        Just("EXCHANGE/BDR".to_string()),
        Just("LOADING/DR".to_string()),
        "[A-Z0-9/]{1,12}".prop_filter("must not contain FULL", |s| !s.contains("FULL")),
    ]
}

fn full_row() -> impl Strategy<Value = String> {
    (any::<u8>(), 1u64..64, prop_oneof![Just("DR"), Just("BDR"), Just("DROTHER"), Just("-")])
        .prop_map(|(host, port, role)| {
            format!(
                "10.0.0.{}  1  FULL/{}  00:00:31  172.16.0.{}  GigabitEthernet{}",
                host, role, host, port
            )
        })
}

proptest! {
    #[test]
    fn test_non_full_rows_never_yield_links(
        host in any::<u8>(),
        state in non_full_state(),
        port in 1u64..64,
    ) {
        let row = format!(
            "10.0.0.{}  1  {}  00:00:31  172.16.0.{}  GigabitEthernet{}",
            host, state, host, port
        );
        prop_assert!(discovery().assemble_links(&row).is_empty());
    }

    #[test]
    fn test_wrong_column_count_never_yields_links(
        tokens in prop::collection::vec("[A-Za-z0-9./:]{1,16}", 0..12usize)
            .prop_filter("must not have six columns", |t| t.len() != 6),
    ) {
        let row = tokens.join(" ");
        prop_assert!(discovery().assemble_links(&row).is_empty());
    }

    #[test]
    fn test_full_rows_resolve(row in full_row()) {
        let links = discovery().assemble_links(&row);
        prop_assert_eq!(links.len(), 1);
        let link = links.iter().next().unwrap();
        prop_assert_eq!(link.dst.port, PortNumber::new(1));
    }

    #[test]
    fn test_assembly_is_idempotent(rows in prop::collection::vec(full_row(), 0..16)) {
        let block = rows.join("\n");
        let discovery = discovery();
        prop_assert_eq!(discovery.assemble_links(&block), discovery.assemble_links(&block));

        // order and repetition of rows do not change the result
        let mut doubled: Vec<String> = rows.iter().rev().cloned().collect();
        doubled.extend(rows.iter().cloned());
        prop_assert_eq!(discovery.assemble_links(&doubled.join("\n")), discovery.assemble_links(&block));
    }
}
