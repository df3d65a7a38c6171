//! Structural properties of generated networks and network effects.

use agora_core::types::*;
use agora_runtime::network::{AgentNetwork, NetworkConfig};
use std::collections::BTreeMap;

const ALL_TYPES: [NetworkType; 6] = [
    NetworkType::Hierarchical,
    NetworkType::Random,
    NetworkType::SmallWorld,
    NetworkType::ScaleFree,
    NetworkType::Clustered,
    NetworkType::Complete,
];

fn values(agents: &[&str], resource: &str, x: f64) -> AgentValues {
    agents
        .iter()
        .map(|a| (AgentId::new(*a), BTreeMap::from([(resource.to_string(), x)])))
        .collect()
}

#[test]
fn generators_produce_declared_sizes_without_self_loops() {
    for network_type in ALL_TYPES {
        let net = AgentNetwork::new("g", network_type, NetworkConfig::default().with_seed(3));
        let expected = match network_type {
            NetworkType::Hierarchical => 15,
            _ => 20,
        };
        assert_eq!(net.agent_count(), expected, "{}", network_type);
        assert!(
            net.connections().iter().all(|(a, b, _)| a != b),
            "{} produced a self-loop",
            network_type
        );
        assert_eq!(net.connections().len(), net.connection_count());
    }
}

#[test]
fn seeded_generation_is_reproducible() {
    for network_type in ALL_TYPES {
        let config = NetworkConfig::default().with_seed(99);
        let a = AgentNetwork::new("a", network_type, config.clone());
        let b = AgentNetwork::new("b", network_type, config);
        assert_eq!(a.connections(), b.connections(), "{}", network_type);
    }
}

#[test]
fn growth_never_duplicates_agents() {
    for network_type in ALL_TYPES {
        let mut net = AgentNetwork::new("g", network_type, NetworkConfig::default().with_seed(5));
        let before = net.agent_count();
        assert!(net.add_agent("newcomer", AgentAttributes::default()));
        let edges = net.connection_count();
        assert!(!net.add_agent("newcomer", AgentAttributes::default()));
        assert_eq!(net.agent_count(), before + 1);
        assert_eq!(net.connection_count(), edges);
        assert!(!net.has_connection(&"newcomer".into(), &"newcomer".into()));
    }
}

#[test]
fn connections_are_symmetric() {
    let mut net = AgentNetwork::new("s", NetworkType::Random, NetworkConfig::empty());
    net.add_connection("a", "b", 0.7);
    assert_eq!(net.connection_weight(&"b".into(), &"a".into()), Some(0.7));
    assert!(net.update_connection(&"b".into(), &"a".into(), 0.2));
    assert_eq!(net.connection_weight(&"a".into(), &"b".into()), Some(0.2));
    assert!(net.remove_connection(&"a".into(), &"b".into()));
    assert!(!net.has_connection(&"b".into(), &"a".into()));
    assert_eq!(net.agent_count(), 2);
}

#[test]
fn complete_direct_effect_boosts_every_agent() {
    let mut net = AgentNetwork::new("k4", NetworkType::Complete, NetworkConfig::empty());
    for id in ["a", "b", "c", "d"] {
        net.add_agent(id, AgentAttributes::default());
    }
    assert_eq!(net.connection_count(), 6);

    net.add_network_effect("metcalfe", 0.5, EffectKind::direct(&["x"]));
    let input = values(&["a", "b", "c", "d"], "x", 10.0);
    let output = net.apply_network_effects(&input);

    for id in ["a", "b", "c", "d"] {
        assert!((output[&AgentId::new(id)]["x"] - 10.2).abs() < 1e-9);
        assert_eq!(input[&AgentId::new(id)]["x"], 10.0);
    }
}

#[test]
fn zero_strength_effects_are_identity() {
    let mut net = AgentNetwork::new("sw", NetworkType::SmallWorld, NetworkConfig::default().with_seed(8));
    for (i, kind) in [
        EffectKind::direct(&["x"]),
        EffectKind::indirect("x", &["y"]),
        EffectKind::local(&["x"]),
        EffectKind::learning(&["x"]),
        EffectKind::coordination(&["x"]),
        EffectKind::congestion(&["x"]),
    ]
    .into_iter()
    .enumerate()
    {
        net.add_network_effect(format!("e{}", i), 0.0, kind);
    }

    let mut input = AgentValues::new();
    for agent in net.agents() {
        input.insert(agent, BTreeMap::from([("x".to_string(), 500.0), ("y".to_string(), 3.0)]));
    }
    let output = net.apply_network_effects(&input);
    assert_eq!(output, input);
}

#[test]
fn inactive_effects_are_skipped() {
    let mut net = AgentNetwork::new("k", NetworkType::Complete, NetworkConfig::default().with_initial_nodes(5));
    net.add_network_effect("m", 1.0, EffectKind::direct(&["x"]));
    assert!(net.set_effect_active("m", false));
    assert!(!net.set_effect_active("missing", false));

    let input = values(&["0", "1"], "x", 4.0);
    assert_eq!(net.apply_network_effects(&input), input);
}

#[test]
fn congestion_never_increases_or_collapses_values() {
    let mut net = AgentNetwork::new("c", NetworkType::Complete, NetworkConfig::default().with_initial_nodes(3));
    net.add_network_effect("jam", 1.0, EffectKind::congestion(&["bw"]));

    for load in [1.0, 50.0, 500.0, 50_000.0] {
        let input = values(&["0", "1", "2"], "bw", load);
        let output = net.apply_network_effects(&input);
        for agent in ["0", "1", "2"] {
            let v = output[&AgentId::new(agent)]["bw"];
            assert!(v <= load + 1e-12);
            assert!(v >= 0.1 * load - 1e-12);
        }
    }
}

#[test]
fn learning_effect_writes_knowledge_levels() {
    let mut net = AgentNetwork::new("l", NetworkType::Random, NetworkConfig::empty());
    net.add_agent("mentor", AgentAttributes::default().with_knowledge_level(1.0));
    net.add_agent("pupil", AgentAttributes::default().with_knowledge_level(0.0));
    net.add_connection("mentor", "pupil", 1.0);
    net.add_network_effect("study", 0.5, EffectKind::learning(&["x"]));

    net.apply_network_effects(&values(&["mentor", "pupil"], "x", 1.0));
    let pupil = net.agent_attributes(&"pupil".into()).unwrap().knowledge_level.unwrap();
    assert!(pupil > 0.0 && pupil <= 1.0);
}

#[test]
fn clustered_growth_labels_every_agent() {
    let config = NetworkConfig::empty().with_seed(13);
    let clusters = config.clusters;
    let mut net = AgentNetwork::new("grown", NetworkType::Clustered, config);

    for i in 0..12 {
        assert!(net.add_agent(format!("agent-{}", i), AgentAttributes::default()));
    }
    for agent in net.agents() {
        let cluster = net.agent_attributes(&agent).unwrap().cluster;
        assert!(matches!(cluster, Some(c) if c < clusters), "{} has {:?}", agent, cluster);
    }
}
