// ABOUTME: Property tests for dependency layering over generated stack graphs.
// ABOUTME: Checks ordering, completeness, and minimal depth of every layer.

mod support;

use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use strata::config::Config;
use strata::layers::Layers;
use support::TEMPLATE;

/// Acyclic graphs: stack `sN` may only depend on stacks with a lower index.
fn dags() -> impl Strategy<Value = BTreeMap<String, Vec<String>>> {
    prop::collection::vec(prop::collection::vec(any::<bool>(), 10), 1..10).prop_map(|rows| {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let deps = (0..i).filter(|j| row[*j]).map(|j| format!("s{j}")).collect();
                (format!("s{i}"), deps)
            })
            .collect()
    })
}

fn to_config(graph: &BTreeMap<String, Vec<String>>) -> Config {
    let mut yaml = String::from("stacks:\n");
    for (name, deps) in graph {
        yaml.push_str(&format!(
            "  {name}:\n    template: {TEMPLATE}\n    dependencies: [{}]\n",
            deps.join(", ")
        ));
    }
    Config::from_yaml(&yaml).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_stack_lands_once_after_its_dependencies(graph in dags()) {
        let config = to_config(&graph);
        let layers = Layers::layered(&config.stacks, false).unwrap();

        let mut depth: HashMap<&str, usize> = HashMap::new();
        for (index, layer) in layers.iter().enumerate() {
            prop_assert!(!layer.is_empty());
            prop_assert!(layer.windows(2).all(|pair| pair[0] < pair[1]));
            for name in layer {
                prop_assert!(depth.insert(name.as_str(), index).is_none());
            }
        }
        prop_assert_eq!(depth.len(), graph.len());

        for (name, deps) in &graph {
            let expected = deps.iter().map(|dep| depth[dep.as_str()] + 1).max().unwrap_or(0);
            prop_assert_eq!(depth[name.as_str()], expected);
        }
    }
}

#[test]
fn back_edge_makes_a_cycle() {
    let yaml = format!(
        "stacks:\n  s0:\n    template: {TEMPLATE}\n    dependencies: [s2]\n  s1:\n    template: {TEMPLATE}\n    dependencies: [s0]\n  s2:\n    template: {TEMPLATE}\n    dependencies: [s1]\n"
    );
    let err = Config::from_yaml(&yaml).unwrap_err();
    assert!(err.to_string().contains("cycle"), "{err}");
}
