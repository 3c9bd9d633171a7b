// tests/scheduler_properties.rs

//! Property tests for run planning: any acyclic registry yields a
//! topologically valid, stable plan.

use std::collections::HashSet;

use proptest::prelude::*;

use assetflow::dag::plan::plan;
use assetflow::registry::Registry;

// Strategy to generate a valid DAG-shaped registry.
// Acyclicity is ensured by only allowing task N to depend on tasks 0..N-1.
fn registry_strategy(max_tasks: usize) -> impl Strategy<Value = Registry> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        );

        deps_strat.prop_map(move |raw_deps| {
            let mut registry = Registry::new();
            for (i, potential_deps) in raw_deps.into_iter().enumerate() {
                let name = format!("task_{i}");

                // Sanitize dependencies: only allow deps < i.
                let mut valid: HashSet<usize> = HashSet::new();
                for dep_idx in potential_deps {
                    if i > 0 {
                        valid.insert(dep_idx % i);
                    }
                }

                let dep_names: Vec<String> =
                    valid.into_iter().map(|d| format!("task_{d}")).collect();
                let dep_refs: Vec<&str> = dep_names.iter().map(String::as_str).collect();

                registry
                    .register(&name, &dep_refs, |_ctx| Ok(()))
                    .expect("generated names are unique");
            }
            registry
        })
    })
}

proptest! {
    #[test]
    fn plans_are_topologically_valid(registry in registry_strategy(12)) {
        let last = registry.len() - 1;
        let target = format!("task_{last}");

        let plan = plan(&registry, &target).expect("generated registries are acyclic");
        let order: Vec<&str> = plan.ordered().collect();

        // Every task appears exactly once.
        let unique: HashSet<&str> = order.iter().copied().collect();
        prop_assert_eq!(unique.len(), order.len());

        // Every task appears after all of its prerequisites.
        for (idx, name) in order.iter().enumerate() {
            let def = registry.get(name).unwrap();
            for dep in def.deps.iter() {
                if let Some(dep_idx) = order.iter().position(|n| n == dep) {
                    prop_assert!(
                        dep_idx < idx,
                        "{} at {} must follow its prerequisite {} at {}",
                        name, idx, dep, dep_idx
                    );
                }
            }
        }
    }

    #[test]
    fn planning_is_deterministic(registry in registry_strategy(10)) {
        let last = registry.len() - 1;
        let target = format!("task_{last}");

        let first = plan(&registry, &target).unwrap();
        let second = plan(&registry, &target).unwrap();

        prop_assert_eq!(first.levels, second.levels);
    }
}
