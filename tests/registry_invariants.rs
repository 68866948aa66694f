//! Sweep over every embedded resource definition
//!
//! Guards the JSON definitions themselves: a broken path template or a
//! method typo should fail here rather than at request time.

use midaz_mcp::resource::{path_tokens, resolve_action, Component, HttpMethod, Registry};
use std::collections::BTreeSet;

fn registry() -> Registry {
    Registry::load().expect("embedded definitions should load")
}

#[test]
fn every_template_token_is_declared_and_vice_versa() {
    let registry = registry();

    for schema in registry.all_schemas() {
        for (name, action) in &schema.actions {
            let tokens: BTreeSet<&str> = path_tokens(&action.path).into_iter().collect();
            let declared: BTreeSet<&str> = action.path_params.keys().map(String::as_str).collect();
            assert_eq!(
                tokens, declared,
                "{}.{} path {} disagrees with its pathParams",
                schema.resource, name, action.path
            );
        }
    }
}

#[test]
fn every_path_is_versioned_and_absolute() {
    for schema in registry().all_schemas() {
        for (name, action) in &schema.actions {
            assert!(
                action.path.starts_with("/v1/"),
                "{}.{} has path {}",
                schema.resource,
                name,
                action.path
            );
        }
    }
}

#[test]
fn bodies_only_on_methods_that_send_them() {
    for schema in registry().all_schemas() {
        for (name, action) in &schema.actions {
            if action.input.is_some() {
                assert!(
                    action.method.sends_body(),
                    "{}.{} declares input on {}",
                    schema.resource,
                    name,
                    action.method
                );
            }
        }
    }
}

#[test]
fn count_actions_use_head() {
    for schema in registry().all_schemas() {
        if let Some(count) = schema.actions.get("count") {
            assert_eq!(count.method, HttpMethod::Head, "{}.count", schema.resource);
        }
    }
}

#[test]
fn endpoint_count_matches_action_sum() {
    let registry = registry();
    let sum: usize = registry.all_schemas().iter().map(|s| s.actions.len()).sum();
    assert_eq!(registry.endpoint_count(), sum);
    assert_eq!(registry.endpoint_count(), 91);
}

#[test]
fn every_component_serves_something() {
    let registry = registry();
    for component in Component::ALL {
        assert!(
            !registry.schemas_by_component(component).is_empty(),
            "{component} has no resources"
        );
    }
}

#[test]
fn every_action_resolves() {
    let registry = registry();
    for schema in registry.all_schemas() {
        for name in schema.action_names() {
            let resolved = resolve_action(&registry, &schema.resource, &name)
                .unwrap_or_else(|e| panic!("{}.{}: {}", schema.resource, name, e));
            assert_eq!(resolved.component, schema.component);
            for set in &schema.actions[&name].query_param_sets {
                let shared = registry.query_param_set(set).expect("set exists");
                for key in shared.keys() {
                    assert!(resolved.query_params.contains_key(key));
                }
            }
        }
    }
}
