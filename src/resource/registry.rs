//! Resource Registry - Load resource definitions from JSON
//!
//! The catalog of resource types is an embedded JSON file; each entry is
//! paired with the collector that implements it.

use super::collector::Collector;
use super::collectors;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded catalog (compiled into the binary)
const CATALOG: &str = include_str!("../resources/catalog.json");

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Worksheet name prefix; regional sheets append `_<region>`
    pub sheet_prefix: String,
    /// Fetched once per run instead of once per region
    #[serde(default)]
    pub is_global: bool,
    /// Region a global resource is queried in; `None` uses the provider default
    #[serde(default)]
    pub region: Option<String>,
}

/// Root structure of resources/catalog.json
#[derive(Debug, Clone, Deserialize)]
struct Catalog {
    resources: Vec<ResourceDef>,
}

/// Catalog entries in order, plus the collector for each key
pub struct Registry {
    pub resources: Vec<ResourceDef>,
    collectors: HashMap<&'static str, Box<dyn Collector>>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let catalog: Catalog = serde_json::from_str(CATALOG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded resource catalog: {}", e));
        let collectors = collectors::all()
            .into_iter()
            .map(|collector| (collector.key(), collector))
            .collect();

        Registry {
            resources: catalog.resources,
            collectors,
        }
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.iter().find(|r| r.key == key)
}

/// Get the collector implementing a resource key
pub fn get_collector(key: &str) -> Option<&'static dyn Collector> {
    get_registry().collectors.get(key).map(|c| c.as_ref())
}

/// Get all resource keys, in catalog order
pub fn get_all_resource_keys() -> Vec<&'static str> {
    get_registry()
        .resources
        .iter()
        .map(|r| r.key.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert_eq!(registry.resources.len(), 27, "Catalog should list 27 resource types");
    }

    #[test]
    fn test_catalog_and_collectors_correspond() {
        let catalog: HashSet<_> = get_all_resource_keys().into_iter().collect();
        let implemented: HashSet<_> = collectors::all().iter().map(|c| c.key()).collect();
        assert_eq!(catalog, implemented);
        for key in &catalog {
            assert!(get_collector(key).is_some(), "No collector for {}", key);
        }
    }

    #[test]
    fn test_catalog_order_matches_collector_order() {
        let implemented: Vec<_> = collectors::all().iter().map(|c| c.key()).collect();
        assert_eq!(get_all_resource_keys(), implemented);
    }

    #[test]
    fn test_global_resources() {
        let globals: Vec<_> = get_registry()
            .resources
            .iter()
            .filter(|r| r.is_global)
            .map(|r| (r.key.as_str(), r.region.as_deref()))
            .collect();
        assert_eq!(
            globals,
            vec![
                ("s3", Some("us-east-1")),
                ("global_accelerator", Some("us-west-2")),
                ("route53", None)
            ]
        );
    }

    #[test]
    fn test_sheet_prefixes() {
        assert_eq!(get_resource("nat_gateway").map(|r| r.sheet_prefix.as_str()), Some("NAT"));
        assert_eq!(
            get_resource("security_group_rules").map(|r| r.display_name.as_str()),
            Some("SecurityGroupRules")
        );
        assert!(get_resource("lambda").is_none());
    }
}
