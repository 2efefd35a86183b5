use crate::domain::model::{Hub, PostalCode};
use crate::utils::error::{Result, RouterError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// 內建的配送中心資料
const BUNDLED_HUBS: &[(&str, [&str; 5])] = &[
    ("Pune Main Nodal Center", ["411001", "411002", "411003", "411004", "411005"]),
    ("Mumbai Central Nodal Center", ["400001", "400016", "400020", "400021", "400022"]),
    ("Nagpur Regional Nodal Center", ["440001", "440002", "440003", "440004", "440005"]),
    ("Solapur Distribution Hub", ["413001", "413002", "413003", "413004", "413005"]),
    ("Aurangabad Logistics Park", ["431001", "431002", "431003", "431004", "431005"]),
    ("Kolhapur Delivery Center", ["416001", "416002", "416003", "416004", "416005"]),
    ("Thane West Sorting Office", ["400601", "400602", "400603", "400604", "400605"]),
    ("Nashik Main Post Office", ["422001", "422002", "422003", "422004", "422005"]),
    ("Amravati Camp Hub", ["444601", "444602", "444603", "444604", "444605"]),
    ("Akola City Dispatch", ["444001", "444002", "444003", "444004", "444005"]),
    ("Latur City Post Office", ["413512", "413513", "413514", "413515", "413516"]),
    ("Jalgaon City Delivery", ["425001", "425002", "425003", "425004", "425005"]),
    ("Parbhani City Post", ["431401", "431402", "431403", "431404", "431405"]),
    ("New Delhi Central Hub", ["110001", "110002", "110003", "110004", "110006"]),
    ("Bangalore MG Road Center", ["560001", "560002", "560003", "560004", "560005"]),
    ("Kolkata Park Street Hub", ["700001", "700016", "700017", "700018", "700019"]),
    ("Jaipur JLN Marg Center", ["302001", "302002", "302003", "302004", "302005"]),
    ("Ahmedabad MG Road Hub", ["380001", "380002", "380003", "380009", "380010"]),
    ("Hyderabad Sarojini Devi Hub", ["500001", "500002", "500003", "500004", "500005"]),
];

/// A code that a later hub also declared; the earlier hub keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConflict {
    pub code: PostalCode,
    pub kept_by: String,
    pub dropped_from: String,
}

/// Immutable hub → pincode mapping. Each code has exactly one owning hub.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    hubs: Vec<Hub>,
    owners: HashMap<PostalCode, usize>,
    conflicts: Vec<RegistryConflict>,
}

impl Registry {
    /// 依宣告順序建立 Registry；重複的郵遞區號歸第一個宣告的 hub
    pub fn from_hubs(hubs: impl IntoIterator<Item = Hub>) -> Self {
        let mut registry = Registry::default();

        for hub in hubs {
            let hub_index = registry.hubs.len();
            let mut owned = Vec::with_capacity(hub.postal_codes.len());

            for code in hub.postal_codes {
                match registry.owners.get(&code) {
                    Some(&owner) if owner == hub_index => {
                        // 同一個 hub 內的重複
                    }
                    Some(&owner) => {
                        let kept_by = registry.hubs[owner].name.clone();
                        tracing::warn!(
                            "⚠️ Pincode {} declared by both '{}' and '{}'; keeping '{}'",
                            code,
                            kept_by,
                            hub.name,
                            kept_by
                        );
                        registry.conflicts.push(RegistryConflict {
                            code,
                            kept_by,
                            dropped_from: hub.name.clone(),
                        });
                    }
                    None => {
                        registry.owners.insert(code.clone(), hub_index);
                        owned.push(code);
                    }
                }
            }

            registry.hubs.push(Hub {
                name: hub.name,
                postal_codes: owned,
            });
        }

        registry
    }

    pub fn bundled() -> Self {
        Self::from_hubs(BUNDLED_HUBS.iter().map(|(name, codes)| {
            Hub::new(
                *name,
                codes
                    .iter()
                    .filter_map(|code| PostalCode::parse(code)),
            )
        }))
    }

    pub fn hubs(&self) -> &[Hub] {
        &self.hubs
    }

    /// Owning hub of `code`, if any.
    pub fn owner(&self, code: &str) -> Option<&Hub> {
        let code = PostalCode::parse(code)?;
        self.owners.get(&code).map(|&index| &self.hubs[index])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.owner(code).is_some()
    }

    /// All codes, flattened in declaration order.
    pub fn codes(&self) -> impl Iterator<Item = &PostalCode> {
        self.hubs.iter().flat_map(|hub| hub.postal_codes.iter())
    }

    pub fn code_count(&self) -> usize {
        self.owners.len()
    }

    pub fn hub_count(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn conflicts(&self) -> &[RegistryConflict] {
        &self.conflicts
    }
}

/// Load-once / read-many handle. Refreshing swaps in a new snapshot; calls
/// already holding the old `Arc` finish against it.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Option<Arc<Registry>>>>,
}

impl SharedRegistry {
    pub fn unloaded() -> Self {
        Self::default()
    }

    pub fn loaded(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(registry)))),
        }
    }

    pub fn replace(&self, registry: Registry) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| RouterError::dependency("registry lock poisoned"))?;
        tracing::info!(
            "🔄 Registry refreshed: {} hubs, {} pincodes",
            registry.hub_count(),
            registry.code_count()
        );
        *guard = Some(Arc::new(registry));
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Arc<Registry>> {
        let guard = self
            .inner
            .read()
            .map_err(|_| RouterError::dependency("registry lock poisoned"))?;
        guard
            .clone()
            .ok_or_else(|| RouterError::dependency("pincode registry has not been loaded"))
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().map(|g| g.is_some()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> PostalCode {
        PostalCode::parse(s).unwrap()
    }

    #[test]
    fn test_bundled_registry_shape() {
        let registry = Registry::bundled();
        assert_eq!(registry.hub_count(), 19);
        assert_eq!(registry.code_count(), 95);
        assert!(registry.conflicts().is_empty());
        assert_eq!(
            registry.owner("411002").map(|h| h.name.as_str()),
            Some("Pune Main Nodal Center")
        );
        assert_eq!(registry.codes().next().map(|c| c.as_str()), Some("411001"));
    }

    #[test]
    fn test_first_declared_hub_wins_on_duplicate() {
        let registry = Registry::from_hubs(vec![
            Hub::new("Alpha", vec![code("111111"), code("222222")]),
            Hub::new("Beta", vec![code("222222"), code("333333")]),
        ]);

        assert_eq!(registry.owner("222222").unwrap().name, "Alpha");
        assert_eq!(registry.hubs()[1].postal_codes, vec![code("333333")]);
        assert_eq!(
            registry.conflicts(),
            &[RegistryConflict {
                code: code("222222"),
                kept_by: "Alpha".to_string(),
                dropped_from: "Beta".to_string(),
            }]
        );
    }

    #[test]
    fn test_duplicate_within_hub_is_collapsed() {
        let registry = Registry::from_hubs(vec![Hub::new(
            "Alpha",
            vec![code("111111"), code("111111")],
        )]);
        assert_eq!(registry.code_count(), 1);
        assert_eq!(registry.hubs()[0].postal_codes.len(), 1);
        assert!(registry.conflicts().is_empty());
    }

    #[test]
    fn test_owner_rejects_malformed() {
        let registry = Registry::bundled();
        assert!(registry.owner("41100").is_none());
        assert!(registry.owner("").is_none());
        assert!(!registry.contains("411099"));
    }

    #[test]
    fn test_shared_registry_unloaded_is_dependency_failure() {
        let shared = SharedRegistry::unloaded();
        assert!(!shared.is_loaded());
        let err = shared.snapshot().unwrap_err();
        assert!(matches!(err, RouterError::DependencyFailure { .. }));

        shared.replace(Registry::bundled()).unwrap();
        assert!(shared.is_loaded());
        assert_eq!(shared.snapshot().unwrap().hub_count(), 19);
    }
}
