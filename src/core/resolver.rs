use crate::core::registry::Registry;
use crate::domain::model::Hub;

/// 找不到配送中心時回傳的標籤
pub const NOT_FOUND_LABEL: &str = "Nodal Center Not Found";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HubLookup<'r> {
    Found(&'r Hub),
    NotFound,
}

impl<'r> HubLookup<'r> {
    pub fn hub(&self) -> Option<&'r Hub> {
        match self {
            Self::Found(hub) => Some(hub),
            Self::NotFound => None,
        }
    }

    pub fn label(&self) -> &'r str {
        match self {
            Self::Found(hub) => hub.name.as_str(),
            Self::NotFound => NOT_FOUND_LABEL,
        }
    }
}

/// Maps a pincode to the hub that owns it. Unknown or malformed codes are a
/// normal `NotFound`, not an error.
pub struct HubResolver<'r> {
    registry: &'r Registry,
}

impl<'r> HubResolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, code: &str) -> HubLookup<'r> {
        match self.registry.owner(code) {
            Some(hub) => HubLookup::Found(hub),
            None => HubLookup::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_code() {
        let registry = Registry::bundled();
        let lookup = HubResolver::new(&registry).resolve("400016");
        assert_eq!(lookup.label(), "Mumbai Central Nodal Center");
        assert!(lookup.hub().is_some());
    }

    #[test]
    fn test_resolve_unknown_code() {
        let registry = Registry::bundled();
        let resolver = HubResolver::new(&registry);
        assert_eq!(resolver.resolve("999999"), HubLookup::NotFound);
        assert_eq!(resolver.resolve("999999").label(), NOT_FOUND_LABEL);
        assert_eq!(resolver.resolve(""), HubLookup::NotFound);
        assert_eq!(resolver.resolve("abc"), HubLookup::NotFound);
    }
}
