//! Pool lookups by name and namespace
//!
//! Linear scans over read-only snapshots. `find_unit` hands back a borrow of
//! the pool element itself, so the result lives as long as the pool.

use crate::models::{DeploymentUnit, HelmReleaseIdentity};

/// Whether a release with this exact name and namespace exists
pub fn find_identity(pool: &[HelmReleaseIdentity], name: &str, namespace: &str) -> bool {
    pool.iter()
        .any(|release| release.name == name && release.namespace == namespace)
}

/// The first unit with this exact name and namespace
pub fn find_unit<'a>(
    pool: &'a [DeploymentUnit],
    name: &str,
    namespace: &str,
) -> Option<&'a DeploymentUnit> {
    pool.iter()
        .find(|unit| unit.name == name && unit.namespace == namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InventoryEntry;

    #[test]
    fn test_find_identity() {
        let pool = vec![
            HelmReleaseIdentity::new("release", "test"),
            HelmReleaseIdentity::new("release", "test"),
            HelmReleaseIdentity::new("other", "prod"),
        ];
        assert!(find_identity(&pool, "release", "test"));
        assert!(find_identity(&pool, "other", "prod"));
        assert!(!find_identity(&pool, "release", "prod"));
        assert!(!find_identity(&[], "release", "test"));
    }

    #[test]
    fn test_find_unit_returns_pool_element() {
        let pool = vec![
            DeploymentUnit::new("infra", "flux-system", None),
            DeploymentUnit::new(
                "apps",
                "flux-system",
                Some(vec![InventoryEntry::new("default_web_apps_Deployment")]),
            ),
        ];

        let unit = find_unit(&pool, "apps", "flux-system").unwrap();
        assert!(std::ptr::eq(unit, &pool[1]));
        assert!(unit.contains("default_web_apps_Deployment"));

        assert!(find_unit(&pool, "apps", "default").is_none());
    }
}
