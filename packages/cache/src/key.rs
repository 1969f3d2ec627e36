//! Typed cache keys. Every key the portal reads or deletes is built here,
//! so the invalidation set for a write can be listed exactly.

use std::fmt;

use works_portal_report_models::Domain;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `<domain>:list`, the unfiltered first page.
    List(Domain),
    /// `<domain>:stats`
    Stats(Domain),
    /// `<domain>:<id>`
    Detail(Domain, String),
    /// `<domain>:overview:<scope>`
    Overview(Domain, &'static str),
    /// `bina-marga:emergency`
    RoadEmergency,
    /// `water-resources:urgent`
    WaterUrgent,
}

impl CacheKey {
    /// Every key a write to `domain` makes stale. Includes the detail key
    /// when `id` is given.
    #[must_use]
    pub fn invalidations(domain: Domain, id: Option<&str>) -> Vec<Self> {
        let mut keys = vec![Self::List(domain), Self::Stats(domain)];
        keys.extend(
            domain
                .overview_scopes()
                .iter()
                .map(|scope| Self::Overview(domain, scope)),
        );
        match domain {
            Domain::Road => keys.push(Self::RoadEmergency),
            Domain::Water => keys.push(Self::WaterUrgent),
            _ => {}
        }
        if let Some(id) = id {
            keys.push(Self::Detail(domain, id.to_string()));
        }
        keys
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(domain) => write!(f, "{}:list", domain.slug()),
            Self::Stats(domain) => write!(f, "{}:stats", domain.slug()),
            Self::Detail(domain, id) => write!(f, "{}:{id}", domain.slug()),
            Self::Overview(domain, scope) => write!(f, "{}:overview:{scope}", domain.slug()),
            Self::RoadEmergency => write!(f, "{}:emergency", Domain::Road.slug()),
            Self::WaterUrgent => write!(f, "{}:urgent", Domain::Water.slug()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_namespaced_keys() {
        assert_eq!(CacheKey::List(Domain::Road).to_string(), "bina-marga:list");
        assert_eq!(CacheKey::Stats(Domain::Building).to_string(), "reports:stats");
        assert_eq!(
            CacheKey::Detail(Domain::Water, "01J0".into()).to_string(),
            "water-resources:01J0"
        );
        assert_eq!(
            CacheKey::Overview(Domain::Agriculture, "pangan").to_string(),
            "agriculture:overview:pangan"
        );
        assert_eq!(CacheKey::RoadEmergency.to_string(), "bina-marga:emergency");
    }

    #[test]
    fn road_writes_drop_every_overview_scope_and_the_emergency_list() {
        let keys = CacheKey::invalidations(Domain::Road, Some("abc"))
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            [
                "bina-marga:list",
                "bina-marga:stats",
                "bina-marga:overview:all",
                "bina-marga:overview:road",
                "bina-marga:overview:bridge",
                "bina-marga:emergency",
                "bina-marga:abc",
            ]
        );
    }

    #[test]
    fn create_has_no_detail_key() {
        let keys = CacheKey::invalidations(Domain::Spatial, None);
        assert!(!keys.iter().any(|k| matches!(k, CacheKey::Detail(..))));
    }
}
