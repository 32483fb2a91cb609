//! Region codes and their upstream routing hosts.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Host pair an upstream call must target for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionRoute {
    /// Continental routing host (account and match endpoints)
    pub continental_host: &'static str,

    /// Platform host (summoner-scoped endpoints)
    pub platform_host: &'static str,
}

/// Supported region codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Euw,
    Eune,
    Na,
    Kr,
    Jp,
    Br,
    Oce,
    Tr,
    Ru,
    Las,
    Lan,
}

/// Region table: code, continental host, platform host.
static ROUTES: [(Region, &str, RegionRoute); 11] = [
    (Region::Euw, "EUW", route("europe", "euw1")),
    (Region::Eune, "EUNE", route("europe", "eun1")),
    (Region::Na, "NA", route("americas", "na1")),
    (Region::Kr, "KR", route("asia", "kr")),
    (Region::Jp, "JP", route("asia", "jp1")),
    (Region::Br, "BR", route("americas", "br1")),
    (Region::Oce, "OCE", route("americas", "oc1")),
    (Region::Tr, "TR", route("europe", "tr1")),
    (Region::Ru, "RU", route("europe", "ru")),
    (Region::Las, "LAS", route("americas", "la2")),
    (Region::Lan, "LAN", route("americas", "la1")),
];

const fn route(continental_host: &'static str, platform_host: &'static str) -> RegionRoute {
    RegionRoute {
        continental_host,
        platform_host,
    }
}

impl Region {
    /// All supported regions in display order.
    pub fn all() -> impl Iterator<Item = Region> {
        ROUTES.iter().map(|(region, _, _)| *region)
    }

    /// Resolve the routing hosts for this region.
    pub fn route(&self) -> RegionRoute {
        self.entry().2
    }

    /// Human-facing region code.
    pub fn code(&self) -> &'static str {
        self.entry().1
    }

    fn entry(&self) -> &'static (Region, &'static str, RegionRoute) {
        // Every variant has exactly one row; the index mirrors declaration order.
        &ROUTES[*self as usize]
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Raised for region codes outside the supported table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown region code: {0}")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        ROUTES
            .iter()
            .find(|(_, c, _)| c.eq_ignore_ascii_case(code))
            .map(|(region, _, _)| *region)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_region_maps_to_its_own_row() {
        for (i, (region, code, _)) in ROUTES.iter().enumerate() {
            assert_eq!(*region as usize, i);
            assert_eq!(region.code(), *code);
        }
        assert_eq!(Region::all().count(), 11);
    }

    #[test]
    fn test_route_lookup() {
        assert_eq!(
            Region::Euw.route(),
            RegionRoute {
                continental_host: "europe",
                platform_host: "euw1"
            }
        );
        assert_eq!(Region::Kr.route().continental_host, "asia");
        assert_eq!(Region::Lan.route().platform_host, "la1");
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("euw".parse::<Region>(), Ok(Region::Euw));
        assert_eq!(" NA ".parse::<Region>(), Ok(Region::Na));
        assert_eq!("Eune".parse::<Region>(), Ok(Region::Eune));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "PBE".parse::<Region>(),
            Err(UnknownRegion("PBE".to_string()))
        );
    }

    #[test]
    fn test_region_serialization() {
        let json = serde_json::to_string(&Region::Oce).unwrap();
        assert_eq!(json, "\"OCE\"");
        let parsed: Region = serde_json::from_str("\"LAS\"").unwrap();
        assert_eq!(parsed, Region::Las);
    }
}
