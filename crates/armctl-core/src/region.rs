//! Azure regions
//!
//! ARM identifies regions by a compact location name (`westus`); portals and
//! older SDKs use display names (`West US`). Both parse to the same [`Region`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A geographic deployment zone offered by Azure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    #[default]
    WestUs,
    WestUs2,
    WestUs3,
    WestCentralUs,
    EastUs,
    EastUs2,
    CentralUs,
    NorthCentralUs,
    SouthCentralUs,
    CanadaCentral,
    CanadaEast,
    BrazilSouth,
    NorthEurope,
    WestEurope,
    UkSouth,
    UkWest,
    FranceCentral,
    GermanyWestCentral,
    SwedenCentral,
    SwitzerlandNorth,
    NorwayEast,
    EastAsia,
    SoutheastAsia,
    JapanEast,
    JapanWest,
    KoreaCentral,
    CentralIndia,
    SouthIndia,
    AustraliaEast,
    AustraliaSoutheast,
    SouthAfricaNorth,
    UaeNorth,
}

/// Returned when a string names no known region
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown region '{0}' (expected an ARM location such as 'westus' or 'northeurope')")]
pub struct UnknownRegion(pub String);

const REGIONS: &[(Region, &str, &str)] = &[
    (Region::WestUs, "westus", "West US"),
    (Region::WestUs2, "westus2", "West US 2"),
    (Region::WestUs3, "westus3", "West US 3"),
    (Region::WestCentralUs, "westcentralus", "West Central US"),
    (Region::EastUs, "eastus", "East US"),
    (Region::EastUs2, "eastus2", "East US 2"),
    (Region::CentralUs, "centralus", "Central US"),
    (Region::NorthCentralUs, "northcentralus", "North Central US"),
    (Region::SouthCentralUs, "southcentralus", "South Central US"),
    (Region::CanadaCentral, "canadacentral", "Canada Central"),
    (Region::CanadaEast, "canadaeast", "Canada East"),
    (Region::BrazilSouth, "brazilsouth", "Brazil South"),
    (Region::NorthEurope, "northeurope", "North Europe"),
    (Region::WestEurope, "westeurope", "West Europe"),
    (Region::UkSouth, "uksouth", "UK South"),
    (Region::UkWest, "ukwest", "UK West"),
    (Region::FranceCentral, "francecentral", "France Central"),
    (Region::GermanyWestCentral, "germanywestcentral", "Germany West Central"),
    (Region::SwedenCentral, "swedencentral", "Sweden Central"),
    (Region::SwitzerlandNorth, "switzerlandnorth", "Switzerland North"),
    (Region::NorwayEast, "norwayeast", "Norway East"),
    (Region::EastAsia, "eastasia", "East Asia"),
    (Region::SoutheastAsia, "southeastasia", "Southeast Asia"),
    (Region::JapanEast, "japaneast", "Japan East"),
    (Region::JapanWest, "japanwest", "Japan West"),
    (Region::KoreaCentral, "koreacentral", "Korea Central"),
    (Region::CentralIndia, "centralindia", "Central India"),
    (Region::SouthIndia, "southindia", "South India"),
    (Region::AustraliaEast, "australiaeast", "Australia East"),
    (Region::AustraliaSoutheast, "australiasoutheast", "Australia Southeast"),
    (Region::SouthAfricaNorth, "southafricanorth", "South Africa North"),
    (Region::UaeNorth, "uaenorth", "UAE North"),
];

impl Region {
    /// ARM location name, as used in request bodies
    pub fn name(&self) -> &'static str {
        self.entry().1
    }

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        self.entry().2
    }

    /// Every known region
    pub fn all() -> impl Iterator<Item = Region> {
        REGIONS.iter().map(|(region, _, _)| *region)
    }

    fn entry(&self) -> &'static (Region, &'static str, &'static str) {
        REGIONS
            .iter()
            .find(|(region, _, _)| region == self)
            .unwrap_or(&REGIONS[0])
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        REGIONS
            .iter()
            .find(|(_, name, _)| *name == normalized)
            .map(|(region, _, _)| *region)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

impl Serialize for Region {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_region_is_west_us() {
        assert_eq!(Region::default(), Region::WestUs);
        assert_eq!(Region::default().to_string(), "westus");
    }

    #[test]
    fn parses_location_and_display_names() {
        assert_eq!("westus".parse::<Region>().unwrap(), Region::WestUs);
        assert_eq!("West US 2".parse::<Region>().unwrap(), Region::WestUs2);
        assert_eq!("north-europe".parse::<Region>().unwrap(), Region::NorthEurope);
        assert_eq!("UAENorth".parse::<Region>().unwrap(), Region::UaeNorth);
    }

    #[test]
    fn rejects_unknown_region() {
        let err = "moonbase".parse::<Region>().unwrap_err();
        assert_eq!(err, UnknownRegion("moonbase".to_string()));
        assert!(err.to_string().contains("moonbase"));
    }

    #[test]
    fn every_region_roundtrips_through_its_name() {
        for region in Region::all() {
            assert_eq!(region.name().parse::<Region>().unwrap(), region);
            assert_eq!(region.display_name().parse::<Region>().unwrap(), region);
        }
    }

    #[test]
    fn serde_uses_location_name() {
        let json = serde_json::to_string(&Region::SoutheastAsia).unwrap();
        assert_eq!(json, "\"southeastasia\"");
        let back: Region = serde_json::from_str("\"Southeast Asia\"").unwrap();
        assert_eq!(back, Region::SoutheastAsia);
    }
}
