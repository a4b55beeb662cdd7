use std::fmt;

use serde::{Deserialize, Serialize};

// (name, label, abbreviation)
const KNOWN_REGIONS: &[(&str, &str, &str)] = &[
    ("eastus", "East US", "EUS"),
    ("eastus2", "East US 2", "EUS2"),
    ("centralus", "Central US", "CUS"),
    ("northcentralus", "North Central US", "NCUS"),
    ("southcentralus", "South Central US", "SCUS"),
    ("westcentralus", "West Central US", "WCUS"),
    ("westus", "West US", "WUS"),
    ("westus2", "West US 2", "WUS2"),
    ("westus3", "West US 3", "WUS3"),
    ("canadacentral", "Canada Central", "CCA"),
    ("canadaeast", "Canada East", "CAE"),
    ("brazilsouth", "Brazil South", "CQ"),
    ("northeurope", "North Europe", "NEU"),
    ("westeurope", "West Europe", "WEU"),
    ("uksouth", "UK South", "SUK"),
    ("ukwest", "UK West", "WUK"),
    ("francecentral", "France Central", "PAR"),
    ("germanywestcentral", "Germany West Central", "DEWC"),
    ("switzerlandnorth", "Switzerland North", "CHN"),
    ("norwayeast", "Norway East", "NOE"),
    ("swedencentral", "Sweden Central", "SEC"),
    ("eastasia", "East Asia", "EA"),
    ("southeastasia", "Southeast Asia", "SEA"),
    ("japaneast", "Japan East", "EJP"),
    ("japanwest", "Japan West", "OS"),
    ("koreacentral", "Korea Central", "SE"),
    ("centralindia", "Central India", "CIN"),
    ("southindia", "South India", "MA"),
    ("australiaeast", "Australia East", "EAU"),
    ("australiasoutheast", "Australia Southeast", "SEAU"),
    ("southafricanorth", "South Africa North", "JNB"),
    ("uaenorth", "UAE North", "DXB"),
];

/// An Azure location, stored by its programmatic name (`eastus`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    /// Accepts either the name (`westeurope`) or the label (`West Europe`).
    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        Self(normalized)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn label(&self) -> &str {
        self.known().map_or(&self.0, |(_, label, _)| label)
    }

    /// Short code used in default resource names, e.g. `DefaultResourceGroup-EUS`.
    ///
    /// Unknown regions use their upper-cased name.
    pub fn abbreviation(&self) -> String {
        self.known()
            .map_or_else(|| self.0.to_uppercase(), |(_, _, abbr)| abbr.to_string())
    }

    fn known(&self) -> Option<&'static (&'static str, &'static str, &'static str)> {
        KNOWN_REGIONS.iter().find(|(name, _, _)| *name == self.0)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_names_are_the_same_region() {
        assert_eq!(Region::from_name("West Europe"), Region::from_name("westeurope"));
        assert_eq!(Region::from_name("eastus").label(), "East US");
    }

    #[test]
    fn abbreviations() {
        assert_eq!(Region::from_name("eastus").abbreviation(), "EUS");
        assert_eq!(Region::from_name("moonbase1").abbreviation(), "MOONBASE1");
    }
}
