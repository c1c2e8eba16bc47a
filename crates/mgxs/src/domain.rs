// mgtools modules
use mgtools_utils::f;

// crate modules
use crate::error::{Error, Result};

// external crates
use serde::{Deserialize, Serialize};

/// Kind of region cross sections are homogenised over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainKind {
    /// Everywhere a material is used
    Material,
    /// A single geometry cell
    Cell,
    /// A universe, including every cell filling it
    Universe,
    /// Every voxel of a regular mesh
    Mesh,
}

impl DomainKind {
    /// Every supported domain kind
    pub const ALL: [DomainKind; 4] = [
        DomainKind::Material,
        DomainKind::Cell,
        DomainKind::Universe,
        DomainKind::Mesh,
    ];

    /// Tag written to the `type` attribute of a domain
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Cell => "cell",
            Self::Universe => "universe",
            Self::Mesh => "mesh",
        }
    }
}

impl std::str::FromStr for DomainKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "material" => Ok(Self::Material),
            "cell" => Ok(Self::Cell),
            "universe" => Ok(Self::Universe),
            "mesh" => Ok(Self::Mesh),
            _ => Err(Error::Configuration(f!("invalid domain type \"{s}\""))),
        }
    }
}

impl std::fmt::Display for DomainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Region of the model that cross sections are averaged over
///
/// The `id` is whatever the transport model uses to identify the region, and
/// is the value a solver input refers to when picking cross sections.
///
/// ```rust
/// # use mgtools_mgxs::{Domain, DomainKind};
/// let fuel = Domain::material(1, "fuel");
/// assert_eq!(fuel.kind, DomainKind::Material);
/// assert_eq!(fuel.to_string(), "material 1 (fuel)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    /// Unique identifier within the model
    pub id: u32,
    /// Human readable name
    pub name: String,
    /// Type of region
    pub kind: DomainKind,
}

impl Domain {
    /// Create a new domain of any kind
    pub fn new(id: u32, name: impl Into<String>, kind: DomainKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }

    /// Shorthand for a material domain
    pub fn material(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, DomainKind::Material)
    }

    /// Shorthand for a cell domain
    pub fn cell(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, DomainKind::Cell)
    }

    /// Shorthand for a universe domain
    pub fn universe(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, DomainKind::Universe)
    }

    /// Shorthand for a mesh domain
    pub fn mesh(id: u32, name: impl Into<String>) -> Self {
        Self::new(id, name, DomainKind::Mesh)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_round_trip() {
        for kind in DomainKind::ALL {
            assert_eq!(kind.as_str().parse::<DomainKind>().unwrap(), kind);
        }
        assert_eq!(" Cell".parse::<DomainKind>().unwrap(), DomainKind::Cell);
        assert!("lattice".parse::<DomainKind>().unwrap_err().is_configuration());
    }

    #[test]
    fn kind_serialises_lowercase() {
        let json = serde_json::to_string(&Domain::universe(4, "core")).unwrap();
        assert_eq!(json, r#"{"id":4,"name":"core","kind":"universe"}"#);
    }
}
