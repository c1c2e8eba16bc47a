// standard library
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

// mgtools modules
use mgtools_utils::f;

// crate modules
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::group::EnergyGroups;
use crate::reaction::{ReactionRecord, ReactionType};

// external crates
use log::info;
use serde::{Deserialize, Serialize};

/// Generator tag used when nothing else is specified
pub const DEFAULT_GENERATOR: &str = "openmc";

/// Microscopic depletion cross sections for a single nuclide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NuclideXs {
    /// Nuclide name, e.g. `U235`
    pub name: String,
    /// Reaction channels in output order
    pub records: Vec<ReactionRecord>,
}

impl NuclideXs {
    /// Create a new nuclide from its reaction channels
    pub fn new(name: impl Into<String>, records: Vec<ReactionRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

/// Every cross section computed for one domain
///
/// Macroscopic reactions live in `records`, microscopic depletion channels
/// are grouped by nuclide. The optional `flux` is only used as the weighting
/// function when condensing onto fewer groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainXs {
    /// Region the cross sections were averaged over
    pub domain: Domain,
    /// Macroscopic reactions in output order
    #[serde(default)]
    pub records: Vec<ReactionRecord>,
    /// Per-nuclide depletion channels in output order
    #[serde(default)]
    pub nuclides: Vec<NuclideXs>,
    /// Group scalar flux
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flux: Option<Vec<f64>>,
}

impl DomainXs {
    /// Create an empty set of cross sections for a domain
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            records: Vec::new(),
            nuclides: Vec::new(),
            flux: None,
        }
    }

    /// Add a macroscopic reaction
    pub fn with_record(mut self, record: ReactionRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Add the depletion channels of a nuclide
    pub fn with_nuclide(mut self, nuclide: NuclideXs) -> Self {
        self.nuclides.push(nuclide);
        self
    }

    /// Set the group flux used for condensation
    pub fn with_flux(mut self, flux: Vec<f64>) -> Self {
        self.flux = Some(flux);
        self
    }

    /// Find a macroscopic reaction by exact type
    pub fn get(&self, reaction: ReactionType) -> Option<&ReactionRecord> {
        self.records.iter().find(|r| r.reaction() == reaction)
    }

    /// Find the first scattering matrix of any variant
    pub fn scatter(&self) -> Option<&ReactionRecord> {
        self.records.iter().find(|r| r.reaction().is_scatter())
    }

    /// Find a nuclide by name
    pub fn nuclide(&self, name: &str) -> Option<&NuclideXs> {
        self.nuclides.iter().find(|n| n.name == name)
    }

    /// Check every record agrees with the group structure
    fn check(&self, num_groups: usize) -> Result<()> {
        for record in &self.records {
            if record.reaction().is_microscopic() {
                return Err(Error::Configuration(f!(
                    "{} is a depletion channel and must be given per nuclide in {}",
                    record.reaction(),
                    self.domain
                )));
            }
            record.check(num_groups)?;
        }

        for nuclide in &self.nuclides {
            for record in &nuclide.records {
                if !record.reaction().is_microscopic() {
                    return Err(Error::Configuration(f!(
                        "{} is not a depletion channel ({} in {})",
                        record.reaction(),
                        nuclide.name,
                        self.domain
                    )));
                }
                record.check(num_groups)?;
            }
        }

        if let Some(flux) = &self.flux {
            if flux.len() != num_groups {
                return Err(Error::UnexpectedLength {
                    context: "group flux".to_string(),
                    expected: num_groups,
                    found: flux.len(),
                });
            }
        }

        Ok(())
    }
}

/// Collection of computed multi-group cross sections
///
/// Every domain shares a single [EnergyGroups] structure. This is the
/// in-memory form of results loaded from a statepoint, and the input to the
/// XML writers.
///
/// ```rust
/// # use mgtools_mgxs::{Domain, DomainXs, EnergyGroups, MgxsLibrary, ReactionRecord, ReactionType};
/// let groups = EnergyGroups::new(vec![0.0, 0.625, 2e7]).unwrap();
/// let mut library = MgxsLibrary::new(groups);
///
/// let fuel = DomainXs::new(Domain::material(1, "fuel"))
///     .with_record(ReactionRecord::groupwise(ReactionType::Total, vec![0.5, 1.2]).unwrap());
/// library.push(fuel).unwrap();
///
/// // records with the wrong number of groups are rejected
/// let bad = DomainXs::new(Domain::material(2, "clad"))
///     .with_record(ReactionRecord::groupwise(ReactionType::Total, vec![0.5]).unwrap());
/// assert!(library.push(bad).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MgxsLibrary {
    /// Tag identifying the code that generated the data
    pub generator: String,
    groups: EnergyGroups,
    #[serde(default)]
    domains: Vec<DomainXs>,
}

impl MgxsLibrary {
    /// Create an empty library for a group structure
    pub fn new(groups: EnergyGroups) -> Self {
        Self {
            generator: DEFAULT_GENERATOR.to_string(),
            groups,
            domains: Vec::new(),
        }
    }

    /// Change the generator tag
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Group structure shared by every domain
    pub fn groups(&self) -> &EnergyGroups {
        &self.groups
    }

    /// Domains in insertion order
    pub fn domains(&self) -> &[DomainXs] {
        &self.domains
    }

    /// Find a domain by id
    pub fn domain(&self, id: u32) -> Option<&DomainXs> {
        self.domains.iter().find(|d| d.domain.id == id)
    }

    /// Add a domain, checking it is consistent with the library
    ///
    /// Domain ids must be unique since solver inputs select cross sections
    /// by id alone.
    pub fn push(&mut self, domain: DomainXs) -> Result<()> {
        if self.domain(domain.domain.id).is_some() {
            return Err(Error::Configuration(f!(
                "domain id {} is already in the library",
                domain.domain.id
            )));
        }
        domain.check(self.groups.num_groups())?;
        self.domains.push(domain);
        Ok(())
    }

    /// Check the whole library for consistency
    ///
    /// Anything built through [MgxsLibrary::push] is already valid, but data
    /// deserialised from elsewhere may not be.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::with_capacity(self.domains.len());
        for domain in &self.domains {
            if !ids.insert(domain.domain.id) {
                return Err(Error::Configuration(f!(
                    "domain id {} appears more than once",
                    domain.domain.id
                )));
            }
            domain.check(self.groups.num_groups())?;
        }
        Ok(())
    }

    /// Write the library to a JSON file
    ///
    /// Useful for keeping computed results around without needing the
    /// original statepoint. Read back with [read_json()].
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub(crate) fn from_parts(
        generator: String,
        groups: EnergyGroups,
        domains: Vec<DomainXs>,
    ) -> Result<Self> {
        let library = Self {
            generator,
            groups,
            domains,
        };
        library.validate()?;
        Ok(library)
    }
}

impl std::fmt::Display for MgxsLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = "MgxsLibrary {\n".to_string();
        s += &f!("    generator: {}\n", self.generator);
        s += &f!("    groups: {}\n", self.groups);
        for domain in &self.domains {
            s += &f!(
                "    {}: {} reactions, {} nuclides\n",
                domain.domain,
                domain.records.len(),
                domain.nuclides.len()
            );
        }
        s += "}";
        write!(f, "{}", s)
    }
}

/// Read a library from a JSON file
///
/// The `path` takes anything that can be turned into a `Path` reference, such
/// as a [&str], [String], [Path], etc...
///
/// The data is validated after reading, so group counts and matrix shapes are
/// guaranteed to be consistent.
///
/// ```rust, no_run
/// # use mgtools_mgxs::{read_json, MgxsLibrary};
/// let library: MgxsLibrary = read_json("path/to/library.json").unwrap();
/// println!("{library}");
/// ```
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<MgxsLibrary> {
    let path: &Path = path.as_ref();
    info!("Reading {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let library: MgxsLibrary = serde_json::from_reader(reader)?;
    library.validate()?;
    Ok(library)
}
