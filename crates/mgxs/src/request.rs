//! Selection of which cross sections to pull out of a source

// mgtools modules
use mgtools_utils::f;

// crate modules
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::library::{DomainXs, MgxsLibrary, NuclideXs};
use crate::reaction::{ReactionRecord, ReactionType, ScatterKind, ScatterMatrix, XsData};
use crate::source::XsSource;

// external crates
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Transport correction applied to scattering matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correction {
    /// Remove the P1 out-scatter from the in-group term of a P0 matrix
    P0,
}

/// Cross sections to collect for a list of named domains
///
/// Each domain is exported under the name given in the matching position of
/// `names`, regardless of what the source calls it.
///
/// ```rust
/// # use mgtools_mgxs::{Domain, MgxsRequest, ReactionType};
/// let request = MgxsRequest::new(
///     vec!["fuel".into(), "water".into()],
///     vec![Domain::material(1, "UO2"), Domain::material(2, "H2O")],
/// )
/// .unwrap()
/// .with_microscopic(MgxsRequest::depletion_defaults())
/// .unwrap()
/// .with_legendre_order(1);
///
/// assert_eq!(request.microscopic.len(), 6);
///
/// // one name per domain
/// assert!(MgxsRequest::new(vec!["fuel".into()], vec![]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MgxsRequest {
    /// Names to export each domain under
    pub names: Vec<String>,
    /// Domains as known to the source
    pub domains: Vec<Domain>,
    /// Macroscopic reactions in output order
    pub macroscopic: Vec<ReactionType>,
    /// Per-nuclide depletion channels in output order
    pub microscopic: Vec<ReactionType>,
    /// Scattering correction, only meaningful for isotropic matrices
    pub correction: Option<Correction>,
    /// Legendre order to export scattering matrices at
    pub legendre_order: u32,
}

impl Default for MgxsRequest {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            domains: Vec::new(),
            macroscopic: Self::supported_macroscopic(),
            microscopic: Vec::new(),
            correction: None,
            legendre_order: 0,
        }
    }
}

impl MgxsRequest {
    /// Request every supported macroscopic reaction for named domains
    pub fn new(names: Vec<String>, domains: Vec<Domain>) -> Result<Self> {
        let request = Self {
            names,
            domains,
            ..Default::default()
        };
        request.validate()?;
        Ok(request)
    }

    /// Replace the macroscopic reactions
    pub fn with_macroscopic(mut self, reactions: Vec<ReactionType>) -> Result<Self> {
        self.macroscopic = reactions;
        self.validate()?;
        Ok(self)
    }

    /// Replace the microscopic depletion channels
    pub fn with_microscopic(mut self, reactions: Vec<ReactionType>) -> Result<Self> {
        self.microscopic = reactions;
        self.validate()?;
        Ok(self)
    }

    /// Set the scattering correction
    pub fn with_correction(mut self, correction: Option<Correction>) -> Self {
        self.correction = correction;
        self
    }

    /// Set the Legendre order of scattering matrices
    pub fn with_legendre_order(mut self, order: u32) -> Self {
        self.legendre_order = order;
        self
    }

    /// Every macroscopic reaction the solver understands
    pub fn supported_macroscopic() -> Vec<ReactionType> {
        ReactionType::MACROSCOPIC.to_vec()
    }

    /// Minimal set for a fixed source or eigenvalue transport problem
    pub fn transport_defaults() -> Vec<ReactionType> {
        vec![
            ReactionType::Total,
            ReactionType::Absorption,
            ReactionType::Scatter(ScatterKind::ConsistentScatter),
            ReactionType::InverseVelocity,
        ]
    }

    /// Every depletion channel
    pub fn depletion_defaults() -> Vec<ReactionType> {
        ReactionType::DEPLETION.to_vec()
    }

    /// Check the request is consistent
    ///
    /// Useful after deserialising, since the fields are public.
    pub fn validate(&self) -> Result<()> {
        if self.names.len() != self.domains.len() {
            return Err(Error::Configuration(f!(
                "{} names given for {} domains",
                self.names.len(),
                self.domains.len()
            )));
        }

        if let Some(idx) = self.names.iter().position(|n| n.trim().is_empty()) {
            return Err(Error::Configuration(f!(
                "empty name for {}",
                self.domains[idx]
            )));
        }

        if let Some(r) = self.macroscopic.iter().find(|r| r.is_microscopic()) {
            return Err(Error::Configuration(f!(
                "invalid macroscopic cross section type \"{r}\""
            )));
        }

        if let Some(r) = self.microscopic.iter().find(|r| !r.is_microscopic()) {
            return Err(Error::Configuration(f!(
                "invalid microscopic cross section type \"{r}\""
            )));
        }

        Ok(())
    }

    /// Collect everything requested from a source into a library
    ///
    /// Scattering matrices are truncated to the requested Legendre order, and
    /// the P0 correction is applied if requested for order 0. Asking for a
    /// higher order than the source has is an error.
    ///
    /// Depletion channels are collected for every nuclide the source lists
    /// for a domain.
    pub fn load<S: XsSource + ?Sized>(&self, source: &S) -> Result<MgxsLibrary> {
        self.validate()?;

        if self.correction.is_some() && self.legendre_order > 0 {
            warn!(
                "Correction only applies to isotropic scattering, ignored for order {}",
                self.legendre_order
            );
        }

        let mut library = MgxsLibrary::new(source.energy_groups().clone());
        for (name, domain) in self.names.iter().zip(&self.domains) {
            debug!("Loading cross sections for {domain} as \"{name}\"");
            library.push(self.load_domain(source, name, domain)?)?;
        }

        Ok(library)
    }

    fn load_domain<S: XsSource + ?Sized>(
        &self,
        source: &S,
        name: &str,
        domain: &Domain,
    ) -> Result<DomainXs> {
        let exported = Domain::new(domain.id, name, domain.kind);
        let mut domain_xs = DomainXs::new(exported);

        for reaction in &self.macroscopic {
            let data = match source.get_xs(domain, *reaction, None)? {
                XsData::Scatter(matrix) => XsData::Scatter(self.prepare_scatter(&matrix)?),
                groupwise => groupwise,
            };
            domain_xs.records.push(ReactionRecord::new(*reaction, data)?);
        }

        if !self.microscopic.is_empty() {
            for nuclide in source.nuclides(domain) {
                let records = self
                    .microscopic
                    .iter()
                    .map(|r| ReactionRecord::new(*r, source.get_xs(domain, *r, Some(&nuclide))?))
                    .collect::<Result<Vec<ReactionRecord>>>()?;
                domain_xs.nuclides.push(NuclideXs::new(nuclide, records));
            }
        }

        domain_xs.flux = source.flux(domain).map(|flux| flux.to_vec());
        Ok(domain_xs)
    }

    fn prepare_scatter(&self, matrix: &ScatterMatrix) -> Result<ScatterMatrix> {
        match (self.correction, self.legendre_order) {
            (Some(Correction::P0), 0) => matrix.p0_corrected(),
            (_, order) => {
                let available = matrix.legendre_order()?;
                if order < available {
                    debug!("Truncating scattering from order {available} to {order}");
                }
                matrix.truncate(order)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::EnergyGroups;

    fn source() -> MgxsLibrary {
        let groups = EnergyGroups::new(vec![0.0, 1.0, 10.0]).unwrap();
        let mut library = MgxsLibrary::new(groups);
        let matrix = ScatterMatrix::legendre(
            2,
            1,
            vec![
                1.0, 0.2, // 0 -> 0
                0.5, 0.1, // 0 -> 1
                0.0, 0.0, // 1 -> 0
                2.0, 0.4, // 1 -> 1
            ],
        )
        .unwrap();
        let domain = DomainXs::new(Domain::material(10, "m10"))
            .with_record(ReactionRecord::groupwise(ReactionType::Total, vec![2.0, 3.0]).unwrap())
            .with_record(ReactionRecord::scatter(ScatterKind::NuScatter, matrix).unwrap())
            .with_nuclide(NuclideXs::new(
                "U238",
                vec![
                    ReactionRecord::groupwise(ReactionType::NGamma, vec![0.1, 2.0]).unwrap(),
                    ReactionRecord::groupwise(ReactionType::N2n, vec![0.3, 0.0]).unwrap(),
                ],
            ))
            .with_flux(vec![1.0, 4.0]);
        library.push(domain).unwrap();
        library
    }

    fn request() -> MgxsRequest {
        MgxsRequest::new(vec!["fuel".into()], vec![Domain::material(10, "m10")])
            .unwrap()
            .with_macroscopic(vec![
                ReactionType::Total,
                ReactionType::Scatter(ScatterKind::NuScatter),
            ])
            .unwrap()
    }

    #[test]
    fn validation() {
        let domains = vec![Domain::cell(1, "a"), Domain::cell(2, "b")];
        let err = MgxsRequest::new(vec!["a".into()], domains.clone()).unwrap_err();
        assert!(err.is_configuration());

        let err = MgxsRequest::new(vec!["a".into(), " ".into()], domains.clone()).unwrap_err();
        assert!(err.is_configuration());

        let request = MgxsRequest::new(vec!["a".into(), "b".into()], domains).unwrap();
        assert!(request
            .clone()
            .with_macroscopic(vec![ReactionType::NGamma])
            .is_err());
        assert!(request
            .with_microscopic(vec![ReactionType::Total])
            .is_err());
    }

    #[test]
    fn default_sets() {
        assert_eq!(MgxsRequest::supported_macroscopic().len(), 8);
        assert!(MgxsRequest::transport_defaults()
            .iter()
            .all(|r| !r.is_microscopic()));
        assert!(MgxsRequest::depletion_defaults()
            .iter()
            .all(|r| r.is_microscopic()));
        assert_eq!(MgxsRequest::default().macroscopic, MgxsRequest::supported_macroscopic());
    }

    #[test]
    fn load_uses_requested_names() {
        let library = request().load(&source()).unwrap();
        let fuel = library.domain(10).unwrap();
        assert_eq!(fuel.domain.name, "fuel");
        assert_eq!(fuel.records.len(), 2);
        assert!(fuel.nuclides.is_empty());
        assert_eq!(fuel.flux.as_deref(), Some([1.0, 4.0].as_slice()));
    }

    #[test]
    fn load_truncates_scattering() {
        let library = request().load(&source()).unwrap();
        let XsData::Scatter(matrix) = library.domain(10).unwrap().scatter().unwrap().data() else {
            panic!("expected a scattering matrix");
        };
        assert_eq!(matrix.legendre_order().unwrap(), 0);
        assert_eq!(matrix.values(), &[1.0, 0.5, 0.0, 2.0]);
    }

    #[test]
    fn load_applies_p0_correction() {
        let library = request()
            .with_correction(Some(Correction::P0))
            .load(&source())
            .unwrap();
        let XsData::Scatter(matrix) = library.domain(10).unwrap().scatter().unwrap().data() else {
            panic!("expected a scattering matrix");
        };
        assert!((matrix.get(0, 0, 0) - 0.7).abs() < 1e-12);
        assert!((matrix.get(1, 1, 0) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn load_rejects_higher_order() {
        let err = request().with_legendre_order(3).load(&source()).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientLegendreOrder {
                requested: 3,
                available: 1
            }
        ));
    }

    #[test]
    fn load_microscopic() {
        let library = request()
            .with_macroscopic(vec![])
            .unwrap()
            .with_microscopic(vec![ReactionType::NGamma, ReactionType::N2n])
            .unwrap()
            .load(&source())
            .unwrap();
        let u238 = library.domain(10).unwrap().nuclide("U238").unwrap();
        assert_eq!(u238.records.len(), 2);
        assert_eq!(u238.records[1].data().values(), &[0.3, 0.0]);

        // every requested channel must exist
        let err = request()
            .with_microscopic(vec![ReactionType::NAlpha])
            .unwrap()
            .load(&source())
            .unwrap_err();
        assert!(err.is_missing_data());
    }

    #[test]
    fn deserialise_from_json() {
        let json = r#"{
            "names": ["fuel"],
            "domains": [{"id": 10, "name": "m10", "kind": "material"}],
            "macroscopic": ["total", "nu-scatter"],
            "correction": "P0"
        }"#;
        let request: MgxsRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.correction, Some(Correction::P0));
        assert_eq!(request.legendre_order, 0);
        assert!(request.microscopic.is_empty());
    }
}
