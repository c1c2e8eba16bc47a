//! Reaction types and the cross-section data attached to them

// mgtools modules
use mgtools_utils::{f, SliceExt};

// crate modules
use crate::error::{Error, Result};

// external crates
use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// Tolerance used to decide a reaction channel is all zeros
pub const ZERO_TOLERANCE: f64 = 1e-16;

/// Variants of scattering matrix available from the tallies
///
/// These only change how the upstream code computes the matrix. All of them
/// are written to file as a plain `scatter` reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScatterKind {
    /// Analog scattering matrix
    Scatter,
    /// Scattering matrix including multiplicity
    NuScatter,
    /// Scattering matrix normalised to the scattering cross section
    ConsistentScatter,
    /// Multiplicity matrix normalised to the nu-scattering cross section
    ConsistentNuScatter,
    /// Group-to-group transfer probabilities
    Probability,
}

/// Every reaction that can be exported
///
/// Macroscopic reactions are written for transport calculations, and the six
/// neutron induced channels are written per nuclide for depletion.
///
/// ```rust
/// # use mgtools_mgxs::{ReactionType, ScatterKind};
/// let reaction: ReactionType = "consistent nu-scatter matrix".parse().unwrap();
/// assert_eq!(reaction, ReactionType::Scatter(ScatterKind::ConsistentNuScatter));
/// assert_eq!(reaction.export_name(), "scatter");
///
/// // the short names are accepted too
/// assert_eq!("inverse-vel".parse::<ReactionType>().unwrap(), ReactionType::InverseVelocity);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReactionType {
    /// Total cross section
    Total,
    /// Absorption cross section
    Absorption,
    /// Any of the scattering matrix variants
    Scatter(ScatterKind),
    /// Neutron production cross section
    NuFission,
    /// Fission spectrum
    Chi,
    /// Recoverable fission energy production
    KappaFission,
    /// Flux weighted inverse velocity
    InverseVelocity,
    /// Diffusion coefficient
    DiffusionCoefficient,
    /// (n,2n)
    N2n,
    /// (n,3n)
    N3n,
    /// (n,4n)
    N4n,
    /// Radiative capture (n,gamma)
    NGamma,
    /// (n,p)
    NProton,
    /// (n,a)
    NAlpha,
}

impl ReactionType {
    /// Every macroscopic reaction the solver reads, in the usual request order
    pub const MACROSCOPIC: [ReactionType; 8] = [
        ReactionType::Total,
        ReactionType::Scatter(ScatterKind::NuScatter),
        ReactionType::InverseVelocity,
        ReactionType::NuFission,
        ReactionType::Chi,
        ReactionType::KappaFission,
        ReactionType::DiffusionCoefficient,
        ReactionType::Absorption,
    ];

    /// Every microscopic depletion channel
    pub const DEPLETION: [ReactionType; 6] = [
        ReactionType::N2n,
        ReactionType::N3n,
        ReactionType::N4n,
        ReactionType::NGamma,
        ReactionType::NProton,
        ReactionType::NAlpha,
    ];

    /// Full name of the reaction, distinguishing scatter variants
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Absorption => "absorption",
            Self::Scatter(kind) => match kind {
                ScatterKind::Scatter => "scatter matrix",
                ScatterKind::NuScatter => "nu-scatter matrix",
                ScatterKind::ConsistentScatter => "consistent scatter matrix",
                ScatterKind::ConsistentNuScatter => "consistent nu-scatter matrix",
                ScatterKind::Probability => "scatter probability matrix",
            },
            Self::NuFission => "nu-fission",
            Self::Chi => "chi",
            Self::KappaFission => "kappa-fission",
            Self::InverseVelocity => "inverse-velocity",
            Self::DiffusionCoefficient => "diffusion-coefficient",
            Self::N2n => "(n,2n)",
            Self::N3n => "(n,3n)",
            Self::N4n => "(n,4n)",
            Self::NGamma => "(n,gamma)",
            Self::NProton => "(n,p)",
            Self::NAlpha => "(n,a)",
        }
    }

    /// Name written to the `type` attribute of a reaction
    pub const fn export_name(&self) -> &'static str {
        match self {
            Self::Scatter(_) => "scatter",
            _ => self.name(),
        }
    }

    /// Check for any scattering matrix variant
    pub const fn is_scatter(&self) -> bool {
        matches!(self, Self::Scatter(_))
    }

    /// Check for the per-nuclide depletion channels
    pub const fn is_microscopic(&self) -> bool {
        matches!(
            self,
            Self::N2n | Self::N3n | Self::N4n | Self::NGamma | Self::NProton | Self::NAlpha
        )
    }
}

impl std::str::FromStr for ReactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let reaction = match s.trim() {
            "total" => Self::Total,
            "absorption" => Self::Absorption,
            "scatter" | "scatter matrix" => Self::Scatter(ScatterKind::Scatter),
            "nu-scatter" | "nu-scatter matrix" => Self::Scatter(ScatterKind::NuScatter),
            "consistent scatter matrix" => Self::Scatter(ScatterKind::ConsistentScatter),
            "consistent nu-scatter matrix" => Self::Scatter(ScatterKind::ConsistentNuScatter),
            "scatter probability matrix" => Self::Scatter(ScatterKind::Probability),
            "nu-fission" => Self::NuFission,
            "chi" => Self::Chi,
            "kappa-fission" => Self::KappaFission,
            "inverse-velocity" | "inverse-vel" => Self::InverseVelocity,
            "diffusion-coefficient" | "diffusion" => Self::DiffusionCoefficient,
            "(n,2n)" => Self::N2n,
            "(n,3n)" => Self::N3n,
            "(n,4n)" => Self::N4n,
            "(n,gamma)" => Self::NGamma,
            "(n,p)" => Self::NProton,
            "(n,a)" => Self::NAlpha,
            _ => {
                return Err(Error::Configuration(f!(
                    "unsupported cross section type \"{s}\""
                )))
            }
        };
        Ok(reaction)
    }
}

impl TryFrom<String> for ReactionType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ReactionType> for String {
    fn from(reaction: ReactionType) -> Self {
        reaction.name().to_string()
    }
}

impl std::fmt::Display for ReactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Angular representation of a scattering matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScatterFormat {
    /// Legendre expansion up to and including `order`
    Legendre { order: u32 },
    /// Equal width histogram bins in the scattering cosine
    Histogram { bins: u32 },
    /// Tabulated points in the scattering cosine
    Tabular { points: u32 },
}

impl ScatterFormat {
    /// Number of angular values stored per group-to-group entry
    pub const fn entries(&self) -> usize {
        match self {
            Self::Legendre { order } => *order as usize + 1,
            Self::Histogram { bins } => *bins as usize,
            Self::Tabular { points } => *points as usize,
        }
    }
}

impl std::fmt::Display for ScatterFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Legendre { order } => write!(f, "legendre (order {order})"),
            Self::Histogram { bins } => write!(f, "histogram ({bins} bins)"),
            Self::Tabular { points } => write!(f, "tabular ({points} points)"),
        }
    }
}

/// Group-to-group scattering data for all angular entries
///
/// Values are stored flat in (incoming group, outgoing group, angular entry)
/// order, which is also the order they are written to file.
///
/// ```text
/// index = (g_in * num_groups + g_out) * entries + l
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterMatrix {
    num_groups: usize,
    format: ScatterFormat,
    values: Vec<f64>,
}

impl ScatterMatrix {
    /// Create a matrix from flat values in (in, out, angle) order
    pub fn new(num_groups: usize, format: ScatterFormat, values: Vec<f64>) -> Result<Self> {
        let matrix = Self {
            num_groups,
            format,
            values,
        };
        matrix.check_length()?;
        Ok(matrix)
    }

    /// Create a Legendre matrix from flat values in (in, out, moment) order
    ///
    /// ```rust
    /// # use mgtools_mgxs::ScatterMatrix;
    /// let matrix = ScatterMatrix::legendre(2, 0, vec![0.5, 0.1, 0.0, 1.5]).unwrap();
    /// assert_eq!(matrix.get(0, 1, 0), 0.1);
    ///
    /// // needs exactly g*g*(L+1) values
    /// assert!(ScatterMatrix::legendre(2, 1, vec![0.5, 0.1, 0.0, 1.5]).is_err());
    /// ```
    pub fn legendre(num_groups: usize, order: u32, values: Vec<f64>) -> Result<Self> {
        Self::new(num_groups, ScatterFormat::Legendre { order }, values)
    }

    /// Build a Legendre matrix from a function of (in, out, moment)
    pub fn legendre_from_fn<F>(num_groups: usize, order: u32, f: F) -> Self
    where
        F: Fn(usize, usize, usize) -> f64,
    {
        let values = iproduct!(0..num_groups, 0..num_groups, 0..=order as usize)
            .map(|(g_in, g_out, l)| f(g_in, g_out, l))
            .collect();
        Self {
            num_groups,
            format: ScatterFormat::Legendre { order },
            values,
        }
    }

    /// Number of energy groups
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Angular representation
    pub fn format(&self) -> ScatterFormat {
        self.format
    }

    /// Legendre order, or an error for any other representation
    pub fn legendre_order(&self) -> Result<u32> {
        match self.format {
            ScatterFormat::Legendre { order } => Ok(order),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Flat values in (in, out, angle) order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value for an incoming group, outgoing group, and angular entry
    ///
    /// Panics if any index is out of range, like slice indexing.
    pub fn get(&self, g_in: usize, g_out: usize, l: usize) -> f64 {
        self.values[self.index(g_in, g_out, l)]
    }

    /// Lower the Legendre order by dropping the higher moments
    pub fn truncate(&self, order: u32) -> Result<Self> {
        let available = self.legendre_order()?;
        if order > available {
            return Err(Error::InsufficientLegendreOrder {
                requested: order,
                available,
            });
        }
        Ok(Self::legendre_from_fn(self.num_groups, order, |g_in, g_out, l| {
            self.get(g_in, g_out, l)
        }))
    }

    /// Remove the P1 out-scatter of each group from the in-group P0 term
    ///
    /// This is the usual transport correction for isotropic (P0) matrices. The
    /// result is always order 0, and needs at least order 1 to work from.
    pub fn p0_corrected(&self) -> Result<Self> {
        let available = self.legendre_order()?;
        if available < 1 {
            return Err(Error::InsufficientLegendreOrder {
                requested: 1,
                available,
            });
        }

        let n = self.num_groups;
        let out_scatter_p1: Vec<f64> = (0..n)
            .map(|g_in| (0..n).map(|g_out| self.get(g_in, g_out, 1)).sum())
            .collect();

        Ok(Self::legendre_from_fn(n, 0, |g_in, g_out, _| {
            let p0 = self.get(g_in, g_out, 0);
            if g_in == g_out {
                p0 - out_scatter_p1[g_in]
            } else {
                p0
            }
        }))
    }

    #[inline]
    fn index(&self, g_in: usize, g_out: usize, l: usize) -> usize {
        (g_in * self.num_groups + g_out) * self.format.entries() + l
    }

    fn check_length(&self) -> Result<()> {
        let expected = self
            .num_groups
            .checked_mul(self.num_groups)
            .and_then(|n| n.checked_mul(self.format.entries()));
        let Some(expected) = expected else {
            return Err(Error::UnexpectedLength {
                context: "scattering matrix".to_string(),
                expected: usize::MAX,
                found: self.values.len(),
            });
        };
        if self.values.len() != expected {
            return Err(Error::UnexpectedLength {
                context: "scattering matrix".to_string(),
                expected,
                found: self.values.len(),
            });
        }
        Ok(())
    }
}

/// Cross-section values for a single reaction
///
/// Replaces any guesswork on shape: scattering is always a [ScatterMatrix]
/// and everything else has one value per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XsData {
    /// One value per group in increasing group order
    Groupwise(Vec<f64>),
    /// Group-to-group scattering matrix
    Scatter(ScatterMatrix),
}

impl XsData {
    /// Number of groups the data describes
    pub fn num_groups(&self) -> usize {
        match self {
            Self::Groupwise(values) => values.len(),
            Self::Scatter(matrix) => matrix.num_groups(),
        }
    }

    /// Every stored value, flattened in output order
    pub fn values(&self) -> &[f64] {
        match self {
            Self::Groupwise(values) => values,
            Self::Scatter(matrix) => matrix.values(),
        }
    }

    /// Check whether every value is indistinguishable from zero
    pub fn is_degenerate(&self) -> bool {
        self.values()
            .all_close(0.0, ZERO_TOLERANCE, ZERO_TOLERANCE)
    }
}

/// A reaction type paired with data of the right shape
///
/// ```rust
/// # use mgtools_mgxs::{ReactionRecord, ReactionType, XsData};
/// let total = ReactionRecord::groupwise(ReactionType::Total, vec![1.0, 2.0]).unwrap();
/// assert_eq!(total.data().num_groups(), 2);
///
/// // scattering needs a matrix
/// let bad = ReactionRecord::new(
///     "scatter".parse().unwrap(),
///     XsData::Groupwise(vec![0.5, 0.5]),
/// );
/// assert!(bad.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    reaction: ReactionType,
    data: XsData,
}

impl ReactionRecord {
    /// Pair a reaction with its data, checking the shape is consistent
    pub fn new(reaction: ReactionType, data: XsData) -> Result<Self> {
        let record = Self { reaction, data };
        record.check_shape()?;
        Ok(record)
    }

    /// Any non-scattering reaction with one value per group
    pub fn groupwise(reaction: ReactionType, values: Vec<f64>) -> Result<Self> {
        Self::new(reaction, XsData::Groupwise(values))
    }

    /// Scattering matrix reaction
    pub fn scatter(kind: ScatterKind, matrix: ScatterMatrix) -> Result<Self> {
        Self::new(ReactionType::Scatter(kind), XsData::Scatter(matrix))
    }

    /// Type of reaction
    pub fn reaction(&self) -> ReactionType {
        self.reaction
    }

    /// Cross-section data
    pub fn data(&self) -> &XsData {
        &self.data
    }

    /// Consume the record, keeping the data
    pub fn into_data(self) -> XsData {
        self.data
    }

    /// Check shape and group count against a library structure
    pub(crate) fn check(&self, num_groups: usize) -> Result<()> {
        // deserialised records never went through new()
        self.check_shape()?;
        if self.data.num_groups() != num_groups {
            return Err(Error::UnexpectedLength {
                context: f!("{} group", self.reaction),
                expected: num_groups,
                found: self.data.num_groups(),
            });
        }
        if let XsData::Scatter(matrix) = &self.data {
            matrix.check_length()?;
        }
        Ok(())
    }

    fn check_shape(&self) -> Result<()> {
        match (&self.data, self.reaction.is_scatter()) {
            (XsData::Scatter(_), true) | (XsData::Groupwise(_), false) => Ok(()),
            (XsData::Groupwise(_), true) => Err(Error::Configuration(f!(
                "{} requires a scattering matrix",
                self.reaction
            ))),
            (XsData::Scatter(_), false) => Err(Error::Configuration(f!(
                "{} cannot hold a scattering matrix",
                self.reaction
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_size_overflow() {
        let huge = 1usize << (usize::BITS / 2);
        let err = ScatterMatrix::new(huge, ScatterFormat::Legendre { order: 0 }, vec![])
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedLength { found: 0, .. }));
    }

    #[test]
    fn names_parse_back() {
        let all = ReactionType::MACROSCOPIC
            .iter()
            .chain(ReactionType::DEPLETION.iter());
        for reaction in all {
            assert_eq!(reaction.name().parse::<ReactionType>().unwrap(), *reaction);
        }
        assert!("(n,fission)".parse::<ReactionType>().is_err());
    }

    #[test]
    fn every_scatter_variant_exports_as_scatter() {
        let kinds = [
            ScatterKind::Scatter,
            ScatterKind::NuScatter,
            ScatterKind::ConsistentScatter,
            ScatterKind::ConsistentNuScatter,
            ScatterKind::Probability,
        ];
        for kind in kinds {
            let reaction = ReactionType::Scatter(kind);
            assert_eq!(reaction.export_name(), "scatter");
            assert_eq!(reaction.name().parse::<ReactionType>().unwrap(), reaction);
        }
    }

    #[test]
    fn microscopic_channels() {
        assert!(ReactionType::DEPLETION.iter().all(|r| r.is_microscopic()));
        assert!(!ReactionType::MACROSCOPIC.iter().any(|r| r.is_microscopic()));
    }

    #[test]
    fn matrix_index_order() {
        let matrix = ScatterMatrix::legendre_from_fn(2, 1, |i, o, l| (100 * i + 10 * o + l) as f64);
        assert_eq!(
            matrix.values(),
            &[0.0, 1.0, 10.0, 11.0, 100.0, 101.0, 110.0, 111.0]
        );
    }

    #[test]
    fn truncation() {
        let matrix = ScatterMatrix::legendre_from_fn(2, 2, |i, o, l| (100 * i + 10 * o + l) as f64);
        let p1 = matrix.truncate(1).unwrap();
        assert_eq!(p1.legendre_order().unwrap(), 1);
        assert_eq!(p1.values().len(), 8);
        assert_eq!(p1.get(1, 0, 1), 101.0);

        let err = matrix.truncate(3).unwrap_err();
        assert!(err.is_missing_data());
    }

    #[test]
    fn p0_correction() {
        // P1 moments: row 0 sums to 0.3, row 1 sums to 0.05
        let values = vec![
            1.0, 0.2, // 0 -> 0
            0.5, 0.1, // 0 -> 1
            0.0, 0.0, // 1 -> 0
            2.0, 0.05, // 1 -> 1
        ];
        let matrix = ScatterMatrix::legendre(2, 1, values).unwrap();
        let corrected = matrix.p0_corrected().unwrap();

        assert_eq!(corrected.legendre_order().unwrap(), 0);
        assert!((corrected.get(0, 0, 0) - 0.7).abs() < 1e-12);
        assert_eq!(corrected.get(0, 1, 0), 0.5);
        assert_eq!(corrected.get(1, 0, 0), 0.0);
        assert!((corrected.get(1, 1, 0) - 1.95).abs() < 1e-12);

        let isotropic = corrected.p0_corrected().unwrap_err();
        assert!(isotropic.is_missing_data());
    }

    #[test]
    fn non_legendre_formats() {
        let matrix = ScatterMatrix::new(1, ScatterFormat::Histogram { bins: 4 }, vec![0.25; 4]).unwrap();
        assert!(matrix.legendre_order().unwrap_err().is_unsupported_format());
        assert!(matrix.truncate(0).unwrap_err().is_unsupported_format());
    }

    #[test]
    fn degenerate_data() {
        assert!(XsData::Groupwise(vec![0.0, 1e-17, -1e-16]).is_degenerate());
        assert!(!XsData::Groupwise(vec![0.0, 2e-16]).is_degenerate());
        assert!(XsData::Groupwise(vec![]).is_degenerate());
    }

    #[test]
    fn record_checks_group_count() {
        let record = ReactionRecord::groupwise(ReactionType::Chi, vec![1.0, 0.0]).unwrap();
        assert!(record.check(2).is_ok());
        assert!(record.check(3).unwrap_err().is_configuration());
    }

    #[test]
    fn deserialised_shape_is_checked() {
        let json = r#"{"reaction": "scatter", "data": {"groupwise": [0.5, 0.5]}}"#;
        let record: ReactionRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(record.check(2), Err(Error::Configuration(_))));
    }
}
