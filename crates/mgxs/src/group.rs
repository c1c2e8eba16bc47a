// mgtools modules
use mgtools_utils::{Monotonic, SliceExt};

// crate modules
use crate::error::{Error, Result};

// external crates
use serde::{Deserialize, Serialize};

/// Energy group structure shared by every cross section in a library
///
/// The group boundaries are kept exactly as provided, which for most Monte
/// Carlo codes is ascending energy. Cross-section values on the other hand are
/// stored in increasing *group* order, so group 0 is the highest energy group
/// for ascending boundaries.
///
/// | Stored edges     | Groups                                 |
/// | ---------------- | -------------------------------------- |
/// | 0.0 0.625 2e7    | g0 = 0.625 - 2e7, g1 = 0.0 - 0.625     |
///
/// Output files list the boundaries reversed so that they line up with the
/// group order of the values. This is a fixed convention applied to any
/// structure, whatever the direction of the stored edges.
///
/// ```rust
/// # use mgtools_mgxs::EnergyGroups;
/// let groups = EnergyGroups::new(vec![0.0, 0.625, 2e7]).unwrap();
/// assert_eq!(groups.num_groups(), 2);
/// assert_eq!(groups.group_bounds(), "20000000.0 0.625 0.0");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct EnergyGroups {
    edges: Vec<f64>,
    direction: Monotonic,
}

impl EnergyGroups {
    /// Create a new group structure from a list of boundaries (eV)
    ///
    /// Fails with a configuration error for fewer than two boundaries, any
    /// undefined values, or boundaries that are not strictly monotonic.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        let direction = edges.monotonic()?;
        Ok(Self { edges, direction })
    }

    /// Boundaries in the order they were provided
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of energy groups, always one fewer than the boundaries
    pub fn num_groups(&self) -> usize {
        self.edges.len() - 1
    }

    /// Whether the boundaries were provided in ascending or descending order
    pub fn direction(&self) -> Monotonic {
        self.direction
    }

    /// Boundaries in the order emitted to file, lining up with group order
    pub fn reversed_bounds(&self) -> Vec<f64> {
        self.edges.iter().rev().copied().collect()
    }

    /// Space separated string of the reversed boundaries
    pub fn group_bounds(&self) -> String {
        self.reversed_bounds().to_spaced_string()
    }

    /// Map every group onto a coarser structure
    ///
    /// Returns the coarse group index for each fine group. The coarse
    /// boundaries must be a subset of these boundaries, in the same direction,
    /// and cover exactly the same energy range.
    ///
    /// ```rust
    /// # use mgtools_mgxs::EnergyGroups;
    /// let fine = EnergyGroups::new(vec![0.0, 1.0, 10.0, 20.0]).unwrap();
    /// let coarse = EnergyGroups::new(vec![0.0, 1.0, 20.0]).unwrap();
    ///
    /// // groups run high to low energy, so 10-20 and 1-10 both collapse to 0
    /// assert_eq!(fine.condensation_map(&coarse).unwrap(), vec![0, 0, 1]);
    /// ```
    pub fn condensation_map(&self, coarse: &EnergyGroups) -> Result<Vec<usize>> {
        if self.direction != coarse.direction {
            return Err(Error::Configuration(
                "coarse group boundaries are in the opposite order".to_string(),
            ));
        }

        let fine_bounds = self.reversed_bounds();
        let coarse_bounds = coarse.reversed_bounds();

        if fine_bounds.first() != coarse_bounds.first() || fine_bounds.last() != coarse_bounds.last()
        {
            return Err(Error::Configuration(
                "coarse group boundaries must cover the same energy range".to_string(),
            ));
        }

        // walk down the fine boundaries, stepping to the next coarse group
        // whenever a shared boundary is crossed
        let mut map = Vec::with_capacity(self.num_groups());
        let mut coarse_group = 0;
        for boundary in &fine_bounds[1..] {
            map.push(coarse_group);
            if coarse_bounds.get(coarse_group + 1) == Some(boundary) {
                coarse_group += 1;
            }
        }

        if coarse_group != coarse.num_groups() {
            return Err(Error::Configuration(
                "coarse group boundaries are not a subset of the fine boundaries".to_string(),
            ));
        }

        Ok(map)
    }
}

impl TryFrom<Vec<f64>> for EnergyGroups {
    type Error = Error;

    fn try_from(edges: Vec<f64>) -> Result<Self> {
        Self::new(edges)
    }
}

impl From<EnergyGroups> for Vec<f64> {
    fn from(groups: EnergyGroups) -> Self {
        groups.edges
    }
}

impl std::fmt::Display for EnergyGroups {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} groups ({})", self.num_groups(), self.group_bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![])]
    #[case(vec![1.0])]
    #[case(vec![0.0, 1.0, 1.0])]
    #[case(vec![0.0, 2.0, 1.0])]
    #[case(vec![0.0, f64::NAN])]
    fn invalid_structures(#[case] edges: Vec<f64>) {
        let err = EnergyGroups::new(edges).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn boundary_errors_keep_the_index() {
        let err = EnergyGroups::new(vec![0.0, 2.0, 1.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::UtilsError(mgtools_utils::Error::NotStrictlyMonotonic { index: 2 })
        ));
    }

    #[test]
    fn descending_edges_are_reversed_too() {
        let groups = EnergyGroups::new(vec![2e7, 1.0, 0.0]).unwrap();
        assert_eq!(groups.direction(), Monotonic::Decreasing);
        assert_eq!(groups.group_bounds(), "0.0 1.0 20000000.0");
    }

    #[test]
    fn identity_condensation() {
        let groups = EnergyGroups::new(vec![0.0, 1.0, 10.0]).unwrap();
        assert_eq!(groups.condensation_map(&groups).unwrap(), vec![0, 1]);
    }

    #[test]
    fn condensation_to_single_group() {
        let fine = EnergyGroups::new(vec![0.0, 1.0, 10.0, 20.0]).unwrap();
        let coarse = EnergyGroups::new(vec![0.0, 20.0]).unwrap();
        assert_eq!(fine.condensation_map(&coarse).unwrap(), vec![0, 0, 0]);
    }

    #[rstest]
    #[case(vec![0.0, 5.0, 20.0])] // boundary not in fine structure
    #[case(vec![0.0, 10.0])] // different range
    #[case(vec![20.0, 1.0, 0.0])] // opposite direction
    fn invalid_condensation(#[case] edges: Vec<f64>) {
        let fine = EnergyGroups::new(vec![0.0, 1.0, 10.0, 20.0]).unwrap();
        let coarse = EnergyGroups::new(edges).unwrap();
        assert!(fine.condensation_map(&coarse).is_err());
    }

    #[test]
    fn json_rejects_bad_edges() {
        let groups: EnergyGroups = serde_json::from_str("[0.0, 0.625, 20000000.0]").unwrap();
        assert_eq!(groups.num_groups(), 2);
        assert!(serde_json::from_str::<EnergyGroups>("[1.0, 0.5, 0.9]").is_err());
    }
}
