//! Collapse of cross sections onto coarser group structures

// mgtools modules
use mgtools_utils::f;

// crate modules
use crate::error::{Error, Result};
use crate::group::EnergyGroups;
use crate::library::{DomainXs, MgxsLibrary, NuclideXs};
use crate::reaction::{ReactionRecord, ReactionType, ScatterMatrix, XsData};

// external crates
use itertools::iproduct;
use log::debug;

impl MgxsLibrary {
    /// Collapse every cross section onto a coarser group structure
    ///
    /// The `coarse` boundaries must be a subset of the current boundaries
    /// covering the same range. Each domain uses its own group flux as the
    /// weighting function, or uniform weights if it has none.
    ///
    /// | Data          | Coarse group value                               |
    /// | ------------- | ------------------------------------------------ |
    /// | chi           | sum over fine groups                             |
    /// | scatter       | flux weighted over incoming, summed over outgoing |
    /// | flux          | sum over fine groups                             |
    /// | anything else | flux weighted mean                               |
    ///
    /// ```rust
    /// # use mgtools_mgxs::{Domain, DomainXs, EnergyGroups, MgxsLibrary, ReactionRecord, ReactionType};
    /// let fine = EnergyGroups::new(vec![0.0, 1.0, 10.0]).unwrap();
    /// let mut library = MgxsLibrary::new(fine);
    /// let domain = DomainXs::new(Domain::material(1, "water"))
    ///     .with_record(ReactionRecord::groupwise(ReactionType::Total, vec![1.0, 3.0]).unwrap())
    ///     .with_flux(vec![3.0, 1.0]);
    /// library.push(domain).unwrap();
    ///
    /// let coarse = EnergyGroups::new(vec![0.0, 10.0]).unwrap();
    /// let condensed = library.condense(&coarse).unwrap();
    ///
    /// let total = condensed.domain(1).unwrap().get(ReactionType::Total).unwrap();
    /// assert_eq!(total.data().values(), &[1.5]);
    /// ```
    pub fn condense(&self, coarse: &EnergyGroups) -> Result<MgxsLibrary> {
        let map = self.groups().condensation_map(coarse)?;
        let num_coarse = coarse.num_groups();
        debug!(
            "Condensing {} groups to {} groups",
            self.groups().num_groups(),
            num_coarse
        );

        let domains = self
            .domains()
            .iter()
            .map(|domain| condense_domain(domain, &map, num_coarse))
            .collect::<Result<Vec<DomainXs>>>()?;

        MgxsLibrary::from_parts(self.generator.clone(), coarse.clone(), domains)
    }
}

fn condense_domain(domain: &DomainXs, map: &[usize], num_coarse: usize) -> Result<DomainXs> {
    let weights = domain.flux.as_deref();
    let condense_records = |records: &[ReactionRecord]| {
        records
            .iter()
            .map(|r| {
                let data = condense_data(r.data(), r.reaction(), map, weights, num_coarse)?;
                ReactionRecord::new(r.reaction(), data)
            })
            .collect::<Result<Vec<ReactionRecord>>>()
    };

    let records = condense_records(&domain.records)?;
    let nuclides = domain
        .nuclides
        .iter()
        .map(|n| -> Result<NuclideXs> {
            Ok(NuclideXs::new(n.name.clone(), condense_records(&n.records)?))
        })
        .collect::<Result<Vec<NuclideXs>>>()?;
    let flux = domain.flux.as_ref().map(|f| sum_groups(f, map, num_coarse));

    Ok(DomainXs {
        domain: domain.domain.clone(),
        records,
        nuclides,
        flux,
    })
}

/// Collapse a single set of results given the fine-to-coarse group map
///
/// `weights` are the fine group flux values, uniform if `None`. A coarse group
/// with no weight at all ends up as zero.
pub(crate) fn condense_data(
    data: &XsData,
    reaction: ReactionType,
    map: &[usize],
    weights: Option<&[f64]>,
    num_coarse: usize,
) -> Result<XsData> {
    if data.num_groups() != map.len() {
        return Err(Error::UnexpectedLength {
            context: f!("{reaction} group"),
            expected: map.len(),
            found: data.num_groups(),
        });
    }

    let uniform = vec![1.0; map.len()];
    let weights = weights.unwrap_or(&uniform[..]);
    let coarse_weights = sum_groups(weights, map, num_coarse);

    let condensed = match data {
        XsData::Groupwise(values) if reaction == ReactionType::Chi => {
            XsData::Groupwise(sum_groups(values, map, num_coarse))
        }
        XsData::Groupwise(values) => {
            let weighted: Vec<f64> = values.iter().zip(weights).map(|(v, w)| v * w).collect();
            let sums = sum_groups(&weighted, map, num_coarse);
            XsData::Groupwise(normalise(&sums, &coarse_weights))
        }
        XsData::Scatter(matrix) => {
            XsData::Scatter(condense_matrix(matrix, map, weights, &coarse_weights, num_coarse)?)
        }
    };

    Ok(condensed)
}

fn condense_matrix(
    matrix: &ScatterMatrix,
    map: &[usize],
    weights: &[f64],
    coarse_weights: &[f64],
    num_coarse: usize,
) -> Result<ScatterMatrix> {
    let entries = matrix.format().entries();
    let mut values = vec![0.0; num_coarse * num_coarse * entries];

    for (g_in, g_out, l) in iproduct!(0..map.len(), 0..map.len(), 0..entries) {
        let idx = (map[g_in] * num_coarse + map[g_out]) * entries + l;
        values[idx] += weights[g_in] * matrix.get(g_in, g_out, l);
    }

    // normalise by the weight of the incoming coarse group
    for (idx, value) in values.iter_mut().enumerate() {
        let weight = coarse_weights[idx / (num_coarse * entries)];
        *value = if weight == 0.0 { 0.0 } else { *value / weight };
    }

    ScatterMatrix::new(num_coarse, matrix.format(), values)
}

fn sum_groups(values: &[f64], map: &[usize], num_coarse: usize) -> Vec<f64> {
    let mut sums = vec![0.0; num_coarse];
    for (value, coarse) in values.iter().zip(map) {
        sums[*coarse] += value;
    }
    sums
}

fn normalise(sums: &[f64], weights: &[f64]) -> Vec<f64> {
    sums.iter()
        .zip(weights)
        .map(|(s, w)| if *w == 0.0 { 0.0 } else { s / w })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::reaction::ScatterKind;

    fn fine() -> EnergyGroups {
        EnergyGroups::new(vec![0.0, 1.0, 10.0, 20.0]).unwrap()
    }

    #[test]
    fn chi_is_summed() {
        let data = XsData::Groupwise(vec![0.5, 0.25, 0.25]);
        let condensed =
            condense_data(&data, ReactionType::Chi, &[0, 0, 1], Some([5.0, 1.0, 1.0].as_slice()), 2).unwrap();
        assert_eq!(condensed.values(), &[0.75, 0.25]);
    }

    #[test]
    fn zero_weight_groups() {
        let data = XsData::Groupwise(vec![2.0, 4.0, 8.0]);
        let condensed =
            condense_data(&data, ReactionType::Total, &[0, 0, 1], Some([0.0, 0.0, 1.0].as_slice()), 2)
                .unwrap();
        assert_eq!(condensed.values(), &[0.0, 8.0]);
    }

    #[test]
    fn wrong_group_count() {
        let data = XsData::Groupwise(vec![2.0, 4.0]);
        let err = condense_data(&data, ReactionType::Total, &[0, 0, 1], None, 2).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn scatter_matrix_collapse() {
        // 3 -> 1 group, uniform weights: every fine entry summed then / 3
        let matrix = ScatterMatrix::legendre_from_fn(3, 1, |i, o, l| (i + o + l) as f64);
        let coarse = condense_matrix(&matrix, &[0, 0, 0], &[1.0; 3], &[3.0], 1).unwrap();

        let p0: f64 = (0..3).flat_map(|i| (0..3).map(move |o| (i + o) as f64)).sum();
        assert_eq!(coarse.legendre_order().unwrap(), 1);
        assert_eq!(coarse.get(0, 0, 0), p0 / 3.0);
        assert_eq!(coarse.get(0, 0, 1), (p0 + 9.0) / 3.0);
    }

    #[test]
    fn library_condensation() {
        let mut library = MgxsLibrary::new(fine()).with_generator("tally");
        let matrix = ScatterMatrix::legendre(
            3,
            0,
            vec![
                1.0, 0.5, 0.0, // from g0
                0.0, 2.0, 0.5, // from g1
                0.0, 0.0, 4.0, // from g2
            ],
        )
        .unwrap();
        let domain = DomainXs::new(Domain::material(1, "water"))
            .with_record(ReactionRecord::scatter(ScatterKind::NuScatter, matrix).unwrap())
            .with_nuclide(NuclideXs::new(
                "O16",
                vec![ReactionRecord::groupwise(ReactionType::NProton, vec![0.2, 0.0, 0.0]).unwrap()],
            ))
            .with_flux(vec![1.0, 3.0, 10.0]);
        library.push(domain).unwrap();

        let coarse = EnergyGroups::new(vec![0.0, 1.0, 20.0]).unwrap();
        let condensed = library.condense(&coarse).unwrap();
        assert_eq!(condensed.generator, "tally");
        assert_eq!(condensed.groups(), &coarse);

        let water = condensed.domain(1).unwrap();
        assert_eq!(water.flux.as_deref(), Some([4.0, 10.0].as_slice()));

        // incoming coarse group 0 = fine 0 (w=1) and fine 1 (w=3)
        let scatter = match water.scatter().unwrap().data() {
            XsData::Scatter(m) => m.clone(),
            _ => unreachable!(),
        };
        assert_eq!(scatter.get(0, 0, 0), (1.0 * 1.5 + 3.0 * 2.0) / 4.0);
        assert_eq!(scatter.get(0, 1, 0), (3.0 * 0.5) / 4.0);
        assert_eq!(scatter.get(1, 0, 0), 0.0);
        assert_eq!(scatter.get(1, 1, 0), 4.0);

        let np = &water.nuclide("O16").unwrap().records[0];
        assert_eq!(np.data().values(), &[0.05, 0.0]);
    }
}
