//! Interface to wherever the tallied cross sections come from

// mgtools modules
use mgtools_utils::f;

// crate modules
use crate::condense::condense_data;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::group::EnergyGroups;
use crate::library::MgxsLibrary;
use crate::reaction::{ReactionType, XsData};

/// Provider of tallied multi-group cross sections
///
/// Monte Carlo codes accumulate the tallies and do the homogenisation. This
/// trait covers only what is needed to pull the finished results out, so any
/// statepoint reader can be plugged into a [MgxsRequest](crate::MgxsRequest).
///
/// [MgxsLibrary] implements this directly for results that have already been
/// loaded, e.g. with [read_json()](crate::read_json).
pub trait XsSource {
    /// Group structure the results were tallied with
    fn energy_groups(&self) -> &EnergyGroups;

    /// Results for one reaction in increasing group order
    ///
    /// Macroscopic data when `nuclide` is `None`, otherwise microscopic data
    /// for the named nuclide. Must fail with [Error::MissingData] if there is
    /// nothing tallied for the combination.
    fn get_xs(
        &self,
        domain: &Domain,
        reaction: ReactionType,
        nuclide: Option<&str>,
    ) -> Result<XsData>;

    /// Names of nuclides with microscopic results in a domain
    fn nuclides(&self, domain: &Domain) -> Vec<String>;

    /// Group flux for a domain, if available
    fn flux(&self, domain: &Domain) -> Option<&[f64]>;

    /// Results for one reaction collapsed onto a coarser group structure
    ///
    /// The default implementation flux weights the fine group data (see
    /// [MgxsLibrary::condense]), falling back to uniform weights when there
    /// is no flux.
    fn get_condensed_xs(
        &self,
        domain: &Domain,
        reaction: ReactionType,
        nuclide: Option<&str>,
        coarse: &EnergyGroups,
    ) -> Result<XsData> {
        let map = self.energy_groups().condensation_map(coarse)?;
        let data = self.get_xs(domain, reaction, nuclide)?;
        condense_data(
            &data,
            reaction,
            &map,
            self.flux(domain),
            coarse.num_groups(),
        )
    }
}

impl XsSource for MgxsLibrary {
    fn energy_groups(&self) -> &EnergyGroups {
        self.groups()
    }

    fn get_xs(
        &self,
        domain: &Domain,
        reaction: ReactionType,
        nuclide: Option<&str>,
    ) -> Result<XsData> {
        let missing = || Error::MissingData {
            domain: domain.name.clone(),
            reaction: match nuclide {
                Some(name) => f!("{reaction} ({name})"),
                None => reaction.to_string(),
            },
        };

        let domain_xs = self.domain(domain.id).ok_or_else(missing)?;
        let record = match nuclide {
            Some(name) => domain_xs
                .nuclide(name)
                .and_then(|n| n.records.iter().find(|r| r.reaction() == reaction)),
            None => domain_xs.get(reaction),
        };

        record.map(|r| r.data().clone()).ok_or_else(missing)
    }

    fn nuclides(&self, domain: &Domain) -> Vec<String> {
        self.domain(domain.id)
            .map(|d| d.nuclides.iter().map(|n| n.name.clone()).collect())
            .unwrap_or_default()
    }

    fn flux(&self, domain: &Domain) -> Option<&[f64]> {
        self.domain(domain.id).and_then(|d| d.flux.as_deref())
    }
}
