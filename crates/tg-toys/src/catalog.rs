//! Region catalog: resolves requested regions to their data and nominal background
//! templates through the ledger.

use std::collections::BTreeSet;

use tg_core::{Error, NOMINAL, ProcessKind, Result};
use tg_hist::{Grid2D, HistogramLoader, algebra};

use crate::ledger::{Ledger, LedgerFilter, LedgerRow, NameSubstitution, filter_ledger};

/// Ledger rows resolved for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionEntry {
    /// Region name (after substitution).
    pub region: String,
    /// The single data row.
    pub data: LedgerRow,
    /// Nominal background rows.
    pub backgrounds: Vec<LedgerRow>,
}

/// Resolved catalog for an ordered list of regions.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionCatalog {
    entries: Vec<RegionEntry>,
}

impl RegionCatalog {
    /// Resolve `regions` (in order) against `ledger`.
    ///
    /// With a non-empty `substitutions`, region labels and histogram names are rewritten
    /// before selection. Without one, every selected row's histogram name must contain its
    /// region label, otherwise [`Error::RegionNotFound`] asks for a substitution map.
    /// Each region needs exactly one data row ([`Error::AmbiguousData`]); only `nominal`
    /// background rows are kept.
    pub fn resolve(
        ledger: &Ledger,
        regions: &[String],
        substitutions: &NameSubstitution,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for r in regions {
            if !seen.insert(r.as_str()) {
                return Err(Error::Validation(format!("region '{r}' requested more than once")));
            }
        }

        let table = if substitutions.is_empty() {
            ledger.clone()
        } else {
            log::info!("applying {} name substitutions to the ledger", substitutions.pairs().len());
            ledger.substituted(substitutions)
        };

        let data_rows = filter_ledger(
            &table,
            &LedgerFilter::all().regions(regions.iter().cloned()).process_types([ProcessKind::Data]),
        );
        let bkg_rows = filter_ledger(
            &table,
            &LedgerFilter::all()
                .regions(regions.iter().cloned())
                .process_types([ProcessKind::Background])
                .variations([NOMINAL]),
        );

        if substitutions.is_empty() {
            for row in data_rows.rows().iter().chain(bkg_rows.rows()) {
                if !row.source_histname.contains(&row.region) {
                    return Err(Error::RegionNotFound {
                        region: row.region.clone(),
                        histogram: row.source_histname.clone(),
                        file: row.source_filename.clone(),
                    });
                }
            }
        }

        let mut entries = Vec::with_capacity(regions.len());
        for region in regions {
            let data: Vec<&LedgerRow> =
                data_rows.rows().iter().filter(|r| &r.region == region).collect();
            let backgrounds: Vec<LedgerRow> =
                bkg_rows.rows().iter().filter(|r| &r.region == region).cloned().collect();

            if data.is_empty() && backgrounds.is_empty() {
                let known = table.rows().iter().any(|r| &r.region == region);
                if !known {
                    return Err(Error::RegionNotFound {
                        region: region.clone(),
                        histogram: String::new(),
                        file: String::new(),
                    });
                }
            }
            if data.len() != 1 {
                return Err(Error::AmbiguousData { region: region.clone(), found: data.len() });
            }
            log::debug!("region {region}: data + {} nominal backgrounds", backgrounds.len());
            entries.push(RegionEntry { region: region.clone(), data: data[0].clone(), backgrounds });
        }
        Ok(Self { entries })
    }

    /// Entries in request order.
    pub fn entries(&self) -> &[RegionEntry] {
        &self.entries
    }

    /// Entry for `region`.
    pub fn get(&self, region: &str) -> Option<&RegionEntry> {
        self.entries.iter().find(|e| e.region == region)
    }

    /// Load every template through `loader`.
    pub fn load(&self, loader: &dyn HistogramLoader) -> Result<Vec<RegionTemplates>> {
        self.entries
            .iter()
            .map(|e| {
                let data = loader.load(&e.data.source_filename, &e.data.source_histname)?;
                let backgrounds = e
                    .backgrounds
                    .iter()
                    .map(|b| {
                        Ok((b.process.clone(), loader.load(&b.source_filename, &b.source_histname)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(RegionTemplates { region: e.region.clone(), data, backgrounds })
            })
            .collect()
    }
}

/// Loaded templates of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTemplates {
    /// Region name.
    pub region: String,
    /// Observed data.
    pub data: Grid2D,
    /// Nominal backgrounds as `(process, grid)`.
    pub backgrounds: Vec<(String, Grid2D)>,
}

impl RegionTemplates {
    /// Elementwise sum of all nominal backgrounds (zero grid if there are none).
    pub fn total_background(&self) -> Result<Grid2D> {
        algebra::sum(
            &self.data,
            self.backgrounds.iter().map(|(_, g)| g),
            format!("TotalBkg_{}", self.region),
        )
    }

    /// Observed event count (integral of the data grid).
    pub fn observed(&self) -> f64 {
        algebra::integral(&self.data)
    }
}
