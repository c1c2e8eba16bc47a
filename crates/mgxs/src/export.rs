//! Write operations for solver-ready XML files

// standard library
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

// mgtools modules
use mgtools_utils::f;

// crate modules
use crate::document::ExportDocument;
use crate::error::{Error, Result};
use crate::group::EnergyGroups;
use crate::library::MgxsLibrary;

// external crates
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Optional settings shared by the XML writers
///
/// ```rust
/// # use mgtools_mgxs::{EnergyGroups, ExportOptions};
/// let options = ExportOptions {
///     generator: Some("my-code".into()),
///     condense_to: Some(EnergyGroups::new(vec![0.0, 0.625, 2e7]).unwrap()),
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Overrides the generator tag of the library
    pub generator: Option<String>,
    /// Collapse onto a coarser group structure before writing
    pub condense_to: Option<EnergyGroups>,
}

/// Write macroscopic cross sections for a transport calculation
///
/// The document is written to `<directory>/<file_name>.xml`, creating the
/// directory if it does not exist and replacing any existing file. Returns
/// the path of the file written.
///
/// Every domain must have a total cross section and a scattering matrix. If
/// anything fails the target file is either absent or left exactly as it was.
///
/// ```rust, no_run
/// # use mgtools_mgxs::{read_json, write_macroscopic_xml, ExportOptions};
/// let library = read_json("path/to/library.json").unwrap();
/// write_macroscopic_xml(&library, "xs", "macro_xs", &ExportOptions::default()).unwrap();
/// ```
pub fn write_macroscopic_xml<P: AsRef<Path>>(
    library: &MgxsLibrary,
    directory: P,
    file_name: &str,
    options: &ExportOptions,
) -> Result<PathBuf> {
    export(
        library,
        directory.as_ref(),
        file_name,
        options,
        ExportDocument::macroscopic,
    )
}

/// Write per-nuclide depletion cross sections
///
/// Same file handling as [write_macroscopic_xml()]. Channels that are zero in
/// every group are left out of the file.
///
/// ```rust, no_run
/// # use mgtools_mgxs::{read_json, write_depletion_xml, ExportOptions};
/// let library = read_json("path/to/library.json").unwrap();
/// write_depletion_xml(&library, "xs", "micro_xs", &ExportOptions::default()).unwrap();
/// ```
pub fn write_depletion_xml<P: AsRef<Path>>(
    library: &MgxsLibrary,
    directory: P,
    file_name: &str,
    options: &ExportOptions,
) -> Result<PathBuf> {
    export(
        library,
        directory.as_ref(),
        file_name,
        options,
        ExportDocument::depletion,
    )
}

/// Write any prepared document to `<directory>/<file_name>.xml`
///
/// The content goes to a temporary file in the same directory first, which
/// is then renamed over the target.
pub fn write_document<P: AsRef<Path>>(
    document: &ExportDocument,
    directory: P,
    file_name: &str,
) -> Result<PathBuf> {
    let directory = directory.as_ref();
    let path = target_path(directory, file_name)?;
    fs::create_dir_all(directory)?;

    let mut file = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        write!(writer, "{document}")?;
        writer.flush()?;
    }
    file.persist(&path)?;

    info!("Written {}", path.display());
    Ok(path)
}

fn export<F>(
    library: &MgxsLibrary,
    directory: &Path,
    file_name: &str,
    options: &ExportOptions,
    build: F,
) -> Result<PathBuf>
where
    F: Fn(&MgxsLibrary, &str) -> Result<ExportDocument>,
{
    // fail early on a bad name rather than after the work is done
    target_path(directory, file_name)?;

    let condensed;
    let library = match &options.condense_to {
        Some(coarse) => {
            debug!("Condensing to {} groups before export", coarse.num_groups());
            condensed = library.condense(coarse)?;
            &condensed
        }
        None => library,
    };

    let generator = options.generator.as_deref().unwrap_or(&library.generator);
    let document = build(library, generator)?;
    write_document(&document, directory, file_name)
}

fn target_path(directory: &Path, file_name: &str) -> Result<PathBuf> {
    if file_name.trim().is_empty() || file_name.contains(['/', '\\']) {
        return Err(Error::Configuration(f!(
            "invalid file name \"{file_name}\""
        )));
    }
    Ok(directory.join(f!("{file_name}.xml")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::library::DomainXs;
    use crate::reaction::{ReactionRecord, ReactionType, ScatterKind, ScatterMatrix};

    fn library() -> MgxsLibrary {
        let groups = EnergyGroups::new(vec![0.0, 1.0, 10.0]).unwrap();
        let mut library = MgxsLibrary::new(groups).with_generator("tally");
        let matrix = ScatterMatrix::legendre(2, 0, vec![1.0, 0.0, 0.0, 3.0]).unwrap();
        let domain = DomainXs::new(Domain::universe(5, "core"))
            .with_record(ReactionRecord::groupwise(ReactionType::Total, vec![2.0, 4.0]).unwrap())
            .with_record(ReactionRecord::scatter(ScatterKind::Scatter, matrix).unwrap());
        library.push(domain).unwrap();
        library
    }

    #[test]
    fn bad_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions::default();
        for name in ["", " ", "a/b", "a\\b"] {
            let err = write_macroscopic_xml(&library(), dir.path(), name, &options).unwrap_err();
            assert!(err.is_configuration());
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn generator_override() {
        let dir = tempfile::tempdir().unwrap();

        let path =
            write_macroscopic_xml(&library(), dir.path(), "a", &ExportOptions::default()).unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("generator=\"tally\""));

        let options = ExportOptions {
            generator: Some("other".into()),
            ..Default::default()
        };
        let path = write_macroscopic_xml(&library(), dir.path(), "b", &options).unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("generator=\"other\""));
    }

    #[test]
    fn condensed_export() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            condense_to: Some(EnergyGroups::new(vec![0.0, 10.0]).unwrap()),
            ..Default::default()
        };
        let path = write_macroscopic_xml(&library(), dir.path(), "one_group", &options).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("num_groups=\"1\""));
        assert!(text.contains("group_bounds=\"10.0 0.0\""));
        assert!(text.contains("<reaction type=\"total\" mgxs=\"3.0\"/>"));
        assert!(text.contains("<reaction type=\"scatter\" mgxs=\"2.0\"/>"));
    }

    #[test]
    fn no_temporary_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        write_macroscopic_xml(&library(), dir.path(), "xs", &ExportOptions::default()).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["xs.xml"]);
    }
}
