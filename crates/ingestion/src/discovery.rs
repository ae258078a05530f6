//! Raw-file discovery and instrument-id extraction.
//!
//! File names encode the instrument id between the first two underscores,
//! e.g. `TAQ_BMWG.DE_20170901_20171001.csv.gz`. Venues sharing one folder
//! are told apart by a substring filter (e.g. `.BS_` for BATS).

use std::path::{Path, PathBuf};

use tickday_core::{Error, Result};
use tracing::debug;

/// List raw files in `folder` matching the suffix and venue filter,
/// sorted by name.
pub fn discover_files(folder: &Path, suffix: &str, venue_filter: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.ends_with(suffix) && name.contains(venue_filter) {
            files.push(entry.path());
        }
    }
    files.sort();
    debug!(count = files.len(), folder = %folder.display(), "discovered raw files");
    Ok(files)
}

/// Instrument id from the segment between the first two underscores of the
/// file name.
pub fn instrument_from_path(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::data(format!("unusable file name: {}", path.display())))?;
    let mut parts = name.split('_');
    parts.next();
    match parts.next() {
        Some(ric) if !ric.is_empty() => Ok(ric.to_string()),
        _ => Err(Error::data(format!(
            "cannot extract instrument id from file name {name:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_from_path() {
        let path = Path::new("/data/TAQ_BMWG.DE_20170901_20171001.csv.gz");
        assert_eq!(instrument_from_path(path).unwrap(), "BMWG.DE");
    }

    #[test]
    fn test_instrument_from_mtf_path() {
        let path = Path::new("TAQ_BMWGn.BS_20170901.csv.gz");
        assert_eq!(instrument_from_path(path).unwrap(), "BMWGn.BS");
    }

    #[test]
    fn test_instrument_missing_underscores() {
        let path = Path::new("no-underscores.csv.gz");
        assert!(instrument_from_path(path).is_err());
    }

    #[test]
    fn test_discover_filters_by_suffix_and_venue() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "TAQ_BMWG.DE_201709.csv.gz",
            "TAQ_BMWGn.BS_201709.csv.gz",
            "TAQ_BMWGn.TQ_201709.csv.gz",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let all = discover_files(dir.path(), ".csv.gz", "").unwrap();
        assert_eq!(all.len(), 3);

        let bats = discover_files(dir.path(), ".csv.gz", ".BS_").unwrap();
        assert_eq!(bats.len(), 1);
        assert_eq!(
            instrument_from_path(&bats[0]).unwrap(),
            "BMWGn.BS"
        );
    }

    #[test]
    fn test_discover_missing_folder_is_error() {
        assert!(discover_files(Path::new("/does/not/exist"), ".csv.gz", "").is_err());
    }
}
