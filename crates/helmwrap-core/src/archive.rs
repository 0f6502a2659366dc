//! Packaged chart extraction
//!
//! Charts handed over as `.tgz` / `.tar.gz` archives are unpacked into a
//! scratch directory so their dependencies can be inspected and built. The
//! directory lives exactly as long as the returned [`ExtractedChart`].

use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Archive;
use tempfile::TempDir;

use crate::chart::CHART_MANIFEST;
use crate::error::{CoreError, Result};

const ARCHIVE_SUFFIXES: [&str; 2] = [".tgz", ".tar.gz"];

/// Whether a chart reference points at a packaged archive
pub fn is_chart_archive(chart: &str) -> bool {
    ARCHIVE_SUFFIXES
        .iter()
        .any(|suffix| chart.len() > suffix.len() && chart.ends_with(suffix))
}

/// A chart unpacked into a scratch directory
///
/// Dropping this removes the directory and everything in it.
#[derive(Debug)]
pub struct ExtractedChart {
    scratch: TempDir,
    chart_dir: PathBuf,
}

impl ExtractedChart {
    /// Directory to hand to Helm as the chart
    pub fn chart_dir(&self) -> &Path {
        &self.chart_dir
    }

    /// Root of the scratch directory
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

/// Unpack a chart archive into a fresh scratch directory
pub fn extract_chart(archive_path: &Path) -> Result<ExtractedChart> {
    let failed = |message: String| CoreError::ExtractionFailed {
        archive: archive_path.display().to_string(),
        message,
    };

    let scratch = tempfile::Builder::new()
        .prefix("helm-chart-")
        .tempdir()
        .map_err(|e| failed(format!("could not create scratch directory: {}", e)))?;

    let file = File::open(archive_path).map_err(|e| failed(e.to_string()))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(scratch.path())
        .map_err(|e| failed(e.to_string()))?;

    let chart_dir = locate_chart_root(scratch.path());
    tracing::debug!(
        "Extracted {} to {}",
        archive_path.display(),
        chart_dir.display()
    );

    Ok(ExtractedChart { scratch, chart_dir })
}

/// `helm package` nests the chart under a directory named after it; flat
/// archives keep Chart.yaml at the root.
fn locate_chart_root(root: &Path) -> PathBuf {
    if root.join(CHART_MANIFEST).is_file() {
        return root.to_path_buf();
    }

    let Ok(entries) = std::fs::read_dir(root) else {
        return root.to_path_buf();
    };
    let dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();

    match dirs.as_slice() {
        [only] if only.join(CHART_MANIFEST).is_file() => only.clone(),
        _ => root.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::{Builder, Header};

    fn write_archive(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in files {
            let mut header = Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_mtime(0);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_is_chart_archive() {
        assert!(is_chart_archive("mychart-1.0.0.tgz"));
        assert!(is_chart_archive("/out/bin/chart.tar.gz"));
        assert!(!is_chart_archive("./charts/mychart"));
        assert!(!is_chart_archive("mychart"));
        assert!(!is_chart_archive(".tgz"));
    }

    #[test]
    fn test_extract_nested_chart() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("mychart-1.0.0.tgz");
        write_archive(
            &archive,
            &[
                ("mychart/Chart.yaml", "apiVersion: v2\nname: mychart\nversion: 1.0.0\n"),
                ("mychart/values.yaml", "replicas: 1\n"),
            ],
        );

        let extracted = extract_chart(&archive).unwrap();
        assert!(extracted.chart_dir().ends_with("mychart"));
        assert!(extracted.chart_dir().join("Chart.yaml").is_file());
        assert!(extracted.chart_dir().starts_with(extracted.scratch_dir()));
    }

    #[test]
    fn test_extract_flat_chart() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("chart.tar.gz");
        write_archive(
            &archive,
            &[
                ("Chart.yaml", "apiVersion: v2\nname: flat\nversion: 0.1.0\n"),
                ("templates/cm.yaml", "kind: ConfigMap\n"),
            ],
        );

        let extracted = extract_chart(&archive).unwrap();
        assert_eq!(extracted.chart_dir(), extracted.scratch_dir());
        assert!(extracted.chart_dir().join("templates/cm.yaml").is_file());
    }

    #[test]
    fn test_scratch_removed_on_drop() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("chart.tgz");
        write_archive(&archive, &[("Chart.yaml", "name: x\n")]);

        let extracted = extract_chart(&archive).unwrap();
        let scratch = extracted.scratch_dir().to_path_buf();
        assert!(scratch.exists());

        drop(extracted);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_extract_missing_archive() {
        let temp = TempDir::new().unwrap();
        let err = extract_chart(&temp.path().join("missing.tgz")).unwrap_err();
        assert!(matches!(err, CoreError::ExtractionFailed { .. }));
    }

    #[test]
    fn test_extract_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.tgz");
        std::fs::write(&archive, b"this is not gzip").unwrap();

        let err = extract_chart(&archive).unwrap_err();
        assert!(matches!(err, CoreError::ExtractionFailed { .. }));
    }
}
