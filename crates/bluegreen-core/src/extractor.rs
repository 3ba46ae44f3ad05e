//! Artifact extraction.
//!
//! Unpacks an uploaded zip archive into a directory the courier can push
//! from, optionally replacing the bundled `manifest.yml`.

use std::path::Path;

use anyhow::Context;

const MANIFEST_FILE: &str = "manifest.yml";

const FIX_YOUR_ZIP: &str = "Please double check your zip compression method and that the correct files are zipped.
You can try confirming that it's valid on your computer by opening or performing some other action on it. Once you've confirmed that it's valid, please try again.";

/// Extracts application archives onto the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    /// Unzip `source` into `destination`.
    ///
    /// When `manifest` is given it is written to `manifest.yml`, replacing
    /// any manifest shipped inside the archive.
    pub fn unzip(
        &self,
        source: &Path,
        destination: &Path,
        manifest: Option<&str>,
    ) -> anyhow::Result<()> {
        tracing::info!("extracting application");
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            "extractor parameters"
        );

        std::fs::create_dir_all(destination).with_context(|| {
            format!("cannot create directory: {}", destination.display())
        })?;

        let file = std::fs::File::open(source)
            .with_context(|| format!("cannot open artifact: {}", source.display()))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| {
            anyhow::anyhow!(
                "cannot open zip file: {}: {}\n{}",
                source.display(),
                e,
                FIX_YOUR_ZIP
            )
        })?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("cannot extract file from archive: entry {}", i))?;

            // Entries that would escape the destination are skipped
            let Some(relative) = entry.enclosed_name() else {
                tracing::warn!(entry = entry.name(), "skipping archive entry with unsafe path");
                continue;
            };
            let out_path = destination.join(relative);

            if entry.is_dir() {
                std::fs::create_dir_all(&out_path)
                    .with_context(|| format!("cannot make directory: {}", out_path.display()))?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("cannot make directory: {}", parent.display()))?;
            }

            let mut out_file = std::fs::File::create(&out_path).with_context(|| {
                format!("cannot open file for writing: {}", out_path.display())
            })?;
            std::io::copy(&mut entry, &mut out_file)
                .with_context(|| format!("cannot write to file: {}", out_path.display()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode & 0o7777))
                        .with_context(|| {
                            format!("cannot set permissions: {}", out_path.display())
                        })?;
                }
            }
        }

        if let Some(manifest) = manifest {
            let manifest_path = destination.join(MANIFEST_FILE);
            std::fs::write(&manifest_path, manifest).with_context(|| {
                format!("cannot write manifest file: {}", manifest_path.display())
            })?;
        }

        tracing::info!("extract was successful");
        Ok(())
    }
}
