//! Source archive fetching and extraction

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::Result;

/// Archive format of a fetched source distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Gzip-compressed tarball (`.tgz` / `.tar.gz`)
    TarGz,
    /// Zip archive
    Zip,
}

/// Fetch a URL and save to the given path, verifying SHA-256 when provided
pub fn fetch_url(url: &str, dest: &Path, expected_sha256: Option<&str>) -> Result<()> {
    info!("Fetching {}", url);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let response = reqwest::blocking::get(url)?;

    if !response.status().is_success() {
        return Err(CoreError::SourceFetch {
            url: url.to_string(),
            message: format!("HTTP status {}", response.status()),
        });
    }

    let bytes = response.bytes()?;

    if let Some(expected) = expected_sha256 {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let actual = hex::encode(hasher.finalize());

        if actual != expected {
            return Err(CoreError::HashMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        debug!("Hash verified: {}", expected);
    }

    let mut file = File::create(dest)?;
    file.write_all(&bytes)?;

    info!("Downloaded to {}", dest.display());
    Ok(())
}

/// Unpack an archive into the destination directory
///
/// Entry paths are preserved as-is: a `Python-3.7.16.tgz` archive produces a
/// `Python-3.7.16/` tree under `dest`, which configure later runs inside.
pub fn unpack_archive(archive_path: &Path, kind: ArchiveKind, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;

    match kind {
        ArchiveKind::TarGz => unpack_tar_gz(archive_path, dest)?,
        ArchiveKind::Zip => unpack_zip(archive_path, dest)?,
    }

    info!("Unpacked to {}", dest.display());
    Ok(())
}

fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    let mut archive = Archive::new(decoder);
    archive.unpack(dest)?;
    Ok(())
}

fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| {
        CoreError::SourceFetch {
            url: archive_path.display().to_string(),
            message: format!("failed to open zip: {}", e),
        }
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| CoreError::SourceFetch {
            url: archive_path.display().to_string(),
            message: format!("failed to read zip entry: {}", e),
        })?;

        let Some(path) = entry.enclosed_name() else {
            return Err(CoreError::SourceFetch {
                url: archive_path.display().to_string(),
                message: "invalid zip entry name".to_string(),
            });
        };
        let dest_path = dest.join(path);

        if entry.is_dir() {
            fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut outfile = File::create(&dest_path)?;
            std::io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
                }
            }
        }
    }

    Ok(())
}

/// File name component of a distribution URL
pub fn archive_file_name(url: &str) -> PathBuf {
    let name = url.rsplit('/').next().unwrap_or(url);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tar_gz(path: &Path, top_dir: &str) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let mut header = tar::Header::new_gnu();
        let content = b"print('hi')\n";
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                format!("{}/setup.py", top_dir),
                content.as_slice(),
            )
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_unpack_tar_gz_preserves_top_dir() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("Python-3.7.16.tgz");
        write_tar_gz(&archive, "Python-3.7.16");

        let dest = temp.path().join("source");
        unpack_archive(&archive, ArchiveKind::TarGz, &dest).unwrap();

        assert!(dest.join("Python-3.7.16/setup.py").exists());
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(
            archive_file_name("https://www.python.org/ftp/python/3.7.16/Python-3.7.16.tgz"),
            PathBuf::from("Python-3.7.16.tgz")
        );
    }
}
