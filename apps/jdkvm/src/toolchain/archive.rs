//! Archive extraction for downloaded JDK distributions.
//!
//! JDK archives contain a single top-level `jdk-<version>/` directory. The
//! extractor unpacks entries as they are; locating and relocating the
//! distribution directory is the installer's job.
//!
//! Supported formats, chosen by file name:
//!
//! - `.zip`
//! - `.tar.gz` / `.tgz`
//!
//! Entries with absolute paths or `..` components are rejected before
//! anything is written for them. Tar entries are unpacked with
//! [`tar::Entry::unpack_in`], which also refuses to write through a symlink
//! created by an earlier entry.

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use std::path::{Component, Path};
use tar::Archive;

/// Unpacks an archive into a directory.
pub trait Decompressor {
    /// Extracts `archive` into `dest`, creating `dest` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is unreadable or an entry cannot be written.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// [`Decompressor`] for zip and gzip-compressed tar archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveDecompressor;

impl Decompressor for ArchiveDecompressor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        extract_archive(archive, dest)
    }
}

/// Extracts a zip or tar.gz archive, selected by extension.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or extracted.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let name = archive_path.to_string_lossy().to_ascii_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive_path, dest_dir)
    } else {
        extract_zip(archive_path, dest_dir)
    }
}

fn ensure_enclosed(entry_path: &Path) -> Result<()> {
    if entry_path.is_absolute()
        || entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        bail!(
            "Refusing to extract path with parent directory or absolute reference: {}",
            entry_path.display()
        );
    }
    Ok(())
}

/// Extracts a zip archive.
///
/// On Unix, file modes stored in the archive are restored.
///
/// # Errors
///
/// Returns an error if the archive is not a valid zip, contains an unsafe
/// path, or a file cannot be written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;

        let Some(entry_path) = entry.enclosed_name() else {
            bail!("Refusing to extract unsafe entry path: {}", entry.name());
        };
        ensure_enclosed(&entry_path)?;

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut outfile = std::fs::File::create(&output_path)
            .with_context(|| format!("Failed to create file: {}", output_path.display()))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions: {}", output_path.display()))?;
        }
    }

    Ok(())
}

/// Extracts a gzip-compressed tar archive.
///
/// # Errors
///
/// Returns an error if the archive is not a valid tar.gz, contains an unsafe
/// path, or an entry cannot be unpacked.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;

        let entry_path = entry
            .path()
            .context("Failed to get entry path")?
            .into_owned();
        ensure_enclosed(&entry_path)?;

        let unpacked = entry
            .unpack_in(dest_dir)
            .with_context(|| format!("Failed to extract: {}", entry_path.display()))?;
        if !unpacked {
            bail!(
                "Refusing to extract entry outside the destination: {}",
                entry_path.display()
            );
        }
    }

    Ok(())
}

/// Marks every file in `<install>/bin` as executable (`0755`).
///
/// A missing `bin` directory is not an error.
///
/// # Errors
///
/// Returns an error if a permission change fails.
#[cfg(unix)]
pub fn set_executable_permissions(install_path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let bin_dir = install_path.join("bin");
    if !bin_dir.is_dir() {
        return Ok(());
    }

    let entries = std::fs::read_dir(&bin_dir)
        .with_context(|| format!("Failed to read bin directory: {}", bin_dir.display()))?;

    for entry in entries {
        let path = entry.context("Failed to read directory entry")?.path();
        if path.is_file() {
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
        }
    }

    Ok(())
}

/// Sets executable permissions (no-op on Windows).
#[cfg(windows)]
#[allow(clippy::unnecessary_wraps)]
pub fn set_executable_permissions(_install_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tar::Builder;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).expect("Should create file");
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).expect("Should start file");
            zip.write_all(content).expect("Should write");
        }
        zip.finish().expect("Should finish");
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).expect("Should create file");
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, *content)
                .expect("Should append file");
        }
        builder.finish().expect("Should finish");
    }

    #[test]
    fn zip_keeps_distribution_directory() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("OpenJDK17U-jdk_x64_windows.zip");
        let dest = temp.path().join("out");
        write_zip(
            &archive,
            &[
                ("jdk-17.0.11+9/bin/java.exe", b"MZ"),
                ("jdk-17.0.11+9/release", b"JAVA_VERSION=\"17.0.11\""),
            ],
        );

        ArchiveDecompressor.extract(&archive, &dest).unwrap();

        assert!(dest.join("jdk-17.0.11+9/bin/java.exe").is_file());
        assert!(dest.join("jdk-17.0.11+9/release").is_file());
    }

    #[test]
    fn tar_gz_is_selected_by_extension() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("out");
        for name in ["jdk.tar.gz", "jdk.tgz", "JDK.TAR.GZ"] {
            let archive = temp.path().join(name);
            write_tar_gz(&archive, &[("jdk-21.0.3+9/bin/java", b"\x7fELF")]);
            extract_archive(&archive, &dest).unwrap();
            assert!(dest.join("jdk-21.0.3+9/bin/java").is_file());
        }
    }

    #[test]
    fn zip_rejects_parent_directory_entries() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("evil.zip");
        let dest = temp.path().join("out");
        write_zip(&archive, &[("../escaped.txt", b"nope")]);

        assert!(extract_zip(&archive, &dest).is_err());
        assert!(!temp.path().join("escaped.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn tar_gz_refuses_to_write_through_symlinks() {
        let temp = tempfile::tempdir().unwrap();
        let outside = temp.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        let archive = temp.path().join("evil.tar.gz");
        let dest = temp.path().join("out");

        let file = std::fs::File::create(&archive).unwrap();
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        link.set_link_name(&outside).unwrap();
        link.set_cksum();
        builder
            .append_data(&mut link, "jdk-x/link", std::io::empty())
            .unwrap();
        let mut escaped = tar::Header::new_gnu();
        escaped.set_size(4);
        escaped.set_mode(0o644);
        escaped.set_cksum();
        builder
            .append_data(&mut escaped, "jdk-x/link/escaped.txt", &b"nope"[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        assert!(extract_tar_gz(&archive, &dest).is_err());
        assert!(!outside.join("escaped.txt").exists());
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("broken.zip");
        std::fs::write(&archive, b"this is not a zip").unwrap();

        assert!(extract_archive(&archive, &temp.path().join("out")).is_err());
    }

    #[test]
    fn empty_zip_extracts_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("empty.zip");
        let dest = temp.path().join("out");
        write_zip(&archive, &[]);

        extract_zip(&archive, &dest).unwrap();
        assert_eq!(std::fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[cfg(unix)]
    mod unix_permissions {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        #[test]
        fn bin_files_become_executable() {
            let temp = tempfile::tempdir().unwrap();
            let bin = temp.path().join("bin");
            std::fs::create_dir_all(&bin).unwrap();
            for name in ["java", "javac"] {
                let path = bin.join(name);
                std::fs::write(&path, b"bin").unwrap();
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
            }

            set_executable_permissions(temp.path()).unwrap();

            for name in ["java", "javac"] {
                let mode = std::fs::metadata(bin.join(name)).unwrap().permissions().mode();
                assert_eq!(mode & 0o777, 0o755, "{name}");
            }
        }

        #[test]
        fn missing_bin_dir_is_fine() {
            let temp = tempfile::tempdir().unwrap();
            assert!(set_executable_permissions(temp.path()).is_ok());
        }
    }
}
