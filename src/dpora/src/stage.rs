// This file is part of Drawpile.
// Copyright (C) 2021 Calle Laakkonen
//
// Drawpile is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// As additional permission under section 7, you are allowed to distribute
// the software through an app store, even if that store has restrictive
// terms and conditions that are incompatible with the GPL, provided that
// the source is also available under the GPL with or without this permission
// through a channel without those restrictive terms and conditions.
//
// Drawpile is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Drawpile.  If not, see <https://www.gnu.org/licenses/>.

//! Extraction of the archive into a scratch directory

use super::manifest::MANIFEST_NAME;
use super::ImportError;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, warn};
use zip::result::ZipResult;
use zip::ZipArchive;

static MIMETYPE_NAME: &str = "mimetype";
static EXPECTED_MIMETYPE: &[u8] = b"image/openraster";

const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A service that unpacks an archive into a directory
pub trait ArchiveExtractor {
    /// Extract the whole archive into `dest`.
    ///
    /// The destination directory exists when this is called.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ImportError>;

    /// Is the content in place when `extract` returns.
    ///
    /// Extractors that hand the work to something that finishes later
    /// return false, and the archive's manifest is waited for.
    fn completes_synchronously(&self) -> bool {
        true
    }
}

/// Extracts zip archives in-process
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ImportError> {
        let file = File::open(archive).map_err(|e| {
            ImportError::Extraction(format!("could not open {}: {}", archive.display(), e))
        })?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        extract_all(&mut zip, dest)?;
        Ok(())
    }
}

fn extract_all<R: Read + Seek>(zip: &mut ZipArchive<R>, dest: &Path) -> ZipResult<()> {
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let entry_path = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                warn!("Skipping archive entry with unsafe name {:?}", entry.name());
                continue;
            }
        };

        let output_path = dest.join(&entry_path);
        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
        } else {
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&output_path)?;
            io::copy(&mut entry, &mut outfile)?;
        }
    }

    Ok(())
}

/// Extracts archives by running an external `unzip` compatible program
#[derive(Clone, Debug)]
pub struct CommandExtractor {
    program: OsString,
}

impl Default for CommandExtractor {
    fn default() -> Self {
        CommandExtractor::new("unzip")
    }
}

impl CommandExtractor {
    pub fn new<S: Into<OsString>>(program: S) -> Self {
        CommandExtractor {
            program: program.into(),
        }
    }
}

impl ArchiveExtractor for CommandExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ImportError> {
        let program = Path::new(&self.program).display();
        debug!("Running {} on {}", program, archive.display());

        let status = Command::new(&self.program)
            .arg("-o")
            .arg("-qq")
            .arg(archive)
            .arg("-d")
            .arg(dest)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| ImportError::Extraction(format!("could not run {}: {}", program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(ImportError::Extraction(format!(
                "{} failed on {} ({})",
                program,
                archive.display(),
                status
            )))
        }
    }
}

/// The temporary directory an archive is extracted into.
///
/// The directory and everything in it is deleted when this is closed
/// or dropped.
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(parent: Option<&Path>) -> Result<ScratchDir, ImportError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ora-import-");

        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| {
            ImportError::Extraction(format!("could not create scratch directory: {}", e))
        })?;

        let path = dir.path().to_path_buf();
        debug!("Created scratch directory {}", path.display());
        Ok(ScratchDir {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory, reporting any error
    pub fn close(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => {
                debug!("Removing scratch directory {}", self.path.display());
                dir.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!(
                    "Could not remove scratch directory {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Extract an archive into `dest` and wait until its content is available
pub fn stage(
    extractor: &dyn ArchiveExtractor,
    archive: &Path,
    dest: &Path,
    timeout: Duration,
) -> Result<(), ImportError> {
    if !archive.is_file() {
        return Err(ImportError::Extraction(format!(
            "{} is not a file",
            archive.display()
        )));
    }

    fs::create_dir_all(dest).map_err(|e| {
        ImportError::Extraction(format!("could not create {}: {}", dest.display(), e))
    })?;

    extractor.extract(archive, dest)?;

    if !extractor.completes_synchronously() {
        let marker = dest.join(MANIFEST_NAME);
        if !wait_for_file(&marker, timeout) {
            warn!(
                "{} did not appear within {:?} of extraction",
                MANIFEST_NAME, timeout
            );
        }
    }

    Ok(())
}

/// Poll until a file exists. Returns false if the timeout was reached first.
pub fn wait_for_file(path: &Path, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if path.is_file() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(MARKER_POLL_INTERVAL.min(deadline - now));
    }
}

/// OpenRaster files are identified by the presence of a "mimetype" file
pub fn check_mimetype(dir: &Path, strict: bool) -> Result<(), ImportError> {
    let problem = match fs::read(dir.join(MIMETYPE_NAME)) {
        Ok(content) if content == EXPECTED_MIMETYPE => return Ok(()),
        Ok(content) => format!(
            "unexpected mimetype \"{}\"",
            String::from_utf8_lossy(&content).trim()
        ),
        Err(e) if e.kind() == io::ErrorKind::NotFound => "mimetype entry missing".to_string(),
        Err(e) => return Err(e.into()),
    };

    if strict {
        Err(ImportError::UnsupportedFormat(problem))
    } else {
        warn!("Not a well-formed OpenRaster file: {}", problem);
        Ok(())
    }
}
