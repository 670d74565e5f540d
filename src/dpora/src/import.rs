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

//! The import pipeline from archive to populated document

use super::manifest::{parse_canvas, parse_layers, read_manifest};
use super::reconstruct::reconstruct;
use super::report::{ImportReport, RetainedLayer, SkippedLayer};
use super::stage::{check_mimetype, stage, ArchiveExtractor, ScratchDir, ZipExtractor};
use super::{ImportError, ImportOptions};

use dphost::{ColorMode, DocumentHost, DocumentId, DocumentSpec, HostError, LayerId, LayerInfo};

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

static UNTITLED: &str = "Untitled";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Staged,
    ManifestRead,
    DocumentCreated,
    LayersReconstructed,
    BackgroundStripped,
    Done,
    Failed,
}

/// Import an OpenRaster file into a new document, extracting it in-process
pub fn import_openraster<H: DocumentHost + ?Sized>(
    host: &mut H,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportReport, ImportError> {
    Importer::new(host, &ZipExtractor, options).import(path)
}

/// Drives a single import.
pub struct Importer<'a, H: DocumentHost + ?Sized> {
    host: &'a mut H,
    extractor: &'a dyn ArchiveExtractor,
    options: &'a ImportOptions,
    state: ImportState,
}

impl<'a, H: DocumentHost + ?Sized> Importer<'a, H> {
    pub fn new(
        host: &'a mut H,
        extractor: &'a dyn ArchiveExtractor,
        options: &'a ImportOptions,
    ) -> Self {
        Importer {
            host,
            extractor,
            options,
            state: ImportState::Idle,
        }
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    /// Run the import. The scratch directory is removed before this
    /// returns, whether or not the import succeeded.
    pub fn import(&mut self, path: &Path) -> Result<ImportReport, ImportError> {
        self.state = ImportState::Idle;

        let scratch = match ScratchDir::new(self.options.scratch_parent.as_deref()) {
            Ok(s) => s,
            Err(e) => {
                self.transition(ImportState::Failed);
                return Err(e);
            }
        };

        let result = self.import_staged(path, scratch.path());

        if let Err(e) = scratch.close() {
            warn!("Could not remove scratch directory: {}", e);
        }

        match result {
            Ok(report) => {
                self.transition(ImportState::Done);
                info!(
                    "Imported {} with {} layer(s)",
                    path.display(),
                    report.layers.len()
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(ImportState::Failed);
                warn!("Could not import {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    fn import_staged(&mut self, path: &Path, dir: &Path) -> Result<ImportReport, ImportError> {
        stage(self.extractor, path, dir, self.options.extraction_timeout)?;
        check_mimetype(dir, self.options.strict_mimetype)?;
        self.transition(ImportState::Staged);

        let text = read_manifest(dir)?;
        self.transition(ImportState::ManifestRead);

        let canvas = parse_canvas(&text)?;
        let layers = parse_layers(&text)?;

        let doc = self
            .host
            .create_document(&DocumentSpec {
                name: document_name(path),
                width: canvas.width,
                height: canvas.height,
                resolution: self.options.resolution,
                color_mode: ColorMode::Rgb,
            })
            .map_err(ImportError::Host)?;
        self.transition(ImportState::DocumentCreated);

        let mut report = ImportReport::new(doc, canvas);

        // The manifest lists layers from top to bottom, and each pasted
        // layer lands on top, so paste the bottommost one first.
        for descriptor in layers.iter().rev() {
            match reconstruct(&mut *self.host, doc, descriptor, dir) {
                Ok(layer) => report.layers.push(layer),
                Err(e) => {
                    warn!("Skipping layer \"{}\": {}", descriptor.name, e);
                    report.skipped.push(SkippedLayer {
                        name: descriptor.name.clone(),
                        source: descriptor.source_path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        self.transition(ImportState::LayersReconstructed);

        if self.options.keep_background {
            debug!("Keeping layers created by the host");
        } else {
            self.remove_undeclared_layers(doc, &mut report);
        }
        self.transition(ImportState::BackgroundStripped);

        Ok(report)
    }

    /// Make sure the document contains only the layers from the manifest.
    ///
    /// The host may have added layers of its own when the document was
    /// created (typically an opaque, locked background.)
    fn remove_undeclared_layers(&mut self, doc: DocumentId, report: &mut ImportReport) {
        let declared: HashSet<LayerId> = report.layers.iter().map(|l| l.layer).collect();

        let layers = match self.host.layers(doc) {
            Ok(l) => l,
            Err(e) => {
                warn!("Could not list document layers: {}", e);
                report
                    .warnings
                    .push(format!("could not check for extra layers: {}", e));
                return;
            }
        };

        for layer in layers.into_iter().filter(|l| !declared.contains(&l.id)) {
            match self.remove_layer(doc, &layer) {
                Ok(()) => {
                    debug!("Removed layer \"{}\" ({})", layer.name, layer.id);
                    report.removed_layers.push(layer.name);
                }
                Err(e) => {
                    warn!("Could not remove layer \"{}\": {}", layer.name, e);
                    report.retained_layers.push(RetainedLayer {
                        name: layer.name,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn remove_layer(&mut self, doc: DocumentId, layer: &LayerInfo) -> Result<(), HostError> {
        if layer.locked || layer.is_background {
            self.host.unlock_layer(doc, layer.id)?;
        }
        self.host.remove_layer(doc, layer.id)
    }

    fn transition(&mut self, state: ImportState) {
        debug!("Import state {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

fn document_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(UNTITLED)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_name() {
        assert_eq!(document_name(Path::new("/tmp/picture.ora")), "picture");
        assert_eq!(document_name(Path::new("archive")), "archive");
        assert_eq!(document_name(Path::new("/")), UNTITLED);
    }

    #[test]
    fn test_missing_file_fails() {
        let parent = tempfile::tempdir().unwrap();
        let options = ImportOptions {
            scratch_parent: Some(parent.path().to_path_buf()),
            ..ImportOptions::default()
        };

        let mut host = dphost::MemoryHost::new();
        let mut importer = Importer::new(&mut host, &ZipExtractor, &options);
        let result = importer.import(&parent.path().join("nothing-here.ora"));

        assert!(matches!(result, Err(ImportError::Extraction(_))));
        assert_eq!(importer.state(), ImportState::Failed);
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
        assert!(host.documents().is_empty());
    }
}
