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

//! OpenRaster import.
//!
//! An `.ora` file is extracted into a scratch directory, its `stack.xml`
//! manifest is parsed, and every layer it declares is pasted into a new
//! document of a [`DocumentHost`](dphost::DocumentHost).

use dphost::HostError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use zip::result::ZipError;

pub mod blend;
pub mod import;
pub mod manifest;
mod options;
pub mod reconstruct;
mod report;
pub mod stage;

pub use blend::map_blend_mode;
pub use import::{import_openraster, ImportState, Importer};
pub use manifest::{CanvasDimensions, LayerDescriptor, LayerStack, Manifest};
pub use options::ImportOptions;
pub use reconstruct::{AttributeOutcome, LayerReport};
pub use report::{ImportReport, RetainedLayer, SkippedLayer};
pub use stage::{ArchiveExtractor, CommandExtractor, ScratchDir, ZipExtractor};

/// Errors that abort the whole import
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not extract archive: {0}")]
    Extraction(String),

    #[error("manifest not found: {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("could not create document: {0}")]
    Host(#[source] HostError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ZipError> for ImportError {
    fn from(err: ZipError) -> Self {
        Self::Extraction(err.to_string())
    }
}

/// Errors that cause a single layer to be skipped
#[derive(Debug, Error)]
pub enum LayerImportError {
    #[error("layer source not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("layer source path is not inside the archive: {0}")]
    UnsafePath(String),

    #[error("could not load layer content: {0}")]
    AssetLoad(#[source] HostError),

    #[error("could not paste layer content: {0}")]
    Paste(#[source] HostError),
}
