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

use super::manifest::CanvasDimensions;
use super::reconstruct::LayerReport;

use dphost::DocumentId;

use std::fmt;

/// A manifest layer that could not be imported at all
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedLayer {
    pub name: String,
    pub source: String,
    pub reason: String,
}

/// A layer that is not part of the manifest but could not be removed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetainedLayer {
    pub name: String,
    pub reason: String,
}

/// The outcome of a completed import
#[derive(Clone, Debug)]
pub struct ImportReport {
    pub document: DocumentId,
    pub canvas: CanvasDimensions,

    /// The recreated layers, from bottom to top
    pub layers: Vec<LayerReport>,

    pub skipped: Vec<SkippedLayer>,

    /// Names of the layers the host created on its own that were removed
    pub removed_layers: Vec<String>,

    pub retained_layers: Vec<RetainedLayer>,

    /// Other problems that did not stop the import
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn new(document: DocumentId, canvas: CanvasDimensions) -> Self {
        ImportReport {
            document,
            canvas,
            layers: Vec::new(),
            skipped: Vec::new(),
            removed_layers: Vec::new(),
            retained_layers: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Was everything in the manifest imported without problems
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.retained_layers.is_empty()
            && self.warnings.is_empty()
            && self.layers.iter().all(LayerReport::is_complete)
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Imported {} layer(s) into a {}x{} document",
            self.layers.len(),
            self.canvas.width,
            self.canvas.height
        )?;

        for layer in self.layers.iter().rev() {
            for (attribute, reason) in layer.failures() {
                writeln!(
                    f,
                    "  layer \"{}\": could not set {}: {}",
                    layer.name, attribute, reason
                )?;
            }
        }

        for skipped in &self.skipped {
            writeln!(
                f,
                "  skipped \"{}\" ({}): {}",
                skipped.name, skipped.source, skipped.reason
            )?;
        }

        for retained in &self.retained_layers {
            writeln!(
                f,
                "  could not remove layer \"{}\": {}",
                retained.name, retained.reason
            )?;
        }

        for warning in &self.warnings {
            writeln!(f, "  {}", warning)?;
        }

        Ok(())
    }
}
