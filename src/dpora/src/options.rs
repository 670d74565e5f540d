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

use std::path::PathBuf;
use std::time::Duration;

/// Settings for an OpenRaster import
#[derive(Clone, Debug)]
pub struct ImportOptions {
    /// Resolution of the created document in pixels per inch
    pub resolution: f64,

    /// How long to wait for the manifest to appear after extraction
    pub extraction_timeout: Duration,

    /// Reject archives whose `mimetype` entry is missing or wrong
    pub strict_mimetype: bool,

    /// Leave layers the host created on its own (such as the
    /// default background) in the document
    pub keep_background: bool,

    /// Where to create the scratch directory. The system temporary
    /// directory is used if not set.
    pub scratch_parent: Option<PathBuf>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            resolution: 72.0,
            extraction_timeout: Duration::from_secs(10),
            strict_mimetype: false,
            keep_background: false,
            scratch_parent: None,
        }
    }
}
