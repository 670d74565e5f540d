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

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::{ImageOutputFormat, Rgba, RgbaImage};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use dpora::ImportOptions;

/// Builds OpenRaster archives for the tests
pub struct OraBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl OraBuilder {
    /// An archive with a correct mimetype entry and the given manifest
    pub fn new(stack_xml: &str) -> Self {
        OraBuilder {
            entries: vec![
                ("mimetype".into(), b"image/openraster".to_vec()),
                ("stack.xml".into(), stack_xml.as_bytes().to_vec()),
            ],
        }
    }

    /// An archive with only the given entries
    pub fn empty() -> Self {
        OraBuilder {
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, name: &str, content: &[u8]) -> Self {
        self.entries.push((name.into(), content.to_vec()));
        self
    }

    /// Add a solid colored PNG
    pub fn png(self, name: &str, w: u32, h: u32, color: [u8; 4]) -> Self {
        let content = png_bytes(w, h, color);
        self.entry(name, &content)
    }

    pub fn write(&self, path: &Path) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in &self.entries {
            let options = if name == "mimetype" {
                FileOptions::default().compression_method(CompressionMethod::Stored)
            } else {
                FileOptions::default()
            };
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Write the entries as plain files, as an extractor would
    pub fn write_dir(&self, dir: &Path) {
        for (name, content) in &self.entries {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }
}

/// An executable shell script standing in for `unzip`
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn png_bytes(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(color)))
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// A working directory with a place for the archive and a
/// separate parent directory for the importer's scratch directories.
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("scratch")).unwrap();
        Workspace { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn scratch_parent(&self) -> PathBuf {
        self.path("scratch")
    }

    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            scratch_parent: Some(self.scratch_parent()),
            extraction_timeout: std::time::Duration::from_millis(50),
            ..ImportOptions::default()
        }
    }

    /// Number of entries left in the scratch parent directory
    pub fn leftover_scratch(&self) -> usize {
        fs::read_dir(self.scratch_parent()).unwrap().count()
    }
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
