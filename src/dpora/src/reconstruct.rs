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

//! Recreating a manifest layer in a host document

use super::blend::map_blend_mode;
use super::manifest::LayerDescriptor;
use super::LayerImportError;

use dphost::{DocumentHost, DocumentId, HostError, LayerId, OpenAsset};

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

/// Name given to layers that have no name in the manifest
pub static DEFAULT_LAYER_NAME: &str = "Layer";

/// What happened when a layer attribute was applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttributeOutcome {
    /// The host accepted the value
    Applied,

    /// The layer already had the wanted value; nothing was sent to the host
    Unchanged,

    /// The host rejected the value. The layer keeps the host's default.
    Failed(String),
}

impl AttributeOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, AttributeOutcome::Failed(_))
    }
}

impl fmt::Display for AttributeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeOutcome::Applied => write!(f, "applied"),
            AttributeOutcome::Unchanged => write!(f, "unchanged"),
            AttributeOutcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// The result of recreating one layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerReport {
    pub layer: LayerId,
    pub name: String,
    pub source: String,
    pub name_outcome: AttributeOutcome,
    pub opacity: AttributeOutcome,
    pub visibility: AttributeOutcome,
    pub blend_mode: AttributeOutcome,
    pub position_x: AttributeOutcome,
    pub position_y: AttributeOutcome,
}

impl LayerReport {
    /// Was every attribute applied successfully
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Names and reasons of the attributes that could not be applied
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("name", &self.name_outcome),
            ("opacity", &self.opacity),
            ("visibility", &self.visibility),
            ("blend mode", &self.blend_mode),
            ("x position", &self.position_x),
            ("y position", &self.position_y),
        ]
        .into_iter()
        .filter_map(|(attr, outcome)| match outcome {
            AttributeOutcome::Failed(reason) => Some((attr, reason.as_str())),
            _ => None,
        })
    }
}

/// Paste the layer's content into the document as a new top layer
/// and apply the layer's attributes to it.
///
/// Only a missing or unloadable source is an error. If an attribute
/// cannot be applied, the problem is recorded in the report and the
/// layer is kept.
pub fn reconstruct<H: DocumentHost + ?Sized>(
    host: &mut H,
    doc: DocumentId,
    descriptor: &LayerDescriptor,
    scratch_dir: &Path,
) -> Result<LayerReport, LayerImportError> {
    let path = resolve_source(scratch_dir, &descriptor.source_path)?;

    let layer = {
        let mut asset = OpenAsset::open(host, &path).map_err(LayerImportError::AssetLoad)?;
        asset.copy().map_err(LayerImportError::AssetLoad)?;
        asset.paste(doc).map_err(LayerImportError::Paste)?
    };

    let name = if descriptor.name.trim().is_empty() {
        DEFAULT_LAYER_NAME
    } else {
        descriptor.name.as_str()
    };
    debug!("Pasted \"{}\" from {} as layer {}", name, descriptor.source_path, layer);

    let name_outcome = applied(name, "name", host.set_layer_name(doc, layer, name));

    let opacity = applied(
        name,
        "opacity",
        host.set_layer_opacity(doc, layer, opacity_percent(descriptor.opacity)),
    );

    let visibility = applied(
        name,
        "visibility",
        host.set_layer_visible(doc, layer, descriptor.visible),
    );

    let blend_mode = applied(
        name,
        "blend mode",
        host.set_layer_blendmode(
            doc,
            layer,
            map_blend_mode(descriptor.blend_mode_id.as_deref()),
        ),
    );

    let (position_x, position_y) = move_layer_to(host, doc, layer, descriptor.x, descriptor.y);
    for (axis, result) in [("x", &position_x), ("y", &position_y)] {
        if let AttributeOutcome::Failed(reason) = result {
            warn!("Could not set {} position of layer \"{}\": {}", axis, name, reason);
        }
    }

    Ok(LayerReport {
        layer,
        name: name.to_owned(),
        source: descriptor.source_path.clone(),
        name_outcome,
        opacity,
        visibility,
        blend_mode,
        position_x,
        position_y,
    })
}

/// Move a layer so its top-left corner is at the given position.
///
/// The host can only move layers relative to where they are, so the
/// offset from the current position is applied, one axis at a time.
/// An axis that is already in place is not touched.
pub fn move_layer_to<H: DocumentHost + ?Sized>(
    host: &mut H,
    doc: DocumentId,
    layer: LayerId,
    x: i32,
    y: i32,
) -> (AttributeOutcome, AttributeOutcome) {
    let bounds = match host.layer_bounds(doc, layer) {
        Ok(b) => b,
        Err(e) => {
            let failed = AttributeOutcome::Failed(e.to_string());
            return (failed.clone(), failed);
        }
    };

    let x_outcome = match x.checked_sub(bounds.x) {
        Some(0) => AttributeOutcome::Unchanged,
        Some(dx) => to_outcome(host.translate_layer(doc, layer, dx, 0)),
        None => AttributeOutcome::Failed(format!("x offset {} out of range", x)),
    };

    let y_outcome = match y.checked_sub(bounds.y) {
        Some(0) => AttributeOutcome::Unchanged,
        Some(dy) => to_outcome(host.translate_layer(doc, layer, 0, dy)),
        None => AttributeOutcome::Failed(format!("y offset {} out of range", y)),
    };

    (x_outcome, y_outcome)
}

/// Convert a [0, 1] opacity to the host's percentage scale
pub fn opacity_percent(opacity: f32) -> f64 {
    if !opacity.is_finite() {
        return 100.0;
    }
    // Round away the noise from the f32 to f64 conversion
    let percent = (f64::from(opacity) * 10000.0).round() / 100.0;
    percent.clamp(0.0, 100.0)
}

/// Find the layer's source file inside the scratch directory.
///
/// Paths that would point outside the directory are rejected.
fn resolve_source(scratch_dir: &Path, source: &str) -> Result<PathBuf, LayerImportError> {
    let relative = Path::new(source);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(LayerImportError::UnsafePath(source.to_owned()));
    }

    let path = scratch_dir.join(relative);
    if !path.is_file() {
        return Err(LayerImportError::SourceMissing(path));
    }
    Ok(path)
}

fn to_outcome(result: Result<(), HostError>) -> AttributeOutcome {
    match result {
        Ok(()) => AttributeOutcome::Applied,
        Err(e) => AttributeOutcome::Failed(e.to_string()),
    }
}

fn applied(layer_name: &str, attribute: &str, result: Result<(), HostError>) -> AttributeOutcome {
    let outcome = to_outcome(result);
    if let AttributeOutcome::Failed(reason) = &outcome {
        warn!(
            "Could not set {} of layer \"{}\": {}",
            attribute, layer_name, reason
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use dphost::{ColorMode, DocumentSpec, MemoryHost, Rectangle};

    fn new_document(host: &mut MemoryHost, w: u32, h: u32) -> DocumentId {
        host.create_document(&DocumentSpec {
            name: "test".into(),
            width: w,
            height: h,
            resolution: 72.0,
            color_mode: ColorMode::Rgb,
        })
        .unwrap()
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 255, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_opacity_percent() {
        assert_eq!(opacity_percent(0.5), 50.0);
        assert_eq!(opacity_percent(1.0), 100.0);
        assert_eq!(opacity_percent(0.0), 0.0);
        assert_eq!(opacity_percent(0.3), 30.0);
        assert_eq!(opacity_percent(1.7), 100.0);
        assert_eq!(opacity_percent(-0.2), 0.0);
        assert_eq!(opacity_percent(f32::NAN), 100.0);
    }

    #[test]
    fn test_reconstruct_layer() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "data/ink.png", 10, 6);

        let mut host = MemoryHost::with_background(None);
        let doc = new_document(&mut host, 100, 80);

        let descriptor = LayerDescriptor {
            name: "Ink".into(),
            source_path: "data/ink.png".into(),
            opacity: 0.5,
            visible: false,
            x: 3,
            y: 40,
            blend_mode_id: Some("svg:screen".into()),
        };

        let report = reconstruct(&mut host, doc, &descriptor, dir.path()).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.position_x, AttributeOutcome::Applied);
        assert_eq!(report.position_y, AttributeOutcome::Applied);
        assert_eq!(host.open_asset_count(), 0);

        let layer = host.document(doc).unwrap().layer(report.layer).unwrap();
        assert_eq!(layer.name, "Ink");
        assert_eq!(layer.opacity, 50.0);
        assert!(!layer.visible);
        assert_eq!(layer.blendmode, dphost::Blendmode::Screen);
        assert_eq!(layer.bounds(), Rectangle::new(3, 40, 10, 6));
    }

    #[test]
    fn test_unnamed_layer() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 2, 2);

        let mut host = MemoryHost::with_background(None);
        let doc = new_document(&mut host, 10, 10);
        let descriptor = LayerDescriptor {
            source_path: "a.png".into(),
            ..LayerDescriptor::default()
        };

        let report = reconstruct(&mut host, doc, &descriptor, dir.path()).unwrap();
        assert_eq!(report.name, DEFAULT_LAYER_NAME);
        assert_eq!(
            host.document(doc).unwrap().layer(report.layer).unwrap().name,
            DEFAULT_LAYER_NAME
        );
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MemoryHost::with_background(None);
        let doc = new_document(&mut host, 10, 10);

        let descriptor = LayerDescriptor {
            source_path: "data/missing.png".into(),
            ..LayerDescriptor::default()
        };

        assert!(matches!(
            reconstruct(&mut host, doc, &descriptor, dir.path()),
            Err(LayerImportError::SourceMissing(_))
        ));
        assert_eq!(host.document(doc).unwrap().layer_count(), 0);
    }

    #[test]
    fn test_unsafe_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MemoryHost::with_background(None);
        let doc = new_document(&mut host, 10, 10);

        for source in ["../outside.png", "/etc/passwd", "data/../../x.png"] {
            let descriptor = LayerDescriptor {
                source_path: source.into(),
                ..LayerDescriptor::default()
            };
            assert!(matches!(
                reconstruct(&mut host, doc, &descriptor, dir.path()),
                Err(LayerImportError::UnsafePath(_))
            ));
        }
    }

    #[test]
    fn test_undecodable_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"garbage").unwrap();

        let mut host = MemoryHost::with_background(None);
        let doc = new_document(&mut host, 10, 10);
        let descriptor = LayerDescriptor {
            source_path: "broken.png".into(),
            ..LayerDescriptor::default()
        };

        assert!(matches!(
            reconstruct(&mut host, doc, &descriptor, dir.path()),
            Err(LayerImportError::AssetLoad(_))
        ));
        assert_eq!(host.open_asset_count(), 0);
        assert_eq!(host.document(doc).unwrap().layer_count(), 0);
    }

    #[test]
    fn test_move_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 4, 4);

        let mut host = MemoryHost::with_background(None);
        let doc = new_document(&mut host, 20, 20);
        let descriptor = LayerDescriptor {
            source_path: "a.png".into(),
            x: 1,
            y: 2,
            ..LayerDescriptor::default()
        };
        let layer = reconstruct(&mut host, doc, &descriptor, dir.path())
            .unwrap()
            .layer;

        assert_eq!(
            move_layer_to(&mut host, doc, layer, 1, 2),
            (AttributeOutcome::Unchanged, AttributeOutcome::Unchanged)
        );

        // Only one axis differs
        assert_eq!(
            move_layer_to(&mut host, doc, layer, 1, 7),
            (AttributeOutcome::Unchanged, AttributeOutcome::Applied)
        );
        assert_eq!(
            host.layer_bounds(doc, layer).unwrap(),
            Rectangle::new(1, 7, 4, 4)
        );
    }

    #[test]
    fn test_pasted_in_place() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "full.png", 20, 20);

        let mut host = MemoryHost::with_background(None);
        let doc = new_document(&mut host, 20, 20);
        let descriptor = LayerDescriptor {
            source_path: "full.png".into(),
            ..LayerDescriptor::default()
        };

        // A canvas sized layer is pasted at the origin already
        let report = reconstruct(&mut host, doc, &descriptor, dir.path()).unwrap();
        assert_eq!(report.position_x, AttributeOutcome::Unchanged);
        assert_eq!(report.position_y, AttributeOutcome::Unchanged);
    }
}
