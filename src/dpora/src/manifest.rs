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

//! Reading and decoding of the `stack.xml` manifest

use super::ImportError;

use std::fs;
use std::path::Path;

use tracing::{debug, warn};
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};

pub static MANIFEST_NAME: &str = "stack.xml";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CanvasDimensions {
    pub width: u32,
    pub height: u32,
}

/// A layer as declared in the manifest
#[derive(Clone, Debug, PartialEq)]
pub struct LayerDescriptor {
    pub name: String,

    /// Path of the layer content, relative to the archive root
    pub source_path: String,

    /// Opacity in range [0.0, 1.0]
    pub opacity: f32,
    pub visible: bool,
    pub x: i32,
    pub y: i32,

    /// The `composite-op` attribute, as written
    pub blend_mode_id: Option<String>,
}

impl Default for LayerDescriptor {
    fn default() -> Self {
        LayerDescriptor {
            name: String::new(),
            source_path: String::new(),
            opacity: 1.0,
            visible: true,
            x: 0,
            y: 0,
            blend_mode_id: None,
        }
    }
}

/// The layers in manifest order: the first one is the topmost
pub type LayerStack = Vec<LayerDescriptor>;

#[derive(Clone, Debug, PartialEq)]
pub struct Manifest {
    pub canvas: CanvasDimensions,
    pub layers: LayerStack,
}

/// Read the manifest of an extracted archive
pub fn read_manifest(dir: &Path) -> Result<String, ImportError> {
    let path = dir.join(MANIFEST_NAME);
    if !path.is_file() {
        return Err(ImportError::ManifestMissing(path));
    }

    let content = fs::read(&path)?;
    String::from_utf8(content)
        .map_err(|_| ImportError::MalformedManifest(format!("{} is not UTF-8", MANIFEST_NAME)))
}

pub fn parse_manifest(text: &str) -> Result<Manifest, ImportError> {
    Ok(Manifest {
        canvas: parse_canvas(text)?,
        layers: parse_layers(text)?,
    })
}

/// Get the canvas size from the `<image>` element
pub fn parse_canvas(text: &str) -> Result<CanvasDimensions, ImportError> {
    let mut parser = EventReader::from_str(text);

    loop {
        match parser.next() {
            Ok(XmlEvent::StartElement {
                name, attributes, ..
            }) if name.local_name == "image" => {
                return canvas_from_attributes(attributes);
            }
            Ok(XmlEvent::EndDocument) => {
                return Err(ImportError::MalformedManifest(
                    "no <image> element".to_string(),
                ));
            }
            Err(e) => {
                warn!("Error reading OpenRaster stack: {}", e);
                return Err(ImportError::MalformedManifest(e.to_string()));
            }
            _ => {}
        }
    }
}

fn canvas_from_attributes(
    mut attributes: Vec<OwnedAttribute>,
) -> Result<CanvasDimensions, ImportError> {
    let mut take_pair = |w: &str, h: &str| {
        let width = take_attribute(&mut attributes, w, None).and_then(|a| parse_dimension(&a));
        let height = take_attribute(&mut attributes, h, None).and_then(|a| parse_dimension(&a));
        width.zip(height)
    };

    let full = take_pair("width", "height");
    let abbreviated = take_pair("w", "h");

    match full.or(abbreviated) {
        Some((width, height)) => Ok(CanvasDimensions { width, height }),
        None => {
            warn!("OpenRaster file has invalid image size");
            Err(ImportError::MalformedManifest(
                "<image> has no valid width and height".to_string(),
            ))
        }
    }
}

fn parse_dimension(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|&v| v > 0)
}

/// Attributes a `<stack>` passes down to the layers inside it
#[derive(Copy, Clone, Debug, PartialEq)]
struct StackContext {
    offset: (i32, i32),
    opacity: f32,
    visible: bool,
}

impl Default for StackContext {
    fn default() -> Self {
        StackContext {
            offset: (0, 0),
            opacity: 1.0,
            visible: true,
        }
    }
}

impl StackContext {
    fn nested(&self, mut attributes: Vec<OwnedAttribute>) -> StackContext {
        let x = take_attribute(&mut attributes, "x", None)
            .and_then(|a| parse_coordinate(&a))
            .unwrap_or(0);
        let y = take_attribute(&mut attributes, "y", None)
            .and_then(|a| parse_coordinate(&a))
            .unwrap_or(0);
        let opacity = parse_opacity(take_attribute(&mut attributes, "opacity", None));
        let visible = parse_visibility(take_attribute(&mut attributes, "visibility", None));

        StackContext {
            offset: (
                self.offset.0.saturating_add(x),
                self.offset.1.saturating_add(y),
            ),
            opacity: self.opacity * opacity,
            visible: self.visible && visible,
        }
    }
}

/// Get every `<layer>` element in document order.
///
/// Layers inside nested `<stack>` elements are flattened into the list.
/// The stack's offset is added to their position, its opacity multiplied
/// into theirs, and a hidden stack hides them.
pub fn parse_layers(text: &str) -> Result<LayerStack, ImportError> {
    let mut parser = EventReader::from_str(text);
    let mut layers = LayerStack::new();

    // For each open element: the accumulated context if it is a <stack>
    let mut open_elements: Vec<Option<StackContext>> = Vec::new();

    loop {
        let context = open_elements
            .iter()
            .rev()
            .find_map(|o| *o)
            .unwrap_or_default();

        match parser.next() {
            Ok(XmlEvent::StartElement {
                name, attributes, ..
            }) => match name.local_name.as_str() {
                "stack" => {
                    open_elements.push(Some(context.nested(attributes)));
                }
                "layer" => {
                    open_elements.push(None);
                    if let Some(layer) = layer_from_attributes(attributes, &context) {
                        layers.push(layer);
                    }
                }
                _ => {
                    open_elements.push(None);
                }
            },
            Ok(XmlEvent::EndElement { .. }) => {
                open_elements.pop();
            }
            Ok(XmlEvent::EndDocument) => {
                debug!("Found {} layers in the manifest", layers.len());
                return Ok(layers);
            }
            Err(e) => {
                warn!("Error reading OpenRaster stack: {}", e);
                return Err(ImportError::MalformedManifest(e.to_string()));
            }
            _ => (),
        }
    }
}

fn layer_from_attributes(
    mut attributes: Vec<OwnedAttribute>,
    context: &StackContext,
) -> Option<LayerDescriptor> {
    let name = take_attribute(&mut attributes, "name", None).unwrap_or_default();

    let source_path = take_attribute(&mut attributes, "src", None)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    if source_path.is_empty() {
        warn!("Skipping OpenRaster layer \"{}\": no source image", name);
        return None;
    }

    let opacity = parse_opacity(take_attribute(&mut attributes, "opacity", None));
    let visible = parse_visibility(take_attribute(&mut attributes, "visibility", None));

    let layer = LayerDescriptor {
        name,
        source_path,
        opacity: context.opacity * opacity,
        visible: context.visible && visible,
        x: context.offset.0.saturating_add(
            take_attribute(&mut attributes, "x", None)
                .and_then(|a| parse_coordinate(&a))
                .unwrap_or(0),
        ),
        y: context.offset.1.saturating_add(
            take_attribute(&mut attributes, "y", None)
                .and_then(|a| parse_coordinate(&a))
                .unwrap_or(0),
        ),
        blend_mode_id: take_attribute(&mut attributes, "composite-op", None)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
    };

    if !attributes.is_empty() {
        debug!(
            "Ignored OpenRaster layer attributes: {:?}",
            attributes
                .iter()
                .map(|a| a.name.local_name.as_str())
                .collect::<Vec<_>>()
        );
    }

    Some(layer)
}

/// Opacity in range [0.0, 1.0]. Missing or unparseable values are opaque.
fn parse_opacity(value: Option<String>) -> f32 {
    value
        .and_then(|a| a.trim().parse::<f32>().ok())
        .filter(|o| o.is_finite())
        .map_or(1.0, |o| o.clamp(0.0, 1.0))
}

/// Only an explicit "hidden" hides
fn parse_visibility(value: Option<String>) -> bool {
    value.map_or(true, |a| a.trim() != "hidden")
}

/// Parse an integer coordinate. Some writers emit decimals; those are rounded.
fn parse_coordinate(value: &str) -> Option<i32> {
    let value = value.trim();
    value.parse::<i32>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.abs() <= i32::MAX as f64)
            .map(|v| v.round() as i32)
    })
}

fn take_attribute(
    attrs: &mut Vec<OwnedAttribute>,
    name: &str,
    namespace: Option<&str>,
) -> Option<String> {
    if let Some(idx) = attrs
        .iter()
        .position(|a| a.name.local_name == name && a.name.namespace.as_deref() == namespace)
    {
        Some(attrs.remove(idx).value)
    } else {
        None
    }
}
