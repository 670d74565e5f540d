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

use super::image::{Image8, Pixel8, WHITE_PIXEL8};
use super::{
    AssetId, Blendmode, ColorMode, DocumentHost, DocumentId, DocumentSpec, HostError, LayerId,
    LayerInfo, Rectangle,
};

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

/// A layer of a document held in memory
#[derive(Clone, Debug)]
pub struct MemoryLayer {
    pub id: LayerId,
    pub name: String,
    pub content: Image8,
    pub x: i32,
    pub y: i32,

    /// Opacity in percent
    pub opacity: f64,
    pub visible: bool,
    pub blendmode: Blendmode,
    pub locked: bool,
    pub is_background: bool,
}

impl MemoryLayer {
    pub fn bounds(&self) -> Rectangle {
        self.content.rect_at(self.x, self.y)
    }

    fn info(&self) -> LayerInfo {
        LayerInfo {
            id: self.id,
            name: self.name.clone(),
            is_background: self.is_background,
            locked: self.locked,
        }
    }
}

/// A document held in memory
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    pub id: DocumentId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub resolution: f64,
    pub color_mode: ColorMode,

    // Stored from bottom to top
    layers: Vec<MemoryLayer>,
}

impl MemoryDocument {
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Layers from bottom to top
    pub fn layers(&self) -> &[MemoryLayer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, id: LayerId) -> Option<&MemoryLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Find the topmost layer with the given name
    pub fn layer_by_name(&self, name: &str) -> Option<&MemoryLayer> {
        self.layers.iter().rev().find(|l| l.name == name)
    }

    /// The part of the layer that lies inside the canvas
    pub fn visible_area(&self, id: LayerId) -> Option<Rectangle> {
        self.layer(id).and_then(|l| l.bounds().intersected(&self.bounds()))
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut MemoryLayer, HostError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(HostError::NoSuchLayer(id))
    }

    fn unlocked_layer_mut(&mut self, id: LayerId) -> Result<&mut MemoryLayer, HostError> {
        let layer = self.layer_mut(id)?;
        if layer.locked {
            return Err(HostError::LayerLocked(id));
        }
        Ok(layer)
    }
}

/// A document host that keeps everything in memory.
///
/// Like a desktop editor, it creates new documents with a locked opaque
/// background layer and pastes content centered on the canvas.
pub struct MemoryHost {
    documents: Vec<MemoryDocument>,
    assets: HashMap<AssetId, Image8>,
    clipboard: Option<Image8>,
    background: Option<Pixel8>,
    next_id: u32,
}

impl Default for MemoryHost {
    fn default() -> Self {
        MemoryHost::with_background(Some(WHITE_PIXEL8))
    }
}

impl MemoryHost {
    pub fn new() -> MemoryHost {
        MemoryHost::default()
    }

    /// Create a host that fills new documents' background layer
    /// with the given color, or creates no background layer at all.
    pub fn with_background(background: Option<Pixel8>) -> MemoryHost {
        MemoryHost {
            documents: Vec::new(),
            assets: HashMap::new(),
            clipboard: None,
            background,
            next_id: 1,
        }
    }

    pub fn document(&self, id: DocumentId) -> Option<&MemoryDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn documents(&self) -> &[MemoryDocument] {
        &self.documents
    }

    /// Number of assets that have been opened but not closed
    pub fn open_asset_count(&self) -> usize {
        self.assets.len()
    }

    fn document_mut(&mut self, id: DocumentId) -> Result<&mut MemoryDocument, HostError> {
        self.documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(HostError::NoSuchDocument(id))
    }

    fn get_document(&self, id: DocumentId) -> Result<&MemoryDocument, HostError> {
        self.document(id).ok_or(HostError::NoSuchDocument(id))
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl DocumentHost for MemoryHost {
    fn create_document(&mut self, spec: &DocumentSpec) -> Result<DocumentId, HostError> {
        let max_size = i32::MAX as u32;
        if spec.width == 0 || spec.height == 0 || spec.width > max_size || spec.height > max_size {
            return Err(HostError::InvalidValue(format!(
                "document size {}x{}",
                spec.width, spec.height
            )));
        }
        if !(spec.resolution.is_finite() && spec.resolution > 0.0) {
            return Err(HostError::InvalidValue(format!(
                "resolution {}",
                spec.resolution
            )));
        }

        let id = DocumentId(self.take_id());
        let mut doc = MemoryDocument {
            id,
            name: spec.name.clone(),
            width: spec.width,
            height: spec.height,
            resolution: spec.resolution,
            color_mode: spec.color_mode,
            layers: Vec::new(),
        };

        if let Some(color) = self.background {
            let layer_id = LayerId(self.take_id());
            doc.layers.push(MemoryLayer {
                id: layer_id,
                name: "Background".into(),
                content: Image8::filled(spec.width as usize, spec.height as usize, color),
                x: 0,
                y: 0,
                opacity: 100.0,
                visible: true,
                blendmode: Blendmode::Normal,
                locked: true,
                is_background: true,
            });
        }

        debug!(
            "Created document {} \"{}\" ({}x{} @ {} ppi)",
            id, spec.name, spec.width, spec.height, spec.resolution
        );
        self.documents.push(doc);
        Ok(id)
    }

    fn open_asset(&mut self, path: &Path) -> Result<AssetId, HostError> {
        let img = Image8::load(path)?;
        let id = AssetId(self.take_id());
        self.assets.insert(id, img);
        Ok(id)
    }

    fn copy_asset(&mut self, asset: AssetId) -> Result<(), HostError> {
        let img = self
            .assets
            .get(&asset)
            .ok_or(HostError::NoSuchAsset(asset))?;
        self.clipboard = Some(img.clone());
        Ok(())
    }

    fn close_asset(&mut self, asset: AssetId) {
        if self.assets.remove(&asset).is_none() {
            warn!("Tried to close unknown {}", asset);
        }
    }

    fn paste(&mut self, doc: DocumentId) -> Result<LayerId, HostError> {
        let content = self.clipboard.clone().ok_or(HostError::EmptyClipboard)?;
        let layer_id = LayerId(self.take_id());
        let doc = self.document_mut(doc)?;

        let rect = Rectangle::centered(
            content.width as i32,
            content.height as i32,
            doc.width as i32,
            doc.height as i32,
        );

        let name = format!("Layer {}", doc.layers.len() + 1);
        doc.layers.push(MemoryLayer {
            id: layer_id,
            name,
            content,
            x: rect.x,
            y: rect.y,
            opacity: 100.0,
            visible: true,
            blendmode: Blendmode::Normal,
            locked: false,
            is_background: false,
        });

        Ok(layer_id)
    }

    fn set_layer_name(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        name: &str,
    ) -> Result<(), HostError> {
        self.document_mut(doc)?.layer_mut(layer)?.name = name.to_owned();
        Ok(())
    }

    fn set_layer_opacity(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        opacity: f64,
    ) -> Result<(), HostError> {
        if !(0.0..=100.0).contains(&opacity) {
            return Err(HostError::InvalidValue(format!("opacity {}", opacity)));
        }
        self.document_mut(doc)?.unlocked_layer_mut(layer)?.opacity = opacity;
        Ok(())
    }

    fn set_layer_visible(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        visible: bool,
    ) -> Result<(), HostError> {
        self.document_mut(doc)?.layer_mut(layer)?.visible = visible;
        Ok(())
    }

    fn set_layer_blendmode(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        mode: Blendmode,
    ) -> Result<(), HostError> {
        self.document_mut(doc)?.unlocked_layer_mut(layer)?.blendmode = mode;
        Ok(())
    }

    fn layer_bounds(&self, doc: DocumentId, layer: LayerId) -> Result<Rectangle, HostError> {
        self.get_document(doc)?
            .layer(layer)
            .map(MemoryLayer::bounds)
            .ok_or(HostError::NoSuchLayer(layer))
    }

    fn translate_layer(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        dx: i32,
        dy: i32,
    ) -> Result<(), HostError> {
        let layer = self.document_mut(doc)?.unlocked_layer_mut(layer)?;
        layer.x = layer
            .x
            .checked_add(dx)
            .ok_or_else(|| HostError::InvalidValue(format!("x offset {}", dx)))?;
        layer.y = layer
            .y
            .checked_add(dy)
            .ok_or_else(|| HostError::InvalidValue(format!("y offset {}", dy)))?;
        Ok(())
    }

    fn layers(&self, doc: DocumentId) -> Result<Vec<LayerInfo>, HostError> {
        Ok(self
            .get_document(doc)?
            .layers
            .iter()
            .map(MemoryLayer::info)
            .collect())
    }

    fn unlock_layer(&mut self, doc: DocumentId, layer: LayerId) -> Result<(), HostError> {
        self.document_mut(doc)?.layer_mut(layer)?.locked = false;
        Ok(())
    }

    fn remove_layer(&mut self, doc: DocumentId, layer: LayerId) -> Result<(), HostError> {
        let doc = self.document_mut(doc)?;
        doc.unlocked_layer_mut(layer)?;
        doc.layers.retain(|l| l.id != layer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(width: u32, height: u32) -> DocumentSpec {
        DocumentSpec {
            name: "test".into(),
            width,
            height,
            resolution: 72.0,
            color_mode: ColorMode::Rgb,
        }
    }

    fn paste_image(host: &mut MemoryHost, doc: DocumentId, w: usize, h: usize) -> LayerId {
        host.clipboard = Some(Image8::filled(w, h, [10, 20, 30, 255]));
        host.paste(doc).unwrap()
    }

    #[test]
    fn test_new_document_has_locked_background() {
        let mut host = MemoryHost::new();
        let doc = host.create_document(&spec(64, 32)).unwrap();

        let layers = host.layers(doc).unwrap();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].is_background);
        assert!(layers[0].locked);

        let bg = host.document(doc).unwrap().layers()[0].clone();
        assert_eq!(bg.bounds(), Rectangle::new(0, 0, 64, 32));
        assert_eq!(bg.content.pixel_at(10, 10), WHITE_PIXEL8);

        assert!(matches!(
            host.remove_layer(doc, bg.id),
            Err(HostError::LayerLocked(_))
        ));
        host.unlock_layer(doc, bg.id).unwrap();
        host.remove_layer(doc, bg.id).unwrap();
        assert_eq!(host.document(doc).unwrap().layer_count(), 0);
    }

    #[test]
    fn test_no_background() {
        let mut host = MemoryHost::with_background(None);
        let doc = host.create_document(&spec(64, 32)).unwrap();
        assert!(host.layers(doc).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_document() {
        let mut host = MemoryHost::new();
        assert!(host.create_document(&spec(0, 10)).is_err());

        let mut s = spec(10, 10);
        s.resolution = f64::NAN;
        assert!(host.create_document(&s).is_err());
    }

    #[test]
    fn test_paste_is_centered_on_top() {
        let mut host = MemoryHost::with_background(None);
        let doc = host.create_document(&spec(100, 100)).unwrap();

        let first = paste_image(&mut host, doc, 10, 20);
        let second = paste_image(&mut host, doc, 100, 100);

        assert_eq!(
            host.layer_bounds(doc, first).unwrap(),
            Rectangle::new(45, 40, 10, 20)
        );
        assert_eq!(
            host.layer_bounds(doc, second).unwrap(),
            Rectangle::new(0, 0, 100, 100)
        );

        let ids: Vec<LayerId> = host.layers(doc).unwrap().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_paste_without_copy() {
        let mut host = MemoryHost::new();
        let doc = host.create_document(&spec(10, 10)).unwrap();
        assert!(matches!(host.paste(doc), Err(HostError::EmptyClipboard)));
    }

    #[test]
    fn test_layer_properties() {
        let mut host = MemoryHost::with_background(None);
        let doc = host.create_document(&spec(100, 100)).unwrap();
        let layer = paste_image(&mut host, doc, 10, 10);

        host.set_layer_name(doc, layer, "Ink").unwrap();
        host.set_layer_opacity(doc, layer, 50.0).unwrap();
        host.set_layer_visible(doc, layer, false).unwrap();
        host.set_layer_blendmode(doc, layer, Blendmode::Multiply).unwrap();
        host.translate_layer(doc, layer, -45, 5).unwrap();

        assert!(host.set_layer_opacity(doc, layer, 100.5).is_err());
        assert!(host.set_layer_opacity(doc, layer, -1.0).is_err());

        let l = host.document(doc).unwrap().layer_by_name("Ink").unwrap();
        assert_eq!(l.opacity, 50.0);
        assert!(!l.visible);
        assert_eq!(l.blendmode, Blendmode::Multiply);
        assert_eq!(l.bounds(), Rectangle::new(0, 50, 10, 10));
    }

    #[test]
    fn test_visible_area() {
        let mut host = MemoryHost::with_background(None);
        let doc = host.create_document(&spec(100, 100)).unwrap();
        let layer = paste_image(&mut host, doc, 10, 10);

        host.translate_layer(doc, layer, 50, 0).unwrap();
        let d = host.document(doc).unwrap();
        assert_eq!(d.visible_area(layer), Some(Rectangle::new(95, 45, 5, 10)));

        host.translate_layer(doc, layer, 100, 0).unwrap();
        let d = host.document(doc).unwrap();
        assert_eq!(d.visible_area(layer), None);
    }

    #[test]
    fn test_visible_area_far_outside() {
        let mut host = MemoryHost::with_background(None);
        let doc = host.create_document(&spec(100, 100)).unwrap();
        let layer = paste_image(&mut host, doc, 8, 8);

        // Pasted at (46, 46)
        host.translate_layer(doc, layer, i32::MAX - 2 - 46, 0).unwrap();
        let d = host.document(doc).unwrap();
        assert_eq!(d.layer(layer).unwrap().x, i32::MAX - 2);
        assert_eq!(d.visible_area(layer), None);
    }

    #[test]
    fn test_unknown_ids() {
        let mut host = MemoryHost::new();
        let doc = host.create_document(&spec(10, 10)).unwrap();

        assert!(matches!(
            host.set_layer_visible(doc, LayerId(999), true),
            Err(HostError::NoSuchLayer(LayerId(999)))
        ));
        assert!(matches!(
            host.layers(DocumentId(999)),
            Err(HostError::NoSuchDocument(_))
        ));
        assert!(matches!(
            host.copy_asset(AssetId(999)),
            Err(HostError::NoSuchAsset(_))
        ));
        host.close_asset(AssetId(999));
    }
}
