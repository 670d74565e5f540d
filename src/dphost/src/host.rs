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

use super::{Blendmode, Rectangle};

use std::fmt;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct DocumentId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct LayerId(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct AssetId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ColorMode {
    Rgb,
    Grayscale,
}

/// Parameters for creating a new document
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,

    /// Resolution in pixels per inch
    pub resolution: f64,
    pub color_mode: ColorMode,
}

/// A layer as reported by the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerInfo {
    pub id: LayerId,
    pub name: String,

    /// This is the opaque layer the host creates together with a new document
    pub is_background: bool,
    pub locked: bool,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("no such document: {0}")]
    NoSuchDocument(DocumentId),

    #[error("no such layer: {0}")]
    NoSuchLayer(LayerId),

    #[error("no such asset: {0}")]
    NoSuchAsset(AssetId),

    #[error("nothing to paste")]
    EmptyClipboard,

    #[error("layer {0} is locked")]
    LayerLocked(LayerId),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The graphics editing environment that owns the documents.
///
/// The host models an editor that has a single paste buffer: content is
/// transferred into a document by opening an asset, copying it and pasting
/// it. Pasted content always becomes a new layer on top of the stack. The
/// host decides where pasted content lands; layers can only be moved
/// relative to their current position.
pub trait DocumentHost {
    fn create_document(&mut self, spec: &DocumentSpec) -> Result<DocumentId, HostError>;

    /// Open an image file as a temporary single-asset context
    fn open_asset(&mut self, path: &Path) -> Result<AssetId, HostError>;

    /// Select all of the asset's content and copy it to the paste buffer
    fn copy_asset(&mut self, asset: AssetId) -> Result<(), HostError>;

    /// Release an asset context. Closing an unknown asset does nothing.
    fn close_asset(&mut self, asset: AssetId);

    /// Paste the paste buffer into a new layer at the top of the document
    fn paste(&mut self, doc: DocumentId) -> Result<LayerId, HostError>;

    fn set_layer_name(&mut self, doc: DocumentId, layer: LayerId, name: &str)
        -> Result<(), HostError>;

    /// Set layer opacity in percent (0-100)
    fn set_layer_opacity(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        opacity: f64,
    ) -> Result<(), HostError>;

    fn set_layer_visible(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        visible: bool,
    ) -> Result<(), HostError>;

    fn set_layer_blendmode(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        mode: Blendmode,
    ) -> Result<(), HostError>;

    /// The layer's current placement in document coordinates
    fn layer_bounds(&self, doc: DocumentId, layer: LayerId) -> Result<Rectangle, HostError>;

    /// Move a layer by the given offset
    fn translate_layer(
        &mut self,
        doc: DocumentId,
        layer: LayerId,
        dx: i32,
        dy: i32,
    ) -> Result<(), HostError>;

    /// List the document's layers from bottom to top
    fn layers(&self, doc: DocumentId) -> Result<Vec<LayerInfo>, HostError>;

    fn unlock_layer(&mut self, doc: DocumentId, layer: LayerId) -> Result<(), HostError>;

    fn remove_layer(&mut self, doc: DocumentId, layer: LayerId) -> Result<(), HostError>;
}

/// An open asset that is closed when this guard goes out of scope.
///
/// The guard borrows the host for its lifetime and derefs to it, so the
/// host can be used normally while the asset is open.
pub struct OpenAsset<'h, H: DocumentHost + ?Sized> {
    host: &'h mut H,
    id: AssetId,
}

impl<'h, H: DocumentHost + ?Sized> OpenAsset<'h, H> {
    pub fn open(host: &'h mut H, path: &Path) -> Result<Self, HostError> {
        let id = host.open_asset(path)?;
        debug!("Opened {} from {}", id, path.display());
        Ok(OpenAsset { host, id })
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Copy this asset's content to the paste buffer
    pub fn copy(&mut self) -> Result<(), HostError> {
        self.host.copy_asset(self.id)
    }
}

impl<'h, H: DocumentHost + ?Sized> Deref for OpenAsset<'h, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<'h, H: DocumentHost + ?Sized> DerefMut for OpenAsset<'h, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<'h, H: DocumentHost + ?Sized> Drop for OpenAsset<'h, H> {
    fn drop(&mut self) {
        debug!("Closing {}", self.id);
        self.host.close_asset(self.id);
    }
}
