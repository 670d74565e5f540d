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

use super::{HostError, Rectangle};

use std::path::Path;

use image::io::Reader as ImageReader;
use image::RgbaImage;

pub type Pixel8 = [u8; 4];

pub const TRANSPARENT_PIXEL8: Pixel8 = [0, 0, 0, 0];
pub const WHITE_PIXEL8: Pixel8 = [255, 255, 255, 255];

/// A flat, non-premultiplied RGBA image buffer
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Image8 {
    pub pixels: Vec<Pixel8>,
    pub width: usize,
    pub height: usize,
}

impl Image8 {
    pub fn filled(width: usize, height: usize, color: Pixel8) -> Image8 {
        Image8 {
            pixels: vec![color; width * height],
            width,
            height,
        }
    }

    pub fn from_rgba(img: &RgbaImage) -> Image8 {
        Image8 {
            pixels: bytemuck::cast_slice::<u8, Pixel8>(img.as_raw()).to_vec(),
            width: img.width() as usize,
            height: img.height() as usize,
        }
    }

    /// Decode an image file. The format is guessed from the content.
    pub fn load(path: &Path) -> Result<Image8, HostError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| HostError::Decode(e.to_string()))?;

        let img = Image8::from_rgba(&img.into_rgba8());
        if img.is_null() {
            return Err(HostError::Decode(format!(
                "{}: image has no pixels",
                path.display()
            )));
        }
        Ok(img)
    }

    pub fn is_null(&self) -> bool {
        assert!(self.pixels.len() == self.width * self.height);
        self.pixels.is_empty()
    }

    /// The image rectangle at the given position
    pub fn rect_at(&self, x: i32, y: i32) -> Rectangle {
        Rectangle::new(x, y, self.width as i32, self.height as i32)
    }

    pub fn pixel_at(&self, x: usize, y: usize) -> Pixel8 {
        if x >= self.width || y >= self.height {
            return TRANSPARENT_PIXEL8;
        }
        self.pixels[y * self.width + x]
    }
}
