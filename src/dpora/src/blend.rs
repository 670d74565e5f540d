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

use dphost::Blendmode;

static SVG_PREFIX: &str = "svg:";

/// Translate an OpenRaster `composite-op` value into a host blending mode.
///
/// The `svg:` namespace prefix is optional. Unknown or missing values
/// map to normal (source-over) compositing.
pub fn map_blend_mode(id: Option<&str>) -> Blendmode {
    let name = match id {
        Some(id) => id.trim(),
        None => return Blendmode::Normal,
    };
    let name = name.strip_prefix(SVG_PREFIX).unwrap_or(name);

    use Blendmode::*;
    match name {
        "src-over" | "normal" => Normal,
        "multiply" => Multiply,
        "screen" => Screen,
        "overlay" => Overlay,
        "darken" => Darken,
        "lighten" => Lighten,
        "color-dodge" => ColorDodge,
        "color-burn" => ColorBurn,
        "hard-light" => HardLight,
        "soft-light" => SoftLight,
        "difference" => Difference,
        "exclusion" => Exclusion,
        "hue" => Hue,
        "saturation" => Saturation,
        "color" => Color,
        "luminosity" => Luminosity,
        _ => Normal,
    }
}

/// The OpenRaster name of a blending mode
pub fn svg_name(mode: Blendmode) -> &'static str {
    use Blendmode::*;
    match mode {
        Normal => "svg:src-over",
        Multiply => "svg:multiply",
        Screen => "svg:screen",
        Overlay => "svg:overlay",
        Darken => "svg:darken",
        Lighten => "svg:lighten",
        ColorDodge => "svg:color-dodge",
        ColorBurn => "svg:color-burn",
        HardLight => "svg:hard-light",
        SoftLight => "svg:soft-light",
        Difference => "svg:difference",
        Exclusion => "svg:exclusion",
        Hue => "svg:hue",
        Saturation => "svg:saturation",
        Color => "svg:color",
        Luminosity => "svg:luminosity",
    }
}
