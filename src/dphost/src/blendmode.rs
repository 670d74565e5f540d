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

use std::fmt;

/// Layer compositing modes supported by the document host
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Blendmode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl Blendmode {
    pub const ALL: [Blendmode; 16] = [
        Blendmode::Normal,
        Blendmode::Multiply,
        Blendmode::Screen,
        Blendmode::Overlay,
        Blendmode::Darken,
        Blendmode::Lighten,
        Blendmode::ColorDodge,
        Blendmode::ColorBurn,
        Blendmode::HardLight,
        Blendmode::SoftLight,
        Blendmode::Difference,
        Blendmode::Exclusion,
        Blendmode::Hue,
        Blendmode::Saturation,
        Blendmode::Color,
        Blendmode::Luminosity,
    ];

    /// The user visible name of this mode
    pub fn name(self) -> &'static str {
        use Blendmode::*;
        match self {
            Normal => "Normal",
            Multiply => "Multiply",
            Screen => "Screen",
            Overlay => "Overlay",
            Darken => "Darken",
            Lighten => "Lighten",
            ColorDodge => "Color Dodge",
            ColorBurn => "Color Burn",
            HardLight => "Hard Light",
            SoftLight => "Soft Light",
            Difference => "Difference",
            Exclusion => "Exclusion",
            Hue => "Hue",
            Saturation => "Saturation",
            Color => "Color",
            Luminosity => "Luminosity",
        }
    }
}

impl Default for Blendmode {
    fn default() -> Self {
        Blendmode::Normal
    }
}

impl fmt::Display for Blendmode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<&str> = Blendmode::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(names.len(), Blendmode::ALL.len());
    }

    #[test]
    fn test_default() {
        assert_eq!(Blendmode::default(), Blendmode::Normal);
        assert_eq!(Blendmode::ColorDodge.to_string(), "Color Dodge");
    }
}
