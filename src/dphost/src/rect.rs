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

use core::cmp::{max, min};

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Rectangle {
        assert!(w > 0 && h > 0);
        Rectangle { x, y, w, h }
    }

    /// A rectangle of the given size centered inside a canvas.
    /// The position is rounded towards the top-left corner.
    pub fn centered(w: i32, h: i32, canvas_w: i32, canvas_h: i32) -> Rectangle {
        Rectangle::new((canvas_w - w) / 2, (canvas_h - h) / 2, w, h)
    }

    pub fn intersected(&self, other: &Rectangle) -> Option<Rectangle> {
        // Edges are computed in i64 so rectangles at the far end of
        // the coordinate range do not overflow
        let leftx = max(self.x, other.x);
        let rightx = min(self.x as i64 + self.w as i64, other.x as i64 + other.w as i64);
        let topy = max(self.y, other.y);
        let btmy = min(self.y as i64 + self.h as i64, other.y as i64 + other.h as i64);

        if (leftx as i64) < rightx && (topy as i64) < btmy {
            Some(Rectangle::new(
                leftx,
                topy,
                (rightx - leftx as i64) as i32,
                (btmy - topy as i64) as i32,
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let r1 = Rectangle::new(0, 0, 100, 100);
        let r2 = Rectangle::new(-10, -10, 20, 20);
        let edge = Rectangle::new(99, 0, 10, 10);

        assert_eq!(r1.intersected(&r2), Some(Rectangle::new(0, 0, 10, 10)));
        assert_eq!(r1.intersected(&edge), Some(Rectangle::new(99, 0, 1, 10)));

        let touching = Rectangle::new(100, 100, 20, 20);
        assert_eq!(r1.intersected(&touching), None);
    }

    #[test]
    fn test_intersection_at_coordinate_limits() {
        let canvas = Rectangle::new(0, 0, 100, 100);
        let far = Rectangle::new(i32::MAX - 2, 0, 8, 8);
        assert_eq!(canvas.intersected(&far), None);
        assert_eq!(far.intersected(&canvas), None);

        let corner = Rectangle::new(i32::MAX - 2, i32::MAX - 2, 8, 8);
        let inside = Rectangle::new(i32::MAX - 4, i32::MAX - 1, 4, 4);
        assert_eq!(
            corner.intersected(&inside),
            Some(Rectangle::new(i32::MAX - 2, i32::MAX - 1, 2, 4))
        );

        let low = Rectangle::new(i32::MIN, i32::MIN, 8, 8);
        assert_eq!(low.intersected(&canvas), None);
    }

    #[test]
    fn test_centered() {
        assert_eq!(
            Rectangle::centered(10, 20, 100, 100),
            Rectangle::new(45, 40, 10, 20)
        );
        // Odd leftovers round towards the top-left
        assert_eq!(
            Rectangle::centered(10, 10, 15, 15),
            Rectangle::new(2, 2, 10, 10)
        );
        // Content larger than the canvas hangs over both edges
        assert_eq!(
            Rectangle::centered(200, 50, 100, 100),
            Rectangle::new(-50, 25, 200, 50)
        );
    }
}
