//! Rectangular pixel regions. Boards are cut from the full image as a grid
//! of these.

use serde::{Deserialize, Serialize};

/// Rectangle in pixel space (u32 coordinates, origin top-left).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Row-major index of a global pixel within this rect's local storage.
    pub fn local_index(&self, px: u32, py: u32) -> usize {
        debug_assert!(self.contains(px, py));
        ((py - self.y) * self.width + (px - self.x)) as usize
    }

    /// Cut an image into a grid of rects no larger than `tile` on a side,
    /// ordered center-out so the most interesting regions compute first.
    pub fn grid(image_width: u32, image_height: u32, tile: u32) -> Vec<PixelRect> {
        let mut rects = Vec::new();
        for y in (0..image_height).step_by(tile as usize) {
            for x in (0..image_width).step_by(tile as usize) {
                rects.push(PixelRect::new(
                    x,
                    y,
                    tile.min(image_width - x),
                    tile.min(image_height - y),
                ));
            }
        }

        let cx = image_width as f64 / 2.0;
        let cy = image_height as f64 / 2.0;
        rects.sort_by(|a, b| {
            let da = center_dist_sq(a, cx, cy);
            let db = center_dist_sq(b, cx, cy);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        rects
    }
}

fn center_dist_sq(r: &PixelRect, cx: f64, cy: f64) -> f64 {
    let rx = r.x as f64 + r.width as f64 / 2.0;
    let ry = r.y as f64 + r.height as f64 / 2.0;
    (rx - cx).powi(2) + (ry - cy).powi(2)
}
