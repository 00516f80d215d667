//! Floating chat window geometry, kept inside the terminal on every move,
//! resize and terminal resize.

use ratatui::layout::Rect;

pub const MIN_WIDTH: u16 = 30;
pub const MAX_WIDTH: u16 = 80;
pub const MIN_HEIGHT: u16 = 10;
pub const MAX_HEIGHT: u16 = 30;
/// Columns/rows of the window that must stay on screen when dragged off an edge.
const VISIBLE_MARGIN_X: u16 = 10;
const VISIBLE_MARGIN_Y: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatWindow {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// What a mouse press on the window grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grab {
    Move { dx: u16, dy: u16 },
    Resize,
}

impl ChatWindow {
    /// Default placement: bottom-right corner of `area`.
    pub fn docked(area: Rect) -> Self {
        let width = 50.min(area.width);
        let height = 20.min(area.height);
        let mut w = Self {
            x: area.x + area.width.saturating_sub(width + 1),
            y: area.y + area.height.saturating_sub(height + 1),
            width,
            height,
        };
        w.clamp_to(area);
        w
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Move the top-left corner to (`x`, `y`), leaving part of the window visible.
    pub fn move_to(&mut self, x: i32, y: i32, area: Rect) {
        let max_x = (area.x + area.width).saturating_sub(VISIBLE_MARGIN_X.min(self.width)) as i32;
        let max_y = (area.y + area.height).saturating_sub(VISIBLE_MARGIN_Y.min(self.height)) as i32;
        self.x = x.clamp(area.x as i32, max_x.max(area.x as i32)) as u16;
        self.y = y.clamp(area.y as i32, max_y.max(area.y as i32)) as u16;
    }

    pub fn move_by(&mut self, dx: i32, dy: i32, area: Rect) {
        self.move_to(self.x as i32 + dx, self.y as i32 + dy, area);
    }

    /// Resize to `width` x `height` within the size limits and the terminal.
    pub fn resize_to(&mut self, width: i32, height: i32, area: Rect) {
        let room_w = (area.x + area.width).saturating_sub(self.x) as i32;
        let room_h = (area.y + area.height).saturating_sub(self.y) as i32;
        let width = width.clamp(MIN_WIDTH as i32, MAX_WIDTH as i32).min(room_w).max(1);
        let height = height.clamp(MIN_HEIGHT as i32, MAX_HEIGHT as i32).min(room_h).max(1);
        self.width = width as u16;
        self.height = height as u16;
    }

    pub fn resize_by(&mut self, dw: i32, dh: i32, area: Rect) {
        self.resize_to(self.width as i32 + dw, self.height as i32 + dh, area);
    }

    /// Re-fit after the terminal changed size.
    pub fn clamp_to(&mut self, area: Rect) {
        self.width = self.width.min(area.width).max(1);
        self.height = self.height.min(area.height).max(1);
        let max_x = (area.x + area.width).saturating_sub(self.width);
        let max_y = (area.y + area.height).saturating_sub(self.height);
        self.x = self.x.clamp(area.x, max_x.max(area.x));
        self.y = self.y.clamp(area.y, max_y.max(area.y));
    }

    pub fn contains(&self, col: u16, row: u16) -> bool {
        let r = self.rect();
        col >= r.x && col < r.x + r.width && row >= r.y && row < r.y + r.height
    }

    /// Title bar grabs a move, the bottom-right cell grabs a resize.
    pub fn hit(&self, col: u16, row: u16) -> Option<Grab> {
        if !self.contains(col, row) {
            return None;
        }
        let r = self.rect();
        if col + 1 == r.x + r.width && row + 1 == r.y + r.height {
            Some(Grab::Resize)
        } else if row == r.y {
            Some(Grab::Move { dx: col - r.x, dy: row - r.y })
        } else {
            None
        }
    }

    /// Apply a mouse drag to position (`col`, `row`) for an earlier grab.
    pub fn drag(&mut self, grab: Grab, col: u16, row: u16, area: Rect) {
        match grab {
            Grab::Move { dx, dy } => self.move_to(col as i32 - dx as i32, row as i32 - dy as i32, area),
            Grab::Resize => self.resize_to(col as i32 - self.x as i32 + 1, row as i32 - self.y as i32 + 1, area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect { x: 0, y: 0, width: 120, height: 40 };

    #[test]
    fn docked_fits() {
        let w = ChatWindow::docked(SCREEN);
        assert_eq!((w.width, w.height), (50, 20));
        assert!(w.x + w.width <= 120 && w.y + w.height <= 40);
    }

    #[test]
    fn move_keeps_a_margin_visible() {
        let mut w = ChatWindow::docked(SCREEN);
        w.move_to(-5, -5, SCREEN);
        assert_eq!((w.x, w.y), (0, 0));
        w.move_to(500, 500, SCREEN);
        assert_eq!((w.x, w.y), (110, 37));
    }

    #[test]
    fn resize_respects_limits_and_screen() {
        let mut w = ChatWindow { x: 0, y: 0, width: 50, height: 20 };
        w.resize_to(5, 5, SCREEN);
        assert_eq!((w.width, w.height), (MIN_WIDTH, MIN_HEIGHT));
        w.resize_to(500, 500, SCREEN);
        assert_eq!((w.width, w.height), (MAX_WIDTH, MAX_HEIGHT));
        w.move_to(100, 30, SCREEN);
        w.resize_by(10, 10, SCREEN);
        assert!(w.x + w.width <= 120);
        assert!(w.y + w.height <= 40);
    }

    #[test]
    fn terminal_shrink_refits() {
        let mut w = ChatWindow { x: 100, y: 30, width: 50, height: 20 };
        let small = Rect::new(0, 0, 60, 24);
        w.clamp_to(small);
        assert!(w.x + w.width <= 60);
        assert!(w.y + w.height <= 24);
    }

    #[test]
    fn hit_and_drag() {
        let mut w = ChatWindow { x: 10, y: 5, width: 40, height: 15 };
        assert_eq!(w.hit(0, 0), None);
        assert_eq!(w.hit(12, 5), Some(Grab::Move { dx: 2, dy: 0 }));
        assert_eq!(w.hit(49, 19), Some(Grab::Resize));
        assert_eq!(w.hit(20, 10), None);

        w.drag(Grab::Move { dx: 2, dy: 0 }, 22, 8, SCREEN);
        assert_eq!((w.x, w.y), (20, 8));
        w.drag(Grab::Resize, 69, 27, SCREEN);
        assert_eq!((w.width, w.height), (50, 20));
    }
}
