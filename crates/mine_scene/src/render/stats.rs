//! Per-frame render statistics

use serde::{Deserialize, Serialize};

/// Counters a frame reports to the performance harness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderInfo {
    /// Draw calls issued this frame
    pub draw_calls: u32,
    /// Triangles submitted this frame
    pub triangles: u64,
    /// Point primitives submitted this frame
    pub points: u64,
    /// Line primitives submitted this frame
    pub lines: u64,
}

impl RenderInfo {
    /// Account for one draw call of `triangles` triangles
    pub fn add_draw(&mut self, triangles: u64) {
        self.draw_calls += 1;
        self.triangles += triangles;
    }

    /// Merge another frame section into this one
    pub fn merge(&mut self, other: &RenderInfo) {
        self.draw_calls += other.draw_calls;
        self.triangles += other.triangles;
        self.points += other.points;
        self.lines += other.lines;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate() {
        let mut info = RenderInfo::default();
        info.add_draw(12);
        info.add_draw(48);

        let mut other = RenderInfo::default();
        other.add_draw(100);
        info.merge(&other);

        assert_eq!(info.draw_calls, 3);
        assert_eq!(info.triangles, 160);
    }
}
