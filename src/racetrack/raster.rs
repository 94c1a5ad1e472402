//! Digital line rasterization.
//!
//! Integer-only Bresenham stepping between two grid cells. The produced path
//! includes both endpoints, moves at most one cell per axis per step and has
//! exactly `max(|dx|, |dy|) + 1` cells, so it never revisits a cell.

use super::grid::Position;

/// Cells crossed by a straight move from `from` to `to`, in travel order.
///
/// # Examples
///
/// ```
/// use racetrack::racetrack::{Position, rasterize};
///
/// let path = rasterize(Position::new(0, 0), Position::new(3, 1));
/// assert_eq!(path.first(), Some(&Position::new(0, 0)));
/// assert_eq!(path.last(), Some(&Position::new(3, 1)));
/// assert_eq!(path.len(), 4);
/// ```
pub fn rasterize(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut error = dx + dy;

    let mut path = Vec::with_capacity(dx.max(-dy) as usize + 1);
    let (mut x, mut y) = (from.x, from.y);
    loop {
        path.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += sx;
        }
        if doubled <= dx {
            error += dx;
            y += sy;
        }
    }
    path
}

/// Number of cells on the rasterized path between two positions.
pub fn path_length(from: Position, to: Position) -> usize {
    (to.x - from.x).abs().max((to.y - from.y).abs()) as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    #[test]
    fn test_degenerate_single_cell() {
        assert_eq!(rasterize(p(2, 3), p(2, 3)), vec![p(2, 3)]);
    }

    #[test]
    fn test_horizontal_and_vertical() {
        assert_eq!(rasterize(p(0, 0), p(3, 0)), vec![p(0, 0), p(1, 0), p(2, 0), p(3, 0)]);
        assert_eq!(rasterize(p(1, 4), p(1, 2)), vec![p(1, 4), p(1, 3), p(1, 2)]);
    }

    #[test]
    fn test_diagonal() {
        assert_eq!(rasterize(p(0, 0), p(-2, 2)), vec![p(0, 0), p(-1, 1), p(-2, 2)]);
    }

    #[test]
    fn test_shallow_slope_steps_diagonally_once() {
        assert_eq!(rasterize(p(3, 2), p(5, 3)), vec![p(3, 2), p(4, 3), p(5, 3)]);
    }

    #[test]
    fn test_path_length_matches_rasterize() {
        for &(from, to) in &[(p(0, 0), p(5, -3)), (p(4, 4), p(-1, 2)), (p(0, 0), p(0, 0))] {
            assert_eq!(rasterize(from, to).len(), path_length(from, to));
        }
    }
}
