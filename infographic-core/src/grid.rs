//! Grid geometry for product cards.
//!
//! Cells tile the content area between the header and footer bands in
//! row-major order. Integer division truncates, so the last column/row may
//! stop a few pixels short of the content edge.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// One slot of the layout grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: u32,
    pub column: u32,
    pub top_left: Point,
    pub bottom_right: Point,
}

impl Cell {
    pub fn width(&self) -> i32 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> i32 {
        self.bottom_right.y - self.top_left.y
    }

    fn overlaps(&self, other: &Cell) -> bool {
        self.top_left.x < other.bottom_right.x
            && other.top_left.x < self.bottom_right.x
            && self.top_left.y < other.bottom_right.y
            && other.top_left.y < self.bottom_right.y
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub header_height: u32,
    pub footer_height: u32,
    /// Horizontal gap between cards, also used as the left/right and top inset.
    pub margin: u32,
    pub vertical_margin: u32,
}

impl GridSpec {
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Width and height shared by every cell.
    pub fn cell_size(&self) -> (i64, i64) {
        if self.columns == 0 || self.rows == 0 {
            return (0, 0);
        }
        let (cols, rows) = (self.columns as i64, self.rows as i64);
        let usable_h = self.canvas_height as i64
            - self.header_height as i64
            - self.footer_height as i64
            - (rows - 1) * self.vertical_margin as i64;
        let w = (self.canvas_width as i64 - (cols + 1) * self.margin as i64).div_euclid(cols);
        let h = usable_h.div_euclid(rows);
        (w, h)
    }

    /// Row-major cell rectangles; empty when either grid dimension is zero.
    ///
    /// Heights follow `(H - header - footer - (rows-1)*vertical_margin) / rows`
    /// exactly, with the first row starting `margin` below the header. No
    /// bottom inset is reserved, so the last row can end up to `margin`
    /// pixels inside the footer band (1200x1800, 3x3, bands 180, margins 50
    /// gives 446px cells ending 48px into the footer).
    pub fn cells(&self) -> Vec<Cell> {
        if self.columns == 0 || self.rows == 0 {
            return Vec::new();
        }
        let (w, h) = self.cell_size();
        let margin = self.margin as i64;
        let mut out = Vec::with_capacity(self.cell_count());
        for row in 0..self.rows {
            for column in 0..self.columns {
                let x = column as i64 * (w + margin) + margin;
                let y = row as i64 * (h + self.vertical_margin as i64)
                    + self.header_height as i64
                    + margin;
                out.push(Cell {
                    row,
                    column,
                    top_left: Point::new(x as i32, y as i32),
                    bottom_right: Point::new((x + w) as i32, (y + h) as i32),
                });
            }
        }
        log::debug!(
            "grid {}x{}: {} cells of {}x{}",
            self.columns,
            self.rows,
            out.len(),
            w,
            h
        );
        out
    }

    /// Fail-fast check for callers that are about to draw into the cells.
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(Error::InvalidGrid(format!(
                "columns and rows must be at least 1 (got {}x{})",
                self.columns, self.rows
            )));
        }
        let (w, h) = self.cell_size();
        if w <= 0 || h <= 0 {
            return Err(Error::InvalidGrid(format!(
                "margins and bands leave no room for cells ({w}x{h})"
            )));
        }
        Ok(())
    }
}

/// True when no two cells share interior pixels.
pub fn non_overlapping(cells: &[Cell]) -> bool {
    cells
        .iter()
        .enumerate()
        .all(|(i, a)| cells[i + 1..].iter().all(|b| !a.overlaps(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> GridSpec {
        GridSpec {
            canvas_width: 1200,
            canvas_height: 1800,
            columns: 3,
            rows: 3,
            header_height: 180,
            footer_height: 180,
            margin: 50,
            vertical_margin: 50,
        }
    }

    #[test]
    fn reference_layout_matches_known_geometry() {
        let cells = reference().cells();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0].top_left, Point::new(50, 230));
        assert_eq!(cells[0].width(), 333);
        // (1800 - 180 - 180 - 2*50) / 3
        assert_eq!(cells[0].height(), 446);
        assert_eq!(cells[1].top_left, Point::new(433, 230));
        assert_eq!(cells[3].top_left, Point::new(50, 726));
        assert_eq!(cells[8].bottom_right, Point::new(1149, 1668));
    }

    #[test]
    fn cells_are_row_major() {
        let cells = reference().cells();
        let order: Vec<(u32, u32)> = cells.iter().map(|c| (c.row, c.column)).collect();
        assert_eq!(
            order,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2)]
        );
        for pair in cells.windows(2) {
            if pair[0].row == pair[1].row {
                assert!(pair[0].top_left.x < pair[1].top_left.x);
            } else {
                assert!(pair[0].top_left.y < pair[1].top_left.y);
            }
        }
    }

    #[test]
    fn last_row_may_reach_into_footer_by_at_most_the_margin() {
        let spec = reference();
        let cells = spec.cells();
        for c in &cells {
            assert!(c.top_left.x >= 0 && c.bottom_right.x <= spec.canvas_width as i32);
            assert!(c.top_left.y >= spec.header_height as i32);
        }
        let footer_top = (spec.canvas_height - spec.footer_height) as i32;
        let overshoot = cells[8].bottom_right.y - footer_top;
        assert_eq!(overshoot, 48);
        assert!(overshoot <= spec.margin as i32);
    }

    #[test]
    fn many_shapes_produce_disjoint_cells_in_bounds() {
        for columns in 1..=5 {
            for rows in 1..=5 {
                for margin in [0, 10, 35] {
                    let spec = GridSpec {
                        canvas_width: 1000,
                        canvas_height: 1500,
                        columns,
                        rows,
                        header_height: 120,
                        footer_height: 90,
                        margin,
                        vertical_margin: margin / 2,
                    };
                    let cells = spec.cells();
                    assert_eq!(cells.len(), (columns * rows) as usize);
                    assert!(non_overlapping(&cells), "{columns}x{rows} m={margin}");
                    for c in &cells {
                        assert!(c.width() > 0 && c.height() > 0);
                        assert!(c.bottom_right.x <= spec.canvas_width as i32);
                        assert!(c.top_left.y >= spec.header_height as i32);
                        // Top inset is `margin`; the floor in the height split
                        // is what keeps the last row off the footer.
                        assert!(
                            c.bottom_right.y
                                <= (spec.canvas_height - spec.footer_height + margin) as i32
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn truncation_leaves_slack_on_the_right() {
        let spec = GridSpec {
            canvas_width: 1000,
            canvas_height: 1000,
            columns: 3,
            rows: 1,
            header_height: 0,
            footer_height: 0,
            margin: 10,
            vertical_margin: 0,
        };
        let cells = spec.cells();
        // (1000 - 40) / 3 = 320 exactly
        assert_eq!(cells[2].bottom_right.x, 990);
        let narrower = GridSpec {
            canvas_width: 999,
            ..spec
        };
        let cells = narrower.cells();
        assert_eq!(cells[0].width(), 319);
        assert_eq!(cells[2].bottom_right.x, 987);
    }

    #[test]
    fn zero_dimensions_give_no_cells_and_fail_validation() {
        let spec = GridSpec {
            columns: 0,
            ..reference()
        };
        assert!(spec.cells().is_empty());
        assert!(matches!(spec.validate(), Err(Error::InvalidGrid(_))));
        let spec = GridSpec {
            rows: 0,
            ..reference()
        };
        assert!(spec.cells().is_empty());
        assert!(spec.validate().is_err());
        assert!(reference().validate().is_ok());
    }

    #[test]
    fn oversized_margins_fail_validation() {
        let spec = GridSpec {
            margin: 400,
            ..reference()
        };
        assert!(matches!(spec.validate(), Err(Error::InvalidGrid(_))));
    }
}
