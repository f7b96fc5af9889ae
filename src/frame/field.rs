//! This module rasterizes the targets of a round onto a grid of terminal cells.

use console::style;

use crate::engine::{Target, TargetState};

/// This struct holds a single character of the play area and the state of the target it belongs
/// to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cell {
    /// This field contains the character drawn in the cell.
    pub(crate) ch: char,
    /// This field contains the state of the target whose label covers the cell.
    pub(crate) owner: Option<TargetState>,
}

impl Cell {
    /// This constant is the cell of an empty stretch of the play area.
    const BLANK: Self = Self {
        ch: ' ',
        owner: None,
    };
}

/// This struct holds the play area as rows of cells.
#[derive(Debug)]
pub(crate) struct Field {
    /// This field contains the cells in row-major order.
    cells: Vec<Cell>,
    /// This field contains the number of rows.
    height: usize,
    /// This field contains the number of columns.
    width: usize,
}

impl Field {
    /// This function lays out `targets` on a field of the given size. Labels of lower ids end up
    /// on top of labels of higher ids.
    pub(crate) fn layout(targets: &[Target], width: usize, height: usize) -> Self {
        let mut field = Self {
            cells: vec![Cell::BLANK; width * height],
            height,
            width,
        };

        for target in targets.iter().rev() {
            field.place(target);
        }

        field
    }

    /// This function writes the label of `target` starting at the cell its position maps to. The
    /// label is cut at the right edge.
    fn place(&mut self, target: &Target) {
        let position = target.position();
        let row = scale(position.y, self.height);
        let col = scale(position.x, self.width);

        for (offset, ch) in target.id().to_string().chars().enumerate() {
            if col + offset >= self.width {
                break;
            }
            if let Some(cell) = self.cells.get_mut(row * self.width + col + offset) {
                *cell = Cell {
                    ch,
                    owner: Some(target.state()),
                };
            }
        }
    }

    /// This function renders every row, styling active labels in bold and clicked ones in a dimmed
    /// red.
    pub(crate) fn rows(&self) -> Vec<String> {
        if self.width == 0 {
            return vec![String::new(); self.height];
        }

        self.cells
            .chunks(self.width)
            .map(|row| {
                let mut output = String::new();
                let mut run = String::new();
                let mut owner = None;

                for cell in row {
                    if cell.owner != owner {
                        output.push_str(&paint(&run, owner));
                        run.clear();
                        owner = cell.owner;
                    }
                    run.push(cell.ch);
                }
                output.push_str(&paint(&run, owner));

                output
            })
            .collect()
    }
}

/// This function styles a run of cells that share the same owner.
fn paint(run: &str, owner: Option<TargetState>) -> String {
    match owner {
        None => run.to_owned(),
        Some(TargetState::Active) => format!("{}", style(run).bold()),
        Some(TargetState::Clicked) => format!("{}", style(run).red().dim()),
    }
}

/// This function maps a coordinate in percent onto one of `cells` cells.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Coordinates are within [0, 80) and the result is clamped to the field."
)]
fn scale(percent: f64, cells: usize) -> usize {
    let cell = (percent / 100.0 * cells as f64).floor() as usize;
    cell.min(cells.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use crate::engine::{ClickOutcome, GameEngine, TargetState};

    use super::{scale, Cell, Field};

    fn cell(field: &Field, row: usize, col: usize) -> Option<&Cell> {
        if col >= field.width {
            return None;
        }
        field.cells.get(row * field.width + col)
    }

    #[test]
    fn scale_maps_percent_to_cells() {
        assert_eq!(scale(0.0, 50), 0, "left edge");
        assert_eq!(scale(50.0, 50), 25, "middle");
        assert_eq!(scale(79.9, 100), 79, "right of the sampled range");
        assert_eq!(scale(99.9, 0), 0, "empty field never underflows");
    }

    #[test]
    fn every_target_gets_a_label() {
        let mut engine = GameEngine::with_seed(4);
        engine.start(3);
        let field = Field::layout(engine.targets(), 200, 100);

        for target in engine.targets() {
            let position = target.position();
            let row = scale(position.y, 100);
            let col = scale(position.x, 200);
            let cell = cell(&field, row, col).expect("label is inside the field");

            assert!(cell.owner.is_some(), "target {} is drawn", target.id());
        }
        assert_eq!(field.rows().len(), 100, "one line per row");
    }

    #[test]
    fn lower_ids_are_drawn_on_top() {
        let mut engine = GameEngine::with_seed(8);
        engine.start(9);
        assert_eq!(engine.register_click(1), ClickOutcome::Correct, "hit");

        // a one-cell field stacks every label on the same spot
        let field = Field::layout(engine.targets(), 1, 1);
        let cell = cell(&field, 0, 0).expect("the only cell");

        assert_eq!(cell.ch, '1', "target 1 wins the overlap");
        assert_eq!(cell.owner, Some(TargetState::Clicked), "drawn as clicked");
    }

    #[test]
    fn labels_are_cut_at_the_right_edge() {
        let mut engine = GameEngine::with_seed(8);
        engine.start(12);
        let field = Field::layout(engine.targets(), 1, 1);

        assert!(cell(&field, 0, 1).is_none(), "nothing past the edge");
        let rows: Vec<String> = field
            .rows()
            .iter()
            .map(|row| console::strip_ansi_codes(row).into_owned())
            .collect();
        assert_eq!(rows, vec!["1".to_owned()], "single visible character");
    }
}
