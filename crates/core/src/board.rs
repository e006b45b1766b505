//! Board module - owns the game grid
//!
//! The board is a `width x height` grid of [`Cell`]s stored as a flat,
//! row-major vector. Coordinates are `(x, y)` with `x` growing right and `y`
//! growing down. Which edge is the floor depends on [`Gravity`]: every
//! operation that shifts rows (sweeping, garbage) takes the current gravity
//! and works in "floor to ceiling" order, so flipped gravity simply walks the
//! rows the other way.

use crate::rng::RandomSource;
use crate::types::{
    Cell, CellColor, Modifier, Occupant, Gravity, BOARD_HEIGHT, BOARD_WIDTH,
};

/// Modifier found in a row that was just cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierTrigger {
    pub x: usize,
    pub y: usize,
    pub modifier: Modifier,
}

/// Result of a row sweep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepResult {
    pub lines_cleared: u32,
    /// Indices of cleared rows, in pre-sweep coordinates, ascending
    pub cleared_indices: Vec<usize>,
    /// Modifiers carried by cells of the cleared rows, row by row
    pub triggers: Vec<ModifierTrigger>,
    /// Cleared rows whose cells all share one color
    pub mono_rows: u32,
}

/// What happened to ice while writing a piece
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockReport {
    pub cells_written: u32,
    pub ice_cracked: u32,
    pub ice_broken: u32,
}

/// The game board
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    width: usize,
    height: usize,
    /// Flat array of cells, row-major order (y * width + x)
    cells: Vec<Cell>,
    /// Garbage lines waiting to be inserted
    pending_garbage: u32,
}

impl Board {
    /// Create a new empty board. Dimensions are validated by the caller.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
            pending_garbage: 0,
        }
    }

    /// Rebuild from snapshot contents
    pub fn from_parts(width: usize, height: usize, cells: Vec<Cell>, pending_garbage: u32) -> Self {
        Self {
            width,
            height,
            cells,
            pending_garbage,
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get cell at position (x, y), `None` if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.cells[idx])
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        self.index(x, y).map(move |idx| &mut self.cells[idx])
    }

    /// Set cell at position (x, y). Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// In bounds and clear
    pub fn is_clear_at(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(cell) if cell.is_clear())
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn row(&self, y: usize) -> &[Cell] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    pub fn pending_garbage(&self) -> u32 {
        self.pending_garbage
    }

    /// Row index of the floor edge
    pub fn floor_row(&self, gravity: Gravity) -> usize {
        match gravity {
            Gravity::Normal => self.height - 1,
            Gravity::Flipped => 0,
        }
    }

    /// Row indices ordered from the floor edge to the ceiling edge
    fn floor_to_ceiling(&self, gravity: Gravity) -> Vec<usize> {
        match gravity {
            Gravity::Normal => (0..self.height).rev().collect(),
            Gravity::Flipped => (0..self.height).collect(),
        }
    }

    fn copy_row(&mut self, from: usize, to: usize) {
        if from != to {
            let w = self.width;
            self.cells.copy_within(from * w..from * w + w, to * w);
        }
    }

    fn clear_row_cells(&mut self, y: usize) {
        let start = y * self.width;
        for cell in &mut self.cells[start..start + self.width] {
            cell.clear();
        }
    }

    /// A row is full when every cell is merged (not clear, not zoned) and
    /// none of them is bedrock.
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= self.height {
            return false;
        }
        self.row(y).iter().all(|c| c.is_solid() && !c.is_bedrock())
    }

    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.height).filter(|&y| self.is_row_full(y)).collect()
    }

    /// Write piece cells into the board.
    ///
    /// Cells above the ceiling are dropped. Ice overlays lose one hit per
    /// write: at 0 the overlay is gone, otherwise it becomes cracked.
    pub fn lock_cells(
        &mut self,
        cells: &[(i32, i32)],
        occupant: Occupant,
        color: Option<CellColor>,
    ) -> LockReport {
        let mut report = LockReport::default();
        for &(x, y) in cells {
            let Some(cell) = self.get_mut(x, y) else {
                continue;
            };
            match cell.modifier() {
                Some(Modifier::Ice { hits }) | Some(Modifier::CrackedIce { hits }) => {
                    let left = hits.saturating_sub(1);
                    if left == 0 {
                        cell.set_modifier(None);
                        report.ice_broken += 1;
                    } else {
                        cell.set_modifier(Some(Modifier::CrackedIce { hits: left }));
                        report.ice_cracked += 1;
                    }
                }
                _ => {}
            }
            cell.fill(occupant, color);
            report.cells_written += 1;
        }
        report
    }

    /// Decrement every bomb timer by one. Returns how many bombs are now at or below zero.
    pub fn tick_bombs(&mut self) -> u32 {
        let mut expired = 0;
        for cell in &mut self.cells {
            if let Some(Modifier::Bomb { timer }) = cell.modifier() {
                let timer = timer - 1;
                cell.set_modifier(Some(Modifier::Bomb { timer }));
                if timer <= 0 {
                    expired += 1;
                }
            }
        }
        expired
    }

    /// Clear every bomb whose timer reached zero, returning their positions
    pub fn detonate_bombs(&mut self) -> Vec<(usize, usize)> {
        let mut blown = Vec::new();
        for (idx, cell) in self.cells.iter_mut().enumerate() {
            if let Some(Modifier::Bomb { timer }) = cell.modifier() {
                if timer <= 0 {
                    cell.clear();
                    blown.push((idx % self.width, idx / self.width));
                }
            }
        }
        blown
    }

    /// Remove full rows (or exactly `manual_rows` when given) and pad with
    /// empty rows at the ceiling edge so the row count never changes.
    ///
    /// Modifiers in the removed rows are reported, not applied: the caller
    /// handles their effects once the grid is consistent again.
    pub fn sweep_rows(&mut self, manual_rows: Option<&[usize]>, gravity: Gravity) -> SweepResult {
        let mut cleared: Vec<usize> = match manual_rows {
            Some(rows) => rows.iter().copied().filter(|&y| y < self.height).collect(),
            None => self.full_rows(),
        };
        cleared.sort_unstable();
        cleared.dedup();

        if cleared.is_empty() {
            return SweepResult::default();
        }

        let mut triggers = Vec::new();
        let mut mono_rows = 0;
        for &y in &cleared {
            for (x, cell) in self.row(y).iter().enumerate() {
                if let Some(modifier) = cell.modifier() {
                    triggers.push(ModifierTrigger { x, y, modifier });
                }
            }
            if self.is_mono_row(y) {
                mono_rows += 1;
            }
        }

        // Two-pointer compaction toward the floor.
        let order = self.floor_to_ceiling(gravity);
        let mut write = 0;
        for read in 0..order.len() {
            if cleared.binary_search(&order[read]).is_ok() {
                continue;
            }
            self.copy_row(order[read], order[write]);
            write += 1;
        }
        for &y in &order[write..] {
            self.clear_row_cells(y);
        }

        SweepResult {
            lines_cleared: cleared.len() as u32,
            cleared_indices: cleared,
            triggers,
            mono_rows,
        }
    }

    fn is_mono_row(&self, y: usize) -> bool {
        let mut colors = self.row(y).iter().map(|c| c.effective_color());
        match colors.next() {
            Some(Some(first)) => colors.all(|c| c == Some(first)),
            _ => false,
        }
    }

    /// Mark every occupied cell in row `y` as zoned (pending deferred clear)
    pub fn zone_row(&mut self, y: usize) {
        if y >= self.height {
            return;
        }
        let start = y * self.width;
        for cell in &mut self.cells[start..start + self.width] {
            cell.zone();
        }
    }

    /// Clear every non-bedrock cell in column `x` without shifting rows
    pub fn clear_column(&mut self, x: usize) -> u32 {
        let mut cleared = 0;
        for y in 0..self.height {
            let cell = &mut self.cells[y * self.width + x];
            if !cell.is_clear() && !cell.is_bedrock() {
                cell.clear();
                cleared += 1;
            }
        }
        cleared
    }

    /// Clear every non-bedrock cell
    pub fn wipe(&mut self) -> u32 {
        let mut cleared = 0;
        for cell in &mut self.cells {
            if !cell.is_bedrock() && (!cell.is_clear() || cell.modifier().is_some()) {
                if !cell.is_clear() {
                    cleared += 1;
                }
                cell.clear();
            }
        }
        cleared
    }

    /// Soft blocks in row `y` crumble into clear cells
    pub fn crumble_soft(&mut self, y: usize) -> u32 {
        if y >= self.height {
            return 0;
        }
        let start = y * self.width;
        let mut crumbled = 0;
        for cell in &mut self.cells[start..start + self.width] {
            if cell.modifier() == Some(Modifier::Soft) {
                cell.clear();
                crumbled += 1;
            }
        }
        crumbled
    }

    /// Queue `n` garbage lines for the next garbage application point
    pub fn add_garbage(&mut self, n: u32) {
        self.pending_garbage = self.pending_garbage.saturating_add(n);
    }

    /// Take the pending count without inserting anything
    pub fn take_pending_garbage(&mut self) -> u32 {
        std::mem::take(&mut self.pending_garbage)
    }

    /// Insert all pending garbage, returning how many lines went in
    pub fn apply_pending_garbage<R: RandomSource>(&mut self, gravity: Gravity, rng: &mut R) -> u32 {
        let n = self.take_pending_garbage();
        if n > 0 {
            self.add_garbage_lines(n, gravity, rng);
        }
        n
    }

    /// Insert `n` garbage rows at the floor edge, each with exactly one hole.
    ///
    /// Existing rows shift toward the ceiling; rows pushed past it are lost.
    /// Returns true if any occupied cell was pushed off the board.
    pub fn add_garbage_lines<R: RandomSource>(
        &mut self,
        n: u32,
        gravity: Gravity,
        rng: &mut R,
    ) -> bool {
        let n = (n as usize).min(self.height);
        if n == 0 {
            return false;
        }
        let order = self.floor_to_ceiling(gravity);

        let overflow = order[self.height - n..]
            .iter()
            .any(|&y| self.row(y).iter().any(|c| !c.is_clear()));

        for i in (n..self.height).rev() {
            self.copy_row(order[i - n], order[i]);
        }
        for &y in &order[..n] {
            let hole = rng.next_range(self.width as u32) as usize;
            let start = y * self.width;
            for (x, cell) in self.cells[start..start + self.width].iter_mut().enumerate() {
                *cell = if x == hole {
                    Cell::EMPTY
                } else {
                    Cell::filled(Occupant::Garbage)
                };
            }
        }
        overflow
    }

    /// Pick a random cell matching `eligible`, skipping `exclude`
    pub fn random_cell<R, F>(&self, rng: &mut R, exclude: &[(i32, i32)], eligible: F) -> Option<(usize, usize)>
    where
        R: RandomSource,
        F: Fn(&Cell) -> bool,
    {
        let candidates: Vec<(usize, usize)> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| eligible(c))
            .map(|(idx, _)| (idx % self.width, idx / self.width))
            .filter(|&(x, y)| !exclude.contains(&(x as i32, y as i32)))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.next_range(candidates.len() as u32) as usize])
    }

    /// Place `modifier` on a random clear cell without a modifier
    pub fn place_random_modifier<R: RandomSource>(
        &mut self,
        modifier: Modifier,
        exclude: &[(i32, i32)],
        rng: &mut R,
    ) -> Option<(usize, usize)> {
        let (x, y) = self.random_cell(rng, exclude, |c| c.is_clear() && c.modifier().is_none())?;
        self.cells[y * self.width + x].set_modifier(Some(modifier));
        Some((x, y))
    }

    /// Number of occupied cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_clear()).count()
    }

    /// No occupied cells apart from bedrock
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_clear() || c.is_bedrock())
    }

    /// Numeric grid (0 empty, 1-7 pieces, 8 garbage), row-major
    pub fn code_grid(&self) -> Vec<Vec<u8>> {
        (0..self.height)
            .map(|y| self.row(y).iter().map(Cell::code).collect())
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_WIDTH as usize, BOARD_HEIGHT as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimpleRng;
    use crate::types::PieceKind;

    fn fill_row(board: &mut Board, y: usize) {
        for x in 0..board.width() {
            board.set(x as i32, y as i32, Cell::filled(Occupant::Piece(PieceKind::I)));
        }
    }

    #[test]
    fn test_board_index_calculation() {
        let board = Board::new(11, 22);
        assert_eq!(board.index(0, 0), Some(0));
        assert_eq!(board.index(10, 0), Some(10));
        assert_eq!(board.index(0, 1), Some(11));
        assert_eq!(board.index(10, 21), Some(241));
        assert_eq!(board.index(-1, 0), None);
        assert_eq!(board.index(11, 0), None);
        assert_eq!(board.index(0, 22), None);
    }

    #[test]
    fn test_sweep_normal_gravity_pads_top() {
        let mut board = Board::new(4, 6);
        fill_row(&mut board, 5);
        board.set(1, 4, Cell::filled(Occupant::Garbage));

        let result = board.sweep_rows(None, Gravity::Normal);
        assert_eq!(result.lines_cleared, 1);
        assert_eq!(result.cleared_indices, vec![5]);
        // Row 4 shifted down into row 5.
        assert!(!board.get(1, 5).unwrap().is_clear());
        assert!(board.row(0).iter().all(Cell::is_clear));
    }

    #[test]
    fn test_sweep_flipped_gravity_pads_bottom() {
        let mut board = Board::new(4, 6);
        fill_row(&mut board, 0);
        board.set(2, 1, Cell::filled(Occupant::Garbage));

        let result = board.sweep_rows(None, Gravity::Flipped);
        assert_eq!(result.lines_cleared, 1);
        assert!(!board.get(2, 0).unwrap().is_clear());
        assert!(board.row(5).iter().all(Cell::is_clear));
    }

    #[test]
    fn test_zoned_rows_are_not_full() {
        let mut board = Board::new(4, 6);
        fill_row(&mut board, 5);
        board.zone_row(5);
        assert!(!board.is_row_full(5));
        assert_eq!(board.sweep_rows(None, Gravity::Normal).lines_cleared, 0);
        // A manual sweep still removes it.
        assert_eq!(board.sweep_rows(Some(&[5]), Gravity::Normal).lines_cleared, 1);
        assert_eq!(board.filled_count(), 0);
    }

    #[test]
    fn test_bedrock_row_never_full() {
        let mut board = Board::new(4, 6);
        fill_row(&mut board, 5);
        board.set(
            0,
            5,
            Cell::filled(Occupant::Garbage).with_modifier(Modifier::Bedrock),
        );
        assert!(!board.is_row_full(5));
    }

    #[test]
    fn test_sweep_reports_triggers() {
        let mut board = Board::new(4, 6);
        fill_row(&mut board, 5);
        board.get_mut(2, 5).unwrap().set_modifier(Some(Modifier::Gem));

        let result = board.sweep_rows(None, Gravity::Normal);
        assert_eq!(
            result.triggers,
            vec![ModifierTrigger {
                x: 2,
                y: 5,
                modifier: Modifier::Gem
            }]
        );
        assert_eq!(result.mono_rows, 1);
    }

    #[test]
    fn test_lock_cells_cracks_ice() {
        let mut board = Board::new(4, 6);
        board.get_mut(0, 5).unwrap().set_modifier(Some(Modifier::Ice { hits: 2 }));
        board.get_mut(1, 5).unwrap().set_modifier(Some(Modifier::Ice { hits: 1 }));

        let report = board.lock_cells(&[(0, 5), (1, 5), (2, -1)], Occupant::Piece(PieceKind::O), None);
        assert_eq!(report.cells_written, 2);
        assert_eq!(report.ice_cracked, 1);
        assert_eq!(report.ice_broken, 1);
        assert_eq!(
            board.get(0, 5).unwrap().modifier(),
            Some(Modifier::CrackedIce { hits: 1 })
        );
        assert_eq!(board.get(1, 5).unwrap().modifier(), None);
        assert!(board.get(1, 5).unwrap().is_solid());
    }

    #[test]
    fn test_bombs_tick_and_detonate() {
        let mut board = Board::new(4, 6);
        board.set(
            3,
            5,
            Cell::filled(Occupant::Garbage).with_modifier(Modifier::Bomb { timer: 2 }),
        );
        assert_eq!(board.tick_bombs(), 0);
        assert!(board.detonate_bombs().is_empty());
        assert_eq!(board.tick_bombs(), 1);
        assert_eq!(board.detonate_bombs(), vec![(3, 5)]);
        assert!(board.get(3, 5).unwrap().is_clear());
    }

    #[test]
    fn test_garbage_lines_have_one_hole() {
        let mut board = Board::new(11, 22);
        let mut rng = SimpleRng::new(5);
        board.add_garbage(2);
        assert_eq!(board.apply_pending_garbage(Gravity::Normal, &mut rng), 2);
        assert_eq!(board.pending_garbage(), 0);
        assert_eq!(board.filled_count(), 2 * 10);
        for y in [20, 21] {
            assert_eq!(board.row(y).iter().filter(|c| c.is_clear()).count(), 1);
        }
    }

    #[test]
    fn test_garbage_flipped_inserts_at_row_zero() {
        let mut board = Board::new(4, 6);
        board.set(0, 0, Cell::filled(Occupant::Piece(PieceKind::T)));
        let mut rng = SimpleRng::new(5);
        board.add_garbage_lines(1, Gravity::Flipped, &mut rng);
        assert_eq!(board.row(0).iter().filter(|c| c.is_clear()).count(), 1);
        assert_eq!(
            board.get(0, 1).unwrap().occupant(),
            Some(Occupant::Piece(PieceKind::T))
        );
    }

    #[test]
    fn test_garbage_overflow_reported() {
        let mut board = Board::new(4, 3);
        board.set(0, 0, Cell::filled(Occupant::Garbage));
        let mut rng = SimpleRng::new(5);
        assert!(board.add_garbage_lines(1, Gravity::Normal, &mut rng));
    }

    #[test]
    fn test_wipe_keeps_bedrock() {
        let mut board = Board::new(4, 6);
        fill_row(&mut board, 4);
        board.set(
            0,
            5,
            Cell::filled(Occupant::Garbage).with_modifier(Modifier::Bedrock),
        );
        assert_eq!(board.wipe(), 4);
        assert!(board.is_empty());
        assert_eq!(board.filled_count(), 1);
    }

    #[test]
    fn test_place_random_modifier_respects_exclusion() {
        let mut board = Board::new(2, 1);
        let mut rng = SimpleRng::new(11);
        let placed = board.place_random_modifier(Modifier::Laser, &[(0, 0)], &mut rng);
        assert_eq!(placed, Some((1, 0)));
        assert!(board.place_random_modifier(Modifier::Laser, &[(0, 0)], &mut rng).is_none());
    }
}
