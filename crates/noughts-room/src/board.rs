//! The 3×3 board and win/draw detection.

use noughts_protocol::{BOARD_CELLS, Cell, MoveRejection, Symbol};

/// The eight index triples that win: rows, then columns, then diagonals.
pub const TRIPLES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Nine cells in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board([Cell; BOARD_CELLS]);

impl Board {
    /// An all-empty board.
    pub fn new() -> Self {
        Self([None; BOARD_CELLS])
    }

    /// Builds a board from explicit cells.
    pub fn from_cells(cells: [Cell; BOARD_CELLS]) -> Self {
        Self(cells)
    }

    /// Returns the raw cells.
    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.0
    }

    /// Returns the cell at `index`, or `None` when empty or out of range.
    pub fn get(&self, index: usize) -> Cell {
        self.0.get(index).copied().flatten()
    }

    /// Converts a client-supplied index into a board position.
    pub fn cell_index(raw: i64) -> Option<usize> {
        usize::try_from(raw).ok().filter(|i| *i < BOARD_CELLS)
    }

    /// Writes `symbol` into an empty cell.
    ///
    /// Out-of-range and occupied cells are the same rejection.
    pub fn place(&mut self, index: usize, symbol: Symbol) -> Result<(), MoveRejection> {
        match self.0.get_mut(index) {
            Some(cell) if cell.is_none() => {
                *cell = Some(symbol);
                Ok(())
            }
            _ => Err(MoveRejection::CellTaken),
        }
    }

    /// Returns the first triple held entirely by `symbol`.
    pub fn winning_triple(&self, symbol: Symbol) -> Option<[usize; 3]> {
        TRIPLES
            .iter()
            .find(|triple| triple.iter().all(|&i| self.get(i) == Some(symbol)))
            .copied()
    }

    /// `true` once no cell is empty.
    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.0 = [None; BOARD_CELLS];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Cell = Some(Symbol::X);
    const O: Cell = Some(Symbol::O);
    const E: Cell = None;

    #[test]
    fn test_every_triple_is_detected_for_both_symbols() {
        for symbol in [Symbol::X, Symbol::O] {
            for triple in TRIPLES {
                let mut board = Board::new();
                for i in triple {
                    board.place(i, symbol).unwrap();
                }
                assert_eq!(board.winning_triple(symbol), Some(triple), "{triple:?}");
                assert_eq!(board.winning_triple(symbol.other()), None);
            }
        }
    }

    #[test]
    fn test_two_in_a_row_is_not_a_win() {
        let board = Board::from_cells([X, X, E, O, O, E, E, E, E]);
        assert_eq!(board.winning_triple(Symbol::X), None);
        assert_eq!(board.winning_triple(Symbol::O), None);
    }

    #[test]
    fn test_full_board_without_triple() {
        // X O O
        // O X X
        // O X O  (X: 0,4,5,7  O: 1,2,3,6,8)
        let board = Board::from_cells([X, O, O, O, X, X, O, X, O]);
        assert!(board.is_full());
        assert_eq!(board.winning_triple(Symbol::X), None);
        assert_eq!(board.winning_triple(Symbol::O), None);
    }

    #[test]
    fn test_full_board_can_still_hold_a_triple() {
        let board = Board::from_cells([X, O, X, O, X, O, O, X, X]);
        assert!(board.is_full());
        assert_eq!(board.winning_triple(Symbol::X), Some([0, 4, 8]));
    }

    #[test]
    fn test_place_rejects_occupied_cell() {
        let mut board = Board::new();
        board.place(4, Symbol::X).unwrap();
        assert_eq!(board.place(4, Symbol::O), Err(MoveRejection::CellTaken));
        assert_eq!(board.get(4), X);
    }

    #[test]
    fn test_place_rejects_out_of_range() {
        let mut board = Board::new();
        assert_eq!(board.place(9, Symbol::X), Err(MoveRejection::CellTaken));
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_cell_index_bounds() {
        assert_eq!(Board::cell_index(0), Some(0));
        assert_eq!(Board::cell_index(8), Some(8));
        assert_eq!(Board::cell_index(9), None);
        assert_eq!(Board::cell_index(-1), None);
        assert_eq!(Board::cell_index(i64::MAX), None);
    }

    #[test]
    fn test_clear_empties_board() {
        let mut board = Board::from_cells([X, O, X, O, X, O, O, X, X]);
        board.clear();
        assert_eq!(board, Board::new());
        assert!(!board.is_full());
    }
}
