use crate::service::Feedback;

/// Sessions with this many attempts or more get a small initial board that
/// grows on demand instead of materializing every row up front.
pub const LONG_GAME_THRESHOLD: usize = 50;
pub const LONG_GAME_INITIAL_ROWS: usize = 12;
pub const GROWTH_BATCH: usize = 5;
pub const GROWTH_MARGIN: usize = 2;

/// One feedback slot next to a guess row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Marker {
    #[default]
    Empty,
    Exact,
    Partial,
    Miss,
}

/// One guess row: editable digit tiles plus a parallel feedback strip.
#[derive(Clone, Debug)]
pub struct Row {
    pub tiles: Vec<Option<char>>,
    pub markers: Vec<Marker>,
}

impl Row {
    fn new(code_length: usize) -> Self {
        Self {
            tiles: vec![None; code_length],
            markers: vec![Marker::Empty; code_length],
        }
    }

    /// A row is scored once feedback has been applied; scoring fills every slot.
    pub fn is_scored(&self) -> bool {
        self.markers.first().is_some_and(|m| *m != Marker::Empty)
    }
}

/// Addressable model of the game board, consumed by the ratatui layer.
///
/// Rows are materialized lazily for long games so an "endless" session never
/// allocates thousands of rows up front.
#[derive(Clone, Debug)]
pub struct Board {
    code_length: usize,
    max_attempts: usize,
    rows: Vec<Row>,
    crossed: [bool; 10],
}

impl Board {
    pub fn new(code_length: usize, max_attempts: usize) -> Self {
        let initial = if max_attempts >= LONG_GAME_THRESHOLD {
            LONG_GAME_INITIAL_ROWS.min(max_attempts)
        } else {
            max_attempts
        };

        Self {
            code_length,
            max_attempts,
            rows: (0..initial).map(|_| Row::new(code_length)).collect(),
            crossed: [false; 10],
        }
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn rendered_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn set_tile(&mut self, row: usize, col: usize, digit: char) {
        if let Some(tile) = self.rows.get_mut(row).and_then(|r| r.tiles.get_mut(col)) {
            *tile = Some(digit);
        }
    }

    pub fn clear_tile(&mut self, row: usize, col: usize) {
        if let Some(tile) = self.rows.get_mut(row).and_then(|r| r.tiles.get_mut(col)) {
            *tile = None;
        }
    }

    /// Replace the row's feedback strip: exact markers first, then partial,
    /// then misses. The order is stable so transcripts are shareable.
    pub fn apply_feedback(&mut self, row: usize, feedback: Feedback) {
        let code_length = self.code_length;
        if let Some(r) = self.rows.get_mut(row) {
            let misses = feedback.misses(code_length);
            r.markers.clear();
            r.markers
                .extend(std::iter::repeat(Marker::Exact).take(feedback.exact));
            r.markers
                .extend(std::iter::repeat(Marker::Partial).take(feedback.partial));
            r.markers.extend(std::iter::repeat(Marker::Miss).take(misses));
        }
    }

    /// True when the player is within [`GROWTH_MARGIN`] rows of the rendered
    /// frontier and more rows remain to materialize.
    pub fn should_grow(&self, current_row: usize) -> bool {
        current_row + GROWTH_MARGIN >= self.rows.len() && self.rows.len() < self.max_attempts
    }

    /// Append up to [`GROWTH_BATCH`] rows, never exceeding `max_attempts`.
    /// Returns the number of rows actually added.
    pub fn grow(&mut self) -> usize {
        let room = self.max_attempts - self.rows.len();
        let added = GROWTH_BATCH.min(room);
        for _ in 0..added {
            self.rows.push(Row::new(self.code_length));
        }
        added
    }

    /// Player memory aid on the keypad digit keys; independent of game state.
    pub fn toggle_crossed(&mut self, digit: char) {
        if let Some(d) = digit.to_digit(10) {
            self.crossed[d as usize] = !self.crossed[d as usize];
        }
    }

    pub fn is_crossed(&self, digit: char) -> bool {
        digit
            .to_digit(10)
            .is_some_and(|d| self.crossed[d as usize])
    }

    /// Emoji transcript of all scored rows, for the results screen.
    pub fn share_grid(&self) -> String {
        let mut text = format!("🕵️ CodeBreaker ({} Digits)\n", self.code_length);
        for row in self.rows.iter().filter(|r| r.is_scored()) {
            for marker in &row.markers {
                text.push(match marker {
                    Marker::Exact => '🟢',
                    Marker::Partial => '🟡',
                    _ => '⚫',
                });
            }
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_game_renders_every_row() {
        let board = Board::new(4, 10);
        assert_eq!(board.rendered_rows(), 10);
    }

    #[test]
    fn long_game_renders_initial_batch() {
        let board = Board::new(4, 10_000);
        assert_eq!(board.rendered_rows(), LONG_GAME_INITIAL_ROWS);
    }

    #[test]
    fn threshold_game_uses_initial_batch() {
        let board = Board::new(4, 50);
        assert_eq!(board.rendered_rows(), 12);
    }

    #[test]
    fn grow_adds_a_batch_and_caps_at_max() {
        let mut board = Board::new(4, 14);
        // 14 < threshold, all rows rendered; nothing to add
        assert_eq!(board.grow(), 0);

        let mut board = Board::new(4, 100);
        assert_eq!(board.rendered_rows(), 12);
        assert_eq!(board.grow(), GROWTH_BATCH);
        assert_eq!(board.rendered_rows(), 17);
    }

    #[test]
    fn grow_never_exceeds_max_attempts() {
        let mut board = Board::new(3, 60);
        while board.rendered_rows() < 60 {
            assert!(board.grow() > 0);
        }
        assert_eq!(board.grow(), 0);
        assert_eq!(board.rendered_rows(), 60);
    }

    #[test]
    fn should_grow_near_frontier_only() {
        let board = Board::new(4, 100);
        assert!(!board.should_grow(5));
        assert!(board.should_grow(10)); // 10 + 2 >= 12
        assert!(board.should_grow(11));

        // fully rendered board never grows
        let board = Board::new(4, 10);
        assert!(!board.should_grow(9));
    }

    #[test]
    fn apply_feedback_orders_exact_partial_miss() {
        let mut board = Board::new(4, 10);
        board.apply_feedback(0, Feedback { exact: 2, partial: 1 });
        let row = board.row(0).unwrap();
        assert_eq!(
            row.markers,
            vec![Marker::Exact, Marker::Exact, Marker::Partial, Marker::Miss]
        );
        assert!(row.is_scored());
    }

    #[test]
    fn all_miss_feedback_still_counts_as_scored() {
        let mut board = Board::new(3, 10);
        board.apply_feedback(0, Feedback { exact: 0, partial: 0 });
        assert_eq!(board.row(0).unwrap().markers, vec![Marker::Miss; 3]);
        assert!(board.row(0).unwrap().is_scored());
    }

    #[test]
    fn set_and_clear_tile() {
        let mut board = Board::new(4, 10);
        board.set_tile(0, 0, '7');
        assert_eq!(board.row(0).unwrap().tiles[0], Some('7'));
        board.clear_tile(0, 0);
        assert_eq!(board.row(0).unwrap().tiles[0], None);

        // out-of-range writes are ignored
        board.set_tile(99, 0, '1');
        board.set_tile(0, 99, '1');
    }

    #[test]
    fn crossed_digits_toggle() {
        let mut board = Board::new(4, 10);
        assert!(!board.is_crossed('5'));
        board.toggle_crossed('5');
        assert!(board.is_crossed('5'));
        board.toggle_crossed('5');
        assert!(!board.is_crossed('5'));
        // non-digit is a no-op
        board.toggle_crossed('x');
    }

    #[test]
    fn share_grid_lists_scored_rows_in_order() {
        let mut board = Board::new(3, 10);
        board.apply_feedback(0, Feedback { exact: 1, partial: 1 });
        board.apply_feedback(1, Feedback { exact: 3, partial: 0 });
        let grid = board.share_grid();
        let mut lines = grid.lines();
        assert_eq!(lines.next(), Some("🕵️ CodeBreaker (3 Digits)"));
        assert_eq!(lines.next(), Some("🟢🟡⚫"));
        assert_eq!(lines.next(), Some("🟢🟢🟢"));
        assert_eq!(lines.next(), None);
    }
}
