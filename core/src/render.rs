use alloc::string::String;

use crate::*;

/// Text grid of what the agent knows about `minefield`.
///
/// Revealed cells show their clue, known mines an `F`, proven safe but unplayed cells a `.`. With `reveal_mines` the
/// remaining hidden mines show as `X`.
pub fn render_board(minefield: &Minefield, knowledge: &KnowledgeBase, reveal_mines: bool) -> String {
    let (rows, cols) = minefield.size();
    let separator = "--".repeat(cols.into()) + "-";
    let mut out = String::new();

    for row in 0..rows {
        out.push_str(&separator);
        out.push('\n');
        for col in 0..cols {
            let cell = (row, col);
            let glyph = if knowledge.moves_made().contains(&cell) {
                char::from(b'0' + minefield.adjacent_mine_count(cell))
            } else if knowledge.is_known_mine(cell) {
                'F'
            } else if reveal_mines && minefield.contains_mine(cell) {
                'X'
            } else if knowledge.is_known_safe(cell) {
                '.'
            } else {
                ' '
            };
            out.push('|');
            out.push(glyph);
        }
        out.push_str("|\n");
    }
    out.push_str(&separator);
    out.push('\n');
    out
}
