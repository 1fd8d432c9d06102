//! Text board renderer for logs and tests.

use crate::game_state::game_types::{make_square, Side};
use crate::game_state::position::Position;

/// Render both occupancy grids as one diagram, rank 8 at the top.
///
/// `W` and `B` mark pawns, `.` an empty square.
pub fn render_position(position: &Position) -> String {
    let mut out = String::new();

    out.push_str("  a b c d e f g h\n");

    for rank in (0..8u8).rev() {
        out.push(char::from(b'1' + rank));
        out.push(' ');

        for file in 0..8u8 {
            let ch = match position.side_at(make_square(file, rank)) {
                Some(Side::White) => 'W',
                Some(Side::Black) => 'B',
                None => '.',
            };
            out.push(ch);

            if file < 7 {
                out.push(' ');
            }
        }

        out.push(' ');
        out.push(char::from(b'1' + rank));
        out.push('\n');
    }

    out.push_str("  a b c d e f g h\n");
    out.push_str(match position.side_to_move() {
        Side::White => "White to move",
        Side::Black => "Black to move",
    });

    out
}

#[cfg(test)]
mod tests {
    use super::render_position;
    use crate::game_state::position::Position;

    #[test]
    fn renders_pawns_and_side_to_move() {
        let pos = Position::from_setup("Setup Wa2 Bh7").expect("setup should parse");
        let text = render_position(&pos);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "  a b c d e f g h");
        assert_eq!(lines[2], "7 . . . . . . . B 7");
        assert_eq!(lines[7], "2 W . . . . . . . 2");
        assert_eq!(lines[10], "White to move");
    }
}
