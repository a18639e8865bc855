//! Classic seed patterns in `.`/`O` notation, parsed with
//! [`CellSet::from_pattern`](crate::CellSet::from_pattern).

/// Block: 2x2 still life.
pub const BLOCK: &str = "\
OO
OO";

/// Blinker: period-2 oscillator.
pub const BLINKER: &str = "OOO";

/// Toad: period-2 oscillator.
pub const TOAD: &str = "\
.OOO
OOO.";

/// Beacon: period-2 oscillator made of two blocks.
pub const BEACON: &str = "\
OO..
OO..
..OO
..OO";

/// Glider: a small spaceship that moves diagonally.
pub const GLIDER: &str = "\
.O.
..O
OOO";

/// R-pentomino: stabilizes only after 1103 generations.
pub const R_PENTOMINO: &str = "\
.OO
OO.
.O.";

/// Lightweight Spaceship (LWSS): moves horizontally.
pub const LWSS: &str = "\
.O..O
O....
O...O
OOOO.";

/// Pulsar: a period-3 oscillator.
pub const PULSAR: &str = "\
..OOO...OOO..
.............
O....O.O....O
O....O.O....O
O....O.O....O
..OOO...OOO..
.............
..OOO...OOO..
O....O.O....O
O....O.O....O
O....O.O....O
.............
..OOO...OOO..";

/// Gosper Glider Gun: produces a new glider every 30 generations.
pub const GOSPER_GUN: &str = "\
........................O...........
......................O.O...........
............OO......OO............OO
...........O...O....OO............OO
OO........O.....O...OO..............
OO........O...O.OO....O.O...........
..........O.....O.......O...........
...........O...O....................
............OO......................";

/// Short names accepted by [`by_name`].
pub const NAMES: [&str; 9] = [
    "block", "blinker", "toad", "beacon", "glider", "rpent", "lwss", "pulsar", "gun",
];

pub fn by_name(name: &str) -> Option<&'static str> {
    let pattern = match name {
        "block" => BLOCK,
        "blinker" => BLINKER,
        "toad" => TOAD,
        "beacon" => BEACON,
        "glider" => GLIDER,
        "rpent" => R_PENTOMINO,
        "lwss" => LWSS,
        "pulsar" => PULSAR,
        "gun" => GOSPER_GUN,
        _ => return None,
    };
    Some(pattern)
}
