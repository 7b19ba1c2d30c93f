//! Mapping of a physical 4x4 block of a keyboard onto the hex keypad.
//!
//! ```text
//! 1 2 3 4        1 2 3 C
//! Q W E R   ->   4 5 6 D
//! A S D F        7 8 9 E
//! Z X C V        A 0 B F
//! ```

pub const LAYOUT: [[char; 4]; 4] = [
    ['1', '2', '3', '4'],
    ['Q', 'W', 'E', 'R'],
    ['A', 'S', 'D', 'F'],
    ['Z', 'X', 'C', 'V'],
];

const KEYPAD: [[u8; 4]; 4] = [
    [0x1, 0x2, 0x3, 0xC],
    [0x4, 0x5, 0x6, 0xD],
    [0x7, 0x8, 0x9, 0xE],
    [0xA, 0x0, 0xB, 0xF],
];

/// Keypad index of a physical key, case insensitive
pub fn key_index(key: char) -> Option<u8> {
    let key = key.to_ascii_uppercase();
    LAYOUT
        .iter()
        .zip(KEYPAD.iter())
        .flat_map(|(row, pads)| row.iter().zip(pads.iter()))
        .find(|(&physical, _)| physical == key)
        .map(|(_, &pad)| pad)
}

/// Keypad state with every key in `held` pressed
///
/// Returns the first character that isn't mapped to any key.
pub fn keys_from_str(held: &str) -> Result<[bool; 16], char> {
    let mut keys = [false; 16];
    for c in held.chars() {
        let idx = key_index(c).ok_or(c)?;
        keys[idx as usize] = true;
    }
    Ok(keys)
}
