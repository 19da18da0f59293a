//! QWERTY geometry used for typing cadence and typo selection.

const ROWS: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];

/// True if `a` and `b` sit next to each other on the same letter row
/// (case-insensitive).
pub fn same_row_neighbours(a: char, b: char) -> bool {
    let (a, b) = (fold(a), fold(b));
    ROWS.iter().any(|row| {
        match (row.find(a), row.find(b)) {
            (Some(i), Some(j)) => i.abs_diff(j) == 1,
            _ => false,
        }
    })
}

/// Keys a finger aiming for `c` might hit instead, across rows. Empty for
/// anything that is not a letter key.
pub fn typo_candidates(c: char) -> &'static [char] {
    match fold(c) {
        'q' => &['w', 'a'],
        'w' => &['q', 'e', 's', 'a'],
        'e' => &['w', 'r', 'd', 's'],
        'r' => &['e', 't', 'f', 'd'],
        't' => &['r', 'y', 'g', 'f'],
        'y' => &['t', 'u', 'h', 'g'],
        'u' => &['y', 'i', 'j', 'h'],
        'i' => &['u', 'o', 'k', 'j'],
        'o' => &['i', 'p', 'l', 'k'],
        'p' => &['o', 'l'],
        'a' => &['q', 'w', 's', 'z'],
        's' => &['a', 'w', 'e', 'd', 'x', 'z'],
        'd' => &['s', 'e', 'r', 'f', 'c', 'x'],
        'f' => &['d', 'r', 't', 'g', 'v', 'c'],
        'g' => &['f', 't', 'y', 'h', 'b', 'v'],
        'h' => &['g', 'y', 'u', 'j', 'n', 'b'],
        'j' => &['h', 'u', 'i', 'k', 'm', 'n'],
        'k' => &['j', 'i', 'o', 'l', 'm'],
        'l' => &['k', 'o', 'p'],
        'z' => &['a', 's', 'x'],
        'x' => &['z', 's', 'd', 'c'],
        'c' => &['x', 'd', 'f', 'v'],
        'v' => &['c', 'f', 'g', 'b'],
        'b' => &['v', 'g', 'h', 'n'],
        'n' => &['b', 'h', 'j', 'm'],
        'm' => &['n', 'j', 'k'],
        _ => &[],
    }
}

/// Symbols that need a stretch or a shift and slow the typist down.
pub fn is_awkward_symbol(c: char) -> bool {
    "@#$%^&*()_+{}|:<>?".contains(c)
}

fn fold(c: char) -> char {
    c.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_neighbours() {
        assert!(same_row_neighbours('a', 's'));
        assert!(same_row_neighbours('S', 'a'));
        assert!(same_row_neighbours('n', 'm'));
        assert!(!same_row_neighbours('a', 'd'));
        assert!(!same_row_neighbours('q', 'a'));
        assert!(!same_row_neighbours('1', '2'));
    }

    #[test]
    fn typo_candidates_are_letters_only() {
        assert!(typo_candidates('G').contains(&'h'));
        assert!(typo_candidates('!').is_empty());
        assert!(typo_candidates('é').is_empty());
        for c in 'a'..='z' {
            assert!(!typo_candidates(c).is_empty(), "{c} has no neighbours");
            assert!(!typo_candidates(c).contains(&c));
        }
    }
}
