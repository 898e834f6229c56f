//! Byte scanning for the item segmenter, using memchr

/// Find a single specific delimiter
#[must_use]
pub fn find_byte(haystack: &[u8], needle: u8, start: usize) -> Option<usize> {
    if start >= haystack.len() {
        return None;
    }

    memchr::memchr(needle, &haystack[start..]).map(|pos| start + pos)
}

/// Find any of 3 delimiters
#[must_use]
pub fn find_bytes3(
    haystack: &[u8],
    needle1: u8,
    needle2: u8,
    needle3: u8,
    start: usize,
) -> Option<(usize, u8)> {
    if start >= haystack.len() {
        return None;
    }

    memchr::memchr3(needle1, needle2, needle3, &haystack[start..])
        .map(|pos| (start + pos, haystack[start + pos]))
}

/// Find the next brace or line break, the only bytes the segmenter cares about
#[must_use]
pub fn find_structural(haystack: &[u8], start: usize) -> Option<(usize, u8)> {
    find_bytes3(haystack, b'{', b'}', b'\n', start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_structural() {
        let input = b"@a{x,\n t = {y}}";

        assert_eq!(find_structural(input, 0), Some((2, b'{')));
        assert_eq!(find_structural(input, 3), Some((5, b'\n')));
        assert_eq!(find_structural(input, 6), Some((11, b'{')));
        assert_eq!(find_structural(input, 12), Some((13, b'}')));
        assert_eq!(find_structural(input, 14), Some((14, b'}')));
        assert_eq!(find_structural(input, 15), None);
    }

    #[test]
    fn test_find_byte() {
        let input = b"junk @misc{";

        assert_eq!(find_byte(input, b'@', 0), Some(5));
        assert_eq!(find_byte(input, b'@', 6), None);
        assert_eq!(find_byte(input, b'@', 100), None);
    }
}
