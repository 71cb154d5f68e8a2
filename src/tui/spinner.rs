const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn frame(idx: usize) -> char {
    FRAMES[idx % FRAMES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around() {
        assert_eq!(frame(0), frame(FRAMES.len()));
    }

    #[test]
    fn out_of_range_index_no_panic() {
        let _ = frame(usize::MAX);
    }
}
