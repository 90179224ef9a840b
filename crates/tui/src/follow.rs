use unicode_width::UnicodeWidthChar;

/// Scroll state of the rebuild log: sticks to the newest line until the
/// operator scrolls up, and reattaches once they scroll back to the end.
#[derive(Debug, Clone)]
pub struct FollowTailState {
    pub is_following: bool,
    pub auto_follow_threshold_rows: usize,
    offset: usize,
}

impl Default for FollowTailState {
    fn default() -> Self {
        Self {
            is_following: true,
            auto_follow_threshold_rows: 1,
            offset: 0,
        }
    }
}

impl FollowTailState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn detach(&mut self) {
        self.is_following = false;
    }

    pub fn reattach(&mut self) {
        self.is_following = true;
    }

    pub fn scroll_up(&mut self, rows: usize, total: usize, height: usize) {
        let current = self.offset(total, height);
        self.detach();
        self.offset = current.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: usize, total: usize, height: usize) {
        let max = max_offset(total, height);
        self.offset = (self.offset(total, height) + rows).min(max);
        if self.offset + self.auto_follow_threshold_rows >= max {
            self.reattach();
        }
    }

    /// First visible row for a log of `total` lines in a `height`-row viewport.
    pub fn offset(&self, total: usize, height: usize) -> usize {
        let max = max_offset(total, height);
        if self.is_following {
            max
        } else {
            self.offset.min(max)
        }
    }
}

fn max_offset(total: usize, height: usize) -> usize {
    total.saturating_sub(height)
}

/// Split a log line into rows of at most `width` display columns, breaking
/// anywhere. An empty line still occupies one row.
pub fn wrap_rows(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut used = 0;
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width && !row.is_empty() {
            rows.push(std::mem::take(&mut row));
            used = 0;
        }
        row.push(ch);
        used += w;
    }
    rows.push(row);
    rows
}

#[cfg(test)]
mod tests {
    use super::{FollowTailState, wrap_rows};

    #[test]
    fn follows_tail_until_detached() {
        let mut state = FollowTailState::default();
        assert_eq!(state.offset(50, 10), 40);
        assert_eq!(state.offset(60, 10), 50);

        state.scroll_up(5, 60, 10);
        assert!(!state.is_following);
        assert_eq!(state.offset(60, 10), 45);
        assert_eq!(state.offset(80, 10), 45);
    }

    #[test]
    fn scrolling_back_to_the_end_reattaches() {
        let mut state = FollowTailState::default();
        state.scroll_up(10, 30, 10);
        state.scroll_down(9, 30, 10);
        assert!(state.is_following);
        assert_eq!(state.offset(40, 10), 30);
    }

    #[test]
    fn short_logs_never_scroll() {
        let mut state = FollowTailState::default();
        assert_eq!(state.offset(3, 10), 0);
        state.scroll_up(4, 3, 10);
        assert_eq!(state.offset(3, 10), 0);
    }

    #[test]
    fn long_lines_break_into_full_width_rows() {
        let line = format!("RUN pip install {}", "x".repeat(30));
        let rows = wrap_rows(&line, 20);
        assert_eq!(rows.len(), 3);
        assert!(rows[..2].iter().all(|r| r.chars().count() == 20));
        assert_eq!(rows.concat(), line);
    }

    #[test]
    fn empty_line_keeps_its_row() {
        assert_eq!(wrap_rows("", 10), vec![String::new()]);
        assert_eq!(wrap_rows("abc", 0).len(), 3);
    }
}
