/// 表示中スレッドへのカーソル
///
/// 表示対象が空のときは `Empty`。それ以外は常に `0 <= index < len`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Empty,
    Positioned(usize),
}

impl Cursor {
    pub fn for_len(len: usize) -> Self {
        if len == 0 {
            Cursor::Empty
        } else {
            Cursor::Positioned(0)
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            Cursor::Empty => None,
            Cursor::Positioned(i) => Some(i),
        }
    }

    /// Each transition returns whether the position moved.
    pub fn next(&mut self, len: usize) -> bool {
        match *self {
            Cursor::Positioned(i) if i + 1 < len => self.move_to(i + 1),
            _ => false,
        }
    }

    pub fn prev(&mut self) -> bool {
        match *self {
            Cursor::Positioned(i) if i > 0 => self.move_to(i - 1),
            _ => false,
        }
    }

    pub fn first(&mut self) -> bool {
        match *self {
            Cursor::Positioned(_) => self.move_to(0),
            Cursor::Empty => false,
        }
    }

    pub fn last(&mut self, len: usize) -> bool {
        match *self {
            Cursor::Positioned(_) if len > 0 => self.move_to(len - 1),
            _ => false,
        }
    }

    /// フィルタ変更後の位置。インデックスは可能な限り維持し、範囲外なら末尾に寄せる
    pub fn filter_changed(&mut self, new_len: usize) {
        *self = match (*self, new_len) {
            (_, 0) => Cursor::Empty,
            (Cursor::Positioned(i), len) if i < len => Cursor::Positioned(i),
            (Cursor::Positioned(_), len) => Cursor::Positioned(len - 1),
            (Cursor::Empty, _) => Cursor::Positioned(0),
        };
    }

    fn move_to(&mut self, index: usize) -> bool {
        let moved = *self != Cursor::Positioned(index);
        *self = Cursor::Positioned(index);
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_len() {
        assert_eq!(Cursor::for_len(0), Cursor::Empty);
        assert_eq!(Cursor::for_len(3), Cursor::Positioned(0));
    }

    #[test]
    fn test_next_stops_at_last() {
        let mut cursor = Cursor::for_len(3);
        assert!(cursor.next(3));
        assert!(cursor.next(3));
        assert_eq!(cursor, Cursor::Positioned(2));
        assert!(!cursor.next(3));
        assert_eq!(cursor, Cursor::Positioned(2));
    }

    #[test]
    fn test_prev_stops_at_first() {
        let mut cursor = Cursor::Positioned(1);
        assert!(cursor.prev());
        assert!(!cursor.prev());
        assert_eq!(cursor, Cursor::Positioned(0));
    }

    #[test]
    fn test_first_last_idempotent() {
        let mut cursor = Cursor::Positioned(1);
        assert!(cursor.last(4));
        assert!(!cursor.last(4));
        assert_eq!(cursor.index(), Some(3));
        assert!(cursor.first());
        assert!(!cursor.first());
        assert_eq!(cursor.index(), Some(0));
    }

    #[test]
    fn test_empty_ignores_everything() {
        let mut cursor = Cursor::Empty;
        assert!(!cursor.next(0));
        assert!(!cursor.prev());
        assert!(!cursor.first());
        assert!(!cursor.last(0));
        assert_eq!(cursor, Cursor::Empty);
        assert_eq!(cursor.index(), None);
    }

    #[test]
    fn test_filter_changed_preserves_or_clamps() {
        let mut cursor = Cursor::Positioned(2);
        cursor.filter_changed(5);
        assert_eq!(cursor, Cursor::Positioned(2));

        cursor.filter_changed(2);
        assert_eq!(cursor, Cursor::Positioned(1));

        cursor.filter_changed(0);
        assert_eq!(cursor, Cursor::Empty);

        cursor.filter_changed(4);
        assert_eq!(cursor, Cursor::Positioned(0));
    }
}
