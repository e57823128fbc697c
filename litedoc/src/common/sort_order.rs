/// Direction of a sort key or an index field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// The numeric form used in key documents, `1` or `-1`.
    pub fn as_i64(&self) -> i64 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }

    pub fn reverse(&self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_i64() {
        assert_eq!(SortOrder::Ascending.as_i64(), 1);
        assert_eq!(SortOrder::Descending.as_i64(), -1);
    }

    #[test]
    fn test_reverse() {
        assert_eq!(SortOrder::Ascending.reverse(), SortOrder::Descending);
        assert_eq!(SortOrder::Descending.reverse(), SortOrder::Ascending);
    }
}
