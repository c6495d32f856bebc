//! Ordering requests.

/// The output ordering requested by the enclosing query.
///
/// Opaque to the ordering core: it is forwarded to the access probe so that
/// navigability is measured against the final sort, and never inspected here.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SortClause {
    /// Sort key expressions, outermost first.
    pub keys: Vec<String>,
}

impl SortClause {
    /// Build a sort clause from key expressions.
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_clause_keys() {
        let sort = SortClause::new(["a", "b"]);
        assert_eq!(sort.keys, vec!["a".to_owned(), "b".to_owned()]);
    }
}
