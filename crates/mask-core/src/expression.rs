//! Placeholder expressions: `data.path | filter | filter`.

use crate::context::DataPath;

/// A parsed placeholder body.
///
/// Every `|` separates a stage; the first stage is the data path and the rest
/// are filter names applied left to right. Whitespace around each stage is
/// ignored, so `{{ user.name|mask }}` and `{{user.name | mask}}` are the same
/// expression. Empty filter names are kept and simply never match a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression<'a> {
    path: &'a str,
    filters: Vec<&'a str>,
}

impl<'a> Expression<'a> {
    /// # Examples
    ///
    /// ```
    /// use mask_core::Expression;
    ///
    /// let expr = Expression::parse(" user.phone | mask | mobile ");
    /// assert_eq!(expr.path(), "user.phone");
    /// assert_eq!(expr.filters(), ["mask", "mobile"]);
    /// ```
    pub fn parse(source: &'a str) -> Self {
        let mut stages = source.trim().split('|').map(str::trim);
        let path = stages.next().unwrap_or_default();
        Self {
            path,
            filters: stages.collect(),
        }
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn data_path(&self) -> DataPath<'a> {
        DataPath::parse(self.path)
    }

    pub fn filters(&self) -> &[&'a str] {
        &self.filters
    }
}
