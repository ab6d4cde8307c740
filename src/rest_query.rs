//! Query builder for the backend's PostgREST-style data API.
//!
//! Filters are emitted as `(column, "op.value")` query pairs and handed to
//! the HTTP client for encoding; user values are never spliced into the path.
//! Builder methods return `&mut Self` for chaining.
//!
//! # Example
//!
//! ```rust
//! use coin_market_sdk::RestQuery;
//! let (table, pairs) = RestQuery::new("coins")
//!     .eq("country", "Greece")
//!     .gte("price", "10")
//!     .order_desc("created_at")
//!     .limit(20)
//!     .build();
//! assert_eq!(table, "coins");
//! assert!(pairs.contains(&("country".to_string(), "eq.Greece".to_string())));
//! ```

/// Builds PostgREST query parameter lists.
pub struct RestQuery {
    table: String,
    select_cols: Vec<String>,
    filters: Vec<(String, String)>,
    or_groups: Vec<String>,
    order_cols: Vec<String>,
    limit_val: Option<usize>,
    offset_val: Option<usize>,
}

impl RestQuery {
    /// Create a builder targeting the given table.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select_cols: vec!["*".to_string()],
            filters: Vec::new(),
            or_groups: Vec::new(),
            order_cols: Vec::new(),
            limit_val: None,
            offset_val: None,
        }
    }

    /// Set the columns to select (replaces the default `*`).
    pub fn select(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|c| c.to_string()).collect();
        self
    }

    fn filter(&mut self, column: &str, op: &str, value: &str) -> &mut Self {
        self.filters
            .push((column.to_string(), format!("{}.{}", op, value)));
        self
    }

    /// Equality: `column=eq.value`.
    pub fn eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(&mut self, column: &str, value: &str) -> &mut Self {
        self.filter(column, "neq", value)
    }

    pub fn gte(&mut self, column: &str, value: &str) -> &mut Self {
        self.filter(column, "gte", value)
    }

    pub fn lte(&mut self, column: &str, value: &str) -> &mut Self {
        self.filter(column, "lte", value)
    }

    /// Case-insensitive substring match: `column=ilike.*value*`.
    pub fn ilike(&mut self, column: &str, value: &str) -> &mut Self {
        self.filter(column, "ilike", &format!("*{}*", value))
    }

    /// Membership: `column=in.(a,b)`. Values containing reserved characters
    /// are double-quoted. An empty list matches nothing.
    pub fn in_list(&mut self, column: &str, values: &[&str]) -> &mut Self {
        let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
        self.filter(column, "in", &format!("({})", quoted.join(",")))
    }

    /// `column=is.null` / `is.true` / `is.false`.
    pub fn is(&mut self, column: &str, value: &str) -> &mut Self {
        self.filter(column, "is", value)
    }

    /// Add OR-combined conditions, each given as `(column, "op.value")`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coin_market_sdk::RestQuery;
    /// let (_, pairs) = RestQuery::new("coins")
    ///     .or(&[("name", "ilike.*morgan*"), ("description", "ilike.*morgan*")])
    ///     .build();
    /// assert!(pairs.contains(&(
    ///     "or".to_string(),
    ///     "(name.ilike.*morgan*,description.ilike.*morgan*)".to_string()
    /// )));
    /// ```
    pub fn or(&mut self, conditions: &[(&str, &str)]) -> &mut Self {
        if conditions.is_empty() {
            return self;
        }
        let parts: Vec<String> = conditions
            .iter()
            .map(|(col, cond)| format!("{}.{}", col, cond))
            .collect();
        self.or_groups.push(format!("({})", parts.join(",")));
        self
    }

    pub fn order_asc(&mut self, column: &str) -> &mut Self {
        self.order_cols.push(format!("{}.asc", column));
        self
    }

    pub fn order_desc(&mut self, column: &str) -> &mut Self {
        self.order_cols.push(format!("{}.desc", column));
        self
    }

    /// Set the maximum number of rows to return.
    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit_val = Some(n);
        self
    }

    /// Set the number of rows to skip before returning results.
    pub fn offset(&mut self, n: usize) -> &mut Self {
        self.offset_val = Some(n);
        self
    }

    /// Build the table name and query pairs.
    pub fn build(&self) -> (String, Vec<(String, String)>) {
        let mut pairs = vec![("select".to_string(), self.select_cols.join(","))];
        pairs.extend(self.filters.iter().cloned());

        for group in &self.or_groups {
            pairs.push(("or".to_string(), group.clone()));
        }

        if !self.order_cols.is_empty() {
            pairs.push(("order".to_string(), self.order_cols.join(",")));
        }

        if let Some(n) = self.limit_val {
            pairs.push(("limit".to_string(), n.to_string()));
        }

        if let Some(n) = self.offset_val {
            pairs.push(("offset".to_string(), n.to_string()));
        }

        (self.table.clone(), pairs)
    }
}

fn quote(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ', '.']) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
