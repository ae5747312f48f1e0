/// A data table passed to a step as a parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Values of one column, by header name.
    pub fn column(&self, header: &str) -> Option<Vec<&str>> {
        let index = self.headers.iter().position(|h| h == header)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(index).map(String::as_str))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_lookup() {
        let table = Table::new(
            vec!["name".to_string(), "age".to_string()],
            vec![
                vec!["ada".to_string(), "36".to_string()],
                vec!["alan".to_string(), "41".to_string()],
            ],
        );

        assert_eq!(table.column("age"), Some(vec!["36", "41"]));
        assert_eq!(table.column("email"), None);
    }
}
