use indexmap::IndexMap;

/// One spreadsheet row keyed by column header, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    cells: IndexMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    /// Sets `column`; an absent value is stored as an empty cell.
    pub fn set<C, V>(&mut self, column: C, value: Option<V>) -> &mut Self
    where
        C: Into<String>,
        V: Into<String>,
    {
        self.cells
            .insert(column.into(), value.map(Into::into).unwrap_or_default());
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Lays the row out along a sheet's header row. Header columns the row doesn't
    /// know become empty cells; row columns missing from the header are dropped.
    pub fn values_for(&self, header: &[String]) -> Vec<String> {
        header
            .iter()
            .map(|column| self.cells.get(column.trim()).cloned().unwrap_or_default())
            .collect()
    }

    /// Row columns that have no matching header column.
    pub fn unmatched_columns<'a>(&'a self, header: &'a [String]) -> Vec<&'a str> {
        self.columns()
            .filter(|column| !header.iter().any(|h| h.trim() == *column))
            .collect()
    }
}

impl<C, V> FromIterator<(C, V)> for Row
where
    C: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        Row {
            cells: iter
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        }
    }
}
