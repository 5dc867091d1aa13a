//! Plain-text tables for the status stream.

use crate::types::ContainerRef;

/// Two aligned columns of pod and container names, followed by a blank line.
pub fn container_columns<'a, I>(containers: I) -> String
where
    I: IntoIterator<Item = &'a ContainerRef>,
{
    let containers: Vec<&ContainerRef> = containers.into_iter().collect();
    let width = containers.iter().map(|c| c.pod.len()).max().unwrap_or(0);

    let mut out = String::new();
    for c in containers {
        out.push_str(&format!("{:<width$} {}\n", c.pod, c.container));
    }
    out.push('\n');
    out
}

/// Boxed table with a header row.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&self.headers).chain(&self.rows) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let separator = {
            let mut line = String::from("+");
            for width in &widths {
                line.push_str(&"-".repeat(width + 2));
                line.push('+');
            }
            line.push('\n');
            line
        };
        let format_row = |row: &[String]| {
            let mut line = String::from("|");
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = width - cell.chars().count();
                line.push_str(&format!(" {cell}{} |", " ".repeat(pad)));
            }
            line.push('\n');
            line
        };

        let mut out = separator.clone();
        out.push_str(&format_row(&self.headers));
        out.push_str(&separator);
        for row in &self.rows {
            out.push_str(&format_row(row));
        }
        out.push_str(&separator);
        out
    }
}
