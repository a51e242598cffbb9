use std::fmt;

use chrono::NaiveDate;

pub const COLUMNS: [&str; 6] = ["Open", "High", "Low", "Close", "Adj Close", "Volume"];

/// Tables longer than this are printed as head and tail only.
const MAX_DISPLAY_ROWS: usize = 60;
const TRUNCATED_EDGE_ROWS: usize = 5;

/// One trading day of price and volume data.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Date-indexed price history for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    symbol: String,
    rows: Vec<PriceRow>,
}

impl PriceTable {
    pub fn new<S: Into<String>>(symbol: S, rows: Vec<PriceRow>) -> Self {
        Self {
            symbol: symbol.into(),
            rows,
        }
    }

    pub fn empty<S: Into<String>>(symbol: S) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First and last dates in the table.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some((first.date, last.date))
    }
}

fn row_cells(row: &PriceRow) -> [String; 6] {
    [
        format!("{:.6}", row.open),
        format!("{:.6}", row.high),
        format!("{:.6}", row.low),
        format!("{:.6}", row.close),
        format!("{:.6}", row.adj_close),
        row.volume.to_string(),
    ]
}

impl fmt::Display for PriceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            writeln!(f, "Empty DataFrame")?;
            writeln!(f, "Columns: [{}]", COLUMNS.join(", "))?;
            return write!(f, "Index: []");
        }

        let truncated = self.rows.len() > MAX_DISPLAY_ROWS;
        let visible: Vec<Option<&PriceRow>> = if truncated {
            let head = self.rows[..TRUNCATED_EDGE_ROWS].iter().map(Some);
            let tail = self.rows[self.rows.len() - TRUNCATED_EDGE_ROWS..]
                .iter()
                .map(Some);
            head.chain(std::iter::once(None)).chain(tail).collect()
        } else {
            self.rows.iter().map(Some).collect()
        };

        let body: Vec<Option<(String, [String; 6])>> = visible
            .iter()
            .map(|row| row.map(|row| (row.date.to_string(), row_cells(row))))
            .collect();

        let index_width = body
            .iter()
            .flatten()
            .map(|(date, _)| date.len())
            .max()
            .unwrap_or(0)
            .max("Date".len());

        let mut widths = COLUMNS.map(str::len);
        for (_, cells) in body.iter().flatten() {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.len());
            }
        }

        write!(f, "{:index_width$}", "")?;
        for (name, width) in COLUMNS.iter().zip(widths) {
            write!(f, "  {name:>width$}")?;
        }
        writeln!(f)?;
        write!(f, "{:<index_width$}", "Date")?;

        for row in &body {
            writeln!(f)?;
            match row {
                Some((date, cells)) => {
                    write!(f, "{date:<index_width$}")?;
                    for (cell, width) in cells.iter().zip(widths) {
                        write!(f, "  {cell:>width$}")?;
                    }
                }
                None => {
                    write!(f, "{:<index_width$}", "...")?;
                    for width in widths {
                        write!(f, "  {:>width$}", "...")?;
                    }
                }
            }
        }

        if truncated {
            write!(
                f,
                "\n\n[{} rows x {} columns]",
                self.rows.len(),
                COLUMNS.len()
            )?;
        }

        Ok(())
    }
}
