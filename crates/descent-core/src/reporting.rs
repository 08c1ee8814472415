//! Progress reporting for optimization runs.
//!
//! Reporters receive a row of (heading, value) pairs once per outer
//! iteration. They are purely observational and cannot affect control flow.

use std::fmt;

/// A single reported value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    /// An integer quantity such as an iteration count.
    Int(usize),
    /// A floating-point quantity such as an objective value.
    Float(f64),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:e}"),
        }
    }
}

/// One column of a progress row.
#[derive(Debug, Clone, Copy)]
pub struct Record {
    /// Column heading, stable across a run.
    pub heading: &'static str,
    /// The value at the current iteration.
    pub value: Field,
}

impl Record {
    /// Creates a record.
    pub fn new(heading: &'static str, value: Field) -> Self {
        Self { heading, value }
    }
}

/// Receives per-iteration progress rows.
pub trait Reporter {
    /// Called once before the first iteration.
    fn start(&mut self) {}

    /// Called once per completed iteration with the current row.
    fn iteration(&mut self, records: &[Record]);

    /// Called once with the final row after the run terminates.
    fn finish(&mut self, records: &[Record]) {
        let _ = records;
    }
}

/// A reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReporter;

impl Reporter for NoReporter {
    fn iteration(&mut self, _records: &[Record]) {}
}

/// Prints aligned progress columns to stdout.
///
/// Values are printed every `print_every` iterations; headings are
/// reprinted periodically so long runs stay readable.
#[derive(Debug, Clone)]
pub struct PrintReporter {
    print_every: usize,
    iterations_seen: usize,
    rows_since_heading: usize,
}

const HEADING_INTERVAL: usize = 30;
const COLUMN_WIDTH: usize = 14;

impl PrintReporter {
    /// Creates a reporter printing every `print_every` iterations.
    pub fn new(print_every: usize) -> Self {
        Self {
            print_every: print_every.max(1),
            iterations_seen: 0,
            rows_since_heading: HEADING_INTERVAL + 1,
        }
    }

    fn print_headings(records: &[Record]) {
        let row: Vec<String> = records
            .iter()
            .map(|r| format!("{:>COLUMN_WIDTH$}", r.heading))
            .collect();
        println!("{}", row.join("  "));
    }

    fn print_values(records: &[Record]) {
        let row: Vec<String> = records
            .iter()
            .map(|r| format!("{:>COLUMN_WIDTH$}", r.value.to_string()))
            .collect();
        println!("{}", row.join("  "));
    }
}

impl Reporter for PrintReporter {
    fn start(&mut self) {
        println!("Beginning optimization");
    }

    fn iteration(&mut self, records: &[Record]) {
        self.iterations_seen += 1;
        if self.iterations_seen % self.print_every != 0 {
            return;
        }
        if self.rows_since_heading > HEADING_INTERVAL {
            println!();
            Self::print_headings(records);
            self.rows_since_heading = 0;
        }
        Self::print_values(records);
        self.rows_since_heading += 1;
    }

    fn finish(&mut self, records: &[Record]) {
        Self::print_values(records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects rows for assertions.
    struct Collecting {
        rows: Vec<Vec<(String, Field)>>,
    }

    impl Reporter for Collecting {
        fn iteration(&mut self, records: &[Record]) {
            self.rows
                .push(records.iter().map(|r| (r.heading.to_string(), r.value)).collect());
        }
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::Int(12).to_string(), "12");
        assert_eq!(Field::Float(0.5).to_string(), "5e-1");
    }

    #[test]
    fn test_reporter_receives_rows() {
        let mut rep = Collecting { rows: Vec::new() };
        rep.start();
        rep.iteration(&[
            Record::new("Iter", Field::Int(1)),
            Record::new("Obj", Field::Float(2.5)),
        ]);
        assert_eq!(rep.rows.len(), 1);
        assert_eq!(rep.rows[0][0].0, "Iter");
        assert_eq!(rep.rows[0][1].1, Field::Float(2.5));
    }
}
