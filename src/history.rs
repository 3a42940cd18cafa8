use crate::error::{Result, ShellError};

/// Bounded, ordered record of the lines the user entered.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Append a line. Blank lines are ignored; a full history is an error.
    pub fn push(&mut self, line: &str) -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(ShellError::CapacityExceeded {
                what: "history",
                capacity: self.capacity,
            });
        }
        self.entries.push(line.to_string());
        Ok(())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn keeps_insertion_order() {
        let mut h = History::new(10);
        h.push("ls").unwrap();
        h.push("cat < in.txt").unwrap();
        assert_eq!(h.entries(), ["ls", "cat < in.txt"]);
    }

    #[test]
    fn ignores_blank_lines() {
        let mut h = History::new(10);
        h.push("").unwrap();
        h.push("   ").unwrap();
        assert!(h.is_empty());
    }

    #[test]
    fn full_history_is_reported() {
        let mut h = History::new(1);
        h.push("one").unwrap();
        let err = h.push("two").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(h.len(), 1);
    }
}
