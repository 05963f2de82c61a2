use crate::models::SeatRecord;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// The rows currently on screen. Manual edits never re-filter or re-sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    rows: Vec<SeatRecord>,
}

impl View {
    pub fn new(rows: Vec<SeatRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SeatRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn replace(&mut self, rows: Vec<SeatRecord>) {
        self.rows = rows;
    }

    pub fn take_rows(&mut self) -> Vec<SeatRecord> {
        std::mem::take(&mut self.rows)
    }

    /// Swap a row with its neighbour. Returns false (and changes nothing)
    /// when there is no neighbour in that direction.
    pub fn move_row(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };

        match target {
            Some(target) if index < self.rows.len() && target < self.rows.len() => {
                self.rows.swap(index, target);
                true
            }
            _ => false,
        }
    }

    pub fn remove_row(&mut self, index: usize) -> Option<SeatRecord> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }
}
