//! Page coordinates within the Library of Babel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// A page address: `(hexagon, wall, shelf, volume, page)`.
///
/// Coordinates are opaque identifiers handed out by the external service;
/// only equality and round-tripping back to the service matter. The numeric
/// fields have fixed domains, the hexagon is an arbitrary-length lowercase
/// alphanumeric identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Hexagon room identifier.
    pub hexagon: String,
    /// Wall within the hexagon, `1..=4`.
    pub wall: u8,
    /// Shelf on the wall, `1..=5`.
    pub shelf: u8,
    /// Volume on the shelf, `1..=32`.
    pub volume: u8,
    /// Page within the volume, `1..=410`.
    pub page: u16,
}

impl Coordinate {
    /// Construct a coordinate, validating every field.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidCoordinate`] if any field is outside
    /// its domain.
    pub fn new(
        hexagon: impl Into<String>,
        wall: u8,
        shelf: u8,
        volume: u8,
        page: u16,
    ) -> Result<Self, RecordError> {
        let coordinate = Self {
            hexagon: hexagon.into(),
            wall,
            shelf,
            volume,
            page,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Check the domain constraints without consuming the coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidCoordinate`] naming the first field
    /// that violates its domain.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.hexagon.is_empty() {
            return Err(invalid("hexagon must not be empty"));
        }
        if !self
            .hexagon
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(invalid(
                "hexagon must contain only lowercase alphanumeric characters",
            ));
        }
        if !(1..=4).contains(&self.wall) {
            return Err(invalid(&format!("wall {} outside 1..=4", self.wall)));
        }
        if !(1..=5).contains(&self.shelf) {
            return Err(invalid(&format!("shelf {} outside 1..=5", self.shelf)));
        }
        if !(1..=32).contains(&self.volume) {
            return Err(invalid(&format!("volume {} outside 1..=32", self.volume)));
        }
        if !(1..=410).contains(&self.page) {
            return Err(invalid(&format!("page {} outside 1..=410", self.page)));
        }
        Ok(())
    }

    /// Abbreviated rendering for listings: `1a2b3c4d.../3/4/17/204`.
    #[must_use]
    pub fn short(&self) -> String {
        let hex_prefix: String = self.hexagon.chars().take(8).collect();
        let ellipsis = if self.hexagon.len() > 8 { "..." } else { "" };
        format!(
            "{hex_prefix}{ellipsis}/{}/{}/{}/{}",
            self.wall, self.shelf, self.volume, self.page
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hexagon:{},wall:{},shelf:{},volume:{},page:{}",
            self.hexagon, self.wall, self.shelf, self.volume, self.page
        )
    }
}

fn invalid(reason: &str) -> RecordError {
    RecordError::InvalidCoordinate {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_coordinate() {
        let coordinate = Coordinate::new("0a1b2c", 4, 5, 32, 410).unwrap();
        assert_eq!(coordinate.wall, 4);
        coordinate.validate().unwrap();
    }

    #[test]
    fn empty_hexagon_rejected() {
        assert!(Coordinate::new("", 1, 1, 1, 1).is_err());
    }

    #[test]
    fn uppercase_hexagon_rejected() {
        assert!(Coordinate::new("ABC", 1, 1, 1, 1).is_err());
    }

    #[test]
    fn out_of_range_fields_rejected() {
        assert!(Coordinate::new("abc", 0, 1, 1, 1).is_err());
        assert!(Coordinate::new("abc", 5, 1, 1, 1).is_err());
        assert!(Coordinate::new("abc", 1, 6, 1, 1).is_err());
        assert!(Coordinate::new("abc", 1, 1, 33, 1).is_err());
        assert!(Coordinate::new("abc", 1, 1, 1, 0).is_err());
        assert!(Coordinate::new("abc", 1, 1, 1, 411).is_err());
    }

    #[test]
    fn display_and_short_forms() {
        let coordinate = Coordinate::new("0123456789abcdef", 2, 3, 4, 5).unwrap();
        assert_eq!(
            coordinate.to_string(),
            "hexagon:0123456789abcdef,wall:2,shelf:3,volume:4,page:5"
        );
        assert_eq!(coordinate.short(), "01234567.../2/3/4/5");
    }

    #[test]
    fn serde_roundtrip() {
        let coordinate = Coordinate::new("deadbeef", 1, 2, 3, 4).unwrap();
        let json = serde_json::to_string(&coordinate).unwrap();
        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coordinate);
    }
}
