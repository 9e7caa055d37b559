//! Poses and obstacles in logical grid coordinates (origin bottom-left).

use serde::{Deserialize, Deserializer, Serialize};

use super::direction::Direction;

/// Robot pose at one step of a planned path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub d: Direction,
    /// Scan tag of the obstacle face photographed at this step
    #[serde(default, deserialize_with = "scan_tag")]
    pub s: Option<String>,
}

impl Position {
    /// Create a pose without a scan tag
    pub fn new(x: i32, y: i32, d: Direction) -> Self {
        Position { x, y, d, s: None }
    }

    /// Whether a scan happens at this step
    pub fn scan_tag(&self) -> Option<&str> {
        self.s.as_deref().filter(|tag| !tag.is_empty())
    }
}

/// Obstacle with its grid cell and image face direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub d: Direction,
}

impl Obstacle {
    pub fn new(id: u32, x: i32, y: i32, d: Direction) -> Self {
        Obstacle { id, x, y, d }
    }

    pub fn occupies(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }
}

// Planner variants send the tag either as "obstacleid_L/C/R" or as a bare id.
fn scan_tag<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tag {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Tag>::deserialize(deserializer)?.map(|tag| match tag {
        Tag::Text(text) => text,
        Tag::Number(id) => id.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_and_numeric_scan_tags() {
        let text: Position = serde_json::from_str(r#"{"x":1,"y":2,"d":0,"s":"3_C"}"#).unwrap();
        assert_eq!(text.scan_tag(), Some("3_C"));

        let number: Position = serde_json::from_str(r#"{"x":1,"y":2,"d":2,"s":7}"#).unwrap();
        assert_eq!(number.scan_tag(), Some("7"));

        let none: Position = serde_json::from_str(r#"{"x":1,"y":2,"d":4,"s":null}"#).unwrap();
        assert_eq!(none.scan_tag(), None);

        let absent: Position = serde_json::from_str(r#"{"x":1,"y":2,"d":6}"#).unwrap();
        assert_eq!(absent.s, None);
    }

    #[test]
    fn obstacle_round_trips_wire_direction() {
        let obstacle = Obstacle::new(1, 15, 10, Direction::West);
        let json = serde_json::to_value(obstacle).unwrap();
        assert_eq!(json["d"], 6);
    }
}
