//! Obstacle set keyed by id, with at most one obstacle per cell

use super::{GridError, GridLayout};
use crate::common::{Direction, Obstacle};

/// Obstacles placed on the grid
///
/// Identity is the obstacle `id`. A cell never holds two obstacles, so a
/// lookup by coordinate always resolves to a single id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObstacleSet {
    obstacles: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        ObstacleSet::default()
    }

    /// Build a set from a fixture, rejecting shared cells and repeated ids
    pub fn from_obstacles(
        layout: &GridLayout,
        obstacles: impl IntoIterator<Item = Obstacle>,
    ) -> Result<Self, GridError> {
        let mut set = ObstacleSet::new();
        for obstacle in obstacles {
            set.insert(layout, obstacle)?;
        }
        Ok(set)
    }

    fn insert(&mut self, layout: &GridLayout, obstacle: Obstacle) -> Result<(), GridError> {
        layout.check(obstacle.x, obstacle.y)?;
        if self.get(obstacle.id).is_some() {
            return Err(GridError::DuplicateId(obstacle.id));
        }
        if let Some(existing) = self.at(obstacle.x, obstacle.y) {
            return Err(GridError::CellOccupied {
                x: obstacle.x,
                y: obstacle.y,
                id: existing.id,
            });
        }
        self.obstacles.push(obstacle);
        Ok(())
    }

    /// Place a north-facing obstacle on a cell, clamped into the grid
    pub fn add(&mut self, layout: &GridLayout, x: i32, y: i32) -> Result<Obstacle, GridError> {
        let cell = layout.clamp(x, y);
        let obstacle = Obstacle::new(self.next_id(), cell.x, cell.y, Direction::North);
        self.insert(layout, obstacle)?;
        Ok(obstacle)
    }

    /// Advance an obstacle's image face to the next direction
    pub fn cycle_face(&mut self, id: u32) -> Result<Direction, GridError> {
        let obstacle = self
            .obstacles
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(GridError::UnknownObstacle(id))?;
        obstacle.d = obstacle.d.next();
        Ok(obstacle.d)
    }

    pub fn remove(&mut self, id: u32) -> Result<Obstacle, GridError> {
        let index = self
            .obstacles
            .iter()
            .position(|o| o.id == id)
            .ok_or(GridError::UnknownObstacle(id))?;
        Ok(self.obstacles.remove(index))
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn get(&self, id: u32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    /// Obstacle occupying a cell
    pub fn at(&self, x: i32, y: i32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.occupies(x, y))
    }

    pub fn next_id(&self) -> u32 {
        self.obstacles.iter().map(|o| o.id).max().map_or(1, |max| max + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Obstacle> {
        self.obstacles.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_north_facing_obstacles_with_sequential_ids() {
        let layout = GridLayout::default();
        let mut set = ObstacleSet::new();
        let first = set.add(&layout, 4, 4).unwrap();
        let second = set.add(&layout, 5, 4).unwrap();
        assert_eq!((first.id, first.d), (1, Direction::North));
        assert_eq!(second.id, 2);
    }

    #[test]
    fn next_id_skips_past_removed_gaps() {
        let layout = GridLayout::default();
        let mut set = ObstacleSet::from_obstacles(
            &layout,
            [
                Obstacle::new(1, 1, 1, Direction::East),
                Obstacle::new(5, 2, 2, Direction::West),
            ],
        )
        .unwrap();
        set.remove(1).unwrap();
        assert_eq!(set.add(&layout, 3, 3).unwrap().id, 6);
    }

    #[test]
    fn rejects_second_obstacle_on_a_cell() {
        let layout = GridLayout::default();
        let mut set = ObstacleSet::new();
        set.add(&layout, 9, 9).unwrap();
        assert_eq!(
            set.add(&layout, 9, 9),
            Err(GridError::CellOccupied { x: 9, y: 9, id: 1 })
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn rejects_duplicate_ids_in_fixtures() {
        let layout = GridLayout::default();
        let result = ObstacleSet::from_obstacles(
            &layout,
            [
                Obstacle::new(2, 9, 9, Direction::East),
                Obstacle::new(2, 17, 7, Direction::West),
            ],
        );
        assert_eq!(result, Err(GridError::DuplicateId(2)));
    }

    #[test]
    fn add_clamps_into_grid() {
        let layout = GridLayout::default();
        let mut set = ObstacleSet::new();
        let obstacle = set.add(&layout, 42, -1).unwrap();
        assert_eq!((obstacle.x, obstacle.y), (19, 0));
    }

    #[test]
    fn cycling_walks_all_five_faces() {
        let layout = GridLayout::default();
        let mut set = ObstacleSet::new();
        let id = set.add(&layout, 3, 3).unwrap().id;
        let faces: Vec<_> = (0..5).map(|_| set.cycle_face(id).unwrap()).collect();
        assert_eq!(
            faces,
            vec![
                Direction::East,
                Direction::South,
                Direction::West,
                Direction::Skip,
                Direction::North
            ]
        );
        assert_eq!(set.cycle_face(99), Err(GridError::UnknownObstacle(99)));
    }
}
