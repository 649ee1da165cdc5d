use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::trace;
use util::concurrency::Concurrency;
use util::HexCoord;

use crate::tile::Tile;
use crate::tile_map::TileMap;

/// Breadth-first search over the tile graph.
///
/// The starting tile is always reached; every other tile is reached only
/// when `predicate` accepts it.
pub struct Bfs<'a, P: Fn(&Tile) -> bool> {
    tile_map: &'a TileMap,
    starting_point: HexCoord,
    predicate: P,
    tiles_to_check: VecDeque<HexCoord>,
    /// Maps each reached tile to the tile it was reached from.
    tiles_reached: HashMap<HexCoord, HexCoord>,
    reached_order: Vec<HexCoord>,
}

impl<'a, P: Fn(&Tile) -> bool> Bfs<'a, P> {
    pub fn new(tile_map: &'a TileMap, starting_point: HexCoord, predicate: P) -> Self {
        let mut tiles_to_check = VecDeque::with_capacity(37);
        tiles_to_check.push_back(starting_point);
        let mut tiles_reached = HashMap::new();
        tiles_reached.insert(starting_point, starting_point);
        Bfs {
            tile_map,
            starting_point,
            predicate,
            tiles_to_check,
            tiles_reached,
            reached_order: vec![starting_point],
        }
    }

    /// Processes every remaining tile.
    pub fn step_to_end(&mut self) {
        while !self.has_ended() {
            self.next_step();
        }
    }

    /// Steps until `destination` is reached or the search ends.
    pub fn step_until_destination(&mut self, destination: &HexCoord) -> bool {
        while !self.has_reached_tile(destination) && !self.has_ended() {
            self.next_step();
        }
        self.has_reached_tile(destination)
    }

    /// Expands one tile from the frontier, returning it.
    pub fn next_step(&mut self) -> Option<HexCoord> {
        let current = self.tiles_to_check.pop_front()?;
        for neighbor in self.tile_map.neighbors(&current) {
            if !self.tiles_reached.contains_key(&neighbor.position) && (self.predicate)(neighbor) {
                self.tiles_reached.insert(neighbor.position, current);
                self.reached_order.push(neighbor.position);
                self.tiles_to_check.push_back(neighbor.position);
            }
        }
        Some(current)
    }

    pub fn has_ended(&self) -> bool {
        self.tiles_to_check.is_empty()
    }

    pub fn has_reached_tile(&self, position: &HexCoord) -> bool {
        self.tiles_reached.contains_key(position)
    }

    /// Reached tiles in the order they were reached.
    pub fn get_reached_tiles(&self) -> impl Iterator<Item = &'a Tile> + '_ {
        self.reached_order.iter().filter_map(|it| self.tile_map.get(it))
    }

    pub fn size(&self) -> usize {
        self.reached_order.len()
    }

    pub fn get_path_to(&self, destination: &HexCoord) -> Option<Vec<HexCoord>> {
        path_to(self.starting_point, &self.tiles_reached, destination)
    }

    pub fn into_reached(self) -> ReachedTiles {
        ReachedTiles {
            starting_point: self.starting_point,
            tiles_reached: self.tiles_reached,
        }
    }
}

/// The outcome of a finished search, detached from the map.
#[derive(Debug, Clone)]
pub struct ReachedTiles {
    starting_point: HexCoord,
    tiles_reached: HashMap<HexCoord, HexCoord>,
}

impl ReachedTiles {
    /// Runs a full search on a background thread over a shared map snapshot.
    pub fn spawn<F>(tile_map: Arc<TileMap>, starting_point: HexCoord, predicate: F) -> io::Result<JoinHandle<ReachedTiles>>
    where
        F: Fn(&Tile) -> bool + Send + 'static,
    {
        Concurrency::run("bfs", move || {
            let mut bfs = Bfs::new(tile_map.as_ref(), starting_point, predicate);
            bfs.step_to_end();
            trace!(?starting_point, reached = bfs.size(), "Background search finished");
            bfs.into_reached()
        })
    }

    pub fn has_reached_tile(&self, position: &HexCoord) -> bool {
        self.tiles_reached.contains_key(position)
    }

    pub fn len(&self) -> usize {
        self.tiles_reached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles_reached.is_empty()
    }

    pub fn get_path_to(&self, destination: &HexCoord) -> Option<Vec<HexCoord>> {
        path_to(self.starting_point, &self.tiles_reached, destination)
    }
}

/// Path from `destination` back to the starting point, destination first.
fn path_to(
    starting_point: HexCoord,
    tiles_reached: &HashMap<HexCoord, HexCoord>,
    destination: &HexCoord,
) -> Option<Vec<HexCoord>> {
    if !tiles_reached.contains_key(destination) {
        return None;
    }
    let mut path = vec![*destination];
    let mut current = *destination;
    while current != starting_point {
        current = *tiles_reached.get(&current)?;
        path.push(current);
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;

    fn map_with_wall() -> TileMap {
        // A mountain ridge along x == 0 except at the origin
        let mut tile_map = TileMap::hexagon(3, Terrain::Grassland);
        for tile in tile_map.tiles_mut() {
            if tile.position.x == 0 && tile.position.y != 0 {
                tile.terrain = Terrain::Mountain;
            }
        }
        tile_map
    }

    #[test]
    fn test_step_to_end_respects_predicate() {
        let tile_map = map_with_wall();
        let mut bfs = Bfs::new(&tile_map, HexCoord::new(-2, 0), |tile: &Tile| !tile.is_impassible());
        bfs.step_to_end();
        assert!(bfs.has_reached_tile(&HexCoord::new(2, 0)));
        assert!(!bfs.has_reached_tile(&HexCoord::new(0, 2)));
        assert!(bfs.size() < tile_map.len());
    }

    #[test]
    fn test_path_goes_through_gap() {
        let tile_map = map_with_wall();
        let mut bfs = Bfs::new(&tile_map, HexCoord::new(-1, 0), |tile: &Tile| !tile.is_impassible());
        assert!(bfs.step_until_destination(&HexCoord::new(1, 0)));
        let path = bfs.get_path_to(&HexCoord::new(1, 0)).unwrap();
        assert_eq!(path.first(), Some(&HexCoord::new(1, 0)));
        assert_eq!(path.last(), Some(&HexCoord::new(-1, 0)));
        assert!(path.contains(&HexCoord::new(0, 0)));
    }

    #[test]
    fn test_starting_tile_is_reached_regardless_of_predicate() {
        let tile_map = TileMap::hexagon(1, Terrain::Grassland);
        let mut bfs = Bfs::new(&tile_map, HexCoord::default(), |_: &Tile| false);
        bfs.step_to_end();
        assert_eq!(bfs.size(), 1);
        assert!(bfs.has_reached_tile(&HexCoord::default()));
    }

    #[test]
    fn test_next_step_expands_one_tile() {
        let tile_map = TileMap::hexagon(3, Terrain::Grassland);
        let mut bfs = Bfs::new(&tile_map, HexCoord::default(), |_: &Tile| true);
        assert_eq!(bfs.next_step(), Some(HexCoord::default()));
        assert_eq!(bfs.size(), 7);
    }

    #[test]
    fn test_background_search_matches_foreground() {
        let tile_map = Arc::new(map_with_wall());
        let handle = ReachedTiles::spawn(tile_map.clone(), HexCoord::new(-2, 0), |tile: &Tile| !tile.is_impassible()).unwrap();
        let reached = handle.join().unwrap();

        let mut bfs = Bfs::new(tile_map.as_ref(), HexCoord::new(-2, 0), |tile: &Tile| !tile.is_impassible());
        bfs.step_to_end();
        assert_eq!(reached.len(), bfs.size());
        assert!(reached.get_path_to(&HexCoord::new(2, 0)).is_some());
        assert!(reached.get_path_to(&HexCoord::new(0, 2)).is_none());
    }
}
