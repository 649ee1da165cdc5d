use std::collections::BTreeMap;

use util::HexCoord;

use crate::terrain::Terrain;
use crate::tile::Tile;

/// All tiles of the world keyed by position.
#[derive(Debug, Clone, Default)]
pub struct TileMap {
    tiles: BTreeMap<HexCoord, Tile>,
}

impl TileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hexagon-shaped map of `radius` rings around the origin.
    pub fn hexagon(radius: i32, terrain: Terrain) -> Self {
        let mut tile_map = TileMap::new();
        for position in HexCoord::default().positions_in_distance(radius) {
            tile_map.insert(Tile::new(position, terrain));
        }
        tile_map
    }

    pub fn insert(&mut self, tile: Tile) {
        self.tiles.insert(tile.position, tile);
    }

    pub fn get(&self, position: &HexCoord) -> Option<&Tile> {
        self.tiles.get(position)
    }

    pub fn get_mut(&mut self, position: &HexCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(position)
    }

    pub fn contains(&self, position: &HexCoord) -> bool {
        self.tiles.contains_key(position)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.values_mut()
    }

    pub fn neighbors<'a>(&'a self, position: &HexCoord) -> impl Iterator<Item = &'a Tile> + 'a {
        let neighbors = position.neighbors();
        neighbors.into_iter().filter_map(move |it| self.tiles.get(&it))
    }

    pub fn tiles_in_distance(&self, position: &HexCoord, distance: i32) -> Vec<&Tile> {
        position
            .positions_in_distance(distance)
            .iter()
            .filter_map(|it| self.tiles.get(it))
            .collect()
    }

    /// Tiles owned by the city with the given id.
    pub fn city_tiles<'a>(&'a self, city_id: &'a str) -> impl Iterator<Item = &'a Tile> + 'a {
        self.tiles
            .values()
            .filter(move |it| it.owning_city.as_deref() == Some(city_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hexagon_size() {
        assert_eq!(TileMap::hexagon(2, Terrain::Grassland).len(), 19);
    }

    #[test]
    fn test_neighbors_on_edge() {
        let tile_map = TileMap::hexagon(1, Terrain::Plains);
        assert_eq!(tile_map.neighbors(&HexCoord::new(0, 0)).count(), 6);
        // (1, 1) sits on the rim: only (0, 0), (1, 0) and (0, 1) exist
        assert_eq!(tile_map.neighbors(&HexCoord::new(1, 1)).count(), 3);
    }

    #[test]
    fn test_city_tiles() {
        let mut tile_map = TileMap::hexagon(2, Terrain::Grassland);
        for tile in tile_map.tiles_mut().filter(|it| it.position.aerial_distance_to(&HexCoord::default()) <= 1) {
            tile.owning_city = Some("rome-1".to_string());
        }
        assert_eq!(tile_map.city_tiles("rome-1").count(), 7);
        assert_eq!(tile_map.city_tiles("athens-1").count(), 0);
    }
}
