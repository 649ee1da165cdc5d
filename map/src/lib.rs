pub mod bfs;
pub mod terrain;
pub mod tile;
pub mod tile_map;

pub use bfs::{Bfs, ReachedTiles};
pub use terrain::Terrain;
pub use tile::Tile;
pub use tile_map::TileMap;
