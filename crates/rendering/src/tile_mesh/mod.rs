//! Turns committed tile heightfields into renderable meshes.
//!
//! A tile gets its mesh the first frame after its first commit. Later
//! commits replace the mesh asset in place, so the tile entity keeps one
//! `Mesh3d` handle for its whole life.

mod coloring;
mod mesh;
mod systems;

pub use coloring::height_color;
pub use mesh::{build_tile_mesh, sample_spacing};
pub use systems::{sync_tile_meshes, MeshedGeneration, TileMaterial};
