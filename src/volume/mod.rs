//! Voxel data and the tiled volume built from it.
//!
//! - [`VoxelBuffer`] holds an N-d box of voxels of a runtime [`DataType`]
//! - [`OrientedImage`] ties a buffer to the frame it is expressed in
//! - [`SubImage`] is one tile file placed in the global volume
//! - [`CombinedImage`] presents all tiles as one readable, writable volume

mod buffer;
mod combined;
mod data_type;
mod lookup;
mod oriented;
mod sub_image;

pub use buffer::VoxelBuffer;
pub use combined::{CombinedImage, RescaleOption};
pub use data_type::{ByteOrder, DataType};
pub use lookup::{TileLookupCache, DEFAULT_LOOKUP_ENTRIES};
pub use oriented::OrientedImage;
pub use sub_image::{LocalSource, SubImage};
