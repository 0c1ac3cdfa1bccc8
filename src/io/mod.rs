//! Streaming I/O engine.
//!
//! - [`FileWrapper`] opens a file on first use and performs positioned reads
//!   and writes
//! - [`FileStreamer`] reads and writes lines of typed voxels in a raw file
//! - [`ImageFile`] and [`LinearImageFile`] are the contracts format adapters
//!   implement

mod file_wrapper;
mod image_file;
mod streamer;

pub use file_wrapper::{FileHandleFactory, FileMode, FileWrapper};
pub use image_file::{
    read_image_by_lines, write_image_by_lines, ImageFile, ImageSource, LinearImageFile,
};
pub use streamer::{linear_byte_offset, rescale_line, FileStreamer, Limits};
