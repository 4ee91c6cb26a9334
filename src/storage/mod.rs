//! Durable outputs: the recipe store, downloaded images and diagnostic dumps.

mod dumps;
mod images;
mod recipes;

pub use dumps::{dump_slug, DumpStore};
pub use images::{image_file_name, ImageSink, ImageStore};
pub use recipes::RecipeStore;
