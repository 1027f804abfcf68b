pub mod history;
pub mod image;
pub mod state;

pub use history::*;
pub use image::*;
pub use state::*;
