mod fs;
pub mod io;
mod props;

pub use fs::*;
pub(crate) use props::*;
