pub use append_rle::AppendRle;
pub use merge_iter::*;
pub use rlerun::RleRun;
pub use splitable_span::*;

mod append_rle;
mod merge_iter;
mod rlerun;
mod splitable_span;
