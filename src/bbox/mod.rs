//! Bounding boxes (spec §4.4): `TBox` over (value × time), `STBox` over
//! (space × time). Used both as standalone summaries and as the cached
//! acceleration structure on temporal sequences (spec §4.5).

mod stbox;
mod tbox;

pub use stbox::STBox;
pub use tbox::TBox;
