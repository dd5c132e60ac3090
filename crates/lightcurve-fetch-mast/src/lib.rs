pub mod archive;
pub mod fits;
pub mod invoke;

pub use archive::{MastArchive, MastArchiveConfig};
pub use fits::decode_light_curve;
