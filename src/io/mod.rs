//! File collaborators: export reader, record files and plot data.

pub mod band;
pub mod export;
pub mod record;

pub use band::CurveBand;
pub use export::read_series;
pub use record::{RecordLine, RecordWriter};
