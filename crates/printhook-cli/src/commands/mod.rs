pub mod run;
pub mod watermark;

pub use run::RunCommand;
pub use watermark::WatermarkCommand;
