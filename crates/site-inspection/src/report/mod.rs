pub mod builder;
pub mod canvas;
pub mod images;
pub mod layout;
pub mod pump_grid;

pub use builder::{
    build_report, report_file_name, InspectionReportBuilder, RenderedReport, ReportEntry,
    ReportError, ReportHeader, ReportRequest,
};
pub use canvas::Rgb;
pub use images::{to_data_url, ImageError, RasterImage};
pub use pump_grid::{render_pump_grid, SnapshotError};
