pub mod chart;
pub mod console;
pub mod spreadsheet;
pub mod summary;

pub use chart::render_pie_chart;
pub use console::print_summary;
pub use spreadsheet::write_workbook;
pub use summary::{write_summary, SessionSummary};
