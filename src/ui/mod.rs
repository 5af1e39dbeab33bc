pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    diagnostic, dim, error, file_deleted, file_modified, format_diagnostic, header, report_summary,
    section, success, summary_row, warn,
};
pub use progress::{ProgressManager, Spinner};
pub use progress_message::ProgressMessage;
pub use table::{resolution_table, stats_table, tier_table, TableBuilder};
pub use theme::{theme, Theme};
