pub mod error;
pub mod naming;
pub mod sink;
pub mod table;

pub use error::OutputError;
pub use naming::{keyword_slug, output_path};
pub use sink::{save_results, FileSink, ResultDocument, ResultSink, SavedFiles};
pub use table::{review_rows, write_rows, COLUMNS};
