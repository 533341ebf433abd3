pub mod derive;
pub mod detect;
pub mod types;
pub mod utils;

pub use derive::{infer, HeaderDecision, InferredSchema};
pub use detect::detect_id_column;
pub use types::{Cell, ColumnLabels, ColumnMeta, RawRow, RawTable, Scalar};
pub use utils::{column_letter, normalize, synthetic_label};
