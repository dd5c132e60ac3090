pub mod archive;
pub mod dispatch;
pub mod input;
pub mod layout;
pub mod light_curve;
pub mod result;
pub mod stats;
pub mod summary;
pub mod target;
pub mod worker;
pub mod worklist;

pub use archive::{Archive, ArchiveError};
pub use dispatch::{Dispatcher, NoopObserver, RunConfig, RunError, RunObserver, RunReport};
pub use input::{InputError, InputTable};
pub use layout::{ArtifactError, ArtifactLayout};
pub use light_curve::{ColumnLengthMismatch, LightCurve};
pub use result::{FetchResult, FetchStatus};
pub use stats::{Advisory, AdvisoryPolicy, RunStats};
pub use summary::{CsvSummaryFile, Summary, SummaryError, SummarySink};
pub use target::TargetId;
pub use worker::fetch_one;
pub use worklist::{WorkList, build_work_list};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
