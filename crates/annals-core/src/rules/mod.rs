pub mod duration;
pub mod lifecycle;
pub mod naming;
pub mod participants;
pub mod regarding;
pub mod results;
pub mod validation;

pub use duration::{validate_duration, DEFAULT_DURATION_MINUTES, DURATION_OPTIONS};
pub use lifecycle::{RecordEvent, RecordPhase};
pub use naming::{history_name, MAX_NAME_LEN, UNTITLED_NAME};
pub use participants::{diff_participants, ParticipantDiff};
pub use regarding::{classify_regarding, Regarding, REGARDING_PRESETS};
pub use results::{allowed_results, validate_result};
pub use validation::validate_fields;
