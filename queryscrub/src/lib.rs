pub mod dispatcher;
pub mod handlers;
pub mod parser;
pub mod record;
pub mod scrub;
pub mod value;

pub use dispatcher::{dispatch_log_line, dispatch_profile_entry};
pub use record::{NormalizedRecord, Stats};
pub use scrub::{build_mask, scrub};
pub use value::{canonical_json, Value};
