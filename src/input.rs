//! Turns an `InputSource` into a stream of raw lines (log files, stdin) or
//! profile documents (live polling). Kept separate from `app.rs` so the
//! ingestion loop doesn't need to know how a line or document was obtained.

use crate::bson_convert::chrono_from_bson_datetime;
use crate::config::{LogFileInput, ProfilePollInput};
use crate::errors::AppError;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

pub fn open_log_lines(input: &LogFileInput) -> Result<Box<dyn Iterator<Item = io::Result<String>>>, AppError> {
	let file = File::open(&input.path).map_err(AppError::InputOpen)?;
	Ok(Box::new(BufReader::new(file).lines()))
}

pub fn stdin_lines() -> Box<dyn Iterator<Item = io::Result<String>>> {
	Box::new(BufReader::new(io::stdin()).lines())
}

/// A single poll of `system.profile`, returning documents more recent than
/// `after` (by `ts`), oldest first, plus the newest `ts` observed so the
/// caller can advance its watermark.
pub fn poll_profile_collection(
	client: &mongodb::sync::Client,
	cfg: &ProfilePollInput,
	after: Option<chrono::DateTime<chrono::Utc>>,
) -> anyhow::Result<(Vec<mongodb::bson::Document>, Option<chrono::DateTime<chrono::Utc>>)> {
	use mongodb::bson::{doc, Bson};

	let coll = client
		.database(&cfg.database)
		.collection::<mongodb::bson::Document>("system.profile");

	let filter = match after {
		Some(ts) => doc! { "ts": { "$gt": Bson::DateTime(bson_datetime_from_chrono(ts)) } },
		None => doc! {},
	};

	let cursor = coll.find(filter).sort(doc! { "ts": 1 }).run()?;

	let mut newest = after;
	let mut docs = Vec::new();
	for doc in cursor {
		let doc = doc?;
		if let Some(Bson::DateTime(ts)) = doc.get("ts") {
			let ts = chrono_from_bson_datetime(*ts);
			newest = Some(match newest {
				Some(cur) if cur >= ts => cur,
				_ => ts,
			});
		}
		docs.push(doc);
	}
	Ok((docs, newest))
}

fn bson_datetime_from_chrono(ts: chrono::DateTime<chrono::Utc>) -> mongodb::bson::DateTime {
	mongodb::bson::DateTime::from_millis(ts.timestamp_millis())
}
