use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::{env, time::Duration};
use tracing_subscriber::filter::Builder;
use validator::{Validate, ValidationError};

#[derive(Clone, Deserialize, Validate)]
pub struct AppConfig {
	#[validate(nested)]
	pub server: Server,
	pub input: InputSource,
	pub index_source: IndexSourceConfig,
}

#[derive(Clone, Deserialize, Validate)]
pub struct Server {
	/// Wall-clock budget for a whole run. `None` means run to completion.
	#[serde(with = "humantime_serde::option", default)]
	pub run_timeout: Option<Duration>,
	#[validate(nested)]
	pub log: Log,
}

#[derive(Clone, Deserialize, Validate)]
pub struct Log {
	pub file: String,
	// see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html#directives
	#[validate(custom(function = "validate_log_filter_directives"))]
	pub filter_directives: String,
}

impl Default for Log {
	fn default() -> Self {
		Self {
			file: "stderr".to_string(),
			filter_directives: "info".to_string(),
		}
	}
}

fn validate_log_filter_directives(dirs: &str) -> Result<(), ValidationError> {
	Builder::default()
		.parse(dirs)
		.map_err(|_| ValidationError::new("invalid log filter directives"))
		.map(|_| ())
}

/// Where the records this run analyzes come from: a `mongod` log already on
/// disk, piped in on stdin, or live polling of a `system.profile` collection.
#[derive(Clone, Deserialize, PartialEq, Debug)]
pub enum InputSource {
	#[serde(rename = "log_file")]
	LogFile(LogFileInput),
	#[serde(rename = "stdin")]
	Stdin,
	#[serde(rename = "profile_poll")]
	ProfilePoll(ProfilePollInput),
}

#[derive(Clone, Deserialize, PartialEq, Debug)]
pub struct LogFileInput {
	pub path: String,
}

#[derive(Clone, Deserialize, PartialEq, Debug)]
pub struct ProfilePollInput {
	pub uri: String,
	pub database: String,
	#[serde(with = "humantime_serde", default = "default_poll_interval")]
	pub poll_interval: Duration,
}

const fn default_poll_interval() -> Duration {
	Duration::from_secs(1)
}

/// Where index metadata for the collections this run touches comes from.
#[derive(Clone, Deserialize, PartialEq, Debug)]
pub enum IndexSourceConfig {
	#[serde(rename = "mongo")]
	Mongo(MongoIndexSourceConfig),
	#[serde(rename = "static")]
	Static(StaticIndexSourceConfig),
}

#[derive(Clone, Deserialize, PartialEq, Debug)]
pub struct MongoIndexSourceConfig {
	pub uri: String,
}

#[derive(Clone, Deserialize, PartialEq, Debug, Default)]
pub struct StaticIndexSourceConfig {
	#[serde(default)]
	pub collections: Vec<StaticCollectionIndexes>,
}

/// One collection's worth of fixture indexes, shaped like the `db.collection
/// .getIndexes()` output an operator would paste into a config file: index
/// name to an ordered list of `(field, direction)` pairs.
#[derive(Clone, Deserialize, PartialEq, Debug)]
pub struct StaticCollectionIndexes {
	pub database: String,
	pub collection: String,
	pub indexes: indexmap::IndexMap<String, Vec<(String, IndexKeyDirection)>>,
}

#[derive(Clone, Deserialize, PartialEq, Debug)]
#[serde(untagged)]
pub enum IndexKeyDirection {
	Int(i64),
	Str(String),
}

impl AppConfig {
	pub fn new() -> Result<Self, ConfigError> {
		let default_config = env::var("DEXRS_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
		Config::builder()
			.add_source(File::with_name(&default_config))
			.build()?
			.try_deserialize()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn log_file_input_deserializes() {
		let j = serde_json::json!({"log_file": {"path": "/var/log/mongodb/mongod.log"}});
		let actual: InputSource = serde_json::from_value(j).unwrap();
		assert_eq!(
			actual,
			InputSource::LogFile(LogFileInput {
				path: "/var/log/mongodb/mongod.log".to_string()
			})
		);
	}

	#[test]
	fn profile_poll_input_applies_default_interval() {
		let j = serde_json::json!({"profile_poll": {"uri": "mongodb://localhost", "database": "mydb"}});
		let actual: InputSource = serde_json::from_value(j).unwrap();
		assert_eq!(
			actual,
			InputSource::ProfilePoll(ProfilePollInput {
				uri: "mongodb://localhost".to_string(),
				database: "mydb".to_string(),
				poll_interval: default_poll_interval(),
			})
		);
	}

	#[test]
	fn static_index_source_deserializes_mixed_directions() {
		let j = serde_json::json!({
			"static": {
				"collections": [{
					"database": "mydb",
					"collection": "mycoll",
					"indexes": {
						"geoOne_2d": [["geoOne", "2d"]],
						"simpleIndexedField_1": [["simpleIndexedField", 1]],
					}
				}]
			}
		});
		let actual: IndexSourceConfig = serde_json::from_value(j).unwrap();
		match actual {
			IndexSourceConfig::Static(cfg) => assert_eq!(cfg.collections.len(), 1),
			_ => panic!("expected static index source"),
		}
	}

	#[test]
	fn log_filter_directives_reject_garbage() {
		let log = Log {
			file: "stderr".to_string(),
			filter_directives: "wtf,,;asd".to_string(),
		};
		assert!(log.validate().is_err());
	}

	#[test]
	fn log_filter_directives_accept_well_formed() {
		let log = Log {
			file: "stderr".to_string(),
			filter_directives: "info,dexrs=debug".to_string(),
		};
		assert!(log.validate().is_ok());
	}
}
