use crate::config::{AppConfig, IndexSourceConfig, InputSource, ProfilePollInput};
use crate::errors::AppError;
use crate::input;
use crate::mongo_index_source::MongoIndexSource;
use crate::render::{render_with_quote_swap, Output, ResultEntry, RunStats};
use crate::state::AppState;
use crate::{bson_convert, config::IndexKeyDirection};
use chrono::Utc;
use common::index::{IndexCatalog, IndexDescriptor, IndexDirection};
use common::Namespace;
use indexadvisor::report::analyze;
use reportstore::{IndexSource, StaticIndexSource};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

pub async fn run() -> Result<(), AppError> {
	let cfg = AppConfig::new()?;
	cfg.validate()?;

	init_tracing_subscriber(cfg.server.log.file.clone(), cfg.server.log.filter_directives.as_str());
	info!("dexrs starting");

	let index_source = build_index_source(&cfg.index_source)?;
	let state = AppState::new(Arc::new(cfg.clone()), index_source);

	let started = Instant::now();
	let timeout = cfg.server.run_timeout;

	let ingest_state = state.clone();
	let ingest_input = cfg.input.clone();
	let ingest = tokio::task::spawn_blocking(move || ingest_all(&ingest_input, &ingest_state));

	let timed_out = match timeout {
		Some(dur) => match tokio::time::timeout(dur, ingest).await {
			Ok(joined) => {
				joined.map_err(|e| AppError::Other(anyhow::anyhow!("ingestion task panicked: {e}")))??;
				false
			}
			Err(_) => {
				warn!(?dur, "run timed out; reporting on records processed so far");
				true
			}
		},
		None => {
			ingest
				.await
				.map_err(|e| AppError::Other(anyhow::anyhow!("ingestion task panicked: {e}")))??;
			false
		}
	};

	let run_stats = RunStats::snapshot(&state.counters, started.elapsed().as_millis(), timed_out);
	let results: Vec<ResultEntry> = state.aggregator.get_reports().iter().map(ResultEntry::from).collect();
	let output = Output { run_stats, results };

	let json = serde_json::to_string_pretty(&output).map_err(|e| AppError::Other(e.into()))?;
	let rendered = render_with_quote_swap(&json);

	let mut stdout = std::io::stdout().lock();
	writeln!(stdout, "{rendered}").map_err(AppError::OutputWrite)?;
	stdout.flush().map_err(AppError::OutputWrite)?;
	Ok(())
}

fn build_index_source(cfg: &IndexSourceConfig) -> Result<Arc<dyn IndexSource>, AppError> {
	match cfg {
		IndexSourceConfig::Mongo(mongo) => {
			let source = MongoIndexSource::connect(&mongo.uri).map_err(AppError::Other)?;
			Ok(Arc::new(source))
		}
		IndexSourceConfig::Static(cfg) => {
			let mut source = StaticIndexSource::new();
			for coll in &cfg.collections {
				let mut catalog = IndexCatalog::new();
				for (name, key) in &coll.indexes {
					let key = key
						.iter()
						.map(|(field, dir)| {
							let direction = match dir {
								IndexKeyDirection::Int(i) => IndexDirection::from(*i),
								IndexKeyDirection::Str(s) => IndexDirection::from(s.as_str()),
							};
							(field.clone(), direction)
						})
						.collect();
					catalog.insert(name.clone(), IndexDescriptor::new(key));
				}
				source = source.with_catalog(&coll.database, &coll.collection, catalog);
			}
			Ok(Arc::new(source))
		}
	}
}

/// Runs to completion on whatever thread `spawn_blocking` gives it. Lives
/// outside the async runtime because the parser, scrubber and analyzer are
/// all synchronous CPU-bound work; only index fetches and the profile-poll
/// connection ever touch the network.
fn ingest_all(input: &InputSource, state: &AppState) -> anyhow::Result<()> {
	match input {
		InputSource::LogFile(cfg) => ingest_lines(self::input::open_log_lines(cfg)?, state),
		InputSource::Stdin => ingest_lines(self::input::stdin_lines(), state),
		InputSource::ProfilePoll(cfg) => ingest_profile_poll(cfg, state),
	}
}

fn ingest_lines(lines: Box<dyn Iterator<Item = std::io::Result<String>>>, state: &AppState) -> anyhow::Result<()> {
	for line in lines {
		let line = line?;
		state.counters.observe_line();
		process_raw_line(&line, state);
	}
	Ok(())
}

fn process_raw_line(line: &str, state: &AppState) {
	let now = Utc::now();
	match queryscrub::dispatch_log_line(line, now) {
		Some(record) => process_record(record, state),
		None => {
			let has_timestamp = queryscrub::dispatcher::has_timestamp_prefix(line);
			state.counters.observe_unparsable(has_timestamp, 0);
		}
	}
}

fn ingest_profile_poll(cfg: &ProfilePollInput, state: &AppState) -> anyhow::Result<()> {
	let client = mongodb::sync::Client::with_uri_str(&cfg.uri)?;
	let mut watermark = None;
	loop {
		let (docs, newest) = input::poll_profile_collection(&client, cfg, watermark)?;
		watermark = newest;
		for doc in &docs {
			state.counters.observe_line();
			let map = bson_convert::document_to_map(doc);
			match queryscrub::dispatch_profile_entry(&map) {
				Some(record) => process_record(record, state),
				None => state.counters.observe_unparsable(true, 0),
			}
		}
		std::thread::sleep(cfg.poll_interval);
	}
}

fn process_record(record: queryscrub::NormalizedRecord, state: &AppState) {
	// The timing-fallback handler recognizes a trailing `<N>ms` on an
	// otherwise-unrecognized line; it carries no namespace or query shape, so
	// it contributes to the unparsable tally (and its millis to the
	// unparsed-time sum) rather than to `linesProcessed`.
	if record.ns == "?" {
		state.counters.observe_unparsable(record.ts.is_some(), record.stats.millis);
		return;
	}

	let ns = Namespace::parse(&record.ns);
	let catalog = match &ns {
		Some(ns) => state.index_cache.get_or_fetch(&ns.db, &ns.collection, state.index_source.as_ref()),
		None => Arc::new(IndexCatalog::new()),
	};

	let report = analyze(&record, &catalog);
	state.counters.observe_processed(record.ts);
	if let Some(rec) = &report.recommendation {
		state.counters.observe_recommendation(&rec.index);
	}
	state.aggregator.add(&report);
	debug!(namespace = %report.namespace, status = ?report.index_status, "analyzed query");
}

fn init_tracing_subscriber(file: String, filter_directives: &str) {
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::new(filter_directives.to_string()))
		.with(tracing_subscriber::fmt::layer().json().with_writer(move || get_writer(file.clone())))
		.init();
}

fn get_writer(file: String) -> Box<dyn std::io::Write> {
	if file.eq_ignore_ascii_case("stdout") {
		Box::new(std::io::stdout())
	} else if file.eq_ignore_ascii_case("stderr") {
		Box::new(std::io::stderr())
	} else {
		Box::new(OpenOptions::new().append(true).create(true).open(file).expect("open log file"))
	}
}
