//! The one concrete `IndexSource` this crate ships: a MongoDB-backed
//! implementation using the driver's own index listing, mirroring the
//! original tool's `_ensure_index_cache`, which called
//! `db[collection].index_information()` against a live `pymongo.Connection`.

use anyhow::Context;
use common::index::{IndexCatalog, IndexDescriptor, IndexDirection};
use common::log::ResultLogger;
use mongodb::bson::Bson;
use mongodb::sync::Client;
use reportstore::IndexSource;

pub struct MongoIndexSource {
	client: Client,
}

impl MongoIndexSource {
	pub fn connect(uri: &str) -> anyhow::Result<Self> {
		let client = Client::with_uri_str(uri)
			.with_context(|| format!("connecting to {uri}"))
			.log_e()?;
		Ok(Self { client })
	}
}

impl IndexSource for MongoIndexSource {
	fn fetch_indexes(&self, database: &str, collection: &str) -> anyhow::Result<IndexCatalog> {
		let coll = self.client.database(database).collection::<mongodb::bson::Document>(collection);
		let cursor = coll
			.list_indexes()
			.run()
			.with_context(|| format!("listing indexes for {database}.{collection}"))
			.log_e()?;

		let mut catalog = IndexCatalog::new();
		for model in cursor {
			let model = model.with_context(|| format!("reading index metadata for {database}.{collection}"))?;
			let name = model
				.options
				.as_ref()
				.and_then(|o| o.name.clone())
				.unwrap_or_else(|| "_unnamed_".to_string());
			let key = model
				.keys
				.iter()
				.map(|(field, value)| (field.clone(), index_direction(value)))
				.collect();
			catalog.insert(name, IndexDescriptor::new(key));
		}
		Ok(catalog)
	}
}

fn index_direction(value: &Bson) -> IndexDirection {
	match value {
		Bson::Int32(i) => IndexDirection::from(*i as i64),
		Bson::Int64(i) => IndexDirection::from(*i),
		Bson::Double(d) => IndexDirection::from(*d as i64),
		Bson::String(s) => IndexDirection::from(s.as_str()),
		other => IndexDirection::Other(other.to_string()),
	}
}
