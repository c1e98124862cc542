use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Anything the ranker can filter and order.
///
/// The ranker only reads records; it never clones or mutates them.
pub trait Record {
	fn text(&self) -> &str;

	/// The stored embedding, if any. An empty vector counts as missing.
	fn embedding(&self) -> Option<&[f32]>;
}

/// A journal entry as the record store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	#[serde(default, with = "crate::time_serde", skip_serializing_if = "Option::is_none")]
	pub created_at: Option<OffsetDateTime>,
	#[serde(default)]
	pub text: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding: Option<Vec<f32>>,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assets: Option<Value>,
}
impl Entry {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			id: None,
			user_id: None,
			created_at: None,
			text: text.into(),
			embedding: None,
			tags: Vec::new(),
			assets: None,
		}
	}

	pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
		self.embedding = Some(embedding);

		self
	}

	pub fn has_embedding(&self) -> bool {
		Record::embedding(self).is_some()
	}
}

impl Record for Entry {
	fn text(&self) -> &str {
		&self.text
	}

	fn embedding(&self) -> Option<&[f32]> {
		self.embedding.as_deref().filter(|embedding| !embedding.is_empty())
	}
}

impl<T> Record for &T
where
	T: Record + ?Sized,
{
	fn text(&self) -> &str {
		(**self).text()
	}

	fn embedding(&self) -> Option<&[f32]> {
		(**self).embedding()
	}
}
