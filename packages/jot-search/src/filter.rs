use std::cmp::Ordering;

use time::OffsetDateTime;

use crate::entry::Entry;

/// Store-side candidate selection: owner, tag, and an inclusive `created_at` window.
///
/// Entries without `created_at` never satisfy a date bound.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
	pub user_id: Option<String>,
	pub tag: Option<String>,
	pub start: Option<OffsetDateTime>,
	pub end: Option<OffsetDateTime>,
}
impl CandidateFilter {
	pub fn matches(&self, entry: &Entry) -> bool {
		if let Some(user_id) = self.user_id.as_deref()
			&& entry.user_id.as_deref() != Some(user_id)
		{
			return false;
		}
		if let Some(tag) = self.tag.as_deref()
			&& !entry.tags.iter().any(|t| t == tag)
		{
			return false;
		}
		if self.start.is_none() && self.end.is_none() {
			return true;
		}

		let Some(created_at) = entry.created_at else { return false };

		if self.start.is_some_and(|start| created_at < start) {
			return false;
		}
		if self.end.is_some_and(|end| created_at > end) {
			return false;
		}

		true
	}

	/// Matching entries, newest first. Undated entries sort last and ties keep input order.
	pub fn select<'a>(&self, entries: &'a [Entry]) -> Vec<&'a Entry> {
		let mut out: Vec<&Entry> = entries.iter().filter(|entry| self.matches(entry)).collect();

		out.sort_by(|a, b| newest_first(a.created_at, b.created_at));

		out
	}
}

fn newest_first(a: Option<OffsetDateTime>, b: Option<OffsetDateTime>) -> Ordering {
	match (a, b) {
		(Some(a), Some(b)) => b.cmp(&a),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	fn entry(text: &str, user: &str, tags: &[&str], created_at: Option<OffsetDateTime>) -> Entry {
		let mut entry = Entry::new(text);

		entry.user_id = Some(user.to_string());
		entry.tags = tags.iter().map(|tag| tag.to_string()).collect();
		entry.created_at = created_at;

		entry
	}

	fn texts(selected: &[&Entry]) -> Vec<String> {
		selected.iter().map(|entry| entry.text.clone()).collect()
	}

	#[test]
	fn empty_filter_keeps_everything_newest_first() {
		let entries = vec![
			entry("old", "u1", &[], Some(datetime!(2025-01-01 00:00 UTC))),
			entry("undated", "u1", &[], None),
			entry("new", "u2", &[], Some(datetime!(2025-06-01 00:00 UTC))),
		];
		let selected = CandidateFilter::default().select(&entries);

		assert_eq!(texts(&selected), vec!["new", "old", "undated"]);
	}

	#[test]
	fn filters_by_owner_and_tag() {
		let entries = vec![
			entry("a", "u1", &["work"], None),
			entry("b", "u2", &["work"], None),
			entry("c", "u1", &["home"], None),
		];
		let filter = CandidateFilter {
			user_id: Some("u1".to_string()),
			tag: Some("work".to_string()),
			..Default::default()
		};

		assert_eq!(texts(&filter.select(&entries)), vec!["a"]);
	}

	#[test]
	fn date_window_is_inclusive_and_excludes_undated() {
		let entries = vec![
			entry("before", "u1", &[], Some(datetime!(2025-02-28 23:59 UTC))),
			entry("start", "u1", &[], Some(datetime!(2025-03-01 00:00 UTC))),
			entry("end", "u1", &[], Some(datetime!(2025-03-31 00:00 UTC))),
			entry("after", "u1", &[], Some(datetime!(2025-04-01 00:00 UTC))),
			entry("undated", "u1", &[], None),
		];
		let filter = CandidateFilter {
			start: Some(datetime!(2025-03-01 00:00 UTC)),
			end: Some(datetime!(2025-03-31 00:00 UTC)),
			..Default::default()
		};

		assert_eq!(texts(&filter.select(&entries)), vec!["end", "start"]);
	}
}
