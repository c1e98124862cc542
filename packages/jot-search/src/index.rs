use crate::{Error, Result};

/// One search hit: the row position in the index and its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
	pub row: usize,
	pub distance: f32,
}

/// Exhaustive squared-L2 index over borrowed vectors.
///
/// Built per ranking call and dropped afterwards, so nothing is shared between calls.
#[derive(Debug)]
pub struct FlatIndex<'a> {
	dim: usize,
	rows: Vec<&'a [f32]>,
}
impl<'a> FlatIndex<'a> {
	pub fn with_capacity(dim: usize, capacity: usize) -> Self {
		Self { dim, rows: Vec::with_capacity(capacity) }
	}

	pub(crate) fn dim(&self) -> usize {
		self.dim
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Appends a vector and returns its row. Vectors of the wrong length are rejected.
	pub fn add(&mut self, vector: &'a [f32]) -> Result<usize> {
		let row = self.rows.len();

		if vector.len() != self.dim {
			return Err(Error::DimensionMismatch {
				index: row,
				expected: self.dim,
				actual: vector.len(),
			});
		}

		self.rows.push(vector);

		Ok(row)
	}

	/// The `k` rows closest to `query`, nearest first.
	///
	/// Equal distances are ordered by row, so insertion order breaks ties.
	pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.dim {
			return Err(Error::InvalidRequest {
				message: format!(
					"query vector has {} dimensions but the index holds {}.",
					query.len(),
					self.dim
				),
			});
		}
		if k == 0 {
			return Ok(Vec::new());
		}

		let mut hits: Vec<Neighbor> = self
			.rows
			.iter()
			.enumerate()
			.map(|(row, vector)| Neighbor { row, distance: squared_l2(query, vector) })
			.collect();

		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.row.cmp(&b.row)));
		hits.truncate(k);

		Ok(hits)
	}
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
	a.iter()
		.zip(b)
		.map(|(x, y)| {
			let d = x - y;

			d * d
		})
		.sum()
}

/// Scales `vector` to unit length in place.
///
/// A zero or non-finite norm leaves the vector as it was, so callers that need finite
/// distances must reject non-finite components first.
pub fn l2_normalize(vector: &mut [f32]) {
	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm == 0.0 || !norm.is_finite() {
		return;
	}

	for value in vector.iter_mut() {
		*value /= norm;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalizes_to_unit_length() {
		let mut v = vec![3.0, 4.0];

		l2_normalize(&mut v);

		assert!((v[0] - 0.6).abs() < 1e-6);
		assert!((v[1] - 0.8).abs() < 1e-6);
	}

	#[test]
	fn zero_vector_is_left_alone() {
		let mut v = vec![0.0, 0.0, 0.0];

		l2_normalize(&mut v);

		assert_eq!(v, vec![0.0, 0.0, 0.0]);
	}

	#[test]
	fn returns_nearest_first() {
		let a = [1.0, 0.0];
		let b = [0.9, 0.1];
		let c = [0.0, 1.0];
		let mut index = FlatIndex::with_capacity(2, 1);

		for vector in [&c[..], &b[..], &a[..]] {
			index.add(vector).expect("dims match");
		}

		let hits = index.search(&[1.0, 0.0], 3).expect("search");
		let rows: Vec<_> = hits.iter().map(|hit| hit.row).collect();

		assert_eq!(rows, vec![2, 1, 0]);
		assert_eq!(hits[0].distance, 0.0);
		assert!((hits[1].distance - 0.02).abs() < 1e-6);
	}

	#[test]
	fn ties_keep_insertion_order() {
		let up = [0.0, 1.0];
		let down = [0.0, -1.0];
		let mut index = FlatIndex::with_capacity(2, 2);

		index.add(&up).expect("dims match");
		index.add(&down).expect("dims match");

		let hits = index.search(&[1.0, 0.0], 2).expect("search");

		assert_eq!(hits[0].row, 0);
		assert_eq!(hits[1].row, 1);
		assert_eq!(hits[0].distance, hits[1].distance);
	}

	#[test]
	fn k_is_capped_by_row_count() {
		let v = [0.5, 0.5];
		let mut index = FlatIndex::with_capacity(2, 1);

		index.add(&v).expect("dims match");

		assert_eq!(index.search(&[1.0, 0.0], 10).expect("search").len(), 1);
		assert!(index.search(&[1.0, 0.0], 0).expect("search").is_empty());
	}

	#[test]
	fn rejects_wrong_dimensions() {
		let short = [1.0];
		let mut index = FlatIndex::with_capacity(2, 1);
		let err = index.add(&short).expect_err("expected mismatch");

		assert!(matches!(err, Error::DimensionMismatch { index: 0, expected: 2, actual: 1 }));
		assert!(index.is_empty());
		assert!(index.search(&[1.0, 0.0, 0.0], 1).is_err());
	}
}
