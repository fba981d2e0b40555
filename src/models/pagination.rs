use serde::{Deserialize, Deserializer, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
	pub page:     u32,
	pub per_page: u32,
	pub total:    i64,

	pub data: T,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
	#[serde(default = "page_default", deserialize_with = "page_bounds")]
	pub page:     u32,
	#[serde(
		default = "per_page_default",
		deserialize_with = "per_page_bounds"
	)]
	pub per_page: u32,
}

const fn page_default() -> u32 { 1 }

const fn per_page_default() -> u32 { 20 }

fn bounded<'de, D>(d: D, start: u32, end: u32) -> Result<u32, D::Error>
where
	D: Deserializer<'de>,
{
	let v = u32::deserialize(d)?;

	if (start..=end).contains(&v) {
		Ok(v)
	} else {
		Err(serde::de::Error::custom(format_args!(
			"invalid value: {v}, expected a number between {start} and {end}",
		)))
	}
}

fn page_bounds<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
	bounded(d, 1, u32::MAX)
}

fn per_page_bounds<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
	bounded(d, 1, 100)
}

impl Default for PaginationOptions {
	fn default() -> Self { Self { page: 1, per_page: 20 } }
}

impl PaginationOptions {
	/// Create a new [`Paginated`] struct based on the current parameters with
	/// the given data
	pub fn paginate<T>(&self, total: i64, data: T) -> Paginated<T> {
		Paginated { page: self.page, per_page: self.per_page, total, data }
	}

	/// Calculate the SQL LIMIT value of these parameters
	#[inline]
	#[must_use]
	pub fn limit(&self) -> i64 { self.per_page.into() }

	/// Calculate the SQL OFFSET value of these parameters
	#[inline]
	#[must_use]
	pub fn offset(&self) -> i64 {
		i64::from(self.page - 1) * i64::from(self.per_page)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn limit_and_offset_follow_the_page() {
		let opts: PaginationOptions =
			serde_json::from_str(r#"{"page": 3, "perPage": 20}"#).unwrap();

		assert_eq!(opts.limit(), 20);
		assert_eq!(opts.offset(), 40);
	}

	#[test]
	fn defaults_start_at_the_first_page() {
		let opts: PaginationOptions = serde_json::from_str("{}").unwrap();

		assert_eq!(opts.page, 1);
		assert_eq!(opts.per_page, 20);
		assert_eq!(opts.offset(), 0);
	}

	#[test]
	fn out_of_bounds_pages_are_rejected() {
		let zero_page =
			serde_json::from_str::<PaginationOptions>(r#"{"page": 0}"#);
		let oversized =
			serde_json::from_str::<PaginationOptions>(r#"{"perPage": 101}"#);

		assert!(zero_page.is_err());
		assert!(oversized.is_err());
	}
}
