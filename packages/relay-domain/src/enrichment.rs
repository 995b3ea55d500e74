//! Field-level merge of contact data into an item's enrichment record.
//!
//! Updates arrive from two channels (webhook push and background poll) in any order and possibly
//! more than once. Merging is a union over fields: a value only ever replaces another value, never
//! an absence, so applying the same fields twice or applying disjoint fields in either order ends
//! in the same record.

use crate::model::{Enrichment, EnrichmentStatus};

/// Contact fields extracted from one provider result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
	pub email: Option<String>,
	pub phone: Option<String>,
	pub linkedin_url: Option<String>,
}
impl ContactFields {
	pub fn is_empty(&self) -> bool {
		self.email.is_none() && self.phone.is_none() && self.linkedin_url.is_none()
	}

	/// Fills fields that are still empty; present values are kept.
	pub fn fill_missing(&mut self, other: ContactFields) {
		if self.email.is_none() {
			self.email = other.email;
		}
		if self.phone.is_none() {
			self.phone = other.phone;
		}
		if self.linkedin_url.is_none() {
			self.linkedin_url = other.linkedin_url;
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
	/// Fields whose stored value changed.
	pub contributed: usize,
	/// Whether the record differs from before the merge.
	pub changed: bool,
}
impl MergeOutcome {
	pub fn contributed_any(&self) -> bool {
		self.contributed > 0
	}
}

impl Enrichment {
	pub fn has_contact(&self) -> bool {
		self.email.is_some() || self.phone.is_some() || self.linkedin_url.is_some()
	}

	pub fn merge(&mut self, fields: &ContactFields) -> MergeOutcome {
		let mut outcome = MergeOutcome::default();

		for (slot, value) in [
			(&mut self.email, &fields.email),
			(&mut self.phone, &fields.phone),
			(&mut self.linkedin_url, &fields.linkedin_url),
		] {
			let Some(value) = value else {
				continue;
			};

			if slot.as_deref() != Some(value.as_str()) {
				*slot = Some(value.clone());
				outcome.contributed += 1;
				outcome.changed = true;
			}
		}

		if !fields.is_empty() && self.status != EnrichmentStatus::Done {
			self.status = EnrichmentStatus::Done;
			outcome.changed = true;
		}

		outcome
	}

	/// Marks the record as waiting for results without touching collected fields.
	pub fn queue(&mut self) -> bool {
		if self.status == EnrichmentStatus::Queued {
			return false;
		}

		self.status = EnrichmentStatus::Queued;

		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn email(value: &str) -> ContactFields {
		ContactFields { email: Some(value.to_string()), ..Default::default() }
	}

	fn phone(value: &str) -> ContactFields {
		ContactFields { phone: Some(value.to_string()), ..Default::default() }
	}

	#[test]
	fn merge_is_idempotent() {
		let fields = ContactFields {
			email: Some("a@b.com".to_string()),
			phone: None,
			linkedin_url: Some("https://linkedin.com/in/a".to_string()),
		};
		let mut once = Enrichment::default();
		let first = once.merge(&fields);
		let mut twice = once.clone();
		let second = twice.merge(&fields);

		assert_eq!(first.contributed, 2);
		assert_eq!(once, twice);
		assert_eq!(second, MergeOutcome::default());
	}

	#[test]
	fn merge_of_disjoint_fields_commutes() {
		let mut ab = Enrichment::default();
		let mut ba = Enrichment::default();

		ab.merge(&email("a@b.com"));
		ab.merge(&phone("555"));
		ba.merge(&phone("555"));
		ba.merge(&email("a@b.com"));

		assert_eq!(ab, ba);
		assert_eq!(ab.status, EnrichmentStatus::Done);
	}

	#[test]
	fn absent_fields_never_clear_present_ones() {
		let mut record = Enrichment::default();

		record.merge(&email("a@b.com"));

		let outcome = record.merge(&ContactFields::default());

		assert_eq!(record.email.as_deref(), Some("a@b.com"));
		assert!(!outcome.changed);
	}

	#[test]
	fn fresh_value_replaces_only_its_field() {
		let mut record = Enrichment::default();

		record.merge(&ContactFields {
			email: Some("old@b.com".to_string()),
			phone: Some("555".to_string()),
			linkedin_url: None,
		});

		let outcome = record.merge(&email("new@b.com"));

		assert_eq!(outcome.contributed, 1);
		assert_eq!(record.email.as_deref(), Some("new@b.com"));
		assert_eq!(record.phone.as_deref(), Some("555"));
	}

	#[test]
	fn empty_extraction_keeps_queued_status() {
		let mut record = Enrichment::default();

		assert!(record.queue());

		record.merge(&ContactFields::default());

		assert_eq!(record.status, EnrichmentStatus::Queued);
	}

	#[test]
	fn requeue_keeps_fields_and_confirmation_completes_it() {
		let mut record = Enrichment::default();

		record.merge(&email("a@b.com"));
		record.queue();

		assert_eq!(record.email.as_deref(), Some("a@b.com"));
		assert_eq!(record.status, EnrichmentStatus::Queued);

		let outcome = record.merge(&email("a@b.com"));

		assert!(!outcome.contributed_any());
		assert!(outcome.changed);
		assert_eq!(record.status, EnrichmentStatus::Done);
	}

	#[test]
	fn fill_missing_keeps_earlier_values() {
		let mut fields = email("first@b.com");

		fields.fill_missing(ContactFields {
			email: Some("second@b.com".to_string()),
			phone: Some("555".to_string()),
			linkedin_url: None,
		});

		assert_eq!(fields.email.as_deref(), Some("first@b.com"));
		assert_eq!(fields.phone.as_deref(), Some("555"));
	}
}
