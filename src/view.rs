//! Pure projection pipeline: persona visibility, attribute filtering,
//! pagination and derived counters. Nothing in here mutates the record set;
//! every function is re-run whenever one of its inputs changes.
use super::material::{MaterialRequest, Status, TimeStamp};
use super::session::Persona;
use chrono::Utc;

/// Subset of `records` a persona is allowed to see, prior to any attribute
/// filtering. Search users see closed requests only, approvers see the open
/// ones, analysts see everything.
pub fn visible_for(persona: Persona, records: &[MaterialRequest]) -> Vec<&MaterialRequest> {
    match persona {
        Persona::Search => records
            .iter()
            .filter(|r| r.status == Status::CompletedByIma)
            .collect(),
        Persona::Approver => records
            .iter()
            .filter(|r| r.status != Status::CompletedByIma)
            .collect(),
        Persona::Analyst => records.iter().collect(),
    }
}

/// A conjunction of optional predicates. An unset clause is vacuously true,
/// so the default spec passes every record. Always applied downstream of
/// [`visible_for`], never instead of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    material_name: Option<String>,
    material_number: Option<String>,
    description: Option<String>,
    request_id: Option<String>,
    search: Option<String>,
    status: Option<Status>,
    vendor: Option<String>,
    plant: Option<String>,
    created_from: Option<TimeStamp<Utc>>,
    created_to: Option<TimeStamp<Utc>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_material_name(mut self, term: &str) -> Self {
        self.material_name = text_term(term);
        self
    }
    pub fn set_material_number(mut self, term: &str) -> Self {
        self.material_number = text_term(term);
        self
    }
    pub fn set_description(mut self, term: &str) -> Self {
        self.description = text_term(term);
        self
    }
    pub fn set_request_id(mut self, term: &str) -> Self {
        self.request_id = text_term(term);
        self
    }
    /// Free-text search across name, description, material number and
    /// request id.
    pub fn set_search(mut self, term: &str) -> Self {
        self.search = text_term(term);
        self
    }
    pub fn set_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }
    /// Exact vendor-id match. Blank or `"all"` means no constraint.
    pub fn set_vendor(mut self, key: &str) -> Self {
        self.vendor = key_term(key);
        self
    }
    /// Exact plant-id match. Blank or `"all"` means no constraint.
    pub fn set_plant(mut self, key: &str) -> Self {
        self.plant = key_term(key);
        self
    }
    pub fn set_created_from(mut self, from: TimeStamp<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }
    pub fn set_created_to(mut self, to: TimeStamp<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    pub fn matches(&self, record: &MaterialRequest) -> bool {
        let name_ok = clause(&self.material_name, |t| contains_ci(&record.material_name, t));
        let number_ok = clause(&self.material_number, |t| {
            contains_ci(&record.material_number, t)
        });
        let description_ok = clause(&self.description, |t| {
            contains_ci(&record.material_description, t)
        });
        let request_id_ok = clause(&self.request_id, |t| contains_ci(&record.request_id, t));
        let search_ok = clause(&self.search, |t| {
            contains_ci(&record.material_name, t)
                || contains_ci(&record.material_description, t)
                || contains_ci(&record.material_number, t)
                || contains_ci(&record.request_id, t)
        });
        let status_ok = match self.status {
            Some(status) => record.status == status,
            None => true,
        };
        let vendor_ok = clause(&self.vendor, |key| record.vendor == key);
        let plant_ok = clause(&self.plant, |key| record.plant == key);
        let created = record.created_at.to_datetime_utc();
        let from_ok = match &self.created_from {
            Some(from) => created >= from.to_datetime_utc(),
            None => true,
        };
        let to_ok = match &self.created_to {
            Some(to) => created <= to.to_datetime_utc(),
            None => true,
        };

        name_ok
            && number_ok
            && description_ok
            && request_id_ok
            && search_ok
            && status_ok
            && vendor_ok
            && plant_ok
            && from_ok
            && to_ok
    }

    pub fn apply<'a>(&self, subset: &[&'a MaterialRequest]) -> Vec<&'a MaterialRequest> {
        subset.iter().copied().filter(|r| self.matches(r)).collect()
    }
}

fn text_term(term: &str) -> Option<String> {
    let term = term.trim();
    if term.is_empty() {
        None
    } else {
        Some(term.to_lowercase())
    }
}

fn key_term(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() || key.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(key.to_string())
    }
}

fn clause(term: &Option<String>, predicate: impl Fn(&str) -> bool) -> bool {
    match term {
        Some(value) => predicate(value.as_str()),
        None => true,
    }
}

// terms are lowercased once at set time
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Navigation metadata for one page of a filtered sequence. `start_index`
/// and `end_index` are 1-based inclusive display bounds; an empty sequence
/// reports `0..0` so `start_index <= end_index <= total_items` holds on
/// every valid page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
}

pub struct PageWindow<'a, T> {
    pub slice: &'a [T],
    pub meta: PageMeta,
}

/// Page count for `count` items, never less than one. `page_size` must be
/// greater than zero.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size).max(1)
}

/// Slice out one page. `page` must lie within `1..=total_pages(count)`; the
/// window reports out-of-range pages as empty rather than clamping them, so
/// callers re-invoke with page 1 whenever the underlying sequence shrinks.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> PageWindow<'_, T> {
    let count = items.len();
    let pages = total_pages(count, page_size);
    let offset = page.saturating_sub(1) * page_size;
    let slice = if offset >= count {
        &items[0..0]
    } else {
        &items[offset..(offset + page_size).min(count)]
    };

    PageWindow {
        slice,
        meta: PageMeta {
            current_page: page,
            page_size,
            total_items: count,
            total_pages: pages,
            start_index: if count == 0 { 0 } else { offset + 1 },
            end_index: (offset + page_size).min(count),
            can_go_previous: page > 1,
            can_go_next: page < pages,
        },
    }
}

/// Status buckets over the full record set, recomputed on every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub approved: usize,
    pub requested: usize,
    pub email_sent: usize,
}

impl StatusCounts {
    pub fn tally(records: &[MaterialRequest]) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.status {
                Status::CompletedByIma => counts.approved += 1,
                Status::PendingApproval => counts.requested += 1,
                Status::PendingIma => counts.email_sent += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.approved + self.requested + self.email_sent
    }
}

/// Open-request buckets over the approver-visible subset only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub pending: usize,
    pub email_sent: usize,
}

impl RequestCounts {
    pub fn tally(subset: &[&MaterialRequest]) -> Self {
        let mut counts = Self::default();
        for record in subset {
            match record.status {
                Status::PendingApproval => counts.pending += 1,
                Status::PendingIma => counts.email_sent += 1,
                Status::CompletedByIma => {}
            }
        }
        counts
    }
}
