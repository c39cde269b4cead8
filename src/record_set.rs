//! The session's mirror of the store, replaced wholesale after every write
use super::material::MaterialRequest;

/// Ticket for one refresh round-trip. Snapshots arriving under a ticket
/// older than the newest issued one are dropped, so a slow response can
/// never overwrite the result of a later request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

/// Owned, versioned container for the shared record collection. All reads go
/// through here; the only mutation is [`RecordSet::apply_snapshot`], which
/// swaps the whole collection. Records are never patched in place.
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<MaterialRequest>,
    version: u64,
    latest_ticket: u64,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MaterialRequest] {
        &self.records
    }

    pub fn get(&self, material_id: &str) -> Option<&MaterialRequest> {
        self.records.iter().find(|r| r.material_id == material_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bumped once per applied snapshot.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Start a refresh round-trip and get the ticket its snapshot must carry.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.latest_ticket += 1;
        RefreshTicket(self.latest_ticket)
    }

    /// Replace the whole collection. Returns false (and changes nothing) when
    /// a newer refresh was issued after this ticket.
    pub fn apply_snapshot(&mut self, ticket: RefreshTicket, records: Vec<MaterialRequest>) -> bool {
        if ticket.0 < self.latest_ticket {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest_ticket,
                "dropping stale snapshot"
            );
            return false;
        }

        debug_assert!(
            ids_are_unique(&records),
            "snapshot contains duplicate material ids"
        );

        self.records = records;
        self.version += 1;
        true
    }
}

fn ids_are_unique(records: &[MaterialRequest]) -> bool {
    let mut seen = std::collections::HashSet::new();
    records.iter().all(|r| seen.insert(r.material_id.as_str()))
}
