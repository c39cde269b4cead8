//! Service layer API for material request workflow operations
use super::error::{RequestError, ValidationError};
use super::lifecycle::{TransitionEvent, request_transition};
use super::material::{MaterialRequest, Plant, RequestDraft, TimeStamp, Vendor};
use super::record_set::RecordSet;
use super::session::{Persona, Session, User};
use super::store::RecordStore;
use super::view::{
    FilterSpec, PageMeta, RequestCounts, StatusCounts, paginate, total_pages, visible_for,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A staged transition waiting for the user's confirmation. Building one
/// performs only the cheap existence check; [`MaterialService::confirm`] is
/// the single entry point that validates and applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    SendEmailToIma {
        material_id: String,
    },
    CloseRequest {
        material_id: String,
        material_number: String,
    },
}

/// Derived state only. Recomputed atomically from (records, persona,
/// filters, page cursor) by the rebuild pipeline; never mutated directly,
/// so the page contents and the counters always describe the same snapshot.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub page_records: Vec<MaterialRequest>,
    pub meta: PageMeta,
    pub counts: StatusCounts,
    pub request_counts: RequestCounts,
}

impl ViewState {
    fn empty(page_size: usize) -> Self {
        let window = paginate::<MaterialRequest>(&[], 1, page_size);
        Self {
            page_records: Vec::new(),
            meta: window.meta,
            counts: StatusCounts::default(),
            request_counts: RequestCounts::default(),
        }
    }
}

/// The lifecycle engine. Owns the store handle, the session, the record-set
/// mirror and the derived view; every mutation round-trips through the store
/// and ends in a wholesale re-fetch, never a local patch.
pub struct MaterialService<S: RecordStore> {
    store: S,
    session: Session,
    records: RecordSet,
    filters: FilterSpec,
    page: usize,
    page_size: usize,
    view: ViewState,
}

impl<S: RecordStore> MaterialService<S> {
    pub fn new(store: S) -> Self {
        Self::with_session(store, Session::new())
    }

    pub fn with_session(store: S, session: Session) -> Self {
        let mut service = Self {
            store,
            session,
            records: RecordSet::new(),
            filters: FilterSpec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            view: ViewState::empty(DEFAULT_PAGE_SIZE),
        };
        service.rebuild();
        service
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn vendors(&self) -> Result<Vec<Vendor>, RequestError> {
        Ok(self.store.vendors()?)
    }

    pub fn plants(&self) -> Result<Vec<Plant>, RequestError> {
        Ok(self.store.plants()?)
    }

    /// Sign a user in. Switching persona is a fresh sign-in; filters and the
    /// page cursor never survive it.
    pub fn log_in(&mut self, user: User) {
        tracing::info!(username = %user.username, persona = %user.persona, "user signed in");
        self.session.log_in(user);
        self.reset_view();
    }

    pub fn log_out(&mut self) {
        self.session.log_out();
        self.reset_view();
    }

    fn reset_view(&mut self) {
        self.filters = FilterSpec::new();
        self.page = 1;
        self.rebuild();
    }

    /// Fetch the full snapshot and swap it in. On store failure the mirror
    /// keeps its previous contents; a response overtaken by a newer refresh
    /// is dropped by the ticket guard.
    pub fn refresh(&mut self) -> Result<(), RequestError> {
        let ticket = self.records.begin_refresh();
        let snapshot = match self.store.list() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "refresh failed, keeping previous records");
                return Err(err.into());
            }
        };

        if self.records.apply_snapshot(ticket, snapshot) {
            self.page = 1;
            self.rebuild();
        }
        Ok(())
    }

    /// Validate a draft and create the record. The store assigns the ids and
    /// the acknowledged write is followed by a full refresh; a failed create
    /// changes nothing locally.
    pub fn submit_request(&mut self, draft: RequestDraft) -> Result<MaterialRequest, RequestError> {
        let new_request = draft.build()?;
        let record = new_request.into_record(self.session.username(), TimeStamp::new());

        let created = self.store.create(record)?;
        tracing::info!(material_id = %created.material_id, "material request submitted");

        self.refresh()?;
        Ok(created)
    }

    pub fn stage_send_to_ima(&self, material_id: &str) -> Result<PendingAction, RequestError> {
        self.require_record(material_id)?;
        Ok(PendingAction::SendEmailToIma {
            material_id: material_id.to_string(),
        })
    }

    pub fn stage_close_request(
        &self,
        material_id: &str,
        material_number: &str,
    ) -> Result<PendingAction, RequestError> {
        self.require_record(material_id)?;
        Ok(PendingAction::CloseRequest {
            material_id: material_id.to_string(),
            material_number: material_number.to_string(),
        })
    }

    /// Apply a staged action. Validation runs here again, so a stale or
    /// hand-built action can never bypass the transition rules. On store
    /// failure the record set stays at its pre-transition state.
    pub fn confirm(&mut self, action: PendingAction) -> Result<(), RequestError> {
        let persona = self
            .session
            .persona()
            .ok_or(ValidationError::NotAuthenticated)?;
        let actor = self.session.username().to_string();

        let (material_id, event) = match action {
            PendingAction::SendEmailToIma { material_id } => {
                (material_id, TransitionEvent::SendEmailToIma)
            }
            PendingAction::CloseRequest {
                material_id,
                material_number,
            } => (material_id, TransitionEvent::CloseRequest { material_number }),
        };

        let record = self
            .records
            .get(&material_id)
            .ok_or_else(|| ValidationError::UnknownRequest(material_id.clone()))?;
        let command = request_transition(record, &event, persona, &actor)?;

        self.store.patch(&command.material_id, &command.patch)?;
        tracing::info!(
            material_id = %command.material_id,
            status = %command.patch.status,
            "transition applied"
        );

        self.refresh()
    }

    pub fn set_filters(&mut self, filters: FilterSpec) {
        self.filters = filters;
        self.page = 1;
        self.rebuild();
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(FilterSpec::new());
    }

    /// Jump to a page. Out-of-range pages are rejected, not clamped.
    pub fn set_page(&mut self, page: usize) -> Result<(), RequestError> {
        let total_pages = self.view.meta.total_pages;
        if page < 1 || page > total_pages {
            return Err(ValidationError::PageOutOfRange { page, total_pages }.into());
        }
        self.page = page;
        self.rebuild();
        Ok(())
    }

    pub fn next_page(&mut self) {
        if self.view.meta.can_go_next {
            self.page += 1;
            self.rebuild();
        }
    }

    pub fn previous_page(&mut self) {
        if self.view.meta.can_go_previous {
            self.page -= 1;
            self.rebuild();
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), RequestError> {
        if page_size == 0 {
            return Err(ValidationError::InvalidPageSize.into());
        }
        self.page_size = page_size;
        self.page = 1;
        self.rebuild();
        Ok(())
    }

    fn require_record(&self, material_id: &str) -> Result<&MaterialRequest, RequestError> {
        Ok(self
            .records
            .get(material_id)
            .ok_or_else(|| ValidationError::UnknownRequest(material_id.to_string()))?)
    }

    // The whole pipeline in one place: persona filter, attribute filter,
    // pagination, counters. Runs after every input change so the derived
    // state never straddles two snapshots.
    fn rebuild(&mut self) {
        let records = self.records.records();
        let visible = match self.session.persona() {
            Some(persona) => visible_for(persona, records),
            // nobody signed in: show nothing
            None => Vec::new(),
        };
        let filtered = self.filters.apply(&visible);

        // the input set may have shrunk since the page was chosen
        if self.page > total_pages(filtered.len(), self.page_size) {
            self.page = 1;
        }

        let window = paginate(&filtered, self.page, self.page_size);
        let approver_subset = visible_for(Persona::Approver, records);

        self.view = ViewState {
            page_records: window.slice.iter().copied().cloned().collect(),
            meta: window.meta,
            counts: StatusCounts::tally(records),
            request_counts: RequestCounts::tally(&approver_subset),
        };

        tracing::debug!(
            version = self.records.version(),
            visible = visible.len(),
            filtered = self.view.meta.total_items,
            "view rebuilt"
        );
    }
}
