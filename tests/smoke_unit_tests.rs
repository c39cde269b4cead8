//! Smoke Screen Unit tests for material request system components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path.
//!
#![allow(unused_imports)]

use chrono::Utc;
use material_requests::{
    error::ValidationError,
    lifecycle::{TransitionEvent, request_transition},
    material::{MaterialRequest, Status, TimeStamp},
    session::Persona,
    view::{FilterSpec, RequestCounts, StatusCounts, paginate, total_pages, visible_for},
};

fn record(material_id: &str, status: Status) -> MaterialRequest {
    let created = TimeStamp::new_with(2024, 6, 15, 10, 30, 0);
    MaterialRequest {
        material_id: material_id.to_string(),
        request_id: format!("req-{material_id}"),
        material_number: match status {
            Status::CompletedByIma => format!("M-{material_id}"),
            _ => String::new(),
        },
        material_name: "Steel Beam".to_string(),
        material_description: "Structural beam".to_string(),
        vendor: "V1".to_string(),
        plant: "P1".to_string(),
        status,
        created_at: created.clone(),
        created_by: "materialsearch".to_string(),
        modified_at: created,
        modified_by: "materialsearch".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
    }
}

// LIFECYCLE MODULE TESTS
#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    /// Test that an approver can move a pending request to the IMA step
    #[test]
    fn send_email_moves_pending_to_ima() {
        let pending = record("MAT_REQ_000001", Status::PendingApproval);

        let command = request_transition(
            &pending,
            &TransitionEvent::SendEmailToIma,
            Persona::Approver,
            "materialapprover",
        )
        .unwrap();

        assert_eq!(command.material_id, "MAT_REQ_000001");
        assert_eq!(command.patch.status, Status::PendingIma);
        assert_eq!(command.patch.material_number, None);
        assert_eq!(command.patch.modified_by, "materialapprover");
    }

    /// Test that non-approver personas are rejected before state is checked
    #[test]
    fn transitions_require_approver_persona() {
        let pending = record("MAT_REQ_000001", Status::PendingApproval);

        for persona in [Persona::Search, Persona::Analyst] {
            let result = request_transition(
                &pending,
                &TransitionEvent::SendEmailToIma,
                persona,
                "someone",
            );
            assert_eq!(result.unwrap_err(), ValidationError::NotPermitted(persona));
        }
    }

    /// Test that the email step cannot be repeated
    #[test]
    fn send_email_twice_is_rejected() {
        let emailed = record("MAT_REQ_000001", Status::PendingIma);

        let result = request_transition(
            &emailed,
            &TransitionEvent::SendEmailToIma,
            Persona::Approver,
            "materialapprover",
        );

        assert_eq!(result.unwrap_err(), ValidationError::EmailAlreadySent);
    }

    /// Test that closing a request assigns the material number
    #[test]
    fn close_sets_material_number() {
        let pending = record("MAT_REQ_000001", Status::PendingApproval);

        let command = request_transition(
            &pending,
            &TransitionEvent::CloseRequest {
                material_number: "M-100".to_string(),
            },
            Persona::Approver,
            "materialapprover",
        )
        .unwrap();

        assert_eq!(command.patch.status, Status::CompletedByIma);
        assert_eq!(command.patch.material_number, Some("M-100".to_string()));
    }

    /// Test that a request can be closed directly from either pending status
    #[test]
    fn close_is_legal_from_both_pending_statuses() {
        for status in [Status::PendingApproval, Status::PendingIma] {
            let open = record("MAT_REQ_000001", status);
            let command = request_transition(
                &open,
                &TransitionEvent::CloseRequest {
                    material_number: "M-7".to_string(),
                },
                Persona::Approver,
                "materialapprover",
            )
            .unwrap();
            assert_eq!(command.patch.status, Status::CompletedByIma);
        }
    }

    /// Test that a blank material number rejects the close and changes nothing
    #[test]
    fn close_with_blank_number_is_rejected() {
        let pending = record("MAT_REQ_000001", Status::PendingApproval);

        let result = request_transition(
            &pending,
            &TransitionEvent::CloseRequest {
                material_number: "   ".to_string(),
            },
            Persona::Approver,
            "materialapprover",
        );

        assert_eq!(result.unwrap_err(), ValidationError::MissingMaterialNumber);
        assert_eq!(pending.status, Status::PendingApproval);
        assert_eq!(pending.material_number, "");
    }

    /// Test that surrounding whitespace is stripped from the material number
    #[test]
    fn close_trims_material_number() {
        let pending = record("MAT_REQ_000001", Status::PendingApproval);

        let command = request_transition(
            &pending,
            &TransitionEvent::CloseRequest {
                material_number: "  M-7  ".to_string(),
            },
            Persona::Approver,
            "materialapprover",
        )
        .unwrap();

        assert_eq!(command.patch.material_number, Some("M-7".to_string()));
    }

    /// Test that a completed request is terminal for both events
    #[test]
    fn completed_requests_are_terminal() {
        let completed = record("MAT_REQ_000001", Status::CompletedByIma);

        let email = request_transition(
            &completed,
            &TransitionEvent::SendEmailToIma,
            Persona::Approver,
            "materialapprover",
        );
        assert_eq!(email.unwrap_err(), ValidationError::AlreadyCompleted);

        let close = request_transition(
            &completed,
            &TransitionEvent::CloseRequest {
                material_number: "M-200".to_string(),
            },
            Persona::Approver,
            "materialapprover",
        );
        assert_eq!(close.unwrap_err(), ValidationError::AlreadyCompleted);
    }
}

// VIEW MODULE TESTS
#[cfg(test)]
mod visibility_tests {
    use super::*;

    fn mixed_records() -> Vec<MaterialRequest> {
        vec![
            record("MAT_REQ_000001", Status::PendingApproval),
            record("MAT_REQ_000002", Status::PendingIma),
            record("MAT_REQ_000003", Status::CompletedByIma),
            record("MAT_REQ_000004", Status::CompletedByIma),
        ]
    }

    /// Test that search users only see completed requests
    #[test]
    fn search_sees_completed_only() {
        let records = mixed_records();
        let visible = visible_for(Persona::Search, &records);

        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|r| r.status == Status::CompletedByIma));
    }

    /// Test that approvers see the open requests only
    #[test]
    fn approver_sees_open_only() {
        let records = mixed_records();
        let visible = visible_for(Persona::Approver, &records);

        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|r| r.status != Status::CompletedByIma));
    }

    /// Test that analysts see everything
    #[test]
    fn analyst_sees_everything() {
        let records = mixed_records();
        assert_eq!(visible_for(Persona::Analyst, &records).len(), records.len());
    }

    /// Test that the search and approver views split the set with no overlap
    #[test]
    fn search_and_approver_views_partition_the_set() {
        let records = mixed_records();
        let search = visible_for(Persona::Search, &records);
        let approver = visible_for(Persona::Approver, &records);

        assert_eq!(search.len() + approver.len(), records.len());
        for r in &search {
            assert!(!approver.iter().any(|o| o.material_id == r.material_id));
        }
    }
}

#[cfg(test)]
mod filter_tests {
    use super::*;

    fn subset(records: &[MaterialRequest]) -> Vec<&MaterialRequest> {
        records.iter().collect()
    }

    /// Test case-insensitive substring matching on the name clause
    #[test]
    fn name_clause_is_case_insensitive() {
        let records = vec![record("MAT_REQ_000001", Status::PendingApproval)];
        let refs = subset(&records);

        let hit = FilterSpec::new().set_material_name("sTeEl");
        let miss = FilterSpec::new().set_material_name("copper");

        assert_eq!(hit.apply(&refs).len(), 1);
        assert_eq!(miss.apply(&refs).len(), 0);
    }

    /// Test that blank and "all" sentinels disable the vendor clause
    #[test]
    fn vendor_sentinels_mean_no_constraint() {
        let records = vec![record("MAT_REQ_000001", Status::PendingApproval)];
        let refs = subset(&records);

        assert_eq!(FilterSpec::new().set_vendor("").apply(&refs).len(), 1);
        assert_eq!(FilterSpec::new().set_vendor("all").apply(&refs).len(), 1);
        assert_eq!(FilterSpec::new().set_vendor("V1").apply(&refs).len(), 1);
        assert_eq!(FilterSpec::new().set_vendor("V2").apply(&refs).len(), 0);
    }

    /// Test that the free-text search reaches all four text fields
    #[test]
    fn search_clause_spans_text_fields() {
        let mut by_number = record("MAT_REQ_000001", Status::CompletedByIma);
        by_number.material_number = "M-4711".to_string();
        let records = vec![by_number];
        let refs = subset(&records);

        assert_eq!(FilterSpec::new().set_search("4711").apply(&refs).len(), 1);
        assert_eq!(FilterSpec::new().set_search("beam").apply(&refs).len(), 1);
        assert_eq!(
            FilterSpec::new()
                .set_search("req-MAT_REQ_000001")
                .apply(&refs)
                .len(),
            1
        );
        assert_eq!(FilterSpec::new().set_search("nothing").apply(&refs).len(), 0);
    }

    /// Test that the created-at range is inclusive on both bounds
    #[test]
    fn date_range_is_inclusive() {
        let records = vec![record("MAT_REQ_000001", Status::PendingApproval)];
        let refs = subset(&records);
        let exact = TimeStamp::new_with(2024, 6, 15, 10, 30, 0);

        let on_bounds = FilterSpec::new()
            .set_created_from(exact.clone())
            .set_created_to(exact);
        assert_eq!(on_bounds.apply(&refs).len(), 1);

        let after = FilterSpec::new().set_created_from(TimeStamp::new_with(2024, 7, 1, 0, 0, 0));
        assert_eq!(after.apply(&refs).len(), 0);
    }

    /// Test that all clauses are AND-combined
    #[test]
    fn clauses_are_conjunctive() {
        let records = vec![record("MAT_REQ_000001", Status::PendingApproval)];
        let refs = subset(&records);

        let both = FilterSpec::new()
            .set_material_name("steel")
            .set_vendor("V1");
        assert_eq!(both.apply(&refs).len(), 1);

        let one_fails = FilterSpec::new()
            .set_material_name("steel")
            .set_vendor("V2");
        assert_eq!(one_fails.apply(&refs).len(), 0);
    }

    /// Test the status clause used by the per-view status dropdowns
    #[test]
    fn status_clause_matches_exactly() {
        let records = vec![
            record("MAT_REQ_000001", Status::PendingApproval),
            record("MAT_REQ_000002", Status::PendingIma),
        ];
        let refs = subset(&records);

        let filtered = FilterSpec::new()
            .set_status(Status::PendingIma)
            .apply(&refs);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].material_id, "MAT_REQ_000002");
    }

    /// Test that the default spec is the identity predicate
    #[test]
    fn default_spec_passes_everything() {
        let records = vec![
            record("MAT_REQ_000001", Status::PendingApproval),
            record("MAT_REQ_000002", Status::CompletedByIma),
        ];
        let refs = subset(&records);

        assert_eq!(FilterSpec::new().apply(&refs).len(), 2);
    }
}

#[cfg(test)]
mod pagination_tests {
    use super::*;

    /// Twelve completed records at page size ten: the second page holds the
    /// two leftovers and navigation points backwards only
    #[test]
    fn second_page_of_twelve() {
        let records: Vec<MaterialRequest> = (1..=12)
            .map(|i| record(&format!("MAT_REQ_{i:06}"), Status::CompletedByIma))
            .collect();

        let window = paginate(&records, 2, 10);

        assert_eq!(window.slice.len(), 2);
        assert_eq!(window.meta.total_pages, 2);
        assert_eq!(window.meta.start_index, 11);
        assert_eq!(window.meta.end_index, 12);
        assert!(window.meta.can_go_previous);
        assert!(!window.meta.can_go_next);
    }

    /// Test that an empty sequence still reports one page
    #[test]
    fn empty_sequence_has_one_page() {
        let window = paginate::<MaterialRequest>(&[], 1, 10);

        assert!(window.slice.is_empty());
        assert_eq!(window.meta.total_pages, 1);
        assert_eq!(window.meta.start_index, 0);
        assert_eq!(window.meta.end_index, 0);
        assert!(!window.meta.can_go_previous);
        assert!(!window.meta.can_go_next);
    }

    /// Test the display bounds of a full first page
    #[test]
    fn first_page_bounds() {
        let records: Vec<MaterialRequest> = (1..=12)
            .map(|i| record(&format!("MAT_REQ_{i:06}"), Status::CompletedByIma))
            .collect();

        let window = paginate(&records, 1, 10);

        assert_eq!(window.slice.len(), 10);
        assert_eq!(window.meta.start_index, 1);
        assert_eq!(window.meta.end_index, 10);
        assert!(!window.meta.can_go_previous);
        assert!(window.meta.can_go_next);
    }

    /// Test total_pages rounding
    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(12, 5), 3);
    }
}

#[cfg(test)]
mod counter_tests {
    use super::*;

    /// Test the status buckets over the full record set
    #[test]
    fn status_counts_bucket_by_status() {
        let records = vec![
            record("MAT_REQ_000001", Status::PendingApproval),
            record("MAT_REQ_000002", Status::PendingApproval),
            record("MAT_REQ_000003", Status::PendingIma),
            record("MAT_REQ_000004", Status::CompletedByIma),
        ];

        let counts = StatusCounts::tally(&records);

        assert_eq!(counts.requested, 2);
        assert_eq!(counts.email_sent, 1);
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.total(), records.len());
    }

    /// Test the open-request buckets over the approver subset
    #[test]
    fn request_counts_cover_open_subset_only() {
        let records = vec![
            record("MAT_REQ_000001", Status::PendingApproval),
            record("MAT_REQ_000002", Status::PendingIma),
            record("MAT_REQ_000003", Status::CompletedByIma),
        ];

        let open = visible_for(Persona::Approver, &records);
        let counts = RequestCounts::tally(&open);

        assert_eq!(counts.pending, 1);
        assert_eq!(counts.email_sent, 1);
        assert_eq!(counts.pending + counts.email_sent, open.len());
    }
}
