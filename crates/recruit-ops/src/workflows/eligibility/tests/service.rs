use super::common::*;
use crate::workflows::eligibility::activity::{
    ActivityKind, Communication, CommunicationChannel,
};
use crate::workflows::eligibility::domain::{
    BlockDuration, BlockSource, CandidateEligibilityStatus, OfferId, OfferStatus,
    ScreeningBlockReason, ScreeningResult,
};
use crate::workflows::eligibility::offers::{OfferIssue, OfferResponse, OfferTransitionError};
use crate::workflows::eligibility::store::{
    CandidateRepository, InMemoryCandidateRepository, RepositoryError,
};
use crate::workflows::eligibility::{
    EligibilityError, EligibilityService, EligibilityServiceError, OfferOutcome, PolicyConfig,
    ScreeningBlockRequest,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

fn decline(
    service: &MemoryService,
    code: &str,
    salary: u32,
    location: &str,
    now: DateTime<Utc>,
) -> OfferOutcome {
    let offer = service
        .create_offer(&draft(code, salary, location, now.date_naive()), ACTOR, now)
        .expect("offer created");
    service
        .respond_to_offer(&id(code), &offer.offer_id, OfferResponse::Declined, ACTOR, now)
        .expect("decline recorded")
}

#[test]
fn import_skips_candidates_already_registered() {
    let (service, repository, _) = build_service();
    service
        .register_selection(&selection("CAND-0001"))
        .expect("first registration");

    let registered = service
        .import_selections(&[selection("CAND-0001"), selection("CAND-0002")])
        .expect("import succeeds");

    assert_eq!(registered, 1);
    assert_eq!(repository.list().expect("list").len(), 2);
    let stored = repository
        .fetch(&id("CAND-0002"))
        .expect("fetch")
        .expect("record present");
    assert_eq!(stored.expectations, Some(expectations()));
}

#[test]
fn second_qualifying_decline_blocks_candidate_in_the_same_write() {
    let (service, repository, activity) = seeded_service(&["CAND-0001"]);

    let first = decline(&service, "CAND-0001", 95_000, "Bengaluru", at(2024, 1, 10));
    assert!(first.block.is_none());
    assert_eq!(first.offer.decline_count, 1);

    let second = decline(&service, "CAND-0001", 92_000, "bengaluru", at(2024, 1, 15));
    let block = second.block.expect("blocked on second qualifying decline");
    assert_eq!(second.offer.decline_count, 2);
    assert_eq!(block.source, BlockSource::OfferDeclines);
    assert_eq!(block.block_end, at(2024, 7, 15));
    assert_eq!(
        block.reason,
        "Declined 2 job offers that met salary and location requirements"
    );

    let stored = repository
        .fetch(&id("CAND-0001"))
        .expect("fetch")
        .expect("record present");
    assert_eq!(stored.block, Some(block));
    assert_eq!(stored.offers.len(), 2);
    assert!(activity
        .events()
        .iter()
        .any(|event| event.kind == ActivityKind::CandidateBlocked));
}

#[test]
fn non_qualifying_declines_are_counted_but_never_block() {
    let (service, _, _) = seeded_service(&["CAND-0001"]);

    let underpaid = decline(&service, "CAND-0001", 70_000, "Bengaluru", at(2024, 1, 10));
    let elsewhere = decline(&service, "CAND-0001", 95_000, "Pune", at(2024, 1, 11));
    let qualifying = decline(&service, "CAND-0001", 95_000, "Bengaluru", at(2024, 1, 12));

    assert!(underpaid.block.is_none());
    assert!(elsewhere.block.is_none());
    assert!(qualifying.block.is_none());
    assert_eq!(qualifying.offer.decline_count, 3);
    assert_eq!(
        service
            .get_status(&id("CAND-0001"), at(2024, 1, 12))
            .expect("status"),
        CandidateEligibilityStatus::Active
    );
}

#[test]
fn late_decline_of_an_older_offer_keeps_the_original_block_end() {
    let (service, repository, _) = seeded_service(&["CAND-0001"]);
    let sent = at(2024, 1, 10);
    let offers: Vec<_> = (0..3)
        .map(|_| {
            let draft = draft("CAND-0001", 95_000, "Bengaluru", sent.date_naive());
            service
                .create_offer(&draft, ACTOR, sent)
                .expect("offer created")
        })
        .collect();
    let respond = |index: usize, now: DateTime<Utc>| {
        service
            .respond_to_offer(
                &id("CAND-0001"),
                &offers[index].offer_id,
                OfferResponse::Declined,
                ACTOR,
                now,
            )
            .expect("decline recorded")
    };

    assert!(respond(0, at(2024, 1, 11)).block.is_none());
    let block = respond(1, at(2024, 1, 12)).block.expect("blocked at the threshold");
    assert_eq!(block.block_end, at(2024, 7, 12));

    let third = respond(2, at(2024, 3, 1));
    assert!(third.block.is_none());
    assert!(!third.decision.is_block());
    assert_eq!(third.offer.decline_count, 3);

    let stored = repository
        .fetch(&id("CAND-0001"))
        .expect("fetch")
        .expect("record present");
    assert_eq!(stored.block, Some(block));
    assert_eq!(
        service
            .days_remaining(&id("CAND-0001"), at(2024, 7, 11))
            .expect("days remaining"),
        1
    );
}

#[test]
fn declines_before_an_unblock_do_not_carry_over() {
    let (service, _, _) = seeded_service(&["CAND-0001"]);
    decline(&service, "CAND-0001", 95_000, "Bengaluru", at(2024, 1, 10));
    decline(&service, "CAND-0001", 95_000, "Bengaluru", at(2024, 1, 15));

    let report = service
        .bulk_unblock(&[id("CAND-0001")], ACTOR, at(2024, 7, 16))
        .expect("bulk unblock");
    assert_eq!(report.unblocked, vec![id("CAND-0001")]);

    let after = decline(&service, "CAND-0001", 95_000, "Bengaluru", at(2024, 7, 20));
    assert!(after.block.is_none());
    assert_eq!(after.offer.decline_count, 3);
}

#[test]
fn accepted_offers_take_no_action() {
    let (service, _, activity) = seeded_service(&["CAND-0001"]);
    let now = at(2024, 2, 1);
    let offer = service
        .create_offer(&draft("CAND-0001", 95_000, "Bengaluru", now.date_naive()), ACTOR, now)
        .expect("offer created");

    let outcome = service
        .respond_to_offer(&id("CAND-0001"), &offer.offer_id, OfferResponse::Accepted, ACTOR, now)
        .expect("accepted");

    assert_eq!(outcome.offer.status, OfferStatus::Accepted);
    assert_eq!(outcome.offer.decline_count, 0);
    assert!(!outcome.decision.is_block());
    assert_eq!(
        activity.events().last().map(|event| event.kind),
        Some(ActivityKind::OfferAccepted)
    );
}

#[test]
fn answered_and_unknown_offers_are_rejected() {
    let (service, _, _) = seeded_service(&["CAND-0001"]);
    let now = at(2024, 2, 1);
    let offer = service
        .create_offer(&draft("CAND-0001", 95_000, "Bengaluru", now.date_naive()), ACTOR, now)
        .expect("offer created");
    service
        .respond_to_offer(&id("CAND-0001"), &offer.offer_id, OfferResponse::Expired, ACTOR, now)
        .expect("expired");

    match service.respond_to_offer(
        &id("CAND-0001"),
        &offer.offer_id,
        OfferResponse::Declined,
        ACTOR,
        now,
    ) {
        Err(EligibilityServiceError::OfferTransition(OfferTransitionError::NotPending {
            status,
            ..
        })) => assert_eq!(status, OfferStatus::Expired),
        other => panic!("expected not pending, got {other:?}"),
    }

    match service.respond_to_offer(
        &id("CAND-0001"),
        &OfferId("offer-missing".to_string()),
        OfferResponse::Declined,
        ACTOR,
        now,
    ) {
        Err(EligibilityServiceError::OfferTransition(OfferTransitionError::UnknownOffer(_))) => {}
        other => panic!("expected unknown offer, got {other:?}"),
    }
}

#[test]
fn blocked_candidates_cannot_receive_offers() {
    let (service, repository, _) = seeded_service(&[]);
    repository
        .insert(blocked_record("CAND-0001", at(2024, 1, 20), BlockDuration::SixMonths))
        .expect("seed blocked");
    let now = at(2024, 2, 1);

    match service.create_offer(&draft("CAND-0001", 95_000, "Bengaluru", now.date_naive()), ACTOR, now) {
        Err(EligibilityServiceError::CandidateBlocked { status, .. }) => {
            assert_eq!(status, CandidateEligibilityStatus::Blocked)
        }
        other => panic!("expected blocked candidate, got {other:?}"),
    }

    let later = at(2024, 8, 1);
    match service.create_offer(&draft("CAND-0001", 95_000, "Bengaluru", later.date_naive()), ACTOR, later) {
        Err(EligibilityServiceError::CandidateBlocked { status, .. }) => {
            assert_eq!(status, CandidateEligibilityStatus::ReadyForUnblock)
        }
        other => panic!("expected ready-for-unblock candidate to be refused, got {other:?}"),
    }
}

#[test]
fn invalid_offer_drafts_never_reach_the_store() {
    let (service, repository, activity) = seeded_service(&["CAND-0001"]);
    let now = at(2024, 2, 1);
    let mut invalid = draft("CAND-0001", 95_000, "Bengaluru", now.date_naive());
    invalid.benefits.clear();

    match service.create_offer(&invalid, ACTOR, now) {
        Err(EligibilityServiceError::OfferValidation(error)) => {
            assert_eq!(error.issues, vec![OfferIssue::NoBenefits])
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let stored = repository
        .fetch(&id("CAND-0001"))
        .expect("fetch")
        .expect("record present");
    assert!(stored.offers.is_empty());
    assert!(activity.events().is_empty());
}

#[test]
fn offers_for_unknown_candidates_are_rejected() {
    let (service, _, _) = build_service();
    let now = at(2024, 2, 1);

    match service.create_offer(&draft("CAND-0404", 95_000, "Bengaluru", now.date_naive()), ACTOR, now) {
        Err(EligibilityServiceError::Eligibility(EligibilityError::UnknownCandidate(candidate))) => {
            assert_eq!(candidate, id("CAND-0404"))
        }
        other => panic!("expected unknown candidate, got {other:?}"),
    }
}

#[test]
fn failed_screening_records_result_and_block_together() {
    let (service, repository, activity) = seeded_service(&["CAND-0001"]);
    let now = at(2024, 3, 4);

    let outcome = service
        .record_screening(
            &id("CAND-0001"),
            ScreeningResult::Failed,
            Some("Could not explain prior projects".to_string()),
            Some(ScreeningBlockRequest {
                reason: ScreeningBlockReason::FailedTechnicalAssessment,
                duration_months: Some(3),
            }),
            ACTOR,
            now,
        )
        .expect("screening recorded");

    let block = outcome.block.expect("failed screening blocks");
    assert_eq!(block.reason, "Failed technical assessment");
    assert_eq!(block.source, BlockSource::ScreeningFailure);
    assert_eq!(block.duration, BlockDuration::ThreeMonths);

    let stored = repository
        .fetch(&id("CAND-0001"))
        .expect("fetch")
        .expect("record present");
    assert_eq!(stored.version, 1);
    assert_eq!(
        stored.screening.map(|screening| screening.result),
        Some(ScreeningResult::Failed)
    );
    assert!(stored.block.is_some());

    let kinds: Vec<_> = activity.events().iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![ActivityKind::ScreeningRecorded, ActivityKind::CandidateBlocked]
    );
}

#[test]
fn failed_screening_without_reason_is_rejected() {
    let (service, repository, _) = seeded_service(&["CAND-0001"]);

    let result = service.record_screening(
        &id("CAND-0001"),
        ScreeningResult::Failed,
        None,
        None,
        ACTOR,
        at(2024, 3, 4),
    );

    assert!(matches!(
        result,
        Err(EligibilityServiceError::Eligibility(EligibilityError::EmptyReason))
    ));
    let stored = repository
        .fetch(&id("CAND-0001"))
        .expect("fetch")
        .expect("record present");
    assert!(stored.screening.is_none());
}

#[test]
fn pending_screening_puts_candidate_under_review() {
    let (service, _, _) = seeded_service(&["CAND-0001"]);
    let now = at(2024, 3, 4);

    let outcome = service
        .record_screening(&id("CAND-0001"), ScreeningResult::Pending, None, None, ACTOR, now)
        .expect("screening recorded");
    assert!(outcome.block.is_none());

    let projection = service.project(&id("CAND-0001"), now).expect("projection");
    assert_eq!(projection.status, CandidateEligibilityStatus::UnderReview);
    assert_eq!(
        service.get_status(&id("CAND-0001"), now).expect("status"),
        CandidateEligibilityStatus::Active
    );
}

#[test]
fn manual_block_validates_before_writing() {
    let (service, repository, activity) = seeded_service(&["CAND-0001"]);

    for months in [0, 4] {
        match service.block_manually(&id("CAND-0001"), "Falsified references", months, ACTOR, at(2024, 3, 1)) {
            Err(EligibilityServiceError::Eligibility(EligibilityError::InvalidDuration { months: rejected })) => {
                assert_eq!(rejected, months)
            }
            other => panic!("expected invalid duration, got {other:?}"),
        }
    }
    assert!(matches!(
        service.block_manually(&id("CAND-0001"), "", 6, ACTOR, at(2024, 3, 1)),
        Err(EligibilityServiceError::Eligibility(EligibilityError::EmptyReason))
    ));

    let stored = repository
        .fetch(&id("CAND-0001"))
        .expect("fetch")
        .expect("record present");
    assert!(stored.block.is_none());
    assert!(activity.events().is_empty());
}

#[test]
fn manual_block_and_unblock_round_trip() {
    let (service, _, activity) = seeded_service(&["CAND-0001"]);

    let block = service
        .block_manually(&id("CAND-0001"), "Falsified references", 12, ACTOR, at(2024, 3, 1))
        .expect("blocked");
    assert_eq!(block.block_end, at(2025, 3, 1));
    assert_eq!(service.days_remaining(&id("CAND-0001"), at(2024, 3, 1)).expect("days"), 365);

    let removed = service
        .remove_block(&id("CAND-0001"), ACTOR, at(2024, 3, 2))
        .expect("unblocked");
    assert_eq!(removed, Some(block));
    assert_eq!(
        service.get_status(&id("CAND-0001"), at(2024, 3, 2)).expect("status"),
        CandidateEligibilityStatus::Active
    );

    let again = service
        .remove_block(&id("CAND-0001"), ACTOR, at(2024, 3, 3))
        .expect("no-op");
    assert!(again.is_none());

    let unblock_events: Vec<_> = activity
        .events()
        .into_iter()
        .filter(|event| event.kind == ActivityKind::CandidateUnblocked)
        .collect();
    assert_eq!(unblock_events.len(), 1);
    assert_eq!(unblock_events[0].details.get("early").map(String::as_str), Some("true"));
}

#[test]
fn communications_are_logged_for_known_candidates() {
    let (service, _, _) = seeded_service(&["CAND-0001"]);
    let communication = Communication {
        channel: CommunicationChannel::Phone,
        subject: "Offer walkthrough".to_string(),
        notes: "Asked about relocation support".to_string(),
    };

    let event = service
        .log_communication(&id("CAND-0001"), &communication, ACTOR, at(2024, 3, 1))
        .expect("logged");
    assert_eq!(event.summary, "Phone: Offer walkthrough");
    assert_eq!(
        event.details.get("notes").map(String::as_str),
        Some("Asked about relocation support")
    );

    assert!(matches!(
        service.log_communication(&id("CAND-0404"), &communication, ACTOR, at(2024, 3, 1)),
        Err(EligibilityServiceError::Eligibility(EligibilityError::UnknownCandidate(_)))
    ));

    let blank = Communication {
        subject: " ".to_string(),
        ..communication
    };
    assert!(matches!(
        service.log_communication(&id("CAND-0001"), &blank, ACTOR, at(2024, 3, 1)),
        Err(EligibilityServiceError::EmptySubject)
    ));
}

#[test]
fn recent_activity_is_newest_first_and_limited() {
    let (service, _, _) = seeded_service(&["CAND-0001", "CAND-0002"]);
    service
        .block_manually(&id("CAND-0001"), "Falsified references", 6, ACTOR, at(2024, 3, 1))
        .expect("blocked");
    service
        .block_manually(&id("CAND-0002"), "Repeated no-shows", 3, ACTOR, at(2024, 3, 2))
        .expect("blocked");

    let recent = service.recent_activity(1).expect("activity");

    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].candidate_id, id("CAND-0002"));
}

#[test]
fn activity_outage_surfaces_after_the_block_is_stored() {
    let repository = Arc::new(InMemoryCandidateRepository::default());
    repository.insert(record("CAND-0001")).expect("seed");
    let service = EligibilityService::new(
        repository.clone(),
        Arc::new(OfflineActivity),
        PolicyConfig::default(),
    );

    let result =
        service.block_manually(&id("CAND-0001"), "Falsified references", 6, ACTOR, at(2024, 3, 1));

    assert!(matches!(result, Err(EligibilityServiceError::Activity(_))));
    assert_eq!(
        service.get_status(&id("CAND-0001"), at(2024, 3, 2)).expect("status"),
        CandidateEligibilityStatus::Blocked
    );
}

#[test]
fn repository_outage_propagates_from_reads() {
    let service = EligibilityService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryActivity::default()),
        PolicyConfig::default(),
    );

    assert!(matches!(
        service.dashboard(at(2024, 3, 1)),
        Err(EligibilityServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}
