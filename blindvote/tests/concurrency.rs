mod common;

use blindvote::*;
use std::sync::Arc;
use std::thread;

#[test]
fn racing_requests_for_one_id_issue_once() {
    common::init_tracing();
    let mut rng = rand::thread_rng();
    let authority = ElectionKeyPair::generate(512, &mut rng).unwrap();
    let public = authority.public_parts();
    let issuer = Arc::new(CredentialIssuer::new(authority, vec![1], ()));

    // Every thread holds a valid liveness proof for its own key
    let requests: Vec<CredentialRequest> = (0..8u32)
        .map(|i| {
            let voter = VoterKeyPair::generate(512, &mut rng).unwrap();
            let blinded_mark = blind(&BigUint::from(20_000u32 + i), &BigUint::from(11_111u32), &public);
            CredentialRequest {
                id: 1,
                liveness_signature: voter.sign_liveness(&blinded_mark).unwrap(),
                verification_key: voter.public_key(),
                blinded_mark,
            }
        })
        .collect();

    let handles: Vec<_> = requests
        .into_iter()
        .map(|request| {
            let issuer = Arc::clone(&issuer);
            thread::spawn(move || issuer.request_credential(&request))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let issued = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(Error::DuplicateRequest(1))))
        .count();

    assert_eq!(issued, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(issuer.served(), 1);
}

#[test]
fn concurrent_revisions_keep_the_tally_consistent() {
    common::init_tracing();
    let (public, signer) = common::toy_key();
    let ballot_box = Arc::new(BallotBox::new(vec![1, 2, 3], public, MarkRange { low: 2, high: 3000 }));

    let marks: Vec<u32> = (100..120).collect();
    for mark in marks.iter() {
        let mark = BigUint::from(*mark);
        ballot_box
            .cast_vote(&CastPayload {
                credential: Some(raw_sign(&mark, &signer)),
                mark,
                candidate: 1,
                mode: CastMode::Initial,
            })
            .unwrap();
    }

    let handles: Vec<_> = (0..4u32)
        .map(|t| {
            let ballot_box = Arc::clone(&ballot_box);
            let signer = signer.clone();
            let marks = marks.clone();
            thread::spawn(move || {
                for round in 0..25u32 {
                    for mark in marks.iter() {
                        let mark = BigUint::from(*mark);
                        let candidate = 1 + (t + round + mark.bits() as u32) % 3;
                        ballot_box
                            .cast_vote(&CastPayload {
                                credential: Some(raw_sign(&mark, &signer)),
                                mark,
                                candidate,
                                mode: CastMode::Revision,
                            })
                            .unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Still one ballot per mark, and the totals agree with the ledger
    let results = ballot_box.results();
    assert_eq!(results.num_ballots, marks.len());
    assert_eq!(results.totals.values().sum::<u64>(), marks.len() as u64);

    let ledger = ballot_box.ledger();
    for (candidate, total) in results.totals.iter() {
        let recorded = ledger.values().filter(|c| *c == candidate).count() as u64;
        assert_eq!(recorded, *total);
    }
}
