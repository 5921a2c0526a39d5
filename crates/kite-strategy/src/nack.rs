//! NACK aggregation across out-records
//!
//! After every incoming NACK the strategy looks at all upstreams of the
//! entry and decides whether to keep waiting, to answer a single
//! bidirectional face, or to answer every downstream.

use kite_core::{FaceId, NackReason};
use kite_tables::PitEntry;

/// What to do with an entry after a NACK arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NackDisposition {
    /// Some upstreams have not answered yet
    Wait { pending: usize },
    /// The only unanswered upstream is also a downstream
    Bidirectional { face: FaceId, reason: NackReason },
    /// Every upstream NACKed
    All { reason: NackReason },
}

/// Classify `entry` by the NACK state of its out-records
///
/// The reason reported downstream is the least severe one received.
pub fn classify(entry: &PitEntry) -> NackDisposition {
    let mut pending = 0;
    let mut last_pending = None;
    let mut reason = NackReason::None;

    for record in entry.out_records() {
        match record.incoming_nack() {
            None => {
                pending += 1;
                last_pending = Some(record.face());
            }
            Some(received) => {
                if received.is_less_severe(reason) {
                    reason = received;
                }
            }
        }
    }

    if pending == 1
        && let Some(face) = last_pending
        && entry.in_record(face).is_some()
    {
        return NackDisposition::Bidirectional { face, reason };
    }
    if pending > 0 {
        return NackDisposition::Wait { pending };
    }
    NackDisposition::All { reason }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use kite_core::{Face, Interest, Name, PitToken};
    use kite_tables::Pit;

    use super::*;

    fn entry_with(out: &[(u64, Option<NackReason>)], downstream: &[u64]) -> (Pit, PitToken) {
        let now = Instant::now();
        let interest = Interest::new(Name::parse("/mp/1").unwrap()).with_nonce(1);
        let mut pit = Pit::new();
        let (token, _) = pit.insert(&interest);
        let entry = pit.get_mut(token).unwrap();
        for face in downstream {
            entry.insert_or_update_in_record(Face::remote(*face), &interest, now);
        }
        for (face, nack) in out {
            let record = entry.insert_or_update_out_record(FaceId(*face), &interest, now);
            if let Some(reason) = nack {
                record.set_incoming_nack(1, *reason);
            }
        }
        (pit, token)
    }

    #[test]
    fn test_all_nacked_least_severe() {
        let (pit, token) = entry_with(
            &[
                (2, Some(NackReason::NoRoute)),
                (3, Some(NackReason::Congestion)),
                (4, Some(NackReason::Duplicate)),
            ],
            &[1],
        );
        assert_eq!(
            classify(pit.get(token).unwrap()),
            NackDisposition::All {
                reason: NackReason::Congestion
            }
        );
    }

    #[test]
    fn test_wait_for_pending() {
        let (pit, token) = entry_with(&[(2, Some(NackReason::NoRoute)), (3, None)], &[1]);
        assert_eq!(
            classify(pit.get(token).unwrap()),
            NackDisposition::Wait { pending: 1 }
        );

        let (pit, token) = entry_with(&[(2, None), (3, None)], &[1]);
        assert_eq!(
            classify(pit.get(token).unwrap()),
            NackDisposition::Wait { pending: 2 }
        );
    }

    #[test]
    fn test_bidirectional() {
        let (pit, token) = entry_with(&[(2, Some(NackReason::NoRoute)), (1, None)], &[1]);
        assert_eq!(
            classify(pit.get(token).unwrap()),
            NackDisposition::Bidirectional {
                face: FaceId(1),
                reason: NackReason::NoRoute
            }
        );
    }
}
