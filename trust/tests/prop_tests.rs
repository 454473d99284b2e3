use proptest::prelude::*;

use warden_trust::{TrustEvaluator, TrustSet, ValidatorStanding};
use warden_types::peer::PEER_ID_LEN;
use warden_types::{BlockHeight, ClusterPeerId, PeerSet, StakeAmount, SubnetId, TrustParams};

fn peer(byte: u8) -> ClusterPeerId {
    ClusterPeerId::from_bytes(vec![byte; PEER_ID_LEN]).unwrap()
}

proptest! {
    /// After any pass the set is exactly the trusted peers plus the leader.
    #[test]
    fn set_matches_trusted_verdicts(
        passes in prop::collection::vec(
            prop::collection::vec((0u8..16, any::<bool>()), 0..20),
            1..6,
        ),
        leader in prop::option::of(0u8..16),
    ) {
        let mut set = TrustSet::new(leader.map(peer));
        for verdicts in passes {
            let before = set.peers().clone();
            let outcome = set.apply_verdicts(verdicts.iter().map(|&(b, t)| (peer(b), t)));

            let mut expected: PeerSet = verdicts
                .iter()
                .filter(|(_, t)| *t)
                .map(|&(b, _)| peer(b))
                .collect();
            if let Some(l) = leader {
                expected.insert(peer(l));
            }
            prop_assert_eq!(set.peers(), &expected);
            prop_assert_eq!(outcome.changed(), before != expected);
            if let Some(l) = leader {
                prop_assert!(!outcome.removed.contains(&peer(l)));
            }
        }
    }

    /// The window check is exactly `inscribed_at >= current - window`.
    #[test]
    fn window_check_is_inclusive(
        current in 0u64..1_000_000,
        window in 0u64..10_000,
        inscribed in 0u64..1_000_000,
    ) {
        let eval = TrustEvaluator::new(SubnetId::new(1), TrustParams::new(StakeAmount::ZERO, window));
        let standing = ValidatorStanding { uid: Some(0), has_permit: true, stake: StakeAmount::ZERO };
        let verdict = eval.judge(&standing, BlockHeight::new(inscribed), BlockHeight::new(current));
        prop_assert_eq!(verdict.is_trusted(), inscribed >= current.saturating_sub(window));
    }

    /// Stake at or above the minimum never fails the stake check.
    #[test]
    fn stake_threshold_is_monotonic(min in any::<u64>(), stake in any::<u64>()) {
        let eval = TrustEvaluator::new(
            SubnetId::new(1),
            TrustParams::new(StakeAmount::from_base_units(min), u64::MAX),
        );
        let standing = ValidatorStanding {
            uid: Some(0),
            has_permit: true,
            stake: StakeAmount::from_base_units(stake),
        };
        let verdict = eval.judge(&standing, BlockHeight::GENESIS, BlockHeight::new(1));
        prop_assert_eq!(verdict.is_trusted(), stake >= min);
    }
}
