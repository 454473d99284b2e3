use proptest::prelude::*;

use warden_types::amount::STAKE_UNIT;
use warden_types::peer::PEER_ID_LEN;
use warden_types::{BlockHeight, ClusterPeerId, StakeAmount};

proptest! {
    /// Display form of any amount parses back to the same base units.
    #[test]
    fn stake_display_parses_back(raw in 0u64..u64::MAX) {
        let amount = StakeAmount::from_base_units(raw);
        let parsed = StakeAmount::parse_display(&amount.to_display_string()).unwrap();
        prop_assert_eq!(parsed, amount);
    }

    /// Comparing in base units agrees with comparing whole display units.
    #[test]
    fn stake_order_matches_display_order(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let sa = StakeAmount::parse_display(&a.to_string()).unwrap();
        let sb = StakeAmount::from_base_units(b * STAKE_UNIT);
        prop_assert_eq!(sa >= sb, a >= b);
    }

    /// saturating_sub never exceeds the original height and never underflows.
    #[test]
    fn height_window_start_is_bounded(h in 0u64..u64::MAX, w in 0u64..u64::MAX) {
        let start = BlockHeight::new(h).saturating_sub(w);
        prop_assert!(start <= BlockHeight::new(h));
        prop_assert_eq!(start.get(), h.saturating_sub(w));
    }

    /// Any 38-byte value is a peer id and its base58 form parses back.
    #[test]
    fn peer_id_text_form_parses_back(bytes in prop::collection::vec(any::<u8>(), PEER_ID_LEN)) {
        let peer = ClusterPeerId::from_bytes(bytes).unwrap();
        let parsed: ClusterPeerId = peer.to_base58().parse().unwrap();
        prop_assert_eq!(parsed, peer);
    }

    /// Anything that is not 38 bytes is refused.
    #[test]
    fn peer_id_wrong_length_refused(len in 0usize..128) {
        prop_assume!(len != PEER_ID_LEN);
        prop_assert!(ClusterPeerId::from_bytes(vec![7u8; len]).is_err());
    }
}
