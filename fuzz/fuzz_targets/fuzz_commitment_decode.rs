#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_protocol::codec::CommitmentInfo;
use warden_types::peer::PEER_ID_LEN;

// Decoding untrusted commitment payloads must never panic, and whatever
// decodes must survive an encode/decode cycle. Byte equality is not
// required: the decoder accepts non-canonical compact lengths.
fuzz_target!(|data: &[u8]| {
    if let Ok(info) = CommitmentInfo::decode(data) {
        let encoded = info.encode().expect("decoded fields re-encode");
        assert_eq!(CommitmentInfo::decode(&encoded).ok(), Some(info));
    }

    if let Ok(peer_id) = warden_protocol::decode_peer_id(data) {
        assert_eq!(peer_id.as_bytes().len(), PEER_ID_LEN);
        let reencoded = warden_protocol::encode(&peer_id);
        assert_eq!(
            warden_protocol::decode_peer_id(&reencoded).ok(),
            Some(peer_id)
        );
    }
});
