//! Status list behavior across every supported width.

use sdvc_status::{BitsPerStatus, SharedStatusList, StatusError, StatusList, StatusListClaim, StatusType};

const WIDTHS: [BitsPerStatus; 4] = [
    BitsPerStatus::One,
    BitsPerStatus::Two,
    BitsPerStatus::Four,
    BitsPerStatus::Eight,
];

/// A repeatable pseudo-random sequence in range for `bits`.
fn values(len: usize, bits: BitsPerStatus) -> Vec<u8> {
    let mut state = 0x2545_f491u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as u8) & bits.max_value()
        })
        .collect()
}

#[test]
fn packed_length_is_minimal() {
    for bits in WIDTHS {
        for len in [1usize, 7, 8, 9, 15, 16, 17, 100] {
            let list = StatusList::new(&vec![0; len], bits).unwrap();
            assert_eq!(list.as_bytes().len(), (len * bits.bits() as usize).div_ceil(8));
        }
    }
}

#[test]
fn transport_preserves_every_entry() {
    for bits in WIDTHS {
        for len in [1usize, 3, 8, 33, 1000] {
            let original = values(len, bits);
            let list = StatusList::new(&original, bits).unwrap();
            let decoded = StatusList::decode_with_len(&list.encode().unwrap(), bits, len).unwrap();
            assert_eq!(decoded.iter().collect::<Vec<_>>(), original, "bits={bits} len={len}");
            assert_eq!(decoded, list);
        }
    }
}

#[test]
fn set_touches_only_its_own_slot() {
    for bits in WIDTHS {
        let len = 24;
        let mut list = StatusList::filled(len, bits, bits.max_value()).unwrap();
        for target in 0..len {
            list.set(target, 0).unwrap();
            for i in 0..len {
                let expected = if i <= target { 0 } else { bits.max_value() };
                assert_eq!(list.get(i).unwrap(), expected, "bits={bits} target={target} i={i}");
            }
        }
    }
}

#[test]
fn bounds_and_width_checks() {
    for bits in WIDTHS {
        let mut list = StatusList::filled(10, bits, 0).unwrap();
        assert_eq!(
            list.set(10, 0),
            Err(StatusError::IndexOutOfRange { index: 10, len: 10 })
        );
        assert_eq!(
            list.get(10),
            Err(StatusError::IndexOutOfRange { index: 10, len: 10 })
        );
        if bits != BitsPerStatus::Eight {
            let too_big = bits.max_value() + 1;
            assert_eq!(
                list.set(0, too_big),
                Err(StatusError::ValueOutOfRange {
                    value: too_big,
                    bits: bits.bits()
                })
            );
        }
        assert_eq!(StatusList::new(&[], bits), Err(StatusError::Capacity));
    }
}

#[test]
fn decode_without_length_uses_whole_buffer() {
    let list = StatusList::new(&[1, 2, 3], BitsPerStatus::Two).unwrap();
    let decoded = StatusList::decode(&list.encode().unwrap(), BitsPerStatus::Two).unwrap();
    assert_eq!(decoded.len(), 4);
    assert_eq!(decoded.iter().collect::<Vec<_>>(), vec![1, 2, 3, 0]);
}

#[test]
fn malformed_transport_is_decode_error() {
    for input in ["", "!!!not-base64!!!", "AAAA"] {
        assert!(matches!(
            StatusList::decode(input, BitsPerStatus::One),
            Err(StatusError::Decode(_))
        ));
    }
    let list = StatusList::new(&[1; 16], BitsPerStatus::One).unwrap();
    assert!(matches!(
        StatusList::decode_with_len(&list.encode().unwrap(), BitsPerStatus::One, 40),
        Err(StatusError::Decode(_))
    ));
}

#[test]
fn revocation_scenario() {
    // 10 credentials, 2 bits each, all slots unallocated until issued
    let shared = SharedStatusList::new(StatusList::filled(10, BitsPerStatus::Two, 3).unwrap());
    assert_eq!(shared.status(4).unwrap(), StatusType::Unallocated);

    shared.set(4, 0).unwrap();
    shared.set(5, 0).unwrap();
    shared.set(5, 2).unwrap();

    let claim = StatusListClaim::from_list(&shared.snapshot().unwrap()).unwrap();
    let received = claim.to_list().unwrap();
    let bits = received.bits();
    assert_eq!(StatusType::from_value(received.get(4).unwrap(), bits), StatusType::Valid);
    assert_eq!(StatusType::from_value(received.get(5).unwrap(), bits), StatusType::Revoked);
    assert_eq!(StatusType::from_value(received.get(6).unwrap(), bits), StatusType::Unallocated);
}
