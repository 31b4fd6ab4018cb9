// tests/property/codec_test.rs

//! Property-based tests for the RESP codec
//! Tests that frames survive the wire in one piece or split across reads

use bytes::{Bytes, BytesMut};
use carade::core::protocol::{RespFrame, RespFrameCodec};
use proptest::prelude::*;
use tokio_util::codec::Decoder;

fn leaf_frame() -> impl Strategy<Value = RespFrame> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,32}".prop_map(RespFrame::SimpleString),
        "[a-zA-Z0-9 ]{0,32}".prop_map(RespFrame::Error),
        any::<i64>().prop_map(RespFrame::Integer),
        prop::collection::vec(any::<u8>(), 0..256)
            .prop_map(|b| RespFrame::BulkString(Bytes::from(b))),
        Just(RespFrame::Null),
        Just(RespFrame::NullArray),
    ]
}

fn frame() -> impl Strategy<Value = RespFrame> {
    leaf_frame().prop_recursive(3, 64, 8, |inner| {
        prop::collection::vec(inner, 0..8).prop_map(RespFrame::Array)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_encoded_frame_decodes_to_itself(original in frame()) {
        let encoded = original.encode_to_vec().unwrap();
        let mut buf = BytesMut::from(&encoded[..]);
        let decoded = RespFrameCodec.decode(&mut buf).unwrap();
        prop_assert_eq!(decoded, Some(original));
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn test_split_frames_wait_for_more_data(
        frames in prop::collection::vec(frame(), 1..6),
        split in any::<prop::sample::Index>()
    ) {
        let mut wire = Vec::new();
        for f in &frames {
            wire.extend(f.encode_to_vec().unwrap());
        }
        let cut = split.index(wire.len());

        let mut codec = RespFrameCodec;
        let mut buf = BytesMut::from(&wire[..cut]);
        let mut decoded = Vec::new();
        while let Some(f) = codec.decode(&mut buf).unwrap() {
            decoded.push(f);
        }
        buf.extend_from_slice(&wire[cut..]);
        while let Some(f) = codec.decode(&mut buf).unwrap() {
            decoded.push(f);
        }
        prop_assert_eq!(decoded, frames);
    }
}
