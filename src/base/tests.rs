use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;

#[test]
fn test_net_error_roundtrip() {
    // Standard Chromium error
    let original = NetError::ConnectionRefused;
    let code = original.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    // Chunked framing error
    let chunked = NetError::InvalidChunkedEncoding;
    assert!(matches!(
        NetError::from(chunked.as_i32()),
        NetError::InvalidChunkedEncoding
    ));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
    assert_eq!(err.as_i32(), -9999);
}

#[test]
fn test_payload_variants_share_codes() {
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    let err = NetError::connection_failed_to("example.com", 80, io);
    assert_eq!(err.as_i32(), NetError::ConnectionFailed.as_i32());
    assert!(matches!(NetError::from(err.as_i32()), NetError::ConnectionFailed));
}

#[test]
fn test_custom_codes_avoid_blob_range() {
    // Chromium reserves -900..=-906 for blob errors
    let blob_range = -906..=-900;
    for err in [
        NetError::RelativeUrl("/x".into()),
        NetError::PartialWrite { sent: 1, expected: 2 },
        NetError::SocketOptionFailed,
        NetError::TaskFailed("boom".into()),
    ] {
        assert!(!blob_range.contains(&err.as_i32()));
    }
}

#[test]
fn test_configuration_errors() {
    assert!(NetError::UnknownUrlScheme("ftp".into()).is_configuration_error());
    assert!(NetError::RelativeUrl("/a".into()).is_configuration_error());
    assert!(!NetError::ConnectionFailed.is_configuration_error());
}

#[test]
fn test_socket_io_mapping() {
    use std::io::{Error, ErrorKind};
    assert!(matches!(
        NetError::from_socket_io(&Error::new(ErrorKind::WouldBlock, "x")),
        NetError::ConnectionTimedOut
    ));
    assert!(matches!(
        NetError::from_socket_io(&Error::new(ErrorKind::ConnectionReset, "x")),
        NetError::ConnectionReset
    ));
}

#[test]
fn test_load_state_connected() {
    assert!(!LoadState::default().is_connected());
    assert!(LoadState::Sent.is_connected());
    assert!(!LoadState::Done.is_connected());
}
