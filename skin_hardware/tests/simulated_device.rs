use rstest::rstest;
use skin_hardware::SimulatedDevice;
use skin_traits::SerialDevice;

#[test]
fn encoded_records_round_trip_through_raw_bytes() {
    let sentinel = [0xAA, 0x55];
    let records = [(1u8, 0u8, 100i32), (1, 1, -50)];
    let script = SimulatedDevice::encode_records(&records, 8, &sentinel);
    assert_eq!(script.len(), 16);

    let mut device = SimulatedDevice::once(script, 8);
    let mut buf = [0u8; 8];
    assert_eq!(device.read(&mut buf).unwrap(), 8);
    assert_eq!(buf[0], 1);
    assert_eq!(buf[1], 0);
    assert_eq!(i32::from_le_bytes([buf[2], buf[3], buf[4], buf[5]]), 100);
    assert_eq!(&buf[6..8], &sentinel);
}

/// A `once` device must deliver the exact script bytes regardless of the
/// caller's chunk size, then signal EOF, for every chunk size that evenly
/// or unevenly divides the script length.
#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(16)]
fn once_device_delivers_full_script_at_any_chunk_size(#[case] chunk: usize) {
    let sentinel = [0xAA, 0x55];
    let records = [(1u8, 0u8, 100i32), (2, 1, -50)];
    let script = SimulatedDevice::encode_records(&records, 8, &sentinel);
    let expected_len = script.len();

    let mut device = SimulatedDevice::once(script, chunk);
    let mut collected = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = device.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&buf[..n]);
    }
    assert_eq!(collected.len(), expected_len);
}

/// A looping device never signals EOF: reading twice the script length
/// yields the script twice over, for any chunk size.
#[rstest]
#[case(1)]
#[case(5)]
#[case(16)]
fn looping_device_replays_indefinitely_at_any_chunk_size(#[case] chunk: usize) {
    let script = vec![1u8, 2, 3, 4];
    let mut device = SimulatedDevice::looping(script.clone(), chunk);
    let mut collected = Vec::new();
    let mut buf = [0u8; 4096];
    while collected.len() < script.len() * 2 {
        let n = device.read(&mut buf).unwrap();
        assert!(n > 0, "looping device must never signal EOF");
        collected.extend_from_slice(&buf[..n]);
    }
    assert_eq!(&collected[..script.len()], script.as_slice());
    assert_eq!(&collected[script.len()..script.len() * 2], script.as_slice());
}
