use std::io::ErrorKind;
use std::time::Duration;

use am03127::core::{CommunicationError, Frame};
use am03127::serial::{SerialChannel, SerialError};
use am03127::{Channel, DeviceId, Sign, SignError};

mod mock_serial_port;
use crate::mock_serial_port::{MockSerialPort, SerialFailure};

const TIMEOUT: Duration = Duration::from_millis(50);

fn id(value: u8) -> DeviceId {
    DeviceId::try_new(value).unwrap()
}

#[test]
fn port_configured_for_sign() {
    let port = MockSerialPort::new(vec![], SerialFailure::None);
    let channel = SerialChannel::try_new(port, TIMEOUT).unwrap();

    let settings = channel.port().unwrap().settings();
    assert_eq!(serial_core::Baud9600, settings.baud_rate);
    assert_eq!(serial_core::Bits8, settings.char_size);
    assert_eq!(serial_core::ParityNone, settings.parity);
    assert_eq!(serial_core::Stop1, settings.stop_bits);
    assert_eq!(serial_core::FlowNone, settings.flow_control);
}

#[test]
fn configuration_failure() {
    let port = MockSerialPort::new(vec![], SerialFailure::WriteSettings);
    let error = SerialChannel::try_new(port, TIMEOUT).unwrap_err();
    assert!(matches!(error, SerialError::Configure { .. }));
}

#[test]
fn read_stops_at_max_bytes() {
    let port = MockSerialPort::new(b"ACKACK".to_vec(), SerialFailure::None);
    let mut channel = SerialChannel::try_new(port, TIMEOUT).unwrap();

    assert_eq!(b"ACK".to_vec(), channel.read(3, TIMEOUT).unwrap());
    assert_eq!(b"ACK".to_vec(), channel.read(3, TIMEOUT).unwrap());
    channel.port().unwrap().done();
}

#[test]
fn short_read_on_timeout() {
    let port = MockSerialPort::new(b"AC".to_vec(), SerialFailure::None);
    let mut channel = SerialChannel::try_new(port, TIMEOUT).unwrap();

    assert_eq!(b"AC".to_vec(), channel.read(3, TIMEOUT).unwrap());
    assert!(channel.read(1000, TIMEOUT).unwrap().is_empty());
}

#[test]
fn sign_over_serial() {
    let port = MockSerialPort::new(b"ACK".to_vec(), SerialFailure::None);
    let channel = SerialChannel::try_new(port, TIMEOUT).unwrap();
    let mut sign = Sign::new(channel, id(1));

    sign.delete_all().unwrap();

    let port = sign.channel().port().unwrap();
    assert_eq!(b"<ID01><D*>6C<E>", port.written());
    port.done();
}

#[test]
fn retries_over_serial() {
    let port = MockSerialPort::new(b"NAK\r\n".to_vec(), SerialFailure::None);
    let channel = SerialChannel::try_new(port, TIMEOUT).unwrap();
    let mut sign = Sign::new(channel, id(2));

    let error = sign.delete_all().unwrap_err();
    match error {
        SignError::Communication {
            source: CommunicationError::NotAcknowledged { frame, attempts },
        } => {
            assert_eq!(b"<ID02><D*>6C<E>".to_vec(), frame);
            assert_eq!(3, attempts);
        }
        other => panic!("Unexpected error: {:?}", other),
    }

    assert_eq!(b"<ID02><D*>6C<E>".repeat(3), sign.channel().port().unwrap().written());
}

#[test]
fn assign_id_over_serial() {
    let port = MockSerialPort::new(b"05".to_vec(), SerialFailure::None);
    let channel = SerialChannel::try_new(port, TIMEOUT).unwrap();
    let mut sign = Sign::new(channel, id(1));

    sign.assign_device_id(id(5)).unwrap();

    assert_eq!(id(5), sign.device_id());
    assert_eq!(Frame::AssignId(id(5)).to_bytes(), sign.channel().port().unwrap().written());
}

#[test]
fn read_failure_propagates() {
    let port = MockSerialPort::new(vec![], SerialFailure::Read);
    let channel = SerialChannel::try_new(port, TIMEOUT).unwrap();
    let mut sign = Sign::new(channel, id(1));

    let error = sign.delete_all().unwrap_err();
    assert!(matches!(
        error,
        SignError::Communication {
            source: CommunicationError::Io { .. }
        }
    ));
}

#[test]
fn closed_channel_refuses_io() {
    let port = MockSerialPort::new(vec![], SerialFailure::None);
    let mut channel = SerialChannel::try_new(port, TIMEOUT).unwrap();
    assert!(channel.is_open());

    channel.close().unwrap();
    assert!(!channel.is_open());
    assert!(channel.port().is_none());

    let error = channel.write(b"<ID01><D*>6C<E>").unwrap_err();
    assert_eq!(ErrorKind::NotConnected, error.kind());
    let error = channel.read(3, TIMEOUT).unwrap_err();
    assert_eq!(ErrorKind::NotConnected, error.kind());

    // Closing again is harmless.
    channel.close().unwrap();
}
