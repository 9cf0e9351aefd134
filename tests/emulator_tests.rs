use am03127::core::Command;
use am03127::{Brightness, DeviceId};
use am03127_testing::{Emulator, VirtualSign};

mod mock_serial_port;
use crate::mock_serial_port::{MockSerialPort, SerialFailure};

fn id(value: u8) -> DeviceId {
    DeviceId::try_new(value).unwrap()
}

#[test]
fn emulator_acknowledges_frames() {
    let mut input = Command::SetBrightness(Brightness::try_new('B').unwrap())
        .to_frame(id(1))
        .to_bytes();
    input.extend_from_slice(b"<ID><03><E>");

    let port = MockSerialPort::new(input, SerialFailure::None);
    let mut emulator = Emulator::try_new(port, VirtualSign::new(id(1))).unwrap();

    // Everything arrives in one read; later reads time out quietly.
    emulator.process_input().unwrap();
    emulator.process_input().unwrap();

    let sign = emulator.sign();
    assert_eq!(Some(Brightness::try_new('B').unwrap()), sign.brightness());
    assert_eq!(id(3), sign.device_id());
    assert_eq!(2, sign.frames().len());
    assert_eq!(b"ACK03", emulator.port().written());
}

#[test]
fn emulator_ignores_noise() {
    let port = MockSerialPort::new(b"\r\nhello<ID01><BA>FF<E>".to_vec(), SerialFailure::None);
    let mut emulator = Emulator::try_new(port, VirtualSign::new(id(1))).unwrap();

    emulator.process_input().unwrap();

    assert!(emulator.sign().frames().is_empty());
    assert_eq!(None, emulator.sign().brightness());
    assert!(emulator.port().written().is_empty());
}
