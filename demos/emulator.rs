use std::{env, error::Error};

use am03127::DeviceId;
use am03127_testing::{Emulator, VirtualSign};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: emulator <serial_port> [device_id]");
        println!();
        println!("serial_port should be a port name like /dev/ttyUSB1 or COM4");
        println!("If device_id is omitted, the sign starts out as ID 1");
        return Ok(());
    }

    let port = serial::open(&args[1])?;
    let id = match args.get(2) {
        Some(arg) => DeviceId::try_new(arg.parse()?)?,
        None => DeviceId::try_new(1)?,
    };
    println!("Providing virtual sign {} on {}", id, args[1]);

    // Frames arriving on the port are applied to the virtual sign and acknowledged.
    // Run with RUST_LOG=info to watch them.
    let mut emulator = Emulator::try_new(port, VirtualSign::new(id))?;
    loop {
        emulator.process_input()?;
    }
}
