use std::error::Error;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use std::{env, fs, thread};

use log::{error, info, warn};

use am03127::serial::{SerialChannel, DEFAULT_TIMEOUT};
use am03127::{DeviceId, Sign};

const SHOW: &str = "<L1><PA><FE><MA><WD><FE>";
const CLEAR: &str = "<L1><PA><FA><MA><WA><FA>";
const START: &str = "<L1><PA><FE><MA><WA><FE>Start";
const END: &str = "<L1><PA><FA><MA><WD><FE>Ende";

type SerialSign = Sign<SerialChannel<serial::SystemPort>>;

/// One sign on its own port, reconnected whenever it stops answering.
struct Display {
    path: String,
    sign: Option<SerialSign>,
}

impl Display {
    fn connect(path: &str) -> Self {
        Display {
            path: path.to_owned(),
            sign: open_sign(path)
                .map_err(|e| error!("Couldn't connect to {}: {}", path, e))
                .ok(),
        }
    }

    fn send(&mut self, text: &str) {
        let result = match self.sign.as_mut() {
            Some(sign) => sign.send_text(text).map_err(Box::<dyn Error>::from),
            None => Err("not connected".into()),
        };

        if let Err(e) = result {
            warn!("Sending to {} failed: {}", self.path, e);
            self.reconnect();
        }
    }

    fn reconnect(&mut self) {
        if let Some(mut sign) = self.sign.take() {
            if let Err(e) = sign.close() {
                warn!("Problem closing {}: {}", self.path, e);
            }
        }
        *self = Display::connect(&self.path);
    }

    fn close(&mut self) {
        if let Some(mut sign) = self.sign.take() {
            let _ = sign.close();
        }
    }
}

/// Opens the port, claims device ID 1 for whatever sign is attached, and sets its clock.
fn open_sign(path: &str) -> Result<SerialSign, Box<dyn Error>> {
    let port = serial::open(path)?;
    let channel = SerialChannel::try_new(port, DEFAULT_TIMEOUT)?;
    let id = DeviceId::try_new(1)?;
    let mut sign = Sign::new(channel, id);
    sign.assign_device_id(id)?;
    sign.set_clock_now()?;
    info!("Connected to {}", path);
    Ok(sign)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        println!("Usage: prompter <script_file> <hold_seconds> <serial_port> [serial_port...]");
        println!();
        println!("Shows one line of script_file at a time on every sign, holding each for hold_seconds.");
        println!("Commands: n = next line, p = previous line, r = repeat line, x = exit");
        return Ok(());
    }

    let script = fs::read_to_string(&args[1])?;
    let lines: Vec<&str> = script.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() {
        return Err(format!("{} contains no lines", args[1]).into());
    }
    let hold = Duration::from_secs(args[2].parse()?);

    let mut displays: Vec<Display> = args[3..].iter().map(|path| Display::connect(path)).collect();
    for display in &mut displays {
        display.send(START);
    }

    let mut current: Option<usize> = None;
    let stdin = io::stdin();
    loop {
        print!("[n]ext [p]revious [r]epeat e[x]it > ");
        io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let index = match input.trim() {
            "x" => break,
            "n" | "" => current.map_or(0, |i| (i + 1).min(lines.len() - 1)),
            "p" => current.map_or(0, |i| i.saturating_sub(1)),
            "r" => current.unwrap_or(0),
            other => {
                println!("Unknown command {:?}", other);
                continue;
            }
        };
        current = Some(index);

        let line = lines[index].trim();
        println!("{}/{}: {}", index + 1, lines.len(), line);

        let text = format!("{}{}", SHOW, line);
        for display in &mut displays {
            display.send(&text);
        }
        thread::sleep(hold);
        for display in &mut displays {
            display.send(CLEAR);
        }
    }

    for display in &mut displays {
        display.send(END);
    }
    thread::sleep(Duration::from_secs(1));
    for display in &mut displays {
        display.close();
    }

    Ok(())
}
