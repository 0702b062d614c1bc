use std::error::Error;
use std::fs;

use bitvec::slice::BitSlice;
use clap::{Arg, ArgAction, Command, value_parser};
use itertools::Itertools;
use padring_cell::{ArbiterInputs, CellConfig, PadCell, parse_chain_image};
use tracing::info;

#[derive(Debug)]
enum TraceError {
    BadLine { line: usize },
    BadLevel { line: usize, token: String },
}

impl std::fmt::Display for TraceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceError::BadLine { line } => {
                write!(f, "line {line}: expected `reset clock serial`")
            }
            TraceError::BadLevel { line, token } => {
                write!(f, "line {line}: bad level {token:?}, expected 0 or 1")
            }
        }
    }
}

impl Error for TraceError {}

fn parse_level(token: &str, line: usize) -> Result<bool, TraceError> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(TraceError::BadLevel {
            line,
            token: token.to_string(),
        }),
    }
}

fn chain_image_string(bits: &BitSlice) -> String {
    bits.iter().rev().map(|b| if *b { '1' } else { '0' }).collect()
}

fn load_config(m: &clap::ArgMatches) -> Result<CellConfig, Box<dyn Error>> {
    Ok(match m.get_one::<String>("defaults") {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => CellConfig::default(),
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let m = Command::new("padring")
        .subcommand_required(true)
        .subcommand(
            Command::new("load")
                .about("Simulate a full chain load and dump the latched fields")
                .arg(
                    Arg::new("pattern")
                        .required(true)
                        .value_parser(value_parser!(String)),
                )
                .arg(
                    Arg::new("width")
                        .short('w')
                        .long("width")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("defaults")
                        .short('D')
                        .long("defaults")
                        .value_parser(value_parser!(String)),
                )
                .arg(
                    Arg::new("json")
                        .short('j')
                        .long("json")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("arbitration")
                        .short('a')
                        .long("arbitration")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("mgmt-out")
                        .long("mgmt-out")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("mgmt-oe-b")
                        .long("mgmt-oe-b")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("user-out")
                        .long("user-out")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("user-oe-b")
                        .long("user-oe-b")
                        .action(ArgAction::SetTrue),
                )
                .arg(Arg::new("pad-in").long("pad-in").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("trace")
                .about("Replay a control line trace and dump the final state")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(String)),
                )
                .arg(
                    Arg::new("defaults")
                        .short('D')
                        .long("defaults")
                        .value_parser(value_parser!(String)),
                )
                .arg(
                    Arg::new("json")
                        .short('j')
                        .long("json")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    match m.subcommand() {
        Some(("load", m)) => {
            let arg_pattern = m.get_one::<String>("pattern").unwrap();
            let flag_json = m.get_flag("json");
            let flag_arbitration = m.get_flag("arbitration");

            let mut config = load_config(m)?;
            if let Some(&width) = m.get_one::<usize>("width") {
                config.width = width;
            } else if m.get_one::<String>("defaults").is_none() {
                config.width = arg_pattern.chars().count();
            }

            let mut cell = PadCell::new(config)?;
            let image = parse_chain_image(arg_pattern, cell.chain_width())?;
            info!("loading a {} bit chain image", image.len());
            cell.load(&image);

            let inputs = ArbiterInputs {
                mgmt_out: m.get_flag("mgmt-out"),
                mgmt_oe_b: m.get_flag("mgmt-oe-b"),
                user_out: m.get_flag("user-out"),
                user_oe_b: m.get_flag("user-oe-b"),
                pad_in: m.get_flag("pad-in"),
            };

            if flag_json {
                let mut obj = jzon::object! {
                    fields: cell.fields().to_json(),
                };
                if flag_arbitration {
                    obj["arbitration"] = cell.arbitrate(inputs).to_json();
                }
                println!("{}", obj.pretty(4));
            } else {
                cell.fields().dump(&mut std::io::stdout())?;
                if flag_arbitration {
                    let out = cell.arbitrate(inputs);
                    println!("pad out: {}", u32::from(out.pad_out));
                    println!("pad output enable (active low): {}", u32::from(out.pad_oe_b));
                    println!("management in: {}", u32::from(out.mgmt_in));
                    println!("user in: {}", u32::from(out.user_in));
                }
            }
        }
        Some(("trace", m)) => {
            let arg_file = m.get_one::<String>("file").unwrap();
            let flag_json = m.get_flag("json");

            let config = load_config(m)?;
            let mut cell = PadCell::new(config)?;

            let text = fs::read_to_string(arg_file)?;
            let mut steps = 0;
            for (idx, line) in text.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let lineno = idx + 1;
                let Some((reset, clock, serial)) = line.split_whitespace().collect_tuple() else {
                    return Err(TraceError::BadLine { line: lineno }.into());
                };
                let reset_active = parse_level(reset, lineno)?;
                let clock = parse_level(clock, lineno)?;
                let serial_in = parse_level(serial, lineno)?;
                cell.set_serial_in(serial_in);
                cell.set_control(reset_active, clock);
                steps += 1;
            }
            info!("replayed {} transitions", steps);

            let image = chain_image_string(cell.chain_bits());
            if flag_json {
                let obj = jzon::object! {
                    phase: cell.phase().to_string(),
                    chain: image,
                    serial_out: cell.serial_out(),
                    fields: cell.fields().to_json(),
                };
                println!("{}", obj.pretty(4));
            } else {
                println!("phase: {}", cell.phase());
                println!("chain: {image}");
                println!("serial out: {}", u32::from(cell.serial_out()));
                cell.fields().dump(&mut std::io::stdout())?;
            }
        }
        _ => unreachable!(),
    }
    Ok(())
}
