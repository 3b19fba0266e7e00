use clap::{App, Arg};
use drr_arbiter_model::bitmap::ReqBitmap;
use drr_arbiter_model::drr::*;
use drr_arbiter_model::logger;
use drr_arbiter_model::sim::{Pattern, Simulator};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::SubscriberInitExt;

fn lanes(raw: &[Credit]) -> String {
    raw.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn main() {
    let ref_quantum = lanes(&REF_QUANTUM);
    let ref_packet_size = lanes(&REF_PACKET_SIZE);
    let ref_deficit_cap = lanes(&REF_DEFICIT_CAP);
    let matches = App::new("drr_sim")
        .author("shady83123 <shady831213@126.com>")
        .about("clock a deficit round-robin arbiter model and report grant shares")
        .arg(
            Arg::with_name("quantum")
                .short("q")
                .long("quantum")
                .value_name("LIST")
                .takes_value(true)
                .default_value(&ref_quantum)
                .help("credit added per round, one value per requester"),
        )
        .arg(
            Arg::with_name("packet_size")
                .short("p")
                .long("packet-size")
                .value_name("LIST")
                .takes_value(true)
                .default_value(&ref_packet_size)
                .help("credit charged per grant, one value per requester"),
        )
        .arg(
            Arg::with_name("deficit_cap")
                .short("c")
                .long("cap")
                .value_name("LIST")
                .takes_value(true)
                .default_value(&ref_deficit_cap)
                .help("deficit saturation limit, one value per requester"),
        )
        .arg(
            Arg::with_name("ticks")
                .short("t")
                .long("ticks")
                .value_name("TICKS")
                .takes_value(true)
                .default_value("64")
                .validator(|raw| {
                    raw.parse::<u64>()
                        .map(|_| ())
                        .map_err(|_| format!("{} is not a tick count!", raw))
                })
                .help("number of ticks to simulate"),
        )
        .arg(
            Arg::with_name("req")
                .short("r")
                .long("req")
                .value_name("BITS")
                .takes_value(true)
                .multiple(true)
                .require_delimiter(true)
                .default_value("1111")
                .help("request vectors applied cyclically, lane 0 rightmost"),
        )
        .arg(
            Arg::with_name("trace")
                .long("trace")
                .help("print every tick"),
        )
        .arg(
            Arg::with_name("statics")
                .long("statics")
                .value_name("FILE")
                .takes_value(true)
                .help("dump grant statistics to FILE.trace.json"),
        )
        .get_matches();

    let config = DrrConfig::<REQS>::from_lists(
        matches.value_of("quantum").unwrap(),
        matches.value_of("packet_size").unwrap(),
        matches.value_of("deficit_cap").unwrap(),
    )
    .unwrap_or_else(|e| {
        eprintln!("invalid config: {}", e);
        std::process::exit(1)
    });
    let reqs = matches
        .values_of("req")
        .unwrap_or_default()
        .map(|r| r.parse::<ReqBitmap<REQS>>().map_err(ConfigError::from))
        .collect::<Result<Vec<_>>>()
        .unwrap_or_else(|e| {
            eprintln!("invalid request: {}", e);
            std::process::exit(1)
        });
    let ticks = matches.value_of("ticks").unwrap().parse::<u64>().unwrap();

    let registry = tracing_subscriber::registry().with(logger::default());
    let _guard = match matches.value_of("statics") {
        Some(file) => {
            let (statics, guard) = logger::statics(file);
            registry
                .with(statics.with_filter(logger::statics_filter(0x3, &[STATICS_TAR])))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    };

    let mut sim = Simulator::new(DrrArbiter::with_config(config));
    if matches.is_present("trace") {
        sim = sim.with_trace();
    }
    sim.run(&mut Pattern::new(reqs), ticks);

    for r in sim.trace() {
        println!(
            "tick {:>6}: req {} valid {} grant {} {:<10} deficit {:?} mask {}",
            r.tick,
            r.request,
            r.valid,
            r.grant,
            r.pass.map_or("-".to_string(), |p| format!("{:?}", p)),
            r.deficits,
            r.mask
        );
    }
    let stats = sim.stats();
    println!("ticks: {}, idle: {}, fallback grants: {}", stats.ticks, stats.no_grant, stats.fallback);
    for (id, r) in config.requesters().enumerate() {
        println!(
            "requester {}: quantum {:>6} packet {:>6} grants {:>8} bytes {:>10} share {:.4}",
            id,
            r.quantum,
            r.packet_size,
            stats.grants[id],
            stats.bytes[id],
            stats.share(id)
        );
    }
}
