//! Structure dumper for legacy Macintosh document files.
//!
//! Lists the resource map, the compound-file streams and the `vers`
//! records, or runs the registered parser and prints the recovered text
//! or the raw event stream.

use anyhow::{anyhow, Context, Result as AResult};
use libmacdoc::event::{well_formed, Recorder};
use libmacdoc::parser::parser_for;
use libmacdoc::probe;
use libmacdoc::InputFile;
use std::process;

struct Options {
    resources: bool,
    streams: bool,
    text: bool,
    events: bool,
}

fn usage() {
    eprintln!("Usage: inspect [--resources][--streams][--text][--events] filename");
    eprintln!("\t --resources: list the resource fork map");
    eprintln!("\t --streams:   list the OLE container streams");
    eprintln!("\t --text:      parse the document and print its text");
    eprintln!("\t --events:    parse the document and print the event stream");
}

fn main() {
    let mut args = pico_args::Arguments::from_env();
    let options = Options {
        resources: args.contains("--resources"),
        streams: args.contains("--streams"),
        text: args.contains("--text"),
        events: args.contains("--events"),
    };

    let files = match args.free() {
        Ok(files) if files.len() == 1 => files,
        _ => {
            usage();
            process::exit(-1);
        },
    };

    if let Err(error) = inspect(&files[0], &options) {
        eprintln!("inspect: {:#}", error);
        process::exit(-1);
    }
}

fn inspect(path: &str, options: &Options) -> AResult<()> {
    let mut input = InputFile::open(path)
        .with_context(|| format!("reading {}", path))?;

    let detections = input.detect();
    for detection in &detections {
        println!("{}: {}", path, detection.label);
    }
    if detections.is_empty() {
        println!("{}: unknown", path);
    }

    if options.resources {
        if let Some(fork) = input.resource_fork() {
            println!("------- resource fork -------");
            for item in fork.iter() {
                match fork.name_of(item) {
                    Some(name) => println!("\t{} {} \"{}\"", item.os_type, item.id, name),
                    None => println!("\t{} {}", item.os_type, item.id),
                }
            }
            for version in fork.get_version_list() {
                println!("\tvers{}", version);
            }
        } else {
            println!("no resource fork");
        }
    }

    if options.streams {
        if let Some(ole) = input.ole() {
            println!("------- OLE streams -------");
            for stream in ole.stream_paths() {
                println!("\t{}", stream);
            }
            if let Some(label) = ole.root_clsid_label().or_else(|| ole.comp_obj_label()) {
                println!("\tproducer: {}", label);
            }
        } else {
            println!("not an OLE container");
        }
    }

    if options.text || options.events {
        let kind = detections
            .first()
            .map(|detection| detection.kind)
            .ok_or_else(|| anyhow!("no known format"))?;
        let mut parser = parser_for(kind, input)
            .ok_or_else(|| anyhow!("no parser registered for {:?}", kind))?;

        let mut recorder = Recorder::new();
        parser.parse(&mut recorder).map_err(|error| anyhow!("parse failed: {}", error))?;
        well_formed(recorder.events()).map_err(|error| anyhow!("bad event stream: {}", error))?;

        if options.events {
            for event in recorder.events() {
                println!("{:?}", event);
            }
        }
        if options.text {
            print!("{}", recorder.text());
        }
        return Ok(());
    }

    // with no parser requested, still surface the resource summary
    if let Some(fork) = input.resource_fork() {
        let summary = probe::resource_summary(fork);
        if let Some(name) = summary.app_name {
            println!("\tapplication: {}", name);
        }
    }

    Ok(())
}
