//! `macscribe`: identify legacy Macintosh document files.
//!
//! Works like `file`: prints one line per input naming the producing
//! application, identified from FinderInfo, the resource fork and data
//! fork magic. Verbosity adds the raw creator/type codes and the `vers`
//! strings.

use anyhow::{Context, Result as AResult};
use libmacdoc::probe::{self, ResourceSummary};
use libmacdoc::InputFile;
use std::process;

struct Options {
    verbose: i32,
    print_file_name: bool,
}

fn usage(name: &str) {
    eprintln!("Syntax error, expect:");
    eprintln!("\t {} [-h][-H][-v num] filename", name);
    eprintln!("\t where\t filename is the file path,");
    eprintln!("\t\t -h: does not print the filename,");
    eprintln!("\t\t -H: prints the filename[default],");
    eprintln!("\t\t -v num: define the verbose level.");
}

fn main() {
    let program = std::env::args().next().unwrap_or_else(|| "macscribe".to_string());
    let mut args = pico_args::Arguments::from_env();

    let mut options = Options { verbose: 0, print_file_name: true };
    if args.contains("-h") {
        options.print_file_name = false;
    }
    if args.contains("-H") {
        options.print_file_name = true;
    }
    options.verbose = match args.opt_value_from_str("-v") {
        Ok(verbose) => verbose.unwrap_or(0),
        Err(_) => -1,
    };

    let files = match args.free() {
        Ok(files) if files.len() == 1 && options.verbose >= 0 => files,
        _ => {
            usage(&program);
            process::exit(-1);
        },
    };

    for file in &files {
        if let Err(error) = describe(file, &options) {
            eprintln!("{}: can not open file {}: {:#}", program, file, error);
            process::exit(-1);
        }
    }
}

fn describe(path: &str, options: &Options) -> AResult<()> {
    let mut input = InputFile::open(path)
        .with_context(|| format!("reading {}", path))?;

    let detections = input.detect();
    let summary = input.resource_fork().map(probe::resource_summary);
    let finder_info = input.finder_info();

    let mut line = String::new();
    if options.print_file_name {
        line.push_str(path);
        line.push(':');
    }

    if detections.is_empty() {
        let app_name = summary.as_ref().and_then(|summary| summary.app_name.clone());
        match app_name {
            Some(name) => line.push_str(&name),
            None => line.push_str("unknown"),
        }
    } else if detections.len() == 1 {
        line.push_str(&detections[0].label);
    } else {
        line.push('[');
        let labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
        line.push_str(&labels.join(","));
        line.push(']');
    }

    if options.verbose > 0 {
        if let Some(info) = finder_info {
            line.push_str(&format!(":type={}[{}]", info.creator, info.file_type));
        }
    }
    println!("{}", line);

    if options.verbose > 1 {
        if let Some(summary) = &summary {
            print_versions(summary);
        }
    }
    Ok(())
}

fn print_versions(summary: &ResourceSummary) {
    if let Some(version) = &summary.file_version {
        println!("\tFile{}", version);
    }
    if let Some(version) = &summary.app_version {
        println!("\tAppli{}", version);
    }
    if let Some(message) = &summary.missing_message {
        println!("\tmissingString=\"{}\"", message);
    }
}
