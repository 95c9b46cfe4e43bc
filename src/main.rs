// src/main.rs
// Example command-line application for HKD Reader

use std::env;
use std::process;

use hkd_reader::HkdFile;

fn print_usage() {
    eprintln!("Usage: hkd_reader <command> <hkd_file> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  info <file>                    Display HKD file information");
    eprintln!("  convert <file> <output>        Convert full traces to CSV");
    eprintln!("  overview <file> <output>       Export decimated block max/min to CSV");
    eprintln!("  extract <file> <start> <stop>  Print a channel-0 time window to stdout");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  hkd_reader info experiment.hkd");
    eprintln!("  hkd_reader convert experiment.hkd traces.csv");
    eprintln!("  hkd_reader overview experiment.hkd overview.csv");
    eprintln!("  hkd_reader extract experiment.hkd 1.5 3.0 > window.txt");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];
    let input_file = &args[2];

    let mut hkd = match HkdFile::open(input_file) {
        Ok(hkd) => hkd,
        Err(e) => {
            eprintln!("Error opening HKD file '{}': {}", input_file, e);
            process::exit(1);
        }
    };

    match command.as_str() {
        "info" => {
            print_file_info(&mut hkd);
        }

        "convert" => {
            if args.len() < 4 {
                eprintln!("Error: Missing output file argument");
                print_usage();
                process::exit(1);
            }

            let output_file = &args[3];
            if let Err(e) = hkd.write_csv(output_file) {
                eprintln!("Error writing CSV file '{}': {}", output_file, e);
                process::exit(1);
            }

            println!("Successfully converted {} to {}", input_file, output_file);
            println!("Samples written per channel: {}", hkd.total_samples());
        }

        "overview" => {
            if args.len() < 4 {
                eprintln!("Error: Missing output file argument");
                print_usage();
                process::exit(1);
            }

            let output_file = &args[3];
            if let Err(e) = hkd.write_csv_overview(output_file) {
                eprintln!("Error writing overview CSV '{}': {}", output_file, e);
                process::exit(1);
            }

            println!(
                "Successfully exported {} blocks to {}",
                hkd.block_count(),
                output_file
            );
        }

        "extract" => {
            if args.len() < 5 {
                eprintln!("Error: Missing start/stop arguments");
                print_usage();
                process::exit(1);
            }

            let start: f64 = match args[3].parse() {
                Ok(s) => s,
                Err(_) => {
                    eprintln!("Error: Invalid start time '{}'", args[3]);
                    process::exit(1);
                }
            };
            let stop: f64 = match args[4].parse() {
                Ok(s) => s,
                Err(_) => {
                    eprintln!("Error: Invalid stop time '{}'", args[4]);
                    process::exit(1);
                }
            };

            match hkd.extract_range(start, stop, false) {
                Ok(window) => {
                    println!("# Window [{}, {}) s from {}", start, stop, input_file);
                    println!("# Time (s), Current (A), Voltage (V)");
                    for i in 0..window.current.len() {
                        println!(
                            "{:.12e}, {:.6e}, {:.6e}",
                            window.time[i], window.current[i], window.voltage[i]
                        );
                    }
                }
                Err(e) => {
                    eprintln!("Error extracting window: {}", e);
                    process::exit(1);
                }
            }
        }

        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_file_info(hkd: &mut HkdFile) {
    println!("HKD File Information");
    println!("====================");
    println!();
    println!("File: {}", hkd.path());
    println!();

    println!("Channels:");
    for (i, name) in hkd.channel_names().iter().enumerate() {
        println!("  {}: {}", i, name);
    }
    println!();

    let layout = hkd.layout().clone();
    println!("Acquisition Parameters:");
    println!("  Sample rate: {} Hz", layout.sample_rate);
    println!("  Points per block: {}", layout.points_per_block);
    println!("  Number of blocks: {}", layout.block_count);
    println!("  Samples per channel: {}", layout.points_per_channel_total);
    println!(
        "  Duration: {:.6} s",
        layout.points_per_channel_total as f64 / layout.sample_rate
    );
    println!();

    println!("Data Layout:");
    println!("  Header size: {} bytes", layout.header_len);
    println!("  Per-block scalars: {} bytes", layout.per_block_len);
    println!(
        "  Per-channel scalars: {} bytes/channel",
        layout.per_channel_block_len
    );
    println!(
        "  Sample data per block: {} bytes",
        layout.data_bytes_per_block
    );
    println!("  Total block size: {} bytes", layout.total_bytes_per_block);
    println!();

    // Show statistics for the first few blocks
    let show = layout.block_count.min(3);
    if show > 0 {
        println!("Block Statistics (first {} blocks):", show);
        if let Err(e) = hkd.rewind_to_data() {
            eprintln!("Error rewinding file: {}", e);
            process::exit(1);
        }
        for i in 0..show {
            match hkd.read_next_block() {
                Ok(Some(block)) => {
                    for (channel, samples) in block.iter().enumerate() {
                        let min = samples.iter().fold(f64::INFINITY, |a, &b| a.min(b));
                        let max = samples.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                        let avg = samples.iter().sum::<f64>() / samples.len().max(1) as f64;
                        println!(
                            "  Block {} channel {}: min={:.3e}, max={:.3e}, avg={:.3e}",
                            i, channel, min, max, avg
                        );
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    eprintln!("Error reading block {}: {}", i, e);
                    process::exit(1);
                }
            }
        }
    }
}
