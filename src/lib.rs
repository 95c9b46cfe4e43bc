// src/lib.rs
// HKD Reader Library - Public API

//! # HKD Reader
//!
//! A Rust library for reading HEKA nanopore experiment data files (`.hkd`).
//!
//! ## Features
//!
//! - Parse the self-describing v2.0 header (parameter tables declared in the
//!   file itself)
//! - Stream sample data block by block without loading the file into memory
//! - Assemble full-length or min/max-decimated current and voltage traces
//! - Extract arbitrary time windows with a matching time axis
//! - Export data to CSV format
//! - Proper error handling
//!
//! ## Example
//!
//! ```no_run
//! use hkd_reader::HkdFile;
//!
//! let mut hkd = HkdFile::open("experiment.hkd").expect("Failed to open file");
//!
//! println!("Channels: {}", hkd.channel_count());
//! println!("Sample rate: {} Hz", hkd.sample_rate());
//! println!("Blocks: {}", hkd.block_count());
//!
//! // Full-resolution traces for every channel
//! let (currents, voltages) = hkd.read_all_channels(false).expect("Failed to read");
//! println!("First sample: {} A at {} V", currents[0][0], voltages[0][0]);
//!
//! // A 2-second window starting at t = 1 s
//! let window = hkd.extract_range(1.0, 3.0, false).expect("Failed to extract");
//! println!("Window covers {} samples", window.current.len());
//! ```

mod hkd_tools;

pub use hkd_tools::{
    Encoding, FileLayout, HkdError, HkdFile, ParamDescriptor, ParamList, ParamValue, ParamValues,
    Result, TraceWindow, DEFAULT_DECIMATION_RATE, FORMAT_SIGNATURE, HEADER_TERMINATOR,
    PARAM_POINTS_PER_BLOCK, PARAM_SAMPLING_INTERVAL, PARAM_SCALE, PARAM_VOLTAGE,
};
