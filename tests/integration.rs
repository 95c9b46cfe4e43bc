// tests/integration.rs
// Integration tests for HKD Reader

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use hkd_reader::{HkdError, HkdFile};

fn encode_name(name: &str, width: usize) -> Vec<u8> {
    let mut buf = vec![0u8; width];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    buf
}

fn param_list(width: usize, entries: &[(u8, &str)]) -> Vec<u8> {
    let mut out = vec![0u8, 0, 0, entries.len() as u8];
    for &(code, name) in entries {
        out.push(code);
        out.extend(encode_name(name, width));
    }
    out
}

struct TestBlock {
    scales: Vec<f64>,
    voltages: Vec<f64>,
    samples: Vec<Vec<i16>>,
}

/// Helper to create a synthetic HKD v2.0 file.
fn write_hkd_file(
    path: &Path,
    points_per_block: u32,
    sampling_interval: f64,
    channel_names: &[&str],
    blocks: &[TestBlock],
) -> io::Result<()> {
    let mut file = File::create(path)?;

    file.write_all(b"Nanopore Experiment Data File V2.0\n")?;
    file.write_all(b"Acquired: synthetic test data\n")?;
    file.write_all(b"End of file format\n")?;

    file.write_all(&param_list(
        64,
        &[(2, "Points per block"), (7, "Sampling interval")],
    ))?;
    file.write_all(&param_list(64, &[(7, "Timestamp")]))?;
    file.write_all(&param_list(64, &[(7, "Scale"), (7, "Voltage")]))?;
    let channels: Vec<(u8, &str)> = channel_names.iter().map(|&n| (9u8, n)).collect();
    file.write_all(&param_list(512, &channels))?;

    file.write_all(&points_per_block.to_be_bytes())?;
    file.write_all(&sampling_interval.to_be_bytes())?;

    for (i, block) in blocks.iter().enumerate() {
        file.write_all(&(i as f64).to_be_bytes())?;
        for channel in 0..channel_names.len() {
            file.write_all(&block.scales[channel].to_be_bytes())?;
            file.write_all(&block.voltages[channel].to_be_bytes())?;
        }
        for channel in 0..channel_names.len() {
            for &sample in &block.samples[channel] {
                file.write_all(&sample.to_be_bytes())?;
            }
        }
    }

    file.flush()
}

/// 4-block, 1-channel file with sample value == global sample index.
fn write_ramp_file(path: &Path, voltage_per_block: &[f64]) -> io::Result<()> {
    let blocks: Vec<TestBlock> = (0..4)
        .map(|b| TestBlock {
            scales: vec![1.0],
            voltages: vec![voltage_per_block[b]],
            samples: vec![(0..100).map(|j| (b * 100 + j) as i16).collect()],
        })
        .collect();
    write_hkd_file(path, 100, 0.001, &["Current In 0"], &blocks)
}

#[test]
fn test_load_and_read_all_multichannel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("two_channel.hkd");

    let blocks = vec![
        TestBlock {
            scales: vec![2.0, 0.5],
            voltages: vec![0.1, -0.1],
            samples: vec![vec![1, -2, 3], vec![10, 20, -30]],
        },
        TestBlock {
            scales: vec![3.0, 0.5],
            voltages: vec![0.2, -0.2],
            samples: vec![vec![4, 5, -6], vec![-40, 50, 60]],
        },
    ];
    write_hkd_file(&path, 3, 0.0005, &["Current In 0", "Current In 1"], &blocks).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    assert_eq!(hkd.channel_count(), 2);
    assert_eq!(hkd.channel_names(), vec!["Current In 0", "Current In 1"]);
    assert_eq!(hkd.sample_rate(), 2000.0);
    assert_eq!(hkd.block_count(), 2);
    assert_eq!(hkd.total_samples(), 6);

    // layout invariant against the real file size
    let file_size = std::fs::metadata(&path).unwrap().len();
    let layout = hkd.layout();
    assert_eq!(
        layout.header_len + layout.total_bytes_per_block as u64 * layout.block_count,
        file_size
    );

    let (currents, voltages) = hkd.read_all_channels(false).unwrap();
    assert_eq!(currents[0], vec![2.0, -4.0, 6.0, 12.0, 15.0, -18.0]);
    assert_eq!(currents[1], vec![5.0, 10.0, -15.0, -20.0, 25.0, 30.0]);
    assert_eq!(voltages[0], vec![0.1, 0.1, 0.1, 0.2, 0.2, 0.2]);
    assert_eq!(voltages[1], vec![-0.1, -0.1, -0.1, -0.2, -0.2, -0.2]);
}

#[test]
fn test_spec_scenario() {
    // 1 channel, 4 points per block, 1 kHz, 2 blocks, constant scale 2.0
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.hkd");
    let blocks = vec![
        TestBlock {
            scales: vec![2.0],
            voltages: vec![0.3],
            samples: vec![vec![1, 2, 3, 4]],
        },
        TestBlock {
            scales: vec![2.0],
            voltages: vec![0.3],
            samples: vec![vec![5, 6, 7, 8]],
        },
    ];
    write_hkd_file(&path, 4, 0.001, &["Current In 0"], &blocks).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    assert_eq!(hkd.sample_rate(), 1000.0);

    let (currents, _) = hkd.read_all_channels(false).unwrap();
    assert_eq!(currents[0], vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0]);

    let (decimated, _) = hkd.read_all_channels(true).unwrap();
    assert_eq!(decimated[0].len(), 4);
    assert_eq!(decimated[0], vec![8.0, 2.0, 16.0, 10.0]);

    // the stream is exhausted after a full scan; end is signalled cleanly
    assert!(hkd.read_next_block().unwrap().is_none());
    assert!(hkd.read_next_block().unwrap().is_none());
}

#[test]
fn test_read_all_matches_per_block_reads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.hkd");
    write_ramp_file(&path, &[0.1, 0.2, 0.3, 0.4]).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    let (currents, _) = hkd.read_all_channels(false).unwrap();

    hkd.rewind_to_data().unwrap();
    let block_size = hkd.layout().points_per_block;
    let mut index = 0;
    while let Some(block) = hkd.read_next_block().unwrap() {
        assert_eq!(
            &currents[0][index * block_size..(index + 1) * block_size],
            &block[0][..]
        );
        index += 1;
    }
    assert_eq!(index, 4);
}

#[test]
fn test_voltage_piecewise_constant() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("volts.hkd");
    write_ramp_file(&path, &[0.05, -0.05, 0.15, 0.25]).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    let (_, voltages) = hkd.read_all_channels(false).unwrap();
    let block_size = hkd.layout().points_per_block;
    for (b, &expected) in [0.05, -0.05, 0.15, 0.25].iter().enumerate() {
        for &v in &voltages[0][b * block_size..(b + 1) * block_size] {
            assert_eq!(v, expected);
        }
    }
}

#[test]
fn test_read_next_n_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nblocks.hkd");
    write_ramp_file(&path, &[0.0; 4]).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    hkd.rewind_to_data().unwrap();

    let first = hkd.read_next_n_blocks(2).unwrap().unwrap();
    assert_eq!(first[0].len(), 200);
    assert_eq!(first[0][0], 0.0);
    assert_eq!(first[0][199], 199.0);

    // asking for more than remains stops at end of stream
    let rest = hkd.read_next_n_blocks(10).unwrap().unwrap();
    assert_eq!(rest[0].len(), 200);
    assert_eq!(rest[0][0], 200.0);

    assert!(hkd.read_next_n_blocks(1).unwrap().is_none());
}

#[test]
fn test_extract_range_full_series() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("full.hkd");
    write_ramp_file(&path, &[0.1; 4]).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    let window = hkd.extract_range(0.0, 0.0, false).unwrap();
    assert_eq!(window.current.len(), 400);
    assert_eq!(window.time.len(), 400);
    assert_eq!(window.voltage.len(), 400);
    assert_eq!(window.total_len, 400);
    assert_eq!(window.sample_rate, 1000.0);
    assert_eq!(window.time[0], 0.0);
    assert_eq!(window.current[399], 399.0);
}

#[test]
fn test_extract_range_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("window.hkd");
    write_ramp_file(&path, &[0.1, 0.2, 0.3, 0.4]).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    let window = hkd.extract_range(0.125, 0.25, false).unwrap();
    assert_eq!(window.current.len(), 125);
    assert_eq!(window.current[0], 125.0);
    assert_eq!(window.current[124], 249.0);
    assert_eq!(window.voltage[0], 0.2);
    assert_eq!(window.voltage[124], 0.3);
    assert_eq!(window.time[0], 0.0);
    let last = window.time[124];
    assert!((last - 0.125).abs() < 1e-12, "time axis end was {}", last);
}

#[test]
fn test_extract_range_decimated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decimated.hkd");
    write_ramp_file(&path, &[0.1, 0.2, 0.3, 0.4]).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    // divisor = points per block, so 0.1 s maps to one decimated entry
    let window = hkd
        .extract_range_with_divisor(0.125, 0.375, true, 100)
        .unwrap();
    // decimated layout is [max0, min0, max1, min1, ...]; indices 1..3
    assert_eq!(window.current, vec![0.0, 199.0]);
    assert_eq!(window.total_len, 8);
}

#[test]
fn test_error_handling() {
    // non-existent file
    let result = HkdFile::open("non_existent.hkd");
    assert!(matches!(result, Err(HkdError::Io(_))));

    let dir = tempfile::tempdir().unwrap();

    // wrong signature, no live handle afterwards
    let bad = dir.path().join("bad.hkd");
    File::create(&bad)
        .unwrap()
        .write_all(b"This is not an HKD file\nEnd of file format\n")
        .unwrap();
    assert!(matches!(
        HkdFile::open(&bad),
        Err(HkdError::UnrecognizedFormat)
    ));
    std::fs::remove_file(&bad).unwrap();

    // trailing bytes that do not divide into whole blocks
    let ragged = dir.path().join("ragged.hkd");
    write_ramp_file(&ragged, &[0.0; 4]).unwrap();
    OpenOptions::new()
        .append(true)
        .open(&ragged)
        .unwrap()
        .write_all(&[1, 2, 3])
        .unwrap();
    assert!(matches!(
        HkdFile::open(&ragged),
        Err(HkdError::IncompleteBlock { remainder: 3 })
    ));
}

#[test]
fn test_truncated_block_mid_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shrunk.hkd");
    write_ramp_file(&path, &[0.0; 4]).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    let layout = hkd.layout().clone();

    // Shrink the file under the open reader: cut block 1 off in the middle
    // of its per-channel scalars.
    let cut = layout.header_len + layout.total_bytes_per_block as u64 + layout.per_block_len as u64 + 4;
    OpenOptions::new()
        .write(true)
        .open(&path)
        .unwrap()
        .set_len(cut)
        .unwrap();

    hkd.rewind_to_data().unwrap();
    assert!(hkd.read_next_block().unwrap().is_some());
    assert!(matches!(
        hkd.read_next_block(),
        Err(HkdError::TruncatedBlock { block: 1 })
    ));
}

#[test]
fn test_missing_required_parameters() {
    let dir = tempfile::tempdir().unwrap();

    // per-channel table without a Scale parameter
    let path = dir.path().join("noscale.hkd");
    let mut file = File::create(&path).unwrap();
    file.write_all(b"Nanopore Experiment Data File V2.0\n").unwrap();
    file.write_all(b"End of file format\n").unwrap();
    file.write_all(&param_list(
        64,
        &[(2, "Points per block"), (7, "Sampling interval")],
    ))
    .unwrap();
    file.write_all(&param_list(64, &[])).unwrap();
    file.write_all(&param_list(64, &[(7, "Voltage")])).unwrap();
    file.write_all(&param_list(512, &[(9, "Current In 0")])).unwrap();
    file.write_all(&2u32.to_be_bytes()).unwrap();
    file.write_all(&0.001f64.to_be_bytes()).unwrap();
    // one block: voltage scalar plus two samples
    file.write_all(&0.5f64.to_be_bytes()).unwrap();
    file.write_all(&[0, 1, 0, 2]).unwrap();
    file.flush().unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();
    match hkd.read_next_block() {
        Err(HkdError::MissingParameter(name)) => assert_eq!(name, "Scale"),
        other => panic!("expected MissingParameter, got {:?}", other.map(|_| ())),
    }

    // per-file table without Points per block fails at open
    let path = dir.path().join("noppb.hkd");
    let mut file = File::create(&path).unwrap();
    file.write_all(b"Nanopore Experiment Data File V2.0\n").unwrap();
    file.write_all(b"End of file format\n").unwrap();
    file.write_all(&param_list(64, &[(7, "Sampling interval")])).unwrap();
    file.write_all(&param_list(64, &[])).unwrap();
    file.write_all(&param_list(64, &[(7, "Scale"), (7, "Voltage")])).unwrap();
    file.write_all(&param_list(512, &[(9, "Current In 0")])).unwrap();
    file.write_all(&0.001f64.to_be_bytes()).unwrap();
    file.flush().unwrap();

    assert!(matches!(
        HkdFile::open(&path),
        Err(HkdError::MissingParameter(_))
    ));
}

#[test]
fn test_csv_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.hkd");
    write_ramp_file(&path, &[0.1; 4]).unwrap();

    let mut hkd = HkdFile::open(&path).unwrap();

    let csv = dir.path().join("traces.csv");
    hkd.write_csv(&csv).unwrap();
    let content = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 401); // header + one row per sample
    assert!(lines[0].starts_with("Time,Current0,Voltage0"));

    let overview = dir.path().join("overview.csv");
    hkd.write_csv_overview(&overview).unwrap();
    let content = std::fs::read_to_string(&overview).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 5); // header + one row per block
    assert!(lines[0].starts_with("Block,Time"));
}

// Example program showing how to use the library
#[test]
fn example_usage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("example.hkd");
    write_ramp_file(&path, &[0.1, 0.1, 0.2, 0.2]).unwrap();

    let mut hkd = match HkdFile::open(&path) {
        Ok(hkd) => hkd,
        Err(e) => {
            println!("Error opening file: {}", e);
            return;
        }
    };

    println!("\nFile Information:");
    println!("  Channels: {:?}", hkd.channel_names());
    println!("  Sample rate: {} Hz", hkd.sample_rate());
    println!("  Blocks: {}", hkd.block_count());
    println!("  Duration: {} s", hkd.duration_secs());

    let (currents, voltages) = hkd.read_all_channels(false).expect("Failed to read");
    for (i, (current, voltage)) in currents.iter().zip(voltages.iter()).enumerate() {
        let min = current.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = current.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        println!(
            "  Channel {}: min={:.3e}, max={:.3e}, first voltage={:.3}",
            i, min, max, voltage[0]
        );
    }

    hkd.close();
}
