// HKD Reader Module

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use thiserror::Error;
use tracing::debug;

/// Marker the first line of every v2.0 file must contain.
pub const FORMAT_SIGNATURE: &str = "Nanopore Experiment Data File V2.0";

/// Line terminating the textual header; the binary section starts after it.
pub const HEADER_TERMINATOR: &str = "End of file format";

/// Per-file parameter holding the number of samples per block.
pub const PARAM_POINTS_PER_BLOCK: &str = "Points per block";

/// Per-file parameter holding the sampling interval in seconds.
pub const PARAM_SAMPLING_INTERVAL: &str = "Sampling interval";

/// Per-channel parameter converting raw samples to current.
pub const PARAM_SCALE: &str = "Scale";

/// Per-channel parameter holding the applied voltage in volts.
pub const PARAM_VOLTAGE: &str = "Voltage";

/// Block divisor used to map decimated indices back to sample time when no
/// explicit divisor is supplied to `extract_range`.
pub const DEFAULT_DECIMATION_RATE: usize = 2500;

#[derive(Error, Debug)]
pub enum HkdError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("file format not recognized: first line lacks the V2.0 signature")]
    UnrecognizedFormat,

    #[error("unexpected end of file inside header")]
    TruncatedHeader,

    #[error("unsupported parameter type code: {0}")]
    UnsupportedTypeCode(u8),

    #[error("file ends with an incomplete block ({remainder} trailing bytes)")]
    IncompleteBlock { remainder: u64 },

    #[error("unexpected end of file inside block {block}")]
    TruncatedBlock { block: u64 },

    #[error("required numeric parameter '{0}' missing from header")]
    MissingParameter(String),
}

pub type Result<T> = std::result::Result<T, HkdError>;

/// Binary encoding of one header parameter, indexed by type code 0-10.
///
/// All multi-byte values are big-endian except `UInt16Le`, which is declared
/// in the file's type table but not referenced by any current block layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    UInt8,
    UInt16,
    UInt32,
    Int8,
    Int16,
    Int32,
    Float32,
    Float64,
    Text64,
    Text512,
    UInt16Le,
}

impl Encoding {
    /// Map a type code from a parameter list header to its encoding.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Encoding::UInt8),
            1 => Ok(Encoding::UInt16),
            2 => Ok(Encoding::UInt32),
            3 => Ok(Encoding::Int8),
            4 => Ok(Encoding::Int16),
            5 => Ok(Encoding::Int32),
            6 => Ok(Encoding::Float32),
            7 => Ok(Encoding::Float64),
            8 => Ok(Encoding::Text64),
            9 => Ok(Encoding::Text512),
            10 => Ok(Encoding::UInt16Le),
            other => Err(HkdError::UnsupportedTypeCode(other)),
        }
    }

    /// Width of one encoded value in bytes.
    pub fn byte_len(self) -> usize {
        match self {
            Encoding::UInt8 | Encoding::Int8 => 1,
            Encoding::UInt16 | Encoding::Int16 | Encoding::UInt16Le => 2,
            Encoding::UInt32 | Encoding::Int32 | Encoding::Float32 => 4,
            Encoding::Float64 => 8,
            Encoding::Text64 => 64,
            Encoding::Text512 => 512,
        }
    }
}

/// A decoded header scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    UInt(u64),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value; `None` for text parameters.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::UInt(v) => Some(*v as f64),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Text(_) => None,
        }
    }

    /// Non-negative integer view of the value; `None` for text or negatives.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::UInt(v) => Some(*v as usize),
            ParamValue::Int(v) if *v >= 0 => Some(*v as usize),
            ParamValue::Float(v) if *v >= 0.0 => Some(*v as usize),
            _ => None,
        }
    }
}

/// One named parameter slot in a header table.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub name: String,
    pub encoding: Encoding,
}

/// Ordered parameter table; the order is the binary read order in the file.
pub type ParamList = Vec<ParamDescriptor>;

/// Decoded scalar values for one table read, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamValues(Vec<(String, ParamValue)>);

impl ParamValues {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a required numeric parameter.
    pub fn require_f64(&self, name: &str) -> Result<f64> {
        self.get(name)
            .and_then(ParamValue::as_f64)
            .ok_or_else(|| HkdError::MissingParameter(name.to_string()))
    }

    /// Look up a required non-negative integer parameter.
    pub fn require_usize(&self, name: &str) -> Result<usize> {
        self.get(name)
            .and_then(ParamValue::as_usize)
            .ok_or_else(|| HkdError::MissingParameter(name.to_string()))
    }
}

/// Byte geometry of an open file, derived once from the header tables and
/// the total file size.
#[derive(Debug, Clone, Default)]
pub struct FileLayout {
    /// Length of the per-file header (textual section plus binary tables).
    pub header_len: u64,
    /// Bytes of per-channel scalars per block, for one channel.
    pub per_channel_block_len: usize,
    /// Bytes of per-block scalars per block.
    pub per_block_len: usize,
    /// Bytes of per-channel scalars per block, all channels.
    pub header_bytes_per_block: usize,
    /// Bytes of raw sample data per block, all channels.
    pub data_bytes_per_block: usize,
    /// Total bytes of one block.
    pub total_bytes_per_block: usize,
    /// Number of complete blocks after the header.
    pub block_count: u64,
    /// Samples per channel per block.
    pub points_per_block: usize,
    /// Samples per channel across the whole file.
    pub points_per_channel_total: usize,
    /// Reciprocal of the sampling interval, in Hz.
    pub sample_rate: f64,
}

impl FileLayout {
    /// Derive the block geometry. Fails with `IncompleteBlock` when the bytes
    /// after the header do not divide into whole blocks.
    pub fn compute(
        per_file_params: &ParamValues,
        per_block_list: &ParamList,
        per_channel_list: &ParamList,
        channel_count: usize,
        header_len: u64,
        file_size: u64,
    ) -> Result<Self> {
        let points_per_block = per_file_params.require_usize(PARAM_POINTS_PER_BLOCK)?;
        let sampling_interval = per_file_params.require_f64(PARAM_SAMPLING_INTERVAL)?;

        let per_channel_block_len = param_list_byte_len(per_channel_list);
        let per_block_len = param_list_byte_len(per_block_list);
        let header_bytes_per_block = per_channel_block_len * channel_count;
        let data_bytes_per_block = points_per_block * 2 * channel_count;
        let total_bytes_per_block = header_bytes_per_block + data_bytes_per_block + per_block_len;

        let payload = file_size.saturating_sub(header_len);
        let (block_count, remainder) = if total_bytes_per_block == 0 {
            (0, payload)
        } else {
            let total = total_bytes_per_block as u64;
            (payload / total, payload % total)
        };
        if remainder != 0 {
            return Err(HkdError::IncompleteBlock { remainder });
        }

        Ok(FileLayout {
            header_len,
            per_channel_block_len,
            per_block_len,
            header_bytes_per_block,
            data_bytes_per_block,
            total_bytes_per_block,
            block_count,
            points_per_block,
            points_per_channel_total: points_per_block * block_count as usize,
            sample_rate: 1.0 / sampling_interval,
        })
    }
}

/// Sum of the encoded widths of all parameters in a list.
pub fn param_list_byte_len(list: &ParamList) -> usize {
    list.iter().map(|p| p.encoding.byte_len()).sum()
}

/// One extracted time window of channel-0 data.
#[derive(Debug, Clone)]
pub struct TraceWindow {
    /// Scaled current over the window.
    pub current: Vec<f64>,
    /// Time axis of the same length, starting at zero.
    pub time: Vec<f64>,
    /// Sample rate of the underlying file in Hz.
    pub sample_rate: f64,
    /// Per-block voltage over the window.
    pub voltage: Vec<f64>,
    /// Full-series length before windowing.
    pub total_len: usize,
}

/// Which trace a block read should produce.
#[derive(Clone, Copy, PartialEq, Eq)]
enum TraceKind {
    Current,
    Voltage,
}

/// Streaming reader for HEKA nanopore experiment data files.
///
/// The header and block geometry are parsed once at open time; sample data is
/// read block by block on demand, so large files never need to fit in memory.
pub struct HkdFile {
    file: BufReader<File>,
    file_path: String,
    per_file_list: ParamList,
    per_block_list: ParamList,
    per_channel_list: ParamList,
    channel_list: ParamList,
    per_file_params: ParamValues,
    layout: FileLayout,
    next_block: u64,
}

impl HkdFile {
    /// Open a file and parse its header.
    ///
    /// Validates the textual signature, skips the remaining header text, reads
    /// the four self-describing parameter lists and the per-file scalars, and
    /// derives the block geometry. Any failure drops the file handle.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_string_lossy().to_string();
        let file = File::open(&path)?;
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let first = read_header_line(&mut reader)?;
        if !first.contains(FORMAT_SIGNATURE) {
            return Err(HkdError::UnrecognizedFormat);
        }
        loop {
            let line = read_header_line(&mut reader)?;
            if line.contains(HEADER_TERMINATOR) {
                break;
            }
        }

        let per_file_list = read_param_list(&mut reader, Encoding::Text64)?;
        let per_block_list = read_param_list(&mut reader, Encoding::Text64)?;
        let per_channel_list = read_param_list(&mut reader, Encoding::Text64)?;
        let channel_list = read_param_list(&mut reader, Encoding::Text512)?;

        let per_file_params =
            read_param_values(&mut reader, &per_file_list)?.ok_or(HkdError::TruncatedHeader)?;

        let header_len = reader.stream_position()?;
        let layout = FileLayout::compute(
            &per_file_params,
            &per_block_list,
            &per_channel_list,
            channel_list.len(),
            header_len,
            file_size,
        )?;

        debug!(
            blocks = layout.block_count,
            channels = channel_list.len(),
            sample_rate = layout.sample_rate,
            "opened HEKA data file {}",
            file_path
        );

        Ok(HkdFile {
            file: reader,
            file_path,
            per_file_list,
            per_block_list,
            per_channel_list,
            channel_list,
            per_file_params,
            layout,
            next_block: 0,
        })
    }

    /// Explicitly close the reader. Dropping it is equivalent.
    pub fn close(self) {}

    /// Path the file was opened from.
    pub fn path(&self) -> &str {
        &self.file_path
    }

    /// Derived byte geometry of the file.
    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    /// Per-file scalar parameters decoded from the header.
    pub fn per_file_params(&self) -> &ParamValues {
        &self.per_file_params
    }

    /// Declared parameter tables: per-file, per-block, per-channel.
    pub fn param_lists(&self) -> (&ParamList, &ParamList, &ParamList) {
        (&self.per_file_list, &self.per_block_list, &self.per_channel_list)
    }

    pub fn sample_rate(&self) -> f64 {
        self.layout.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channel_list.len()
    }

    /// Channel names from the directory, in acquisition order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channel_list.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn block_count(&self) -> u64 {
        self.layout.block_count
    }

    /// Samples per channel across the whole file.
    pub fn total_samples(&self) -> usize {
        self.layout.points_per_channel_total
    }

    /// Recording duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.layout.points_per_channel_total as f64 / self.layout.sample_rate
    }

    /// Seek back to the first data block, so the file can be scanned again.
    pub fn rewind_to_data(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(self.layout.header_len))?;
        self.next_block = 0;
        Ok(())
    }

    /// Read the next block as per-channel current arrays, scaled by each
    /// channel's `Scale` parameter.
    ///
    /// `Ok(None)` is the clean end-of-stream signal: the cursor sat at a block
    /// boundary with no further bytes. Repeated calls after the end keep
    /// returning `Ok(None)`. Running out of data *inside* a block is the
    /// fatal `TruncatedBlock` error instead.
    pub fn read_next_block(&mut self) -> Result<Option<Vec<Vec<f64>>>> {
        self.read_block(TraceKind::Current)
    }

    /// Read the next block as per-channel voltage arrays.
    ///
    /// Raw samples are consumed but discarded; each channel's output is its
    /// `Voltage` parameter broadcast across the block, since the applied
    /// voltage is constant within a block.
    pub fn read_next_block_voltages(&mut self) -> Result<Option<Vec<Vec<f64>>>> {
        self.read_block(TraceKind::Voltage)
    }

    fn read_block(&mut self, kind: TraceKind) -> Result<Option<Vec<Vec<f64>>>> {
        if self.file.fill_buf()?.is_empty() {
            return Ok(None);
        }
        let per_block = read_param_values(&mut self.file, &self.per_block_list)?;
        if per_block.is_none() {
            return Ok(None);
        }

        let block = self.next_block;
        let mut channel_params = Vec::with_capacity(self.channel_list.len());
        for _ in &self.channel_list {
            let params = read_param_values(&mut self.file, &self.per_channel_list)?
                .ok_or(HkdError::TruncatedBlock { block })?;
            channel_params.push(params);
        }

        let mut data = Vec::with_capacity(self.channel_list.len());
        let mut raw = vec![0i16; self.layout.points_per_block];
        for params in &channel_params {
            match self.file.read_i16_into::<BigEndian>(&mut raw) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(HkdError::TruncatedBlock { block });
                }
                Err(e) => return Err(HkdError::Io(e)),
            }
            match kind {
                TraceKind::Current => {
                    let scale = params.require_f64(PARAM_SCALE)?;
                    data.push(raw.iter().map(|&s| s as f64 * scale).collect());
                }
                TraceKind::Voltage => {
                    let voltage = params.require_f64(PARAM_VOLTAGE)?;
                    data.push(vec![voltage; self.layout.points_per_block]);
                }
            }
        }

        self.next_block += 1;
        Ok(Some(data))
    }

    /// Read the whole file into per-channel current and voltage arrays.
    ///
    /// Non-decimated arrays hold every sample; decimated arrays hold the
    /// `(max, min)` pair of each block, for overview rendering at 2 values
    /// per block. The file is rescanned from the first block on every call,
    /// once for currents and once for voltages.
    pub fn read_all_channels(&mut self, decimate: bool) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        let currents = self.read_all(TraceKind::Current, decimate)?;
        let voltages = self.read_all(TraceKind::Voltage, decimate)?;
        debug!(
            blocks = self.layout.block_count,
            decimate, "scanned all channels of {}", self.file_path
        );
        Ok((currents, voltages))
    }

    fn read_all(&mut self, kind: TraceKind, decimate: bool) -> Result<Vec<Vec<f64>>> {
        self.rewind_to_data()?;

        let len = if decimate {
            self.layout.block_count as usize * 2
        } else {
            self.layout.points_per_channel_total
        };
        let mut data = vec![vec![0.0f64; len]; self.channel_list.len()];

        for i in 0..self.layout.block_count as usize {
            let Some(block) = self.read_block(kind)? else {
                break;
            };
            for (channel, samples) in block.iter().enumerate() {
                if decimate {
                    let max = samples.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                    let min = samples.iter().fold(f64::INFINITY, |a, &b| a.min(b));
                    data[channel][2 * i] = max;
                    data[channel][2 * i + 1] = min;
                } else {
                    let start = i * self.layout.points_per_block;
                    data[channel][start..start + samples.len()].copy_from_slice(samples);
                }
            }
        }

        Ok(data)
    }

    /// Read up to `n_blocks` consecutive blocks from the current cursor and
    /// concatenate them channel-wise.
    ///
    /// Stops early at end of stream or after a short final block. Returns
    /// `Ok(None)` when the very first read already signals end of stream.
    pub fn read_next_n_blocks(&mut self, n_blocks: usize) -> Result<Option<Vec<Vec<f64>>>> {
        let mut blocks = Vec::new();
        for _ in 0..n_blocks {
            match self.read_next_block()? {
                Some(block) => {
                    let size = block.first().map_or(0, |c| c.len());
                    blocks.push(block);
                    if size < self.layout.points_per_block {
                        break;
                    }
                }
                None => break,
            }
        }
        if blocks.is_empty() {
            return Ok(None);
        }

        let total: usize = blocks
            .iter()
            .map(|b| b.first().map_or(0, |c| c.len()))
            .sum();
        let mut data = vec![Vec::with_capacity(total); self.channel_list.len()];
        for block in &blocks {
            for (channel, samples) in block.iter().enumerate() {
                data[channel].extend_from_slice(samples);
            }
        }
        Ok(Some(data))
    }

    /// Extract a `[start, stop)` time window of channel-0 current and voltage,
    /// using the default decimation divisor.
    ///
    /// `stop == 0.0` selects the entire series. The whole file is scanned on
    /// every call; the cursor is left at end of stream.
    pub fn extract_range(&mut self, start: f64, stop: f64, decimate: bool) -> Result<TraceWindow> {
        self.extract_range_with_divisor(start, stop, decimate, DEFAULT_DECIMATION_RATE)
    }

    /// `extract_range` with an explicit decimation block divisor, used to map
    /// decimated indices back to sample time.
    pub fn extract_range_with_divisor(
        &mut self,
        start: f64,
        stop: f64,
        decimate: bool,
        dec_rate: usize,
    ) -> Result<TraceWindow> {
        let (currents, voltages) = self.read_all_channels(decimate)?;
        let data = currents.into_iter().next().unwrap_or_default();
        let volts = voltages.into_iter().next().unwrap_or_default();
        let sample_rate = self.layout.sample_rate;
        let total_len = data.len();

        let mut start_len = (start * sample_rate) as usize;
        let mut stop_len = (stop * sample_rate) as usize;
        if decimate {
            start_len /= dec_rate;
            stop_len /= dec_rate;
        }

        let mut stop = stop;
        if stop == 0.0 {
            stop_len = total_len;
            stop = if decimate {
                ((stop_len * dec_rate) as f64 / sample_rate).trunc()
            } else {
                (stop_len as f64 / sample_rate).trunc()
            };
        }

        let start_idx = start_len.min(total_len);
        let stop_idx = stop_len.min(total_len).max(start_idx);
        let length = stop_idx - start_idx;

        Ok(TraceWindow {
            current: data[start_idx..stop_idx].to_vec(),
            time: linspace(0.0, stop - start, length),
            sample_rate,
            voltage: volts[start_idx..stop_idx].to_vec(),
            total_len,
        })
    }

    /// Write full-resolution traces to a CSV file: a time column followed by
    /// current and voltage columns for every channel.
    pub fn write_csv<P: AsRef<Path>>(&mut self, output_file: P) -> Result<()> {
        let (currents, voltages) = self.read_all_channels(false)?;

        let file = File::create(output_file)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "Time")?;
        for channel in 0..self.channel_count() {
            write!(writer, ",Current{channel},Voltage{channel}")?;
        }
        writeln!(writer)?;

        let dt = 1.0 / self.layout.sample_rate;
        for row in 0..self.layout.points_per_channel_total {
            write!(writer, "{:.9e}", row as f64 * dt)?;
            for channel in 0..currents.len() {
                write!(
                    writer,
                    ",{:.6e},{:.6e}",
                    currents[channel][row], voltages[channel][row]
                )?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the decimated overview to a CSV file: one row per block with the
    /// block start time and each channel's max/min current.
    pub fn write_csv_overview<P: AsRef<Path>>(&mut self, output_file: P) -> Result<()> {
        let (currents, _) = self.read_all_channels(true)?;

        let file = File::create(output_file)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "Block,Time")?;
        for channel in 0..self.channel_count() {
            write!(writer, ",Max{channel},Min{channel}")?;
        }
        writeln!(writer)?;

        let block_secs = self.layout.points_per_block as f64 / self.layout.sample_rate;
        for block in 0..self.layout.block_count as usize {
            write!(writer, "{},{:.9e}", block, block as f64 * block_secs)?;
            for channel in currents.iter() {
                write!(writer, ",{:.6e},{:.6e}", channel[2 * block], channel[2 * block + 1])?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Read one textual header line; EOF before a line is a truncated header.
fn read_header_line(reader: &mut BufReader<File>) -> Result<String> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Err(HkdError::TruncatedHeader);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Fill `buf` completely, or report `false` if end of stream arrived first.
fn try_read_exact(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(true)
}

/// Read one self-describing parameter list:
/// 3 reserved bytes, a u8 parameter count, then per parameter a u8 type code
/// and a fixed-width name encoded at `name_encoding`.
fn read_param_list(reader: &mut impl Read, name_encoding: Encoding) -> Result<ParamList> {
    let mut reserved = [0u8; 3];
    if !try_read_exact(reader, &mut reserved)? {
        return Err(HkdError::TruncatedHeader);
    }
    let mut count = [0u8; 1];
    if !try_read_exact(reader, &mut count)? {
        return Err(HkdError::TruncatedHeader);
    }

    let mut list = Vec::with_capacity(count[0] as usize);
    let mut name_buf = vec![0u8; name_encoding.byte_len()];
    for _ in 0..count[0] {
        let mut code = [0u8; 1];
        if !try_read_exact(reader, &mut code)? {
            return Err(HkdError::TruncatedHeader);
        }
        let encoding = Encoding::from_code(code[0])?;
        if !try_read_exact(reader, &mut name_buf)? {
            return Err(HkdError::TruncatedHeader);
        }
        list.push(ParamDescriptor {
            name: decode_name(&name_buf),
            encoding,
        });
    }
    Ok(list)
}

/// Read one scalar value per descriptor, in declared order.
///
/// `Ok(None)` means the stream ended before the table was complete; during
/// block iteration that is the end-of-stream signal, not an error.
fn read_param_values(reader: &mut impl Read, list: &ParamList) -> Result<Option<ParamValues>> {
    let mut values = Vec::with_capacity(list.len());
    for descriptor in list {
        match read_value(reader, descriptor.encoding)? {
            Some(value) => values.push((descriptor.name.clone(), value)),
            None => return Ok(None),
        }
    }
    Ok(Some(ParamValues(values)))
}

/// Decode one value at the given encoding; `Ok(None)` on end of stream.
fn read_value(reader: &mut impl Read, encoding: Encoding) -> Result<Option<ParamValue>> {
    if matches!(encoding, Encoding::Text64 | Encoding::Text512) {
        let mut buf = vec![0u8; encoding.byte_len()];
        if !try_read_exact(reader, &mut buf)? {
            return Ok(None);
        }
        return Ok(Some(ParamValue::Text(decode_name(&buf))));
    }

    let mut buf = [0u8; 8];
    let field = &mut buf[..encoding.byte_len()];
    if !try_read_exact(reader, field)? {
        return Ok(None);
    }
    let value = match encoding {
        Encoding::UInt8 => ParamValue::UInt(field[0] as u64),
        Encoding::UInt16 => ParamValue::UInt(BigEndian::read_u16(field) as u64),
        Encoding::UInt32 => ParamValue::UInt(BigEndian::read_u32(field) as u64),
        Encoding::Int8 => ParamValue::Int(field[0] as i8 as i64),
        Encoding::Int16 => ParamValue::Int(BigEndian::read_i16(field) as i64),
        Encoding::Int32 => ParamValue::Int(BigEndian::read_i32(field) as i64),
        Encoding::Float32 => ParamValue::Float(BigEndian::read_f32(field) as f64),
        Encoding::Float64 => ParamValue::Float(BigEndian::read_f64(field)),
        Encoding::UInt16Le => ParamValue::UInt(LittleEndian::read_u16(field) as u64),
        Encoding::Text64 | Encoding::Text512 => unreachable!(),
    };
    Ok(Some(value))
}

/// Strip trailing NUL/whitespace padding from a fixed-width name field.
fn decode_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// Evenly spaced values from `start` to `stop` inclusive.
fn linspace(start: f64, stop: f64, len: usize) -> Vec<f64> {
    if len < 2 {
        return vec![start; len];
    }
    let step = (stop - start) / (len - 1) as f64;
    (0..len).map(|i| start + step * i as f64).collect()
}
