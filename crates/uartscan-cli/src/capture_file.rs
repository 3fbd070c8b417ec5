//! On-disk capture format.
//!
//! Layout, all little endian:
//!
//! | Offset | Size | Field                      |
//! |--------|------|----------------------------|
//! | 0      | 8    | Magic `UARTSCAN`           |
//! | 8      | 2    | Format version (currently 1) |
//! | 10     | 2    | Flags (zero)               |
//! | 12     | 8    | Sample rate (samples/s)    |
//! | 20     | n    | One byte per sample, 0 or 1 |

use anyhow::{bail, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"UARTSCAN";
const VERSION: u16 = 1;
const HEADER_LEN: u64 = 20;

/// Write a capture file.
pub fn write_capture(path: &Path, sample_rate: u64, levels: &[bool]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writer.write_all(MAGIC)?;
    writer.write_u16::<LittleEndian>(VERSION)?;
    writer.write_u16::<LittleEndian>(0)?;
    writer.write_u64::<LittleEndian>(sample_rate)?;
    for &level in levels {
        writer.write_u8(level as u8)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a capture file, returning its sample rate and levels.
pub fn read_capture(path: &Path) -> Result<(u64, Vec<bool>)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let len = file.metadata()?.len();
    if len < HEADER_LEN {
        bail!("{} is too short to be a capture file", path.display());
    }
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        bail!("{} is not a uartscan capture", path.display());
    }
    let version = reader.read_u16::<LittleEndian>()?;
    if version != VERSION {
        bail!("unsupported capture version {version}");
    }
    let _flags = reader.read_u16::<LittleEndian>()?;
    let sample_rate = reader.read_u64::<LittleEndian>()?;

    let mut bytes = vec![0u8; (len - HEADER_LEN) as usize];
    reader.read_exact(&mut bytes)?;
    let levels = bytes.into_iter().map(|b| b != 0).collect();

    Ok((sample_rate, levels))
}
