//! Minimal FITS reader and writer for HEALPix maps.
//!
//! HEALPix maps are stored as the first column of a binary-table extension
//! (`XTENSION = 'BINTABLE'`), usually with a repeat count per row (for example
//! `TFORM1 = '1024E'`). The header carries `NSIDE` and `ORDERING`.
//!
//! Only implicit, full-sky maps are supported. Partial-sky (explicitly
//! indexed) maps are rejected.

use std::path::Path;

use tracing::debug;

use super::{pixel, HealpixMap, Ordering};
use crate::error::MapError;

const BLOCK: usize = 2880;
const CARD: usize = 80;

/// One parsed header: keyword/value pairs in file order.
#[derive(Debug, Default)]
struct Header {
    cards: Vec<(String, String)>,
}

impl Header {
    fn get(&self, key: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn get_int(&self, key: &str) -> Result<Option<i64>, MapError> {
        self.get(key)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| MapError::Format(format!("{key} = {v} is not an integer")))
            })
            .transpose()
    }

    fn require_int(&self, key: &str) -> Result<i64, MapError> {
        self.get_int(key)?
            .ok_or_else(|| MapError::Format(format!("missing {key} keyword")))
    }

    fn get_float(&self, key: &str) -> Result<Option<f64>, MapError> {
        self.get(key)
            .map(|v| {
                v.replace(['D', 'd'], "E")
                    .parse::<f64>()
                    .map_err(|_| MapError::Format(format!("{key} = {v} is not a number")))
            })
            .transpose()
    }

    /// Integer keyword that must be present and non-negative.
    fn require_count(&self, key: &str) -> Result<usize, MapError> {
        to_count(key, self.require_int(key)?)
    }

    fn get_count(&self, key: &str, default: usize) -> Result<usize, MapError> {
        self.get_int(key)?
            .map_or(Ok(default), |v| to_count(key, v))
    }

    /// Size in bytes of the data unit following this header, before padding.
    fn data_len(&self) -> Result<usize, MapError> {
        let naxis = self.get_count("NAXIS", 0)?;
        if naxis == 0 {
            return Ok(0);
        }
        let bitpix = self.require_int("BITPIX")?;
        let mut n = (bitpix.unsigned_abs() / 8) as usize;
        for axis in 1..=naxis {
            n = n
                .checked_mul(self.require_count(&format!("NAXIS{axis}"))?)
                .ok_or_else(too_large)?;
        }
        let pcount = self.get_count("PCOUNT", 0)?;
        let gcount = self.get_count("GCOUNT", 1)?;
        n.checked_add(pcount)
            .and_then(|n| n.checked_mul(gcount))
            .ok_or_else(too_large)
    }
}

fn to_count(key: &str, value: i64) -> Result<usize, MapError> {
    usize::try_from(value).map_err(|_| MapError::Format(format!("{key} = {value} is negative")))
}

fn too_large() -> MapError {
    MapError::Format("data unit size overflows".into())
}

/// Parse one 80-byte card into `(keyword, value)`; cards without a value
/// indicator (`COMMENT`, `HISTORY`, blank) yield `None`.
fn parse_card(card: &[u8]) -> Option<(String, String)> {
    let text = String::from_utf8_lossy(card);
    let key = text.get(0..8)?.trim().to_string();
    if text.get(8..10) != Some("= ") {
        return Some((key, String::new())).filter(|(k, _)| k == "END");
    }
    let raw = text.get(10..)?.trim_start();
    let value = if let Some(rest) = raw.strip_prefix('\'') {
        // quoted string, '' is an escaped quote
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    out.push('\'');
                    chars.next();
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        out.trim_end().to_string()
    } else {
        raw.split('/').next().unwrap_or("").trim().to_string()
    };
    Some((key, value))
}

/// Read the header starting at `offset`; returns it with the offset of its data unit.
fn read_header(bytes: &[u8], offset: usize) -> Result<(Header, usize), MapError> {
    let mut header = Header::default();
    let mut pos = offset;
    loop {
        let card = bytes
            .get(pos..pos + CARD)
            .ok_or_else(|| MapError::Format("header without END card".into()))?;
        pos += CARD;
        match parse_card(card) {
            Some((key, _)) if key == "END" => break,
            Some(kv) => header.cards.push(kv),
            None => {}
        }
    }
    Ok((header, pad(pos)))
}

fn pad(n: usize) -> usize {
    n.div_ceil(BLOCK) * BLOCK
}

/// Element type of a binary-table column.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnType {
    Logical,
    Bit,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
    ComplexFloat,
    ComplexDouble,
    Descriptor32,
    Descriptor64,
}

impl ColumnType {
    fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'L' => Self::Logical,
            'X' => Self::Bit,
            'B' => Self::Byte,
            'I' => Self::Short,
            'J' => Self::Int,
            'K' => Self::Long,
            'A' => Self::Char,
            'E' => Self::Float,
            'D' => Self::Double,
            'C' => Self::ComplexFloat,
            'M' => Self::ComplexDouble,
            'P' => Self::Descriptor32,
            'Q' => Self::Descriptor64,
            _ => return None,
        })
    }

    /// Bytes used by `repeat` elements of this type in a row; `None` on overflow.
    fn width(&self, repeat: usize) -> Option<usize> {
        match self {
            Self::Bit => Some(repeat.div_ceil(8)),
            Self::Logical | Self::Byte | Self::Char => Some(repeat),
            Self::Short => repeat.checked_mul(2),
            Self::Int | Self::Float => repeat.checked_mul(4),
            Self::Long | Self::Double | Self::ComplexFloat | Self::Descriptor32 => {
                repeat.checked_mul(8)
            }
            Self::ComplexDouble | Self::Descriptor64 => repeat.checked_mul(16),
        }
    }

    fn decode(&self, b: &[u8]) -> Option<f64> {
        Some(match self {
            Self::Byte => b[0] as f64,
            Self::Short => i16::from_be_bytes(b.try_into().ok()?) as f64,
            Self::Int => i32::from_be_bytes(b.try_into().ok()?) as f64,
            Self::Long => i64::from_be_bytes(b.try_into().ok()?) as f64,
            Self::Float => f32::from_be_bytes(b.try_into().ok()?) as f64,
            Self::Double => f64::from_be_bytes(b.try_into().ok()?),
            _ => return None,
        })
    }
}

/// Parse a `TFORMn` value such as `E`, `1D` or `1024E`.
fn parse_tform(tform: &str) -> Result<(usize, ColumnType), MapError> {
    let tform = tform.trim();
    let split = tform
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| MapError::Format(format!("bad TFORM '{tform}'")))?;
    let repeat = if split == 0 {
        1
    } else {
        tform[..split]
            .parse()
            .map_err(|_| MapError::Format(format!("bad TFORM '{tform}'")))?
    };
    if repeat == 0 {
        return Err(MapError::Format(format!("TFORM '{tform}' has a zero repeat count")));
    }
    let code = tform[split..].chars().next().unwrap_or(' ');
    let ty = ColumnType::from_code(code)
        .ok_or_else(|| MapError::Format(format!("unknown TFORM type '{code}'")))?;
    Ok((repeat, ty))
}

/// Read a full-sky HEALPix map from the first column of the first binary
/// table in a FITS file. The returned map is always in RING order.
pub fn read_map<P: AsRef<Path>>(path: P) -> Result<HealpixMap, MapError> {
    let bytes = std::fs::read(path.as_ref())?;
    let map = parse_map(&bytes)?;
    debug!(
        "Read nside={} map ({} pixels) from {}",
        map.nside(),
        map.npix(),
        path.as_ref().display()
    );
    Ok(map)
}

fn parse_map(bytes: &[u8]) -> Result<HealpixMap, MapError> {
    let (primary, mut data_start) = read_header(bytes, 0)?;
    if primary.get("SIMPLE") != Some("T") {
        return Err(MapError::Format("missing SIMPLE = T".into()));
    }
    let mut header = primary;

    // Walk HDUs until the first binary table
    loop {
        let end = data_start
            .checked_add(header.data_len()?)
            .filter(|&end| end < bytes.len())
            .ok_or_else(|| MapError::Unsupported("no BINTABLE extension".into()))?;
        let next = pad(end);
        if next >= bytes.len() {
            return Err(MapError::Unsupported("no BINTABLE extension".into()));
        }
        let (ext, ext_data) = read_header(bytes, next)?;
        if ext.get("XTENSION").map(str::trim) == Some("BINTABLE") {
            header = ext;
            data_start = ext_data;
            break;
        }
        header = ext;
        data_start = ext_data;
    }

    if let Some(scheme) = header.get("INDXSCHM") {
        if !scheme.eq_ignore_ascii_case("IMPLICIT") {
            return Err(MapError::Unsupported(format!("INDXSCHM = {scheme}")));
        }
    }

    let row_len = header.require_count("NAXIS1")?;
    let nrows = header.require_count("NAXIS2")?;
    let nfields = header.require_count("TFIELDS")?;
    if row_len == 0 {
        return Err(MapError::Format("NAXIS1 = 0, table rows are empty".into()));
    }
    if nfields == 0 {
        return Err(MapError::Unsupported("table has no columns".into()));
    }

    // The map is column 1, which always starts at byte 0 of each row
    let (repeat, ty) = parse_tform(
        header
            .get("TFORM1")
            .ok_or_else(|| MapError::Format("missing TFORM1".into()))?,
    )?;
    let elem = ty.width(1).unwrap_or(0);
    if elem == 0 || ty.decode(&vec![0u8; elem]).is_none() {
        return Err(MapError::Unsupported(format!("column type {ty:?}")));
    }
    let cell_len = ty
        .width(repeat)
        .filter(|&w| w <= row_len)
        .ok_or_else(|| MapError::Format("TFORM1 wider than NAXIS1".into()))?;

    let scale = header.get_float("TSCAL1")?.unwrap_or(1.0);
    let zero = header.get_float("TZERO1")?.unwrap_or(0.0);

    let table = row_len
        .checked_mul(nrows)
        .and_then(|len| data_start.checked_add(len))
        .and_then(|end| bytes.get(data_start..end))
        .ok_or_else(|| MapError::Format("truncated table data".into()))?;

    let mut values = Vec::with_capacity(table.len() / row_len * repeat);
    for row in table.chunks_exact(row_len) {
        for cell in row[..cell_len].chunks_exact(elem) {
            let raw = ty
                .decode(cell)
                .ok_or_else(|| MapError::Unsupported(format!("column type {ty:?}")))?;
            values.push(raw * scale + zero);
        }
    }

    let nside = match header.get_int("NSIDE")? {
        Some(n) => u32::try_from(n).map_err(|_| MapError::InvalidNside(0))?,
        None => pixel::npix2nside(values.len())?,
    };
    pixel::check_nside(nside)?;
    let ordering = match header.get("ORDERING") {
        Some(o) => Ordering::from_keyword(o)
            .ok_or_else(|| MapError::Unsupported(format!("ORDERING = {o}")))?,
        None => {
            debug!("No ORDERING keyword, assuming RING");
            Ordering::Ring
        }
    };

    // Trailing padding elements in the last row
    let npix = pixel::nside2npix(nside);
    if values.len() > npix && values.len() - npix < repeat {
        values.truncate(npix);
    }

    Ok(HealpixMap::new(nside, ordering, values)?.reorder(Ordering::Ring))
}

/// Header card holding a value.
enum CardValue<'a> {
    Str(&'a str),
    Int(i64),
    Bool(bool),
}

fn card(key: &str, value: CardValue) -> String {
    let value = match value {
        CardValue::Str(s) => format!("{:<20}", format!("'{:<8}'", s.replace('\'', "''"))),
        CardValue::Int(i) => format!("{i:>20}"),
        CardValue::Bool(b) => format!("{:>20}", if b { "T" } else { "F" }),
    };
    format!("{key:<8}= {value:<70}")
}

fn push_header(out: &mut Vec<u8>, cards: &[String]) {
    for c in cards {
        out.extend_from_slice(c.as_bytes());
    }
    out.extend_from_slice(format!("{:<80}", "END").as_bytes());
    out.resize(pad(out.len()), b' ');
}

/// Write a map as a single-column (`D`) binary table, one pixel per row, in
/// the map's own ordering.
pub fn write_map<P: AsRef<Path>>(path: P, map: &HealpixMap) -> Result<(), MapError> {
    let npix = map.npix() as i64;
    let mut out = Vec::with_capacity(2 * BLOCK + pad(8 * map.npix()));

    push_header(
        &mut out,
        &[
            card("SIMPLE", CardValue::Bool(true)),
            card("BITPIX", CardValue::Int(8)),
            card("NAXIS", CardValue::Int(0)),
            card("EXTEND", CardValue::Bool(true)),
        ],
    );
    push_header(
        &mut out,
        &[
            card("XTENSION", CardValue::Str("BINTABLE")),
            card("BITPIX", CardValue::Int(8)),
            card("NAXIS", CardValue::Int(2)),
            card("NAXIS1", CardValue::Int(8)),
            card("NAXIS2", CardValue::Int(npix)),
            card("PCOUNT", CardValue::Int(0)),
            card("GCOUNT", CardValue::Int(1)),
            card("TFIELDS", CardValue::Int(1)),
            card("TTYPE1", CardValue::Str("TEMPERATURE")),
            card("TFORM1", CardValue::Str("D")),
            card("PIXTYPE", CardValue::Str("HEALPIX")),
            card("ORDERING", CardValue::Str(map.ordering().keyword())),
            card("NSIDE", CardValue::Int(map.nside() as i64)),
            card("FIRSTPIX", CardValue::Int(0)),
            card("LASTPIX", CardValue::Int(npix - 1)),
            card("INDXSCHM", CardValue::Str("IMPLICIT")),
            card("OBJECT", CardValue::Str("FULLSKY")),
        ],
    );

    let data_start = out.len();
    for v in map.values() {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.resize(data_start + pad(out.len() - data_start), 0);

    std::fs::write(path.as_ref(), out)?;
    debug!(
        "Wrote nside={} map to {}",
        map.nside(),
        path.as_ref().display()
    );
    Ok(())
}
