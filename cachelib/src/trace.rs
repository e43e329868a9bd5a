use std::io::BufRead;
use crate::error::{Result, SimError};
use crate::simulator::Operation;

/// One line of a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord {
    pub operation: Operation,
    pub address: u64,
}

/// Parses one trace line, `None` for blank lines and `#` comments
///
/// The reason in the error is meant to be wrapped with the line number by the caller
///
/// # Examples
///
/// ```
/// use cachelib::simulator::Operation;
/// use cachelib::trace::parse_record;
/// let record = parse_record("W 0x1f").unwrap().unwrap();
/// assert_eq!(record.operation, Operation::Store);
/// assert_eq!(record.address, 0x1f);
/// ```
pub fn parse_record(line: &str) -> std::result::Result<Option<AccessRecord>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut tokens = line.split_whitespace();
    let operation = match tokens.next() {
        Some("R") | Some("r") => Operation::Load,
        Some("W") | Some("w") => Operation::Store,
        Some(other) => return Err(format!("unknown operation {other:?}, expected R or W")),
        None => return Ok(None),
    };
    let address = tokens.next().ok_or_else(|| "missing address".to_string())?;
    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected token {extra:?} after the address"));
    }
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    let address = u64::from_str_radix(digits, 16)
        .map_err(|e| format!("couldn't parse address {address:?} as hexadecimal: {e}"))?;
    Ok(Some(AccessRecord { operation, address }))
}

/// Iterates over the records of a trace in file order
///
/// Stops after the first error, a malformed line is never skipped
pub struct TraceReader<R: BufRead> {
    reader: R,
    buffer: String,
    line: usize,
    failed: bool,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line: 0,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<AccessRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.failed {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
            }
            self.line += 1;
            match parse_record(&self.buffer) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(reason) => {
                    self.failed = true;
                    return Some(Err(SimError::Trace { line: self.line, reason }));
                }
            }
        }
        None
    }
}
