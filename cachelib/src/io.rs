use std::fs::File;
use std::io::{BufRead, BufReader};
use crate::error::Result;

/// Opens a trace for the strictly sequential reads [`crate::simulator::Simulator::simulate`] does
///
/// Memory maps the file on unix, advising the OS of the access pattern, and falls back to a large
/// buffered reader elsewhere. Empty files are never mapped
pub fn get_reader(file: File) -> Result<Box<dyn BufRead>> {
    if file.metadata()?.len() == 0 {
        return Ok(Box::new(BufReader::new(file)));
    }
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        // 4096 is the standard block size (or a multiple of it) on most systems
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // Safety: the mapping is only read, and the simulator never outlives the run; a trace
        // truncated by another process while mapped is outside what we support
        let mmap = unsafe { Mmap::map(&file)? };
        if let Err(e) = mmap.advise(Advice::Sequential) {
            tracing::debug!("couldn't advise the OS of sequential access: {e}");
        }
        Ok(Box::new(Cursor::new(mmap)))
    }
}
