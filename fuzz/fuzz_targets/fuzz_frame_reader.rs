#![no_main]
use libfuzzer_sys::fuzz_target;
use skin_config::LayoutRow;
use skin_core::counters::Counters;
use skin_core::frame_reader::{FrameReader, WireParams};
use skin_core::layout::Layout;
use skin_traits::SerialDevice;

/// Feeds the fuzz input back in small chunks, to exercise partial-record
/// reads the same way a real slow serial line would.
struct ChunkedDevice<'a> {
    data: &'a [u8],
    pos: usize,
}

impl SerialDevice for ChunkedDevice<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let remaining = &self.data[self.pos..];
        if remaining.is_empty() {
            return Ok(0);
        }
        let n = remaining.len().min(buf.len()).min(3);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn write_all(&mut self, _buf: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let layout = Layout::load(&[
        LayoutRow { patch: 1, cell: 0, x: 0.0, y: 0.0 },
        LayoutRow { patch: 1, cell: 1, x: 1.0, y: 0.0 },
        LayoutRow { patch: 2, cell: 0, x: 0.0, y: 1.0 },
    ])
    .expect("fixed fuzz layout is well-formed");

    let wire = WireParams::default();
    let mut reader = FrameReader::new(&wire);
    let mut device = ChunkedDevice { data, pos: 0 };
    let counters = Counters::default();

    loop {
        match reader.next_record(&mut device, &layout, &counters) {
            Ok(Some(_record)) => continue,
            Ok(None) => break,
            Err(_) => break,
        }
    }

    // total_bytes tallied by the reader must never exceed what the device
    // actually returned.
    assert!(counters.total_bytes() <= data.len() as u64);
});
