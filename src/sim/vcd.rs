//! Value Change Dump (IEEE 1364) waveform sink.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::common::{Result, SimError};
use crate::sim::model::TraceVar;
use crate::sim::trace::WaveformSink;

/// Writes dumps as a VCD file, emitting only values that changed.
pub struct VcdSink<W: Write> {
    out: W,
    timescale_ns: u32,
    ids: Vec<String>,
    widths: Vec<u32>,
    last: Vec<Option<u64>>,
    closed: bool,
}

impl VcdSink<BufWriter<File>> {
    /// Creates (or truncates) a VCD file at `path`.
    pub fn create(path: &Path, timescale_ns: u32) -> Result<Self> {
        let file = File::create(path).map_err(|source| SimError::WaveformOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), timescale_ns))
    }
}

impl<W: Write> VcdSink<W> {
    pub fn new(out: W, timescale_ns: u32) -> Self {
        Self {
            out,
            timescale_ns,
            ids: Vec::new(),
            widths: Vec::new(),
            last: Vec::new(),
            closed: false,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn write_value(&mut self, index: usize, value: u64) -> io::Result<()> {
        if self.widths[index] == 1 {
            writeln!(self.out, "{}{}", value & 1, self.ids[index])
        } else {
            writeln!(self.out, "b{:b} {}", value, self.ids[index])
        }
    }
}

impl<W: Write> WaveformSink for VcdSink<W> {
    fn begin(&mut self, vars: &[TraceVar]) -> io::Result<()> {
        writeln!(
            self.out,
            "$version {} {} $end",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.out, "$timescale {}ns $end", self.timescale_ns)?;

        let mut open: Vec<&str> = Vec::new();
        for (i, var) in vars.iter().enumerate() {
            let path: Vec<&str> = var.scope.split('.').collect();
            let common = open
                .iter()
                .zip(path.iter())
                .take_while(|(a, b)| a == b)
                .count();
            for _ in common..open.len() {
                writeln!(self.out, "$upscope $end")?;
            }
            open.truncate(common);
            for &name in &path[common..] {
                writeln!(self.out, "$scope module {} $end", name)?;
                open.push(name);
            }

            let id = id_code(i);
            writeln!(self.out, "$var wire {} {} {} $end", var.width, id, var.name)?;
            self.ids.push(id);
            self.widths.push(var.width);
            self.last.push(None);
        }
        for _ in 0..open.len() {
            writeln!(self.out, "$upscope $end")?;
        }
        writeln!(self.out, "$enddefinitions $end")
    }

    fn dump(&mut self, time: u64, values: &[u64]) -> io::Result<()> {
        writeln!(self.out, "#{}", time)?;
        for (i, &value) in values.iter().enumerate().take(self.ids.len()) {
            if self.last[i] != Some(value) {
                self.write_value(i, value)?;
                self.last[i] = Some(value);
            }
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.out.flush()
    }
}

/// Encodes `n` as a VCD identifier over the printable range `!`..=`~`.
fn id_code(mut n: usize) -> String {
    const BASE: usize = 94;
    let mut id = String::new();
    loop {
        id.push((b'!' + (n % BASE) as u8) as char);
        n /= BASE;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    id
}
