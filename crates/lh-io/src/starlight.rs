//! STARlight text output.
//!
//! Each event is one `EVENT:` line, one `VERTEX:` line and one `TRACK:` line
//! per track:
//!
//! ```text
//! EVENT: <id> <ntracks> <nvertices>
//! VERTEX: <x> <y> <z> <t> <vertex> <process> <parent> <ndaughters>
//! TRACK: <gpid> <px> <py> <pz> <event> <start> <end> <pdg> [pythia fields...]
//! ```
//!
//! Blank lines between records are ignored. The file carries a single view:
//! the event is reported as both generated and reconstructed.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use lh_core::{Error, Event, EventSource, FourVector, PION_MASS, Result, Track};

/// Event source over a STARlight output file.
#[derive(Debug)]
pub struct StarlightSource<R> {
    origin: String,
    reader: R,
    mass: f64,
    line_no: usize,
    /// Next non-blank line and its number, read ahead by `has_more`.
    pending: Option<(usize, String)>,
    current: Event,
}

impl StarlightSource<BufReader<File>> {
    /// Open a file. Tracks get the pion mass unless changed with
    /// [`StarlightSource::with_mass`].
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead + Seek> StarlightSource<R> {
    /// Wrap an already open reader. `origin` names it in diagnostics.
    pub fn from_reader(reader: R, origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            reader,
            mass: PION_MASS,
            line_no: 0,
            pending: None,
            current: Event::default(),
        }
    }

    /// Mass hypothesis applied to every track.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = buf.trim();
            if !line.is_empty() {
                return Ok(Some((self.line_no, line.to_string())));
            }
        }
    }

    fn record(&mut self, tag: &'static str) -> Result<(usize, String)> {
        match self.next_line()? {
            Some((n, line)) => {
                if line.split_whitespace().next() != Some(tag) {
                    return Err(Error::malformed(
                        &self.origin,
                        format!("line {n}"),
                        format!("expected '{tag}' record"),
                    ));
                }
                Ok((n, line))
            }
            None => Err(Error::malformed(
                &self.origin,
                format!("line {}", self.line_no + 1),
                format!("unexpected end of input, expected '{tag}' record"),
            )),
        }
    }

    fn read_event(&mut self) -> Result<Event> {
        let (n, line) = self.record("EVENT:")?;
        let mut f = Fields::new(&self.origin, n, &line);
        let mut event = Event::new(f.parse("event id")?);
        let ntracks: usize = f.parse("track count")?;
        let _nvertices: usize = f.parse("vertex count")?;

        let (n, line) = self.record("VERTEX:")?;
        let mut f = Fields::new(&self.origin, n, &line);
        for what in ["vertex x", "vertex y", "vertex z", "vertex t"] {
            f.parse::<f64>(what)?;
        }
        for what in ["vertex number", "process", "parent track", "daughter count"] {
            f.parse::<i64>(what)?;
        }

        for _ in 0..ntracks {
            let (n, line) = self.record("TRACK:")?;
            let mut f = Fields::new(&self.origin, n, &line);
            let gpid = f.parse("gpid")?;
            let (px, py, pz) = (f.parse("px")?, f.parse("py")?, f.parse("pz")?);
            for what in ["event number", "start vertex", "end vertex"] {
                f.parse::<i64>(what)?;
            }
            let pdg_id = f.parse("pdg code")?;
            event.add_track(Track {
                p: FourVector::from_mass_momentum(self.mass, px, py, pz),
                gpid,
                pdg_id,
                ..Track::default()
            });
        }
        Ok(event)
    }
}

impl<R: BufRead + Seek> EventSource for StarlightSource<R> {
    fn has_more(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            self.pending = self.next_line()?;
        }
        Ok(self.pending.is_some())
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.read_event()?;
        Ok(())
    }

    fn generated(&self) -> &Event {
        &self.current
    }

    fn reconstructed(&self) -> Option<&Event> {
        Some(&self.current)
    }

    fn reset(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.line_no = 0;
        self.pending = None;
        self.current = Event::default();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.origin
    }
}

/// Whitespace fields of one record, after its tag.
struct Fields<'a> {
    origin: &'a str,
    line: usize,
    tokens: SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(origin: &'a str, line: usize, text: &'a str) -> Self {
        let mut tokens = text.split_whitespace();
        tokens.next();
        Self { origin, line, tokens }
    }

    fn parse<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let token = self.tokens.next().ok_or_else(|| {
            Error::malformed(self.origin, format!("line {}", self.line), format!("missing {what}"))
        })?;
        token.parse().map_err(|_| {
            Error::malformed(
                self.origin,
                format!("line {}", self.line),
                format!("invalid {what} '{token}'"),
            )
        })
    }
}
