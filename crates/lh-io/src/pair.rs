//! Two-track generated/reconstructed tables.
//!
//! The generated table has one row per generated event, the reconstructed
//! table one row per event that survived reconstruction. Rows are linked by
//! their index columns (`gen_i`, `rec_i`), which must be strictly increasing.
//! Each row carries the momenta of the positive (`*_pxp`, `*_pyp`, `*_pzp`)
//! and negative (`*_pxm`, `*_pym`, `*_pzm`) track.

use std::path::Path;

use lh_core::{Error, Event, EventSource, FourVector, Result, Track};

use crate::columns::Columns;

/// One side (generated or reconstructed) of a pair table.
#[derive(Debug, Clone)]
struct PairTable {
    index: Vec<i64>,
    plus: [Vec<f64>; 3],
    minus: [Vec<f64>; 3],
}

impl PairTable {
    fn load(table: &Columns, prefix: &str) -> Result<Self> {
        let col = |suffix: &str| -> Result<Vec<f64>> {
            Ok(table.scalar(&format!("{prefix}_{suffix}"))?.to_vec())
        };
        let index_name = format!("{prefix}_i");
        let raw_index = table.scalar(&index_name)?;
        let mut index = Vec::with_capacity(raw_index.len());
        for (row, &v) in raw_index.iter().enumerate() {
            if !v.is_finite() || v.fract() != 0.0 {
                return Err(Error::malformed(
                    table.origin(),
                    format!("row {row}"),
                    format!("'{index_name}' is not an integer: {v}"),
                ));
            }
            let v = v as i64;
            if index.last().is_some_and(|&prev| v <= prev) {
                return Err(Error::malformed(
                    table.origin(),
                    format!("row {row}"),
                    format!("'{index_name}' is not strictly increasing"),
                ));
            }
            index.push(v);
        }

        let out = Self {
            index,
            plus: [col("pxp")?, col("pyp")?, col("pzp")?],
            minus: [col("pxm")?, col("pym")?, col("pzm")?],
        };
        if let Some(bad) = out.plus.iter().chain(&out.minus).find(|c| c.len() != out.index.len()) {
            return Err(table.column_error(
                &index_name,
                &format!("{} rows but a momentum column has {}", out.index.len(), bad.len()),
            ));
        }
        Ok(out)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn event(&self, row: usize, mass: f64) -> Event {
        let mut event = Event::new(self.index[row]);
        for (p, charge) in [(&self.plus, 1), (&self.minus, -1)] {
            event.add_track(Track {
                p: FourVector::from_mass_momentum(mass, p[0][row], p[1][row], p[2][row]),
                charge,
                ..Track::default()
            });
        }
        event
    }
}

/// Event source over paired generated and reconstructed tables.
///
/// Generated rows drive the iteration. For each one, the reconstructed table
/// is advanced until its index catches up; the event has a reconstructed
/// view only when the indices match. Reconstructed rows with no generated
/// counterpart are skipped.
#[derive(Debug, Clone)]
pub struct PairSource {
    origin: String,
    generated: PairTable,
    reconstructed: PairTable,
    mass: f64,
    next_gen: usize,
    next_rec: usize,
    rec_index: Option<i64>,
    current_gen: Event,
    current_rec: Option<Event>,
}

impl PairSource {
    /// Build from `gen_*` and `rec_*` column tables.
    pub fn new(generated: &Columns, reconstructed: &Columns, mass: f64) -> Result<Self> {
        Ok(Self {
            origin: format!("{} + {}", generated.origin(), reconstructed.origin()),
            generated: PairTable::load(generated, "gen")?,
            reconstructed: PairTable::load(reconstructed, "rec")?,
            mass,
            next_gen: 0,
            next_rec: 0,
            rec_index: None,
            current_gen: Event::default(),
            current_rec: None,
        })
    }

    /// Load both tables from Parquet files.
    pub fn from_parquet(generated: &Path, reconstructed: &Path, mass: f64) -> Result<Self> {
        Self::new(&Columns::from_parquet(generated)?, &Columns::from_parquet(reconstructed)?, mass)
    }

    /// Generated rows.
    pub fn len(&self) -> usize {
        self.generated.len()
    }

    /// `true` when the generated table is empty.
    pub fn is_empty(&self) -> bool {
        self.generated.len() == 0
    }
}

impl EventSource for PairSource {
    fn has_more(&mut self) -> Result<bool> {
        Ok(self.next_gen < self.generated.len())
    }

    fn advance(&mut self) -> Result<()> {
        if self.next_gen >= self.generated.len() {
            return Err(Error::malformed(
                &self.origin,
                format!("row {}", self.next_gen),
                "read past the last generated row",
            ));
        }
        let gen_row = self.next_gen;
        self.next_gen += 1;
        let gen_index = self.generated.index[gen_row];
        self.current_gen = self.generated.event(gen_row, self.mass);

        while self.rec_index.is_none_or(|i| i < gen_index)
            && self.next_rec < self.reconstructed.len()
        {
            let rec_index = self.reconstructed.index[self.next_rec];
            self.next_rec += 1;
            self.rec_index = Some(rec_index);
            if rec_index < gen_index {
                log::debug!("{}: reconstructed event {rec_index} has no generated row", self.origin);
            }
        }

        self.current_rec = (self.rec_index == Some(gen_index)).then(|| {
            let mut rec = self.reconstructed.event(self.next_rec - 1, self.mass);
            for track in &mut rec.tracks {
                track.match_to(&self.current_gen.tracks);
            }
            rec
        });
        Ok(())
    }

    fn generated(&self) -> &Event {
        &self.current_gen
    }

    fn reconstructed(&self) -> Option<&Event> {
        self.current_rec.as_ref()
    }

    fn reset(&mut self) -> Result<()> {
        self.next_gen = 0;
        self.next_rec = 0;
        self.rec_index = None;
        self.current_gen = Event::default();
        self.current_rec = None;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lh_core::PION_MASS;

    fn table(prefix: &str, index: &[f64], scale: f64) -> Columns {
        let n = index.len();
        let mut t = Columns::new(prefix).with_scalar(format!("{prefix}_i"), index.to_vec());
        let momenta = [("pxp", 0.3), ("pyp", 0.0), ("pzp", 0.1), ("pxm", -0.3), ("pym", 0.1), ("pzm", 0.0)];
        for (suffix, v) in momenta {
            t.insert_scalar(format!("{prefix}_{suffix}"), vec![v * scale; n]);
        }
        t
    }

    fn drain(s: &mut PairSource) -> Vec<(i64, bool)> {
        let mut out = Vec::new();
        while s.has_more().unwrap() {
            s.advance().unwrap();
            out.push((s.generated().id, s.reconstructed().is_some()));
        }
        out
    }

    #[test]
    fn resynchronises_on_index() {
        let generated = table("gen", &[0.0, 1.0, 2.0, 3.0, 4.0], 1.0);
        let reconstructed = table("rec", &[1.0, 3.0, 4.0], 1.01);
        let mut s = PairSource::new(&generated, &reconstructed, PION_MASS).unwrap();
        assert_eq!(s.len(), 5);
        assert_eq!(drain(&mut s), vec![(0, false), (1, true), (2, false), (3, true), (4, true)]);

        s.reset().unwrap();
        s.advance().unwrap();
        s.advance().unwrap();
        let rec = s.reconstructed().unwrap();
        assert_eq!(rec.id, 1);
        assert_relative_eq!(rec.tracks[0].p.x, 0.303, epsilon = 1e-12);
        assert_eq!(rec.tracks[0].charge, 1);
        assert_eq!(rec.tracks[0].matched, Some(0));
        assert_eq!(rec.tracks[1].matched, Some(1));
    }

    #[test]
    fn orphan_reconstructed_rows_are_skipped() {
        let generated = table("gen", &[0.0, 2.0, 5.0], 1.0);
        let reconstructed = table("rec", &[1.0, 2.0, 3.0, 4.0, 6.0], 1.0);
        let mut s = PairSource::new(&generated, &reconstructed, PION_MASS).unwrap();
        assert_eq!(drain(&mut s), vec![(0, false), (2, true), (5, false)]);
    }

    #[test]
    fn empty_reconstruction_leaves_every_event_unmatched() {
        let generated = table("gen", &[0.0, 1.0], 1.0);
        let reconstructed = table("rec", &[], 1.0);
        let mut s = PairSource::new(&generated, &reconstructed, PION_MASS).unwrap();
        assert_eq!(drain(&mut s), vec![(0, false), (1, false)]);
        assert!(s.advance().is_err());
    }

    #[test]
    fn bad_tables_are_rejected() {
        let reconstructed = table("rec", &[0.0], 1.0);

        let unsorted = table("gen", &[0.0, 2.0, 1.0], 1.0);
        let err = PairSource::new(&unsorted, &reconstructed, PION_MASS).unwrap_err().to_string();
        assert!(err.contains("row 2"), "{err}");

        let mut short = table("gen", &[0.0, 1.0], 1.0);
        short.insert_scalar("gen_pym", vec![0.0]);
        assert!(PairSource::new(&short, &reconstructed, PION_MASS).is_err());

        let missing = Columns::new("gen").with_scalar("gen_i", vec![0.0]);
        let err = PairSource::new(&missing, &reconstructed, PION_MASS).unwrap_err().to_string();
        assert!(err.contains("gen_pxp"), "{err}");
    }
}
