//! Per-event track tables with optional CASTOR hits.
//!
//! One row per event. Track quantities are list columns with one entry per
//! track: `p`, `phi`, `lambda` (dip angle), `qoverp`, `chi2`, `ndof`, and
//! the point of closest approach `x`, `y`, `z`. CASTOR rec-hits, when
//! present, are the list columns `castor_module`, `castor_sector` and
//! `castor_energy`. An optional scalar `event` column supplies event ids;
//! otherwise the row number is used.

use std::path::Path;

use lh_core::{CastorHit, Error, Event, EventSource, FourVector, PION_MASS, Result, Track};

use crate::columns::{Columns, JaggedColumn};

const TRACK_COLUMNS: [&str; 9] = ["p", "phi", "lambda", "qoverp", "chi2", "ndof", "x", "y", "z"];
const CASTOR_COLUMNS: [&str; 3] = ["castor_module", "castor_sector", "castor_energy"];

/// Single-view event source over a track table.
#[derive(Debug, Clone)]
pub struct TrackTableSource {
    origin: String,
    ids: Option<Vec<i64>>,
    tracks: [JaggedColumn; 9],
    castor: Option<[JaggedColumn; 3]>,
    rows: usize,
    mass: f64,
    next: usize,
    current: Event,
}

impl TrackTableSource {
    /// Build from a column table. Tracks get the pion mass unless changed
    /// with [`TrackTableSource::with_mass`].
    pub fn new(table: &Columns) -> Result<Self> {
        let tracks = jagged_columns(table, TRACK_COLUMNS)?;
        let castor = if CASTOR_COLUMNS.iter().any(|c| table.contains(c)) {
            Some(jagged_columns(table, CASTOR_COLUMNS)?)
        } else {
            None
        };
        let ids = table.contains("event").then(|| table.scalar("event")).transpose()?;
        let rows = tracks[0].len();

        let track_lengths = tracks.iter().zip(TRACK_COLUMNS).map(|(c, n)| (n, c.len()));
        let castor_lengths = castor.iter().flatten().zip(CASTOR_COLUMNS).map(|(c, n)| (n, c.len()));
        let id_length = ids.map(|v| ("event", v.len()));
        if let Some((name, len)) =
            track_lengths.chain(castor_lengths).chain(id_length).find(|&(_, len)| len != rows)
        {
            return Err(table.column_error(name, &format!("{len} rows, expected {rows}")));
        }

        log::debug!("{}: {rows} events, castor hits: {}", table.origin(), castor.is_some());
        Ok(Self {
            origin: table.origin().to_string(),
            ids: ids.map(|v| event_ids(table, v)).transpose()?,
            tracks,
            castor,
            rows,
            mass: PION_MASS,
            next: 0,
            current: Event::default(),
        })
    }

    /// Load from a Parquet file.
    pub fn from_parquet(path: &Path) -> Result<Self> {
        Self::new(&Columns::from_parquet(path)?)
    }

    /// Mass hypothesis applied to every track.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// `true` when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    fn read_row(&self, row: usize) -> Result<Event> {
        let id = match &self.ids {
            Some(ids) => ids[row],
            None => row as i64,
        };
        let mut event = Event::new(id);

        let [p, phi, lambda, qoverp, chi2, ndof, x, y, z] =
            self.row_lists(&self.tracks, &TRACK_COLUMNS, row)?;
        for i in 0..p.len() {
            event.add_track(Track {
                p: FourVector::from_mass_polar(self.mass, p[i], phi[i], lambda[i]),
                charge: if qoverp[i] > 0.0 { 1 } else { -1 },
                chi2: chi2[i],
                ndof: ndof[i] as i32,
                vertex: [x[i], y[i], z[i]],
                ..Track::default()
            });
        }

        if let Some(castor) = &self.castor {
            let [module, sector, energy] = self.row_lists(castor, &CASTOR_COLUMNS, row)?;
            for i in 0..module.len() {
                event.add_castor_hit(CastorHit {
                    module: module[i] as i32,
                    sector: sector[i] as i32,
                    energy: energy[i],
                });
            }
        }
        Ok(event)
    }

    /// Row `row` of every column, checked to have one length.
    fn row_lists<'a, const N: usize>(
        &self,
        columns: &'a [JaggedColumn; N],
        names: &[&str; N],
        row: usize,
    ) -> Result<[&'a [f64]; N]> {
        let lists = columns.each_ref().map(|c| c.row(row));
        let expected = lists[0].len();
        if let Some(i) = lists.iter().position(|l| l.len() != expected) {
            return Err(Error::malformed(
                &self.origin,
                format!("row {row}"),
                format!(
                    "column '{}' has {} entries, '{}' has {expected}",
                    names[i],
                    lists[i].len(),
                    names[0]
                ),
            ));
        }
        Ok(lists)
    }
}

fn jagged_columns<const N: usize>(
    table: &Columns,
    names: [&str; N],
) -> Result<[JaggedColumn; N]> {
    let mut out: [JaggedColumn; N] = std::array::from_fn(|_| JaggedColumn::default());
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = table.jagged(name)?.clone();
    }
    Ok(out)
}

/// Event ids must be integral; NaN or fractional values are malformed.
fn event_ids(table: &Columns, raw: &[f64]) -> Result<Vec<i64>> {
    raw.iter()
        .enumerate()
        .map(|(row, &v)| {
            if v.is_finite() && v.fract() == 0.0 {
                Ok(v as i64)
            } else {
                Err(Error::malformed(
                    table.origin(),
                    format!("row {row}"),
                    format!("'event' is not an integer: {v}"),
                ))
            }
        })
        .collect()
}

impl EventSource for TrackTableSource {
    fn has_more(&mut self) -> Result<bool> {
        Ok(self.next < self.rows)
    }

    fn advance(&mut self) -> Result<()> {
        if self.next >= self.rows {
            return Err(Error::malformed(
                &self.origin,
                format!("row {}", self.next),
                "read past the last row",
            ));
        }
        self.current = self.read_row(self.next)?;
        self.next += 1;
        Ok(())
    }

    fn generated(&self) -> &Event {
        &self.current
    }

    fn reconstructed(&self) -> Option<&Event> {
        Some(&self.current)
    }

    fn reset(&mut self) -> Result<()> {
        self.next = 0;
        self.current = Event::default();
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
    use std::f64::consts::FRAC_PI_2;

    /// Two events: two tracks, then one.
    fn tracks_table() -> Columns {
        let mut t = Columns::new("tracks");
        let values: [(&str, [Vec<f64>; 2]); 9] = [
            ("p", [vec![1.0, 0.5], vec![2.0]]),
            ("phi", [vec![0.0, FRAC_PI_2], vec![0.0]]),
            ("lambda", [vec![0.0, 0.0], vec![FRAC_PI_2]]),
            ("qoverp", [vec![1.0, -2.0], vec![0.5]]),
            ("chi2", [vec![3.0, 1.0], vec![0.0]]),
            ("ndof", [vec![2.0, 1.0], vec![0.0]]),
            ("x", [vec![0.1, 0.0], vec![0.0]]),
            ("y", [vec![0.2, 0.0], vec![0.0]]),
            ("z", [vec![0.3, 0.0], vec![0.0]]),
        ];
        for (name, rows) in values {
            t.insert_jagged(name, JaggedColumn::from_rows(rows));
        }
        t
    }

    #[test]
    fn builds_tracks_from_polar_momenta() {
        let mut s = TrackTableSource::new(&tracks_table()).unwrap();
        assert_eq!(s.len(), 2);
        s.advance().unwrap();
        let e = s.generated();
        assert_eq!(e.id, 0);
        assert_eq!(e.tracks.len(), 2);
        let t = &e.tracks[0];
        assert_relative_eq!(t.p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.p.mass(), PION_MASS, epsilon = 1e-9);
        assert_eq!(t.charge, 1);
        assert_eq!(t.chi2_ndof(), Some(1.5));
        assert_eq!(t.vertex, [0.1, 0.2, 0.3]);
        assert_relative_eq!(e.tracks[1].p.y, 0.5, epsilon = 1e-12);
        assert_eq!(e.tracks[1].charge, -1);
        assert!(e.castor.is_empty());

        s.advance().unwrap();
        let e = s.generated();
        assert_eq!(e.id, 1);
        assert_relative_eq!(e.tracks[0].p.z, 2.0, epsilon = 1e-12);
        assert_relative_eq!(e.tracks[0].p.pt(), 0.0, epsilon = 1e-12);
        assert!(!s.has_more().unwrap());
        assert!(s.advance().is_err());
    }

    #[test]
    fn reads_castor_hits_and_event_ids() {
        let table = tracks_table()
            .with_scalar("event", vec![100.0, 101.0])
            .with_jagged("castor_module", JaggedColumn::from_rows([vec![1.0, 2.0], vec![]]))
            .with_jagged("castor_sector", JaggedColumn::from_rows([vec![5.0, 6.0], vec![]]))
            .with_jagged("castor_energy", JaggedColumn::from_rows([vec![0.5, 1.25], vec![]]));
        let mut s = TrackTableSource::new(&table).unwrap();
        s.advance().unwrap();
        assert_eq!(s.generated().id, 100);
        assert_eq!(s.generated().castor[1], CastorHit { module: 2, sector: 6, energy: 1.25 });
        assert_relative_eq!(s.generated().castor_energy(), 1.75);
        s.advance().unwrap();
        assert_eq!(s.generated().id, 101);
        assert!(s.generated().castor.is_empty());

        s.reset().unwrap();
        assert!(s.has_more().unwrap());
    }

    #[test]
    fn non_integer_event_ids_are_rejected() {
        for bad in [100.5, f64::NAN] {
            let table = tracks_table().with_scalar("event", vec![100.0, bad]);
            let err = TrackTableSource::new(&table).unwrap_err();
            assert!(matches!(err, Error::MalformedInput { .. }), "{err}");
            let msg = err.to_string();
            assert!(msg.contains("row 1") && msg.contains("'event'"), "{msg}");
        }
    }

    #[test]
    fn partial_castor_columns_are_rejected() {
        let table = tracks_table()
            .with_jagged("castor_energy", JaggedColumn::from_rows([vec![0.5], vec![]]));
        let err = TrackTableSource::new(&table).unwrap_err().to_string();
        assert!(err.contains("castor_module"), "{err}");
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let table = tracks_table().with_jagged("chi2", JaggedColumn::from_rows([vec![3.0], vec![0.0]]));
        let mut s = TrackTableSource::new(&table).unwrap();
        let err = s.advance().unwrap_err().to_string();
        assert!(err.contains("row 0"), "{err}");
        assert!(err.contains("'chi2'"), "{err}");
    }

    #[test]
    fn mismatched_row_counts_are_rejected() {
        let table = tracks_table().with_scalar("event", vec![1.0]);
        let err = TrackTableSource::new(&table).unwrap_err().to_string();
        assert!(err.contains("column 'event'"), "{err}");
    }
}
