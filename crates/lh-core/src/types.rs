//! Event model: four-vectors, tracks and events.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Charged pion mass in GeV, the default track mass hypothesis.
pub const PION_MASS: f64 = 0.13957018;

/// Charged kaon mass in GeV.
pub const KAON_MASS: f64 = 0.493677;

/// Lorentz four-vector `(t, x, y, z)` in GeV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FourVector {
    /// Energy component.
    pub t: f64,
    /// x momentum component.
    pub x: f64,
    /// y momentum component.
    pub y: f64,
    /// z momentum component.
    pub z: f64,
}

impl FourVector {
    /// Create a four-vector from its components.
    pub fn new(t: f64, x: f64, y: f64, z: f64) -> Self {
        Self { t, x, y, z }
    }

    /// On-shell four-momentum for a particle of mass `m` with the given three-momentum.
    pub fn from_mass_momentum(m: f64, px: f64, py: f64, pz: f64) -> Self {
        let t = (m * m + px * px + py * py + pz * pz).sqrt();
        Self { t, x: px, y: py, z: pz }
    }

    /// On-shell four-momentum from momentum magnitude `p`, azimuth `phi`
    /// and dip angle `lambda` (angle above the transverse plane).
    pub fn from_mass_polar(m: f64, p: f64, phi: f64, lambda: f64) -> Self {
        let pt = p * lambda.cos();
        Self::from_mass_momentum(m, pt * phi.cos(), pt * phi.sin(), p * lambda.sin())
    }

    /// Squared transverse momentum.
    pub fn pt2(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        self.pt2().sqrt()
    }

    /// Three-momentum magnitude.
    pub fn p(&self) -> f64 {
        (self.pt2() + self.z * self.z).sqrt()
    }

    /// Minkowski norm squared, `t² - |p|²`.
    pub fn mass2(&self) -> f64 {
        self.t * self.t - self.pt2() - self.z * self.z
    }

    /// Invariant mass. Space-like round-off is clamped to zero.
    pub fn mass(&self) -> f64 {
        self.mass2().max(0.0).sqrt()
    }

    /// Pseudorapidity, `atanh(pz / |p|)`.
    pub fn eta(&self) -> f64 {
        let p = self.p();
        if p == 0.0 {
            return 0.0;
        }
        (self.z / p).atanh()
    }

    /// Azimuthal angle in `(-π, π]`.
    pub fn phi(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Euclidean distance between the three-momenta of two vectors.
    pub fn momentum_distance(&self, other: &FourVector) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl Add for FourVector {
    type Output = FourVector;

    fn add(self, rhs: FourVector) -> FourVector {
        FourVector::new(self.t + rhs.t, self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for FourVector {
    fn add_assign(&mut self, rhs: FourVector) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for FourVector {
    fn sum<I: Iterator<Item = FourVector>>(iter: I) -> Self {
        iter.fold(FourVector::default(), Add::add)
    }
}

/// A reconstructed (or generated) particle track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Four-momentum under the source's mass hypothesis.
    pub p: FourVector,
    /// Electric charge in units of e (0 when unknown).
    pub charge: i8,
    /// Track fit chi².
    pub chi2: f64,
    /// Track fit degrees of freedom.
    pub ndof: i32,
    /// Point of closest approach `(x, y, z)`.
    pub vertex: [f64; 3],
    /// Generator-level particle id (STARlight `gpid`), 0 when unknown.
    pub gpid: i64,
    /// PDG particle code, 0 when unknown.
    pub pdg_id: i64,
    /// Index of the generated track this one was matched to.
    pub matched: Option<usize>,
}

impl Track {
    /// Track with only a four-momentum set.
    pub fn with_momentum(p: FourVector) -> Self {
        Self { p, ..Self::default() }
    }

    /// Fit quality `chi2 / ndof`, `None` when `ndof <= 0`.
    pub fn chi2_ndof(&self) -> Option<f64> {
        (self.ndof > 0).then(|| self.chi2 / self.ndof as f64)
    }

    /// Set [`Track::matched`] to the generated track closest in three-momentum.
    pub fn match_to(&mut self, generated: &[Track]) {
        self.matched = generated
            .iter()
            .enumerate()
            .map(|(i, g)| (i, self.p.momentum_distance(&g.p)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
    }
}

/// One CASTOR calorimeter rec-hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CastorHit {
    /// Longitudinal module (1-based).
    pub module: i32,
    /// Azimuthal sector (1-based).
    pub sector: i32,
    /// Deposited energy in GeV.
    pub energy: f64,
}

/// One physics event: an id, its tracks and forward calorimeter hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event number as given by the source (row index when the source has none).
    pub id: i64,
    /// Tracks in source order.
    pub tracks: Vec<Track>,
    /// CASTOR rec-hits, empty for sources without calorimetry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub castor: Vec<CastorHit>,
}

impl Event {
    /// Empty event with the given id.
    pub fn new(id: i64) -> Self {
        Self { id, ..Self::default() }
    }

    /// Append a track.
    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Append a CASTOR hit.
    pub fn add_castor_hit(&mut self, hit: CastorHit) {
        self.castor.push(hit);
    }

    /// Sum of the four-momenta of the first two tracks, or `None` with fewer than two.
    pub fn pair_momentum(&self) -> Option<FourVector> {
        match self.tracks.as_slice() {
            [a, b, ..] => Some(a.p + b.p),
            _ => None,
        }
    }

    /// Total energy deposited in CASTOR.
    pub fn castor_energy(&self) -> f64 {
        self.castor.iter().map(|h| h.energy).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn on_shell_mass_is_recovered() {
        let v = FourVector::from_mass_momentum(PION_MASS, 0.3, -0.2, 1.1);
        assert_relative_eq!(v.mass(), PION_MASS, epsilon = 1e-12);
    }

    #[test]
    fn polar_construction_matches_cartesian() {
        let v = FourVector::from_mass_polar(KAON_MASS, 2.0, 0.0, 0.0);
        assert_relative_eq!(v.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.p(), 2.0, epsilon = 1e-12);

        let up = FourVector::from_mass_polar(KAON_MASS, 1.0, 0.3, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(up.pt(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(up.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn back_to_back_pair_mass() {
        let a = FourVector::from_mass_momentum(PION_MASS, 0.5, 0.0, 0.0);
        let b = FourVector::from_mass_momentum(PION_MASS, -0.5, 0.0, 0.0);
        let pair = a + b;
        assert_relative_eq!(pair.pt(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(pair.mass(), 2.0 * a.t, epsilon = 1e-12);
    }

    #[test]
    fn eta_is_zero_in_transverse_plane() {
        let v = FourVector::from_mass_momentum(0.0, 1.0, 1.0, 0.0);
        assert_relative_eq!(v.eta(), 0.0);
        assert!(FourVector::from_mass_momentum(0.0, 1.0, 0.0, 5.0).eta() > 2.0);
        assert_eq!(FourVector::default().eta(), 0.0);
    }

    #[test]
    fn track_matching_picks_nearest() {
        let gen_tracks = vec![
            Track::with_momentum(FourVector::from_mass_momentum(PION_MASS, 1.0, 0.0, 0.0)),
            Track::with_momentum(FourVector::from_mass_momentum(PION_MASS, -1.0, 0.0, 0.0)),
        ];
        let mut rec = Track::with_momentum(FourVector::from_mass_momentum(PION_MASS, -0.9, 0.1, 0.0));
        rec.match_to(&gen_tracks);
        assert_eq!(rec.matched, Some(1));

        rec.match_to(&[]);
        assert_eq!(rec.matched, None);
    }

    #[test]
    fn pair_momentum_needs_two_tracks() {
        let mut e = Event::new(7);
        assert!(e.pair_momentum().is_none());
        e.add_track(Track::with_momentum(FourVector::new(1.0, 0.0, 0.0, 0.0)));
        assert!(e.pair_momentum().is_none());
        e.add_track(Track::with_momentum(FourVector::new(1.0, 0.0, 0.0, 0.0)));
        assert_relative_eq!(e.pair_momentum().unwrap().mass(), 2.0);
    }

    #[test]
    fn chi2_ndof_guards_zero_ndof() {
        let t = Track { chi2: 4.0, ndof: 2, ..Track::default() };
        assert_eq!(t.chi2_ndof(), Some(2.0));
        assert_eq!(Track::default().chi2_ndof(), None);
    }
}
