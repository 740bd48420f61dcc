//! Built-in projections and cuts for two-track (ρ⁰ → π⁺π⁻ style) analyses.
//!
//! These are what configuration files can name. Pair quantities use the
//! first two tracks of the event and fail on events with fewer.

use lh_core::{Error, Event, FourVector, Result};
use serde::{Deserialize, Serialize};

use crate::cut::Cut;
use crate::fill::Projection;

fn pair(event: &Event) -> Result<FourVector> {
    event.pair_momentum().ok_or_else(|| {
        Error::Evaluation(format!(
            "pair quantity needs two tracks, event {} has {}",
            event.id,
            event.tracks.len()
        ))
    })
}

/// Named event quantities usable as fill projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observable {
    /// Invariant mass of the track pair.
    PairMass,
    /// Transverse momentum of the pair.
    PairPt,
    /// Squared transverse momentum of the pair (≈ |t| for coherent production).
    PairPt2,
    /// Pseudorapidity of the pair.
    PairEta,
    /// Number of tracks.
    TrackCount,
    /// Summed CASTOR energy.
    CastorEnergy,
}

impl Projection for Observable {
    fn project(&self, event: &Event) -> Result<f64> {
        Ok(match self {
            Observable::PairMass => pair(event)?.mass(),
            Observable::PairPt => pair(event)?.pt(),
            Observable::PairPt2 => pair(event)?.pt2(),
            Observable::PairEta => pair(event)?.eta(),
            Observable::TrackCount => event.tracks.len() as f64,
            Observable::CastorEnergy => event.castor_energy(),
        })
    }
}

/// Parametrised selections usable as cuts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// Both tracks of the pair have `pt > min`.
    MinTrackPt {
        /// Threshold in GeV.
        min: f64,
    },
    /// Pair invariant mass `> min`.
    MinPairMass {
        /// Threshold in GeV.
        min: f64,
    },
    /// `|eta(pair)| < max`.
    MaxPairAbsEta {
        /// Upper bound on |η|.
        max: f64,
    },
    /// Exactly `count` tracks.
    TrackCount {
        /// Required number of tracks.
        count: usize,
    },
    /// Every track with a fit has `chi2/ndof < max`.
    MaxChi2Ndof {
        /// Upper bound on χ²/ndof.
        max: f64,
    },
    /// Summed CASTOR energy `< max` (rapidity-gap veto).
    MaxCastorEnergy {
        /// Upper bound in GeV.
        max: f64,
    },
}

impl Cut for Selection {
    fn evaluate(&self, event: &Event) -> Result<bool> {
        Ok(match *self {
            Selection::MinTrackPt { min } => {
                pair(event)?;
                event.tracks[..2].iter().all(|t| t.p.pt2() > min * min)
            }
            Selection::MinPairMass { min } => pair(event)?.mass() > min,
            Selection::MaxPairAbsEta { max } => pair(event)?.eta().abs() < max,
            Selection::TrackCount { count } => event.tracks.len() == count,
            Selection::MaxChi2Ndof { max } => {
                event.tracks.iter().filter_map(|t| t.chi2_ndof()).all(|q| q < max)
            }
            Selection::MaxCastorEnergy { max } => event.castor_energy() < max,
        })
    }
}
