use crate::{
    builder,
    config::Config,
    dna,
    fragment::Fragment,
    pareto::{self, Solution},
    primers::PrimerDesigner,
    seq_match::Match,
};
use anyhow::{Result, bail};
use serde::Serialize;
use std::sync::Arc;

/// The result of a design run, ready for serialization.
#[derive(Clone, Debug, Serialize)]
pub struct Output {
    /// name of the target vector
    pub target: String,

    /// the target sequence, normalized
    pub seq: String,

    /// ranked build plans, fewest fragments first; each plan with more
    /// fragments is strictly cheaper than the ones before it
    pub solutions: Vec<Solution>,
}

/// Designs build plans for a circular target from the matches a sequence
/// search found against the fragment databases.
pub fn design(
    target_name: &str,
    target_seq: &str,
    matches: Vec<Match>,
    designer: &dyn PrimerDesigner,
    conf: &Arc<Config>,
) -> Result<Output> {
    let seq = dna::normalize(target_seq);
    if seq.is_empty() {
        bail!("target {target_name} has an empty sequence");
    }
    let target_length = seq.len() as i64;

    if matches.is_empty() {
        bail!("no matches against {target_name} to assemble from");
    }

    // matches too short to hold a junction on either side can never take
    // part in an assembly
    let frags: Vec<Fragment> = matches
        .into_iter()
        .filter(|m| m.length() >= conf.fragments_min_homology)
        .map(|m| {
            let m = m.with_unique_id(target_length);
            Fragment::from_match(&m, conf.clone())
        })
        .collect();
    if frags.is_empty() {
        bail!("no matches against {target_name} are long enough to build from");
    }
    log::info!("{} building fragments against {target_name}", frags.len());

    let assemblies = builder::create_assemblies(frags, target_length, conf);
    let solutions = pareto::fill_assemblies(&seq, assemblies, designer, conf);
    if solutions.is_empty() {
        bail!("no valid assembly found for {target_name}");
    }

    Ok(Output {
        target: target_name.to_string(),
        seq,
        solutions,
    })
}
