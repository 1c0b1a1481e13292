use crate::{
    assembly::Assembly,
    config::Config,
    fragment::{self, FragKind, Fragment},
    primers::PrimerDesigner,
};
use itertools::Itertools;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};

/// One resolved build plan: a cyclic list of concrete fragments, each ready
/// to order or amplify, and the total estimated price.
#[derive(Clone, Debug, Serialize)]
pub struct Solution {
    /// number of fragments in the plan
    pub count: usize,

    /// total estimated cost: procurement + preparation + the assembly
    /// reaction itself
    pub cost: f64,

    /// fragments, in their order around the target
    pub fragments: Vec<Fragment>,
}

/// Buckets assemblies by their fragment count (synthesis bridges included)
/// and sorts each bucket cheapest-estimate first. Returns the counts in
/// ascending order alongside the buckets.
pub fn group_assemblies_by_count(
    assemblies: Vec<Assembly>,
) -> (Vec<usize>, HashMap<usize, Vec<Assembly>>) {
    let mut grouped: HashMap<usize, Vec<Assembly>> =
        assemblies.into_iter().into_group_map_by(|a| a.len());

    for bucket in grouped.values_mut() {
        bucket.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    }

    let counts: Vec<usize> = grouped.keys().copied().sorted_unstable().collect();
    (counts, grouped)
}

/// Resolves candidate assemblies into at most one solution per fragment
/// count, keeping only the Pareto frontier: a solution with more fragments
/// must be strictly cheaper than every solution with fewer.
///
/// Building the target from scratch is always possible when a cost table
/// prices it, either as synthesized pieces assembled in-house or as an
/// insert ordered pre-cloned into a plasmid. The cheaper of the two caps
/// what any plan may cost, and is returned as the sole solution when
/// nothing resolves beneath it, so whatever sets the floor is also what
/// gets reported.
pub fn fill_assemblies(
    target: &str,
    assemblies: Vec<Assembly>,
    designer: &dyn PrimerDesigner,
    conf: &Arc<Config>,
) -> Vec<Solution> {
    let (counts, mut grouped) = group_assemblies_by_count(assemblies);

    let fallback = from_scratch_solution(target, conf);
    let mut min_cost = fallback.as_ref().map_or(f64::INFINITY, |s| s.cost);

    let mut solutions: Vec<Solution> = vec![];
    for count in counts {
        for assembly in grouped.remove(&count).unwrap_or_default() {
            // the bucket is sorted by estimate, nothing further in it can
            // come in under the cheapest plan found so far
            if assembly.cost > min_cost {
                break;
            }

            let fragments = match assembly.fill(target, designer, conf) {
                Ok(fragments) => fragments,
                Err(err) => {
                    log::debug!("skipping assembly {assembly}: {err}");
                    continue;
                }
            };

            let cost = fragment::frags_cost(&fragments) + conf.gibson_assembly_cost;
            if cost >= min_cost {
                continue;
            }

            min_cost = cost;
            solutions.push(Solution {
                count,
                cost,
                fragments,
            });
            break;
        }
    }

    if solutions.is_empty() {
        if let Some(fallback) = fallback {
            log::info!("no assembly resolved, falling back to building from scratch");
            return vec![fallback];
        }
    }

    solutions
}

/// The cheaper of the two from-scratch routes: piecewise synthesis, or the
/// insert ordered pre-cloned into a delivery plasmid.
fn from_scratch_solution(target: &str, conf: &Arc<Config>) -> Option<Solution> {
    match (synthetic_solution(target, conf), plasmid_solution(target, conf)) {
        (Some(pieces), Some(plasmid)) => Some(if plasmid.cost < pieces.cost {
            plasmid
        } else {
            pieces
        }),
        (pieces, plasmid) => pieces.or(plasmid),
    }
}

/// A plan that orders the whole target synthesized and delivered cloned
/// into a plasmid. It arrives assembled, so no assembly reaction is
/// charged. `None` when no provider bucket covers the insert length.
pub fn plasmid_solution(target: &str, conf: &Arc<Config>) -> Option<Solution> {
    let target_length = target.len() as i64;
    let cost = conf.synth_plasmid_cost(target_length)?;

    let mut f = Fragment::empty(conf.clone());
    f.id = "synthetic-plasmid".to_string();
    f.kind = FragKind::Synthetic;
    f.seq = target.to_uppercase();
    f.end = target_length - 1;
    f.cost = cost;

    Some(Solution {
        count: 1,
        cost,
        fragments: vec![f],
    })
}

/// A plan that synthesizes the entire target as overlapping fragments,
/// ignoring the match list altogether. `None` when the cost table can't
/// price pieces of the required length.
pub fn synthetic_solution(target: &str, conf: &Arc<Config>) -> Option<Solution> {
    let target_length = target.len() as i64;
    conf.synth_fragment_cost(target_length)?;

    let anchor = Fragment::empty(conf.clone());
    let mut wrap = Fragment::empty(conf.clone());
    wrap.start = target_length;
    wrap.end = target_length;

    let mut fragments = anchor.synth_to(&wrap, target);
    if fragments.is_empty() {
        return None;
    }

    for f in fragments.iter_mut() {
        f.cost = f.cost(true);
    }
    let cost = fragment::frags_cost(&fragments) + conf.gibson_assembly_cost;
    if !cost.is_finite() {
        return None;
    }

    Some(Solution {
        count: fragments.len(),
        cost,
        fragments,
    })
}
