use crate::{
    assembly::{AddOutcome, Assembly},
    config::Config,
    fragment::Fragment,
};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Enumerates every distinct complete assembly of the target, up to the
/// configured maximum fragment count, by frontier expansion over the
/// candidate fragments (sorted by start index).
///
/// Every fragment seeds its own single-fragment assembly; a narrower seed
/// set would lose covers whose fragments all start late when one of them
/// spans the origin. Seeds expand independently over immutable assembly
/// snapshots, so the seed set is sharded across rayon workers and merged
/// in seed order afterwards; rotations of the same circular plan reached
/// from different seeds collapse in the dedup pass.
pub fn create_assemblies(
    mut frags: Vec<Fragment>,
    target_length: i64,
    conf: &Arc<Config>,
) -> Vec<Assembly> {
    frags.sort_by_key(|f| (f.start, f.end));

    // edge case where a fragment spans the entire target: a 100% match,
    // it *is* the target, and no search beats a single-fragment plan
    if let Some(f) = frags
        .iter()
        .filter(|f| f.seq.len() as i64 >= target_length)
        .min_by(|a, b| a.cost(true).total_cmp(&b.cost(true)))
    {
        return vec![Assembly {
            frags: vec![f.clone()],
            cost: f.cost(true),
            synths: 0,
        }];
    }

    // in addition to fragments with enough overlap, try synthesizing to
    // the next few: 5 or 5%, whichever is greater
    let synth_reach = 5usize.max(frags.len() / 20);
    let reach: Vec<Vec<usize>> = frags
        .iter()
        .enumerate()
        .map(|(i, f)| f.reach(&frags, i, synth_reach))
        .collect();

    let per_seed: Vec<Vec<Assembly>> = (0..frags.len())
        .into_par_iter()
        .map(|i| expand_seed(i, &frags, &reach, target_length, conf))
        .collect();

    let assemblies = dedupe(per_seed.into_iter().flatten());
    log::info!("{} assemblies made", assemblies.len());

    assemblies
}

/// Depth-first frontier expansion from one seed fragment. Completed
/// assemblies that pass the duplicate-junction check are collected;
/// infeasible edges and count overflows just prune the branch.
fn expand_seed(
    seed: usize,
    frags: &[Fragment],
    reach: &[Vec<usize>],
    target_length: i64,
    conf: &Arc<Config>,
) -> Vec<Assembly> {
    let max_count = conf.fragments_max_count;
    let min_homology = conf.fragments_min_homology;
    let max_homology = conf.fragments_max_homology;

    let mut complete: Vec<Assembly> = vec![];
    let mut seen: HashSet<String> = HashSet::new();
    let mut frontier: Vec<(Assembly, usize)> = vec![(Assembly::seed(&frags[seed]), seed)];

    while let Some((assembly, last)) = frontier.pop() {
        for &j in &reach[last] {
            match assembly.add(&frags[j], max_count, target_length, false) {
                AddOutcome::Extended(next) => {
                    // don't re-expand an identical in-progress plan
                    if seen.insert(identity_key(&next)) {
                        frontier.push((next, j));
                    }
                }
                AddOutcome::Complete(done) => {
                    if Assembly::duplicates(&done.frags, min_homology, max_homology).is_none() {
                        complete.push(done);
                    }
                }
                AddOutcome::CountExceeded | AddOutcome::Infeasible => {}
            }
        }
    }

    complete
}

/// Drops assemblies containing the same fragments in the same cyclic order
/// (the target is circular, so rotations are the same plan), keeping the
/// cheaper of any pair and the discovery order otherwise.
fn dedupe(assemblies: impl Iterator<Item = Assembly>) -> Vec<Assembly> {
    let mut kept: Vec<Assembly> = vec![];
    let mut index: HashMap<String, usize> = HashMap::new();

    for assembly in assemblies {
        let key = cyclic_key(&assembly);
        match index.get(&key) {
            Some(&at) => {
                if assembly.cost < kept[at].cost {
                    kept[at] = assembly;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(assembly);
            }
        }
    }

    kept
}

/// Identity of an in-progress assembly: its fragments in placement order.
fn identity_key(assembly: &Assembly) -> String {
    assembly
        .frags
        .iter()
        .map(|f| f.unique_id.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

/// Rotation-independent identity of a complete assembly: the
/// lexicographically smallest rotation of its fragment ids, tagged with
/// the synthesis count.
fn cyclic_key(assembly: &Assembly) -> String {
    let ids: Vec<&str> = assembly.frags.iter().map(|f| f.unique_id.as_str()).collect();

    let mut best = 0;
    for i in 1..ids.len() {
        let rotated = |start: usize| ids.iter().cycle().skip(start).take(ids.len());
        if rotated(i).lt(rotated(best)) {
            best = i;
        }
    }

    let canonical: Vec<&str> = ids
        .iter()
        .cycle()
        .skip(best)
        .take(ids.len())
        .copied()
        .collect();
    format!("{}#{}", canonical.join("|"), assembly.synths)
}
