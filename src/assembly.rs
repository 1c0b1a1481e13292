use crate::{
    config::Config,
    fragment::{FragKind, Fragment},
    primers::PrimerDesigner,
};
use anyhow::{Result, bail};
use std::{fmt, sync::Arc};

/// An ordered, immutable-by-copy list of fragments forming a candidate
/// build plan around the circular target. Extension always produces a new
/// value, so concurrent exploration of different branches can't interfere.
#[derive(Clone, Debug)]
pub struct Assembly {
    /// fragments, ordered by distance from the "end" of the target
    pub frags: Vec<Fragment>,

    /// estimated cost of making this assembly
    pub cost: f64,

    /// number of synthetic fragments that will be needed to make this
    pub synths: usize,
}

/// What happened when a candidate fragment was offered to an assembly.
#[derive(Clone, Debug)]
pub enum AddOutcome {
    /// the assembly grew by one fragment (and possibly synthesis bridges)
    Extended(Assembly),

    /// the candidate certified closure of the circle; the fragment list is
    /// unchanged, though a closing synthesis bridge may have been counted
    Complete(Assembly),

    /// the resulting assembly would exceed the fragment-count ceiling
    CountExceeded,

    /// the gap to the candidate cannot be closed by PCR or synthesis
    Infeasible,
}

impl Assembly {
    /// A starting assembly holding a single fragment.
    pub fn seed(f: &Fragment) -> Self {
        Assembly {
            cost: f.cost_to(f).unwrap_or(0.0), // just its own PCR prep
            frags: vec![f.clone()],
            synths: 0,
        }
    }

    /// Offers a candidate fragment as the next piece of the plan.
    ///
    /// A candidate that geometrically spans past the first fragment plus
    /// the target length closes the circle. If it is a recurrence of the
    /// first fragment (same unique id, "self annealing") it only certifies
    /// closure and is not appended; annealing back to the first fragment
    /// costs nothing unless a synthesis bridge is needed to reach it.
    pub fn add(
        &self,
        f: &Fragment,
        max_count: usize,
        target_length: i64,
        force_synthesis: bool,
    ) -> AddOutcome {
        // would this new fragment complete the assembly?
        let complete = f.end >= self.frags[0].start + target_length - 1;

        // is this the first fragment annealing back to itself?
        let self_annealing = f.unique_id == self.frags[0].unique_id;

        let last = self.frags.last().expect("assembly is never empty");

        // number of synthesis fragments needed to get to this next one
        let mut synths = last.synth_dist(f);
        if force_synthesis && synths == 0 {
            synths = 1;
        }

        let mut new_count = self.len() + synths;
        if !self_annealing {
            new_count += 1;
        }
        if new_count > max_count {
            return AddOutcome::CountExceeded;
        }

        // estimated cost of getting to the next fragment
        let anneal_cost = if force_synthesis {
            last.synth_bridge_cost(f)
        } else {
            last.cost_to(f)
        };
        let mut anneal_cost = match anneal_cost {
            Some(cost) => cost,
            None => return AddOutcome::Infeasible,
        };

        if self_annealing && synths == 0 {
            anneal_cost = 0.0; // annealing to the first fragment is free
        }

        // procurement is charged once per distinct entry in the assembly
        let contained = self.frags.iter().any(|included| included.id == f.id);
        anneal_cost += f.cost(!contained);

        let mut frags = self.frags.clone();
        if !self_annealing {
            frags.push(f.clone());
        }

        let assembly = Assembly {
            frags,
            cost: self.cost + anneal_cost,
            synths: self.synths + synths,
        };

        if complete {
            AddOutcome::Complete(assembly)
        } else {
            AddOutcome::Extended(assembly)
        }
    }

    /// Number of fragments plus the number of synthesis bridges, since each
    /// bridge becomes one more fragment in the final build.
    pub fn len(&self) -> usize {
        self.frags.len() + self.synths
    }

    pub fn is_empty(&self) -> bool {
        self.frags.is_empty()
    }

    /// Checks all fragments for unintended "duplicate homology": the same
    /// junction sequence appearing at more than one junction, or a fragment
    /// whose own two ends anneal to each other. Either would let a
    /// homology-based assembly mis-join at the wrong site.
    ///
    /// Returns the two offending fragment ids and the shared sequence.
    pub fn duplicates(
        frags: &[Fragment],
        min_homology: i64,
        max_homology: i64,
    ) -> Option<(String, String, String)> {
        let count = frags.len();
        for (i, f) in frags.iter().enumerate() {
            // a fragment annealing to itself could self-circularize
            if count > 1 {
                if let Some(self_junction) = f.junction(f, min_homology, max_homology) {
                    if self_junction.len() < f.prepared_seq().len() {
                        return Some((f.id.clone(), f.id.clone(), self_junction));
                    }
                }
            }

            // skip the next fragment, i+1 is supposed to anneal to i
            for j in 2..count {
                let other = &frags[(i + j) % count];
                if let Some(junction) = f.junction(other, min_homology, max_homology) {
                    return Some((f.id.clone(), other.id.clone(), junction));
                }
            }
        }

        None
    }

    /// Resolves every join in the assembly into concrete fragments:
    /// fragments kept as-is, PCR fragments with primers sized to reach the
    /// negotiated homology, and synthetic bridges cut from the target.
    ///
    /// Fails when the assembly has ambiguous junctions or a fragment can't
    /// be prepared; the caller just moves on to the next candidate plan.
    pub fn fill(
        &self,
        target: &str,
        designer: &dyn PrimerDesigner,
        conf: &Arc<Config>,
    ) -> Result<Vec<Fragment>> {
        let min_homology = conf.fragments_min_homology;
        let max_homology = conf.fragments_max_homology;

        // unintended junctions between fragments that shouldn't anneal
        if let Some((first, second, seq)) =
            Self::duplicates(&self.frags, min_homology, max_homology)
        {
            bail!("duplicate junction between {first} and {second}: {seq}");
        }

        // edge case where a single fragment fills the whole target
        if self.len() == 1 && self.frags[0].seq.len() >= target.len() {
            let f = &self.frags[0];
            let mut whole = Fragment::empty(conf.clone());
            whole.id = f.id.clone();
            whole.kind = FragKind::Vector;
            whole.seq = f.seq.to_uppercase()[..target.len()].to_string(); // it may be longer
            whole.url = f.url.clone();
            whole.cost = whole.cost(true);
            return Ok(vec![whole]);
        }

        // keep unmutated copies: primer creation changes ranges, which
        // would skew distance estimates for the neighbors still to come
        let orig = self.frags.clone();
        let mut filled: Vec<Fragment> = vec![];

        for (i, f) in self.frags.iter().enumerate() {
            let mut f = f.clone();

            let last = if i == 0 {
                // mock a "last" fragment to the left of this starting one
                let terminal = orig.last().expect("assembly is never empty");
                mock_at(
                    terminal.start - target.len() as i64,
                    terminal.end - target.len() as i64,
                    conf,
                )
            } else {
                orig[i - 1].clone()
            };
            let next = mock_next(&orig, i, target.len() as i64, conf);

            // primers are needed to subselect from a vector, or to add
            // homology that doesn't exist yet
            let last_pcr = !last.overlaps_via_homology(&f) && last.overlaps_via_pcr(&f);
            let next_pcr = !f.overlaps_via_homology(&next) && f.overlaps_via_pcr(&next);
            let needs_pcr =
                f.kind == FragKind::Vector || f.kind == FragKind::Pcr || last_pcr || next_pcr;

            if needs_pcr {
                designer.design(&mut f, &last, &next, target)?;
                f.kind = FragKind::Pcr;
            } else {
                f.kind = FragKind::Existing;
            }

            filled.push(f);
        }

        // second pass fills the gaps between fragments with synthesis
        let mut with_synths: Vec<Fragment> = vec![];
        for (i, f) in filled.iter().enumerate() {
            with_synths.push(f.clone());

            let next = mock_next(&filled, i, target.len() as i64, conf);
            with_synths.extend(f.synth_to(&next, target));
        }
        let mut filled = with_synths;

        validate_junctions(&filled, conf)?;

        for f in filled.iter_mut() {
            f.cost = f.cost(true);
        }

        Ok(filled)
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for frag in &self.frags {
            write!(f, "{}:{} ", frag.id, frag.kind)?;
        }
        write!(f, "- ${:.2}", self.cost)
    }
}

fn mock_at(start: i64, end: i64, conf: &Arc<Config>) -> Fragment {
    let mut f = Fragment::empty(conf.clone());
    f.start = start;
    f.end = end;
    f
}

/// The fragment one past `i`, or a mock of the first fragment shifted one
/// full turn around the target when `i` is the terminal fragment.
fn mock_next(frags: &[Fragment], i: usize, target_length: i64, conf: &Arc<Config>) -> Fragment {
    if i < frags.len() - 1 {
        return frags[i + 1].clone();
    }

    let first = &frags[0];
    let mut next = mock_at(first.start + target_length, first.end + target_length, conf);
    next.id = first.id.clone();
    next
}

/// Confirms that every adjacent pair of resolved fragments shares an
/// identical junction long enough to anneal.
fn validate_junctions(frags: &[Fragment], conf: &Arc<Config>) -> Result<()> {
    for (i, f) in frags.iter().enumerate() {
        let next = &frags[(i + 1) % frags.len()];
        let max = f.prepared_seq().len().max(next.prepared_seq().len()) as i64;
        if f.junction(next, conf.fragments_min_homology, max).is_none() {
            bail!(
                "fragments {} and {} do not share a junction to anneal by",
                f.id,
                next.id
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::config::SynthCost;

    fn test_conf() -> Arc<Config> {
        let mut c = Config::default();
        c.fragments_max_count = 5;
        c.synthetic_max_length = 100;
        c.synthetic_fragment_cost = BTreeMap::from([(100000, SynthCost {
            fixed: true,
            cost: 0.0,
        })]);
        Arc::new(c)
    }

    fn frag(unique_id: &str, start: i64, end: i64, conf: &Arc<Config>) -> Fragment {
        let mut f = Fragment::empty(conf.clone());
        f.id = unique_id.to_string();
        f.unique_id = unique_id.to_string();
        f.start = start;
        f.end = end;
        f
    }

    fn seq_frag(seq: &str, conf: &Arc<Config>) -> Fragment {
        let mut f = Fragment::empty(conf.clone());
        f.seq = seq.to_string();
        f
    }

    #[test]
    fn test_add_with_overlap() {
        let c = test_conf();
        let n1 = frag("1", 0, 50, &c);
        let n2 = frag("2", 20, 80, &c);

        let a = Assembly {
            frags: vec![n1.clone()],
            cost: 0.0,
            synths: 0,
        };
        match a.add(&n2, 5, 100, false) {
            AddOutcome::Extended(next) => {
                assert_eq!(next.frags.len(), 2);
                assert_eq!(next.synths, 0);
                assert_eq!(next.cost, n1.cost_to(&n2).unwrap());
            }
            other => panic!("expected Extended, got {other:?}"),
        }
    }

    #[test]
    fn test_add_with_synthesis() {
        let c = test_conf();
        let n1 = frag("1", 0, 50, &c);
        let n3 = frag("3", 180, 300, &c); // too far for PCR, synthesizable

        let a = Assembly {
            frags: vec![n1.clone()],
            cost: 10.0,
            synths: 0,
        };
        match a.add(&n3, 5, 500, false) {
            AddOutcome::Extended(next) => {
                assert_eq!(next.frags.len(), 2);
                assert_eq!(next.synths, 2); // 130bp gap across 100bp max
                assert_eq!(next.cost, 10.0 + n1.cost_to(&n3).unwrap());
            }
            other => panic!("expected Extended, got {other:?}"),
        }
    }

    #[test]
    fn test_add_with_completion() {
        let c = test_conf();
        let n1 = frag("1", 0, 50, &c);
        let n2 = frag("2", 20, 80, &c);
        let n3 = frag("3", 60, 100, &c);

        // a recurrence of the first fragment, one turn around the target
        let n1_again = frag("1", 100, 150, &c);

        let a = Assembly {
            frags: vec![n1, n2, n3],
            cost: 10.0,
            synths: 0,
        };
        match a.add(&n1_again, 5, 100, false) {
            AddOutcome::Complete(done) => {
                // closure certifies the plan, nothing is appended
                assert_eq!(done.frags.len(), 3);
                assert_eq!(done.synths, 0);
                assert_eq!(done.cost, 10.0); // annealing back is free
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn test_add_with_completion_requiring_synthesis() {
        let c = test_conf();
        let n1 = frag("1", 0, 50, &c);
        let n2 = frag("2", 20, 80, &c);
        let n3 = frag("3", 60, 100, &c);

        // the recurrence is too far away for straightforward annealing
        let n1_far = frag("1", 160, 200, &c);

        let a = Assembly {
            frags: vec![n1, n2, n3],
            cost: 16.4,
            synths: 0,
        };
        match a.add(&n1_far, 5, 100, false) {
            AddOutcome::Complete(done) => {
                assert_eq!(done.frags.len(), 3);
                assert_eq!(done.synths, 1);
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn test_add_rejects_fragment_count_overflow() {
        let c = test_conf();
        let n1 = frag("1", 0, 50, &c);
        let n2 = frag("2", 20, 80, &c);
        let n3 = frag("3", 60, 100, &c);

        let a = Assembly {
            frags: vec![n1, n2.clone(), n3.clone(), n2.clone(), n3],
            cost: 10.0,
            synths: 0,
        };
        match a.add(&n2, 5, 1000, false) {
            AddOutcome::CountExceeded => {}
            other => panic!("expected CountExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_add_never_exceeds_max_count() {
        let c = test_conf();
        let mut a = Assembly::seed(&frag("0", 0, 30, &c));
        for i in 1..20 {
            let f = frag(&i.to_string(), i * 20, i * 20 + 30, &c);
            match a.add(&f, 5, 10000, false) {
                AddOutcome::Extended(next) => {
                    assert!(next.len() <= 5);
                    a = next;
                }
                AddOutcome::Complete(done) => assert!(done.len() <= 5),
                AddOutcome::CountExceeded | AddOutcome::Infeasible => {}
            }
        }
    }

    #[test]
    fn test_add_force_synthesis() {
        let c = test_conf();
        let n1 = frag("1", 0, 50, &c);
        let n2 = frag("2", 20, 80, &c); // overlapping, no bridge needed

        let a = Assembly::seed(&n1);
        match a.add(&n2, 5, 1000, true) {
            AddOutcome::Extended(next) => assert_eq!(next.synths, 1),
            other => panic!("expected Extended, got {other:?}"),
        }
    }

    #[test]
    fn test_len_counts_synths() {
        let c = test_conf();
        let a = Assembly {
            frags: vec![frag("1", 0, 50, &c), frag("2", 20, 80, &c)],
            cost: 0.0,
            synths: 0,
        };
        assert_eq!(a.len(), 2);

        let b = Assembly { synths: 2, ..a };
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_duplicates_no_false_positive() {
        let c = test_conf();
        let frags = vec![
            seq_frag("ATACCTACTATGGATGACGTAGCAAC", &c),
            seq_frag("AGCAACTCGTTGATATCCACGTA", &c),
            seq_frag("CCACGTAGGTGCATGATGAGATGA", &c),
            seq_frag("TGAGATGATCTACTGTATACCTACT", &c),
        ];
        assert!(Assembly::duplicates(&frags, 5, 10).is_none());
    }

    #[test]
    fn test_duplicates_self_annealing_fragment() {
        let c = test_conf();
        let frags = vec![
            // this fragment's own two ends anneal to each other
            seq_frag("CAGATGACGATGGCAACTGAGATGAGACCAGATGACGATG", &c),
            seq_frag("CAGATGACGATGTCGTTGATATACCTACTGGAGAGCACAG", &c),
            seq_frag("TGGAGAGCACAGATGGATGACGTAATGATGATGACCGCAAC", &c),
            seq_frag("ACCGCAACTCGTTGATATACCTACTCAGATGACGAT", &c),
        ];
        assert!(Assembly::duplicates(&frags, 5, 20).is_some());
    }

    #[test]
    fn test_duplicates_shared_junction() {
        let c = test_conf();
        let frags = vec![
            seq_frag("ATGATGCCACGTGCAACTGAGATGAGACCAGATGACGATG", &c), // <- same junction
            seq_frag("CAGATGACGATGTCGTTGATATACCTACTGGAGAGCACAG", &c),
            seq_frag("TGGAGAGCACAGATGGATGACGTAATGACAGATGACGATG", &c), // <- same junction
            seq_frag("CAGATGACGATGACCGCAACTCGTTGATGATGCCAC", &c),
        ];

        let (_, _, seq) = Assembly::duplicates(&frags, 5, 20).unwrap();
        assert_eq!(seq, "CAGATGACGATG");
    }
}
