use crate::{dna, fragment::{Fragment, Primer}};
use anyhow::{Result, bail};

/// Seam to the external primer-design collaborator. Given a fragment and
/// its neighbors, an implementation must set the fragment's primers, widen
/// its range to the negotiated overlaps, and fill in `pcr_seq`.
pub trait PrimerDesigner {
    fn design(&self, frag: &mut Fragment, last: &Fragment, next: &Fragment, target: &str)
    -> Result<()>;
}

/// Deterministic, arithmetic primer sizing: a fixed annealing length plus
/// whatever embedded tail is needed to reach min homology with each
/// neighbor. No melting-temperature or off-target screening; that belongs
/// to an external oracle implementing [`PrimerDesigner`].
#[derive(Clone, Copy, Debug)]
pub struct HomologyPrimerDesigner {
    /// bp of the primer annealing to the template
    pub annealing_length: i64,
}

impl Default for HomologyPrimerDesigner {
    fn default() -> Self {
        Self {
            annealing_length: 25,
        }
    }
}

impl PrimerDesigner for HomologyPrimerDesigner {
    fn design(
        &self,
        frag: &mut Fragment,
        last: &Fragment,
        next: &Fragment,
        target: &str,
    ) -> Result<()> {
        let conf = frag.conf.clone();
        let min_homology = conf.fragments_min_homology;
        let target_length = target.len() as i64;
        let template = target.to_uppercase().repeat(3);

        // widen the amplified range left/right until the product overlaps
        // each neighbor by min homology, if it doesn't already
        let mut start = frag.start;
        if !last.overlaps_via_homology(frag) {
            start = start.min(last.end - min_homology + 1);
        }
        let mut end = frag.end;
        if !frag.overlaps_via_homology(next) {
            end = end.max(next.start + min_homology - 1);
        }

        if last.dist_to(frag) > conf.pcr_max_embed_length
            || frag.dist_to(next) > conf.pcr_max_embed_length
        {
            bail!("gap to a neighbor of {} is too long for a primer tail", frag.id);
        }

        if end - start + 1 < conf.pcr_min_length {
            bail!(
                "{} is {}bp, needs to be > {}bp for PCR",
                frag.id,
                end - start + 1,
                conf.pcr_min_length
            );
        }

        // forward primer: embedded tail + annealing bp, 5' to 3'
        let fwd_anneal_end = frag.start + self.annealing_length;
        let fwd = slice(&template, start, fwd_anneal_end, target_length);

        // reverse primer: reverse complement of the annealing bp at the
        // product's right end, plus the embedded tail
        let rev_anneal_start = frag.end - self.annealing_length + 1;
        let rev = dna::reverse_complement(&slice(&template, rev_anneal_start, end + 1, target_length));

        frag.primers = vec![
            Primer {
                seq: fwd,
                strand: true,
                start,
                end: fwd_anneal_end - 1,
            },
            Primer {
                seq: rev,
                strand: false,
                start: rev_anneal_start,
                end,
            },
        ];
        frag.start = start;
        frag.end = end;
        frag.pcr_seq = slice(&template, start, end + 1, target_length);

        Ok(())
    }
}

/// Subselects `[start, end)` from the tripled template, offset so ranges
/// across the zero index stay in bounds.
fn slice(template: &str, start: i64, end: i64, target_length: i64) -> String {
    template[(start + target_length) as usize..(end + target_length) as usize].to_string()
}
