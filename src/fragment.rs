use crate::{config::Config, seq_match::Match};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::{fmt, sync::Arc};

lazy_static! {
    static ref ADDGENE_RE: Regex = Regex::new(r"^.*addgene\|(\d*)").unwrap();
    static ref IGEM_RE: Regex = Regex::new(r"^.*igem\|(\w*)").unwrap();
}

/// How a fragment is prepared for the assembly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragKind {
    /// a circular sequence of DNA, eg many of Addgene's plasmids
    Vector,

    /// prepared by PCR, often a subselection of its parent vector
    Pcr,

    /// fully synthesized de novo (eg gBlocks)
    Synthetic,

    /// used as-is, without PCR or synthesis
    Existing,
}

impl fmt::Display for FragKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FragKind::Vector => "vector",
            FragKind::Pcr => "pcr",
            FragKind::Synthetic => "synthetic",
            FragKind::Existing => "existing",
        };
        write!(f, "{name}")
    }
}

/// A single primer of a PCR fragment, 5' to 3'.
#[derive(Clone, Debug, Serialize)]
pub struct Primer {
    pub seq: String,

    /// true if on the template strand, false if on the complement
    pub strand: bool,

    /// range the primer spans on the target, end-inclusive
    #[serde(skip)]
    pub start: i64,
    #[serde(skip)]
    pub end: i64,
}

/// A single building block stretch of DNA for assembly.
///
/// `start`/`end` are 0-indexed, end-inclusive offsets on a linearized view
/// of the circular target; wrap-around occurrences keep unwrapped offsets
/// past the target length so position arithmetic never needs modular math.
#[derive(Clone, Debug, Serialize)]
pub struct Fragment {
    /// id of the fragment in its source database
    pub id: String,

    #[serde(rename = "type")]
    pub kind: FragKind,

    /// cost of procuring and preparing this fragment, resolved by the filler
    pub cost: f64,

    /// link to the fragment's repository page, if any
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// the fragment's sequence on the target
    #[serde(skip_serializing_if = "String::is_empty")]
    pub seq: String,

    /// sequence after PCR's addition of homology-bearing bp
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pcr_seq: String,

    /// primers necessary to create this (if a PCR fragment)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primers: Vec<Primer>,

    /// match disambiguator, shared with wrap-around copies
    #[serde(skip)]
    pub unique_id: String,

    /// the full sequence of the source entry, for off-target checks
    #[serde(skip)]
    pub full_seq: String,

    /// database the fragment came from
    #[serde(skip)]
    pub db: String,

    /// whether the fragment is local, ie free of procurement cost
    #[serde(skip)]
    pub internal: bool,

    #[serde(skip)]
    pub start: i64,

    #[serde(skip)]
    pub end: i64,

    /// shared, read-only cost/length settings
    #[serde(skip)]
    pub conf: Arc<Config>,
}

impl Fragment {
    pub fn empty(conf: Arc<Config>) -> Self {
        Fragment {
            id: String::new(),
            kind: FragKind::Existing,
            cost: 0.0,
            url: String::new(),
            seq: String::new(),
            pcr_seq: String::new(),
            primers: vec![],
            unique_id: String::new(),
            full_seq: String::new(),
            db: String::new(),
            internal: false,
            start: 0,
            end: 0,
            conf,
        }
    }

    pub fn from_match(m: &Match, conf: Arc<Config>) -> Self {
        let kind = if m.circular {
            FragKind::Vector
        } else {
            FragKind::Existing
        };

        Fragment {
            id: m.entry.clone(),
            kind,
            cost: 0.0,
            url: parse_url(&m.entry),
            seq: m.seq.to_uppercase(),
            pcr_seq: String::new(),
            primers: vec![],
            unique_id: m.unique_id.clone(),
            full_seq: String::new(),
            db: m.db.clone(),
            internal: m.internal,
            start: m.query_start,
            end: m.query_end,
            conf,
        }
    }

    /// Length of the fragment's span on the target (end-inclusive).
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Distance between the end of this fragment and the start of the
    /// other. Negative if the two overlap, zero if abutting.
    pub fn dist_to(&self, other: &Fragment) -> i64 {
        other.start - self.end
    }

    /// Whether this fragment could be joined to the other with homology
    /// added via PCR primer tails.
    pub fn overlaps_via_pcr(&self, other: &Fragment) -> bool {
        self.dist_to(other) <= self.conf.pcr_max_embed_length
    }

    /// Whether this fragment already overlaps the other by enough existing
    /// homology to anneal without any preparation.
    pub fn overlaps_via_homology(&self, other: &Fragment) -> bool {
        self.dist_to(other) < -self.conf.fragments_min_homology
    }

    /// Number of synthetic fragments that would be needed between this
    /// fragment and the other, were the two joined with nothing in between.
    pub fn synth_dist(&self, other: &Fragment) -> usize {
        if self.overlaps_via_pcr(other) {
            return 0;
        }

        let dist = self.dist_to(other).max(1) as f64;
        (dist / self.conf.synthetic_max_length as f64).ceil() as usize
    }

    /// Marginal cost of placing the other fragment immediately after this
    /// one: PCR/primer cost if the gap can be closed with primer tails,
    /// synthesis cost otherwise. `None` means the join is infeasible.
    ///
    /// This does not include procurement, which is added per assembly so it
    /// isn't charged twice for repeated entries.
    pub fn cost_to(&self, other: &Fragment) -> Option<f64> {
        if self.overlaps_via_pcr(other) {
            if self.overlaps_via_homology(other) {
                // enough overlap already, just two plain ~25bp primers
                return Some(50.0 * self.conf.pcr_bp_cost);
            }

            // additional primer sequence to reach the next fragment,
            // estimating half of min homology added to both sides
            return Some((50 + self.conf.fragments_min_homology) as f64 * self.conf.pcr_bp_cost);
        }

        // a new synthetic bridge, sized for the gap plus homology arms
        self.synth_bridge_cost(other)
    }

    /// Cost of closing the gap to the other fragment with synthesis alone.
    pub fn synth_bridge_cost(&self, other: &Fragment) -> Option<f64> {
        let frag_length = self.conf.fragments_min_homology + self.dist_to(other).max(1);
        self.conf.synth_fragment_cost(frag_length)
    }

    /// Estimated cost of the fragment itself: procurement (if requested)
    /// plus preparation.
    pub fn cost(&self, procure: bool) -> f64 {
        let mut cost = 0.0;

        if procure {
            if self.url.contains("addgene") {
                cost += self.conf.addgene_cost;
            } else if self.url.contains("igem") {
                cost += self.conf.igem_cost;
            } else if self.url.contains("dnasu") {
                cost += self.conf.dnasu_cost;
            }
        }

        match self.kind {
            FragKind::Pcr if self.primers.len() == 2 => {
                let primer_bp = (self.primers[0].seq.len() + self.primers[1].seq.len()) as f64;
                cost += primer_bp * self.conf.pcr_bp_cost + self.conf.pcr_rxn_cost;
            }
            FragKind::Synthetic => {
                cost += self
                    .conf
                    .synth_fragment_cost(self.seq.len() as i64)
                    .unwrap_or(f64::INFINITY);
            }
            _ => {}
        }

        cost
    }

    /// Indexes of the fragments that this one can reach within an ordered
    /// list: every fragment it overlaps via PCR, plus the first
    /// `synth_count` more that would need a synthetic bridge.
    pub fn reach(&self, frags: &[Fragment], i: usize, mut synth_count: usize) -> Vec<usize> {
        let mut reachable = vec![];

        let mut i = i + 1;
        while i < frags.len() {
            if self.overlaps_via_pcr(&frags[i]) {
                reachable.push(i);
            } else if synth_count > 0 {
                synth_count -= 1;
                reachable.push(i);
            } else {
                break;
            }
            i += 1;
        }

        reachable
    }

    /// The 100% identical homology between the end of this fragment and the
    /// start of the other, if one exists within the homology length window.
    pub fn junction(&self, other: &Fragment, min_homology: i64, max_homology: i64) -> Option<String> {
        let this_seq = self.prepared_seq().to_uppercase();
        let other_seq = other.prepared_seq().to_uppercase();
        let this = this_seq.as_bytes();
        let other = other_seq.as_bytes();

        //      v-max_homology from end   v-min_homology from end
        // ------------------------------------
        //                    -----------------------------
        let len = this.len() as i64;
        let start = (len - max_homology).max(0);
        let end = len - min_homology;
        if end < start {
            return None;
        }

        // for every possible start index, walk to the end of this sequence
        // along the other's prefix
        for i in start..=end {
            let mut j = 0usize;
            for k in (i as usize)..this.len() {
                if j >= other.len() || this[k] != other[j] {
                    break;
                }
                j += 1;

                // made it to the end of the sequence, there's a junction
                if k == this.len() - 1 {
                    return Some(this_seq[i as usize..].to_string());
                }
            }
        }

        None
    }

    /// Synthetic fragments bridging this fragment to the next, each with
    /// min-homology arms against its neighbors, cut from the target.
    pub fn synth_to(&self, next: &Fragment, target: &str) -> Vec<Fragment> {
        let min_homology = self.conf.fragments_min_homology;

        let count = self.synth_dist(next) as i64;
        if count == 0 {
            return vec![];
        }

        // length of each synthesized fragment, with homology on either end,
        // and at least the provider's minimum
        let frag_length = (self.dist_to(next) / count + 2 * min_homology)
            .max(self.conf.synthetic_min_length);

        // repeat the target so ranges across the zero index still subselect,
        // enough times to cover every piece
        let target_length = target.len() as i64;
        let first_start = self.end - min_homology;
        let span_end = first_start + count * (frag_length + 1 - min_homology) + min_homology + 1;
        let repeats = (span_end / target_length + 2) as usize;
        let template = target.to_uppercase().repeat(repeats);

        // slide along the gap, each piece starting min-homology into its
        // predecessor
        let mut synths: Vec<Fragment> = vec![];
        let mut start = first_start;
        while (synths.len() as i64) < count {
            let end = start + frag_length + 1;
            let seq =
                template[(start + target_length) as usize..(end + target_length) as usize].to_string();

            let id = if self.id.is_empty() {
                format!("synthetic-{}", synths.len() + 1)
            } else {
                format!("{}-synthetic-{}", self.id, synths.len() + 1)
            };

            let mut f = Fragment::empty(self.conf.clone());
            f.id = id;
            f.kind = FragKind::Synthetic;
            f.seq = seq;
            f.start = start;
            f.end = end;
            synths.push(f);

            start = end - min_homology;
        }

        synths
    }

    /// The sequence the fragment will actually contribute to the build.
    pub fn prepared_seq(&self) -> &str {
        if self.pcr_seq.is_empty() {
            &self.seq
        } else {
            &self.pcr_seq
        }
    }
}

/// Turns a fragment identifier into a URL to its repository.
pub fn parse_url(id: &str) -> String {
    if id.contains("addgene") {
        if let Some(caps) = ADDGENE_RE.captures(id) {
            return format!("https://www.addgene.org/{}/", &caps[1]);
        }
    }

    if id.contains("igem") {
        if let Some(caps) = IGEM_RE.captures(id) {
            return format!("http://parts.igem.org/Part:{}", &caps[1]);
        }
    }

    String::new()
}

/// Total cost of a list of fragments, procurement included.
pub fn frags_cost(frags: &[Fragment]) -> f64 {
    frags.iter().map(|f| f.cost(true)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conf() -> Arc<Config> {
        Arc::new(Config::default())
    }

    fn frag(unique_id: &str, start: i64, end: i64, conf: &Arc<Config>) -> Fragment {
        let mut f = Fragment::empty(conf.clone());
        f.id = unique_id.to_string();
        f.unique_id = unique_id.to_string();
        f.start = start;
        f.end = end;
        f
    }

    #[test]
    fn test_dist_to() {
        let c = conf();
        let a = frag("a", 0, 50, &c);
        let b = frag("b", 20, 80, &c);
        let d = frag("d", 90, 130, &c);

        assert_eq!(a.dist_to(&b), -30); // overlap
        assert_eq!(b.dist_to(&d), 10); // gap
        assert_eq!(a.dist_to(&a), -50);
    }

    #[test]
    fn test_overlaps() {
        let c = conf();
        let a = frag("a", 0, 50, &c);
        let b = frag("b", 20, 80, &c);
        let far = frag("far", 500, 600, &c);

        assert!(a.overlaps_via_homology(&b));
        assert!(a.overlaps_via_pcr(&b));
        assert!(!a.overlaps_via_pcr(&far));
    }

    #[test]
    fn test_synth_dist() {
        let c = conf();
        let a = frag("a", 0, 50, &c);
        let b = frag("b", 20, 80, &c);
        assert_eq!(a.synth_dist(&b), 0); // already overlapping

        let far = frag("far", 2000, 2100, &c);
        assert_eq!(a.synth_dist(&far), 1); // one bridge

        let very_far = frag("very_far", 3500, 3600, &c);
        assert_eq!(a.synth_dist(&very_far), 2); // split across two bridges
    }

    #[test]
    fn test_cost_to_zero_gap_is_pcr_only() {
        let c = conf();
        let a = frag("a", 0, 50, &c);
        let b = frag("b", 51, 120, &c); // exact abutment

        assert_eq!(a.synth_dist(&b), 0);
        let cost = a.cost_to(&b).unwrap();
        assert_eq!(cost, (50 + c.fragments_min_homology) as f64 * c.pcr_bp_cost);
    }

    #[test]
    fn test_cost_to_infeasible() {
        let mut c = Config::default();
        c.synthetic_fragment_cost = Default::default();
        let c = Arc::new(c);

        let a = frag("a", 0, 50, &c);
        let far = frag("far", 2000, 2100, &c);
        assert_eq!(a.cost_to(&far), None);
    }

    #[test]
    fn test_reach() {
        let c = conf();
        let frags = vec![
            frag("a", 0, 50, &c),
            frag("b", 20, 80, &c),
            frag("c", 60, 100, &c),
            frag("d", 2000, 2100, &c),
            frag("e", 2050, 2150, &c),
        ];

        // a overlaps b and c via PCR, then may synthesize to one more
        assert_eq!(frags[0].reach(&frags, 0, 1), vec![1, 2, 3]);
        // with no synth reach, only the overlapping fragments
        assert_eq!(frags[0].reach(&frags, 0, 0), vec![1, 2]);
    }

    #[test]
    fn test_junction() {
        let c = conf();
        let mut a = frag("a", 0, 0, &c);
        a.seq = "ATACCTACTATGGATGACGTAGCAAC".to_string();
        let mut b = frag("b", 0, 0, &c);
        b.seq = "AGCAACTCGTTGATATCCACGTA".to_string();

        // a's suffix AGCAAC is b's prefix
        assert_eq!(a.junction(&b, 5, 10), Some("AGCAAC".to_string()));

        // below the homology floor there's no junction
        assert_eq!(a.junction(&b, 7, 10), None);

        // no junction in the other direction
        assert_eq!(b.junction(&a, 5, 10), None);
    }

    #[test]
    fn test_synth_to() {
        let c = conf();
        let target: String = "AGCTTGGACT".repeat(30); // 300bp
        let a = frag("a", 0, 49, &c);
        let b = frag("b", 250, 299, &c);

        let synths = a.synth_to(&b, &target);
        assert_eq!(synths.len(), 1);
        let s = &synths[0];
        assert_eq!(s.kind, FragKind::Synthetic);
        assert!(s.seq.len() as i64 >= c.synthetic_min_length);
        // the bridge begins min-homology inside of a
        assert_eq!(s.start, a.end - c.fragments_min_homology);
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(
            parse_url("gnl|addgene|113726(circular)"),
            "https://www.addgene.org/113726/"
        );
        assert_eq!(
            parse_url("gnl|igem|BBa_K1085023"),
            "http://parts.igem.org/Part:BBa_K1085023"
        );
        assert_eq!(parse_url("my_local_fragment"), "");
    }

    #[test]
    fn test_procurement_cost_by_repository() {
        let c = conf();
        let mut f = frag("a", 0, 50, &c);
        f.url = parse_url("gnl|addgene|113726");

        assert_eq!(f.cost(true), c.addgene_cost);
        assert_eq!(f.cost(false), 0.0);
    }
}
