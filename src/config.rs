use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::{collections::BTreeMap, fs};

const BUILTIN_CONFIG_JSON: &str = include_str!("../assets/config.json");

/// Cost of synthesizing DNA up to a certain length. Either fixed for the
/// whole stretch, or paid per bp.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SynthCost {
    pub fixed: bool,
    pub cost: f64,
}

/// Cost and length settings shared, read-only, by every fragment in a run.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// cost of procuring a single Addgene plasmid
    pub addgene_cost: f64,

    /// cost of procuring a single part from the iGEM registry
    pub igem_cost: f64,

    /// cost of procuring a single DNASU plasmid
    pub dnasu_cost: f64,

    /// cost per bp of primer DNA
    pub pcr_bp_cost: f64,

    /// cost of each PCR reaction
    pub pcr_rxn_cost: f64,

    /// fixed per-assembly Gibson surcharge
    pub gibson_assembly_cost: f64,

    /// maximum number of fragments in the final assembly
    pub fragments_max_count: usize,

    /// minimum homology between a fragment and the next one
    #[serde(rename = "fragments-min-junction-length")]
    pub fragments_min_homology: i64,

    /// maximum length of homology between two adjacent fragments in bp
    #[serde(rename = "fragments-max-junction-length")]
    pub fragments_max_homology: i64,

    /// minimum length of a PCR product
    pub pcr_min_length: i64,

    /// maximum length of a sequence to embed up- or downstream of an
    /// amplified sequence via primer tails
    #[serde(rename = "pcr-primer-max-embed-length")]
    pub pcr_max_embed_length: i64,

    /// minimum length of a synthesized piece of DNA
    pub synthetic_min_length: i64,

    /// maximum length of a synthesized piece of DNA
    pub synthetic_max_length: i64,

    /// cost of synthesized fragments as a step function over length
    #[serde_as(as = "BTreeMap<DisplayFromStr, _>")]
    pub synthetic_fragment_cost: BTreeMap<i64, SynthCost>,

    /// cost of synthesizing an insert and having it delivered in a plasmid
    #[serde_as(as = "BTreeMap<DisplayFromStr, _>")]
    pub synthetic_plasmid_cost: BTreeMap<i64, SynthCost>,
}

impl Default for Config {
    fn default() -> Self {
        // the builtin asset is compiled in and known to parse
        serde_json::from_str(BUILTIN_CONFIG_JSON).unwrap()
    }
}

impl Config {
    /// Loads a config from a JSON file, overlaying the user's keys onto the
    /// builtin defaults so partial settings files are fine.
    pub fn from_path(path: &str) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("could not read config {path}"))?;
        let mut base: serde_json::Value = serde_json::from_str(BUILTIN_CONFIG_JSON)?;
        let user: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("config {path} is not valid JSON"))?;
        if let (Some(base_map), Some(user_map)) = (base.as_object_mut(), user.as_object()) {
            for (key, value) in user_map {
                base_map.insert(key.clone(), value.clone());
            }
        }
        Ok(serde_json::from_value(base)?)
    }

    /// Cost of synthesizing a linear stretch of DNA, splitting it into
    /// multiple pieces if it exceeds the maximum synthesizable length.
    /// `None` means the stretch cannot be synthesized at any price.
    pub fn synth_fragment_cost(&self, frag_length: i64) -> Option<f64> {
        if frag_length <= 0 || self.synthetic_max_length <= 0 {
            return None;
        }

        // by default the whole thing is made in one piece, otherwise split
        // it evenly beneath the max synthesizable length
        let frag_count = (frag_length as f64 / self.synthetic_max_length as f64).ceil();
        let piece_length = (frag_length as f64 / frag_count).floor() as i64;

        let cost = self.synth_cost(piece_length)?;
        if cost.fixed {
            Some(frag_count * cost.cost)
        } else {
            Some(frag_count * piece_length as f64 * cost.cost)
        }
    }

    /// Cost of synthesizing an insert and receiving it cloned into a
    /// delivery plasmid. Unlike fragments, an insert is never split.
    pub fn synth_plasmid_cost(&self, insert_length: i64) -> Option<f64> {
        if insert_length <= 0 {
            return None;
        }

        let cost = self
            .synthetic_plasmid_cost
            .range(insert_length..)
            .next()
            .map(|(_, cost)| *cost)?;
        if cost.fixed {
            Some(cost.cost)
        } else {
            Some(insert_length as f64 * cost.cost)
        }
    }

    /// Finds the smallest cost-table bucket at or above the requested
    /// length. Ex: with buckets at 500 and 2000, a 750 bp piece uses the
    /// 2000 bp price.
    fn synth_cost(&self, seq_length: i64) -> Option<SynthCost> {
        self.synthetic_fragment_cost
            .range(seq_length..)
            .next()
            .map(|(_, cost)| *cost)
    }
}
