// Nucleotide helpers shared by the cost model, the filler and primer sizing

use lazy_static::lazy_static;

lazy_static! {
    static ref DNA_COMPLEMENT: [u8; 256] = initialize_complement();
}

fn initialize_complement() -> [u8; 256] {
    let mut dna: [u8; 256] = [b'N'; 256];
    dna[b'A' as usize] = b'T';
    dna[b'T' as usize] = b'A';
    dna[b'G' as usize] = b'C';
    dna[b'C' as usize] = b'G';
    dna[b'U' as usize] = b'A';
    // IUPAC ambiguity codes
    dna[b'Y' as usize] = b'R';
    dna[b'R' as usize] = b'Y';
    dna[b'W' as usize] = b'W';
    dna[b'S' as usize] = b'S';
    dna[b'K' as usize] = b'M';
    dna[b'M' as usize] = b'K';
    dna[b'D' as usize] = b'H';
    dna[b'V' as usize] = b'B';
    dna[b'H' as usize] = b'D';
    dna[b'B' as usize] = b'V';
    dna[b'N' as usize] = b'N';
    dna
}

#[inline(always)]
pub fn complement(base: u8) -> u8 {
    DNA_COMPLEMENT[base.to_ascii_uppercase() as usize]
}

pub fn reverse_complement(seq: &str) -> String {
    seq.bytes()
        .rev()
        .map(|b| complement(b) as char)
        .collect()
}

/// Uppercases a raw sequence, strips whitespace, and replaces anything
/// outside the IUPAC alphabet with `N`.
pub fn normalize(seq: &str) -> String {
    seq.bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|b| {
            let b = b.to_ascii_uppercase();
            if is_iupac(b) { b as char } else { 'N' }
        })
        .collect()
}

#[inline(always)]
pub fn is_iupac(base: u8) -> bool {
    matches!(
        base.to_ascii_uppercase(),
        b'A' | b'C'
            | b'G'
            | b'T'
            | b'U'
            | b'Y'
            | b'R'
            | b'W'
            | b'S'
            | b'K'
            | b'M'
            | b'D'
            | b'V'
            | b'H'
            | b'B'
            | b'N'
    )
}
