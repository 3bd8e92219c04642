//! Reed-Solomon forward error correction over GF(2^8)
//!
//! Systematic code: the codeword is the payload followed by `ecc_bytes`
//! parity symbols. Field polynomial 0x11D, generator α = 2, first consecutive
//! root α^0 (fcr = 0).
//! Decoding corrects up to `ecc_bytes / 2` symbol errors, or any mix with
//! `2 * errors + erasures <= ecc_bytes`.

use crate::config::ModemConfig;
use crate::error::{FecError, ModemError, Result};
use log::trace;

/// Primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
const PRIM_POLY: u16 = 0x11D;

/// Order of the multiplicative group of GF(2^8)
const GROUP_ORDER: usize = 255;

/// Log/antilog tables for GF(2^8).
#[derive(Clone)]
struct Gf256 {
    exp: [u8; 512], // doubled so exp[a + b] needs no reduction
    log: [u8; 256],
}

impl Gf256 {
    fn new() -> Self {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];

        let mut x: u16 = 1;
        for i in 0..GROUP_ORDER {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= PRIM_POLY;
            }
        }
        for i in GROUP_ORDER..512 {
            exp[i] = exp[i - GROUP_ORDER];
        }

        Self { exp, log }
    }

    fn mul(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
    }

    /// `b` must be non-zero.
    fn div(&self, a: u8, b: u8) -> u8 {
        if a == 0 {
            return 0;
        }
        self.exp[self.log[a as usize] as usize + GROUP_ORDER - self.log[b as usize] as usize]
    }

    /// `a` must be non-zero.
    fn inv(&self, a: u8) -> u8 {
        self.exp[GROUP_ORDER - self.log[a as usize] as usize]
    }

    fn alpha_pow(&self, power: usize) -> u8 {
        self.exp[power % GROUP_ORDER]
    }

    /// Horner evaluation; `poly[0]` is the highest-degree coefficient.
    fn eval_high_first(&self, poly: &[u8], x: u8) -> u8 {
        poly.iter().fold(0, |acc, &coeff| self.mul(acc, x) ^ coeff)
    }

    /// `poly[0]` is the constant term.
    fn eval_low_first(&self, poly: &[u8], x: u8) -> u8 {
        poly.iter().rev().fold(0, |acc, &coeff| self.mul(acc, x) ^ coeff)
    }
}

impl std::fmt::Debug for Gf256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gf256").finish()
    }
}

/// Shared encoder/decoder arithmetic for one parity length.
#[derive(Debug, Clone)]
struct ReedSolomon {
    gf: Gf256,
    nsym: usize,
    /// g(x) = prod (x - α^i), i in 0..nsym, highest degree first
    generator: Vec<u8>,
}

/// Outcome of a successful repair.
struct Correction {
    codeword: Vec<u8>,
    corrected: usize,
}

impl ReedSolomon {
    fn new(nsym: usize) -> Self {
        let gf = Gf256::new();
        let mut generator = vec![1u8];
        for i in 0..nsym {
            let root = gf.alpha_pow(i);
            let mut next = vec![0u8; generator.len() + 1];
            for (j, &coeff) in generator.iter().enumerate() {
                next[j] ^= coeff;
                next[j + 1] ^= gf.mul(coeff, root);
            }
            generator = next;
        }
        Self { gf, nsym, generator }
    }

    fn encode(&self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        out.resize(data.len() + self.nsym, 0);

        // Synthetic division by g(x); the tail becomes the remainder
        for i in 0..data.len() {
            let coeff = out[i];
            if coeff != 0 {
                for (j, &g) in self.generator.iter().enumerate().skip(1) {
                    out[i + j] ^= self.gf.mul(g, coeff);
                }
            }
        }
        out[..data.len()].copy_from_slice(data);
        out
    }

    /// S_i = c(α^i) for i in 0..nsym
    fn syndromes(&self, codeword: &[u8]) -> Vec<u8> {
        (0..self.nsym)
            .map(|i| self.gf.eval_high_first(codeword, self.gf.alpha_pow(i)))
            .collect()
    }

    /// Locator value X for a byte index (index 0 carries the highest power).
    fn locator(&self, len: usize, position: usize) -> u8 {
        self.gf.alpha_pow(len - 1 - position)
    }

    fn correct(&self, received: &[u8], erasures: &[usize]) -> std::result::Result<Correction, FecError> {
        let n = received.len();
        if erasures.len() > self.nsym {
            return Err(FecError::TooManyErasures {
                count: erasures.len(),
                max: self.nsym,
            });
        }

        let mut codeword = received.to_vec();
        let syndromes = self.syndromes(&codeword);
        if syndromes.iter().all(|&s| s == 0) {
            return Ok(Correction {
                codeword,
                corrected: 0,
            });
        }

        // Forney syndromes: fold each known erasure out of the sequence
        let mut folded = syndromes.clone();
        for &position in erasures {
            let x = self.locator(n, position);
            for j in 0..folded.len().saturating_sub(1) {
                folded[j] = self.gf.mul(folded[j], x) ^ folded[j + 1];
            }
        }
        let usable = self.nsym - erasures.len();

        let (error_locator, errors) = self.berlekamp_massey(&folded[..usable]);
        let degree = error_locator.len() - 1;
        if degree != errors || 2 * errors + erasures.len() > self.nsym {
            trace!("locator degree {} (L = {}) exceeds capacity", degree, errors);
            return Err(FecError::Uncorrectable);
        }

        let mut positions = self.chien_search(&error_locator, n);
        if positions.len() != errors {
            trace!("chien search found {} roots, expected {}", positions.len(), errors);
            return Err(FecError::Uncorrectable);
        }
        for &position in erasures {
            if !positions.contains(&position) {
                positions.push(position);
            }
        }

        let magnitudes = self.forney(&syndromes, &positions, n)?;
        for (&position, &magnitude) in positions.iter().zip(magnitudes.iter()) {
            codeword[position] ^= magnitude;
        }

        // Anything short of a clean codeword is a miscorrection
        if self.syndromes(&codeword).iter().any(|&s| s != 0) {
            return Err(FecError::Uncorrectable);
        }

        let corrected = magnitudes.iter().filter(|&&m| m != 0).count();
        Ok(Correction {
            codeword,
            corrected,
        })
    }

    /// Shortest LFSR generating `syndromes`.
    ///
    /// Returns the connection polynomial (constant term first, trimmed) and
    /// the register length L.
    fn berlekamp_massey(&self, syndromes: &[u8]) -> (Vec<u8>, usize) {
        let len = syndromes.len();
        let mut current = vec![0u8; len + 1];
        current[0] = 1;
        let mut previous = current.clone();

        let mut l = 0usize;
        let mut shift = 1usize;
        let mut last_discrepancy = 1u8;

        for n in 0..len {
            let mut discrepancy = syndromes[n];
            for i in 1..=l {
                discrepancy ^= self.gf.mul(current[i], syndromes[n - i]);
            }

            if discrepancy == 0 {
                shift += 1;
                continue;
            }

            let coeff = self.gf.div(discrepancy, last_discrepancy);
            let snapshot = current.clone();
            for (i, &b) in previous.iter().enumerate() {
                if i + shift < current.len() {
                    current[i + shift] ^= self.gf.mul(coeff, b);
                }
            }

            if 2 * l <= n {
                l = n + 1 - l;
                previous = snapshot;
                last_discrepancy = discrepancy;
                shift = 1;
            } else {
                shift += 1;
            }
        }

        let degree = current.iter().rposition(|&c| c != 0).unwrap_or(0);
        current.truncate(degree + 1);
        (current, l)
    }

    /// Byte positions whose inverse locator is a root, within the shortened block.
    fn chien_search(&self, locator: &[u8], len: usize) -> Vec<usize> {
        (0..len)
            .filter(|&position| {
                let x_inv = self.gf.inv(self.locator(len, position));
                self.gf.eval_low_first(locator, x_inv) == 0
            })
            .collect()
    }

    /// Error magnitudes for known errata positions.
    fn forney(&self, syndromes: &[u8], positions: &[usize], len: usize) -> std::result::Result<Vec<u8>, FecError> {
        let xs: Vec<u8> = positions.iter().map(|&p| self.locator(len, p)).collect();

        // Errata locator: prod (1 + X_k x)
        let mut locator = vec![1u8];
        for &x in &xs {
            let mut next = vec![0u8; locator.len() + 1];
            for (i, &c) in locator.iter().enumerate() {
                next[i] ^= c;
                next[i + 1] ^= self.gf.mul(c, x);
            }
            locator = next;
        }

        // Evaluator: S(x) * locator(x) mod x^nsym
        let nsym = syndromes.len();
        let mut evaluator = vec![0u8; nsym];
        for i in 0..nsym {
            for j in 0..locator.len().min(i + 1) {
                evaluator[i] ^= self.gf.mul(locator[j], syndromes[i - j]);
            }
        }

        let mut magnitudes = Vec::with_capacity(xs.len());
        for &x in &xs {
            let x_inv = self.gf.inv(x);
            let x_inv_sq = self.gf.mul(x_inv, x_inv);

            // Formal derivative keeps only odd powers in characteristic 2
            let mut derivative = 0u8;
            let mut power = 1u8;
            for k in (1..locator.len()).step_by(2) {
                derivative ^= self.gf.mul(locator[k], power);
                power = self.gf.mul(power, x_inv_sq);
            }
            if derivative == 0 {
                return Err(FecError::Uncorrectable);
            }

            let numerator = self.gf.eval_low_first(&evaluator, x_inv);
            magnitudes.push(self.gf.mul(x, self.gf.div(numerator, derivative)));
        }

        Ok(magnitudes)
    }
}

fn check_params(config: &ModemConfig) -> Result<()> {
    if config.ecc_bytes == 0 || config.ecc_bytes >= config.total_bytes || config.total_bytes > GROUP_ORDER {
        return Err(ModemError::InvalidConfig(format!(
            "RS({}, {}) is not a valid GF(256) code",
            config.total_bytes,
            config.payload_bytes()
        )));
    }
    Ok(())
}

/// Decoded payload plus the number of repaired symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FecReport {
    pub payload: Vec<u8>,
    pub corrected: usize,
}

#[derive(Debug, Clone)]
pub struct FecEncoder {
    rs: ReedSolomon,
    payload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct FecDecoder {
    rs: ReedSolomon,
    payload_bytes: usize,
    total_bytes: usize,
}

impl FecEncoder {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        check_params(config)?;
        Ok(Self::with_params(config.payload_bytes(), config.ecc_bytes))
    }

    pub(crate) fn with_params(payload_bytes: usize, ecc_bytes: usize) -> Self {
        Self {
            rs: ReedSolomon::new(ecc_bytes),
            payload_bytes,
        }
    }

    /// Encode one payload into a full codeword (payload + parity).
    ///
    /// The payload must be exactly `payload_bytes` long.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() != self.payload_bytes {
            return Err(FecError::InvalidLength {
                expected: self.payload_bytes,
                actual: payload.len(),
            }
            .into());
        }
        Ok(self.rs.encode(payload))
    }

    pub fn payload_bytes(&self) -> usize {
        self.payload_bytes
    }

    /// Encode a block the caller has already sized to `payload_bytes`.
    pub(crate) fn encode_block(&self, block: &[u8]) -> Vec<u8> {
        debug_assert_eq!(block.len(), self.payload_bytes);
        self.rs.encode(block)
    }
}

impl FecDecoder {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        check_params(config)?;
        Ok(Self::with_params(config.payload_bytes(), config.ecc_bytes))
    }

    pub(crate) fn with_params(payload_bytes: usize, ecc_bytes: usize) -> Self {
        Self {
            rs: ReedSolomon::new(ecc_bytes),
            payload_bytes,
            total_bytes: payload_bytes + ecc_bytes,
        }
    }

    /// Maximum number of symbol errors guaranteed to be corrected
    pub fn correction_capacity(&self) -> usize {
        self.rs.nsym / 2
    }

    /// Repair a codeword and return its payload
    pub fn decode(&self, codeword: &[u8]) -> Result<Vec<u8>> {
        Ok(self.decode_with_report(codeword)?.payload)
    }

    pub fn decode_with_report(&self, codeword: &[u8]) -> Result<FecReport> {
        self.decode_with_erasures(codeword, &[])
    }

    /// Repair a codeword given byte positions known to be unreliable.
    ///
    /// Each erasure costs one parity symbol instead of two.
    pub fn decode_with_erasures(&self, codeword: &[u8], erasures: &[usize]) -> Result<FecReport> {
        if codeword.len() != self.total_bytes {
            return Err(FecError::InvalidLength {
                expected: self.total_bytes,
                actual: codeword.len(),
            }
            .into());
        }

        let mut positions: Vec<usize> = Vec::with_capacity(erasures.len());
        for &position in erasures {
            if position >= codeword.len() {
                return Err(FecError::InvalidErasure {
                    position,
                    len: codeword.len(),
                }
                .into());
            }
            if !positions.contains(&position) {
                positions.push(position);
            }
        }

        let correction = self.rs.correct(codeword, &positions)?;
        if correction.corrected > 0 {
            trace!("repaired {} symbols", correction.corrected);
        }

        Ok(FecReport {
            payload: correction.codeword[..self.payload_bytes].to_vec(),
            corrected: correction.corrected,
        })
    }
}
