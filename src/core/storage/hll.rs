// src/core/storage/hll.rs

use bytes::Bytes;
use murmur3::murmur3_x64_128;
use std::io::Cursor;

const PRECISION: u32 = 14;
const REGISTER_COUNT: usize = 1 << PRECISION;
const M: f64 = REGISTER_COUNT as f64;

/// Dense HyperLogLog with 16384 one-byte registers.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperLogLog {
    registers: Vec<u8>,
}

impl Default for HyperLogLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperLogLog {
    pub fn new() -> Self {
        Self {
            registers: vec![0; REGISTER_COUNT],
        }
    }

    /// Rebuilds an estimator from raw registers. Returns `None` on a size mismatch.
    pub fn from_registers(registers: &[u8]) -> Option<Self> {
        (registers.len() == REGISTER_COUNT).then(|| Self {
            registers: registers.to_vec(),
        })
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Observes an element. Returns `true` if any register changed.
    pub fn add(&mut self, item: &Bytes) -> bool {
        let hash = murmur3_x64_128(&mut Cursor::new(item), 0).unwrap_or_default();
        let high = (hash >> 64) as u64;

        let index = (high >> (64 - PRECISION)) as usize;
        let rho = ((high << PRECISION).leading_zeros() + 1).min(64 - PRECISION + 1) as u8;

        if rho > self.registers[index] {
            self.registers[index] = rho;
            true
        } else {
            false
        }
    }

    pub fn merge(&mut self, other: &HyperLogLog) {
        for (mine, theirs) in self.registers.iter_mut().zip(&other.registers) {
            *mine = (*mine).max(*theirs);
        }
    }

    pub fn count(&self) -> u64 {
        let alpha = 0.7213 / (1.0 + 1.079 / M);
        let sum: f64 = self
            .registers
            .iter()
            .map(|&r| 2f64.powi(-(r as i32)))
            .sum();
        let estimate = alpha * M * M / sum;

        if estimate <= 2.5 * M {
            let zeros = self.registers.iter().filter(|&&r| r == 0).count();
            if zeros > 0 {
                return (M * (M / zeros as f64).ln()) as u64;
            }
        }
        estimate as u64
    }

    pub fn memory_usage(&self) -> usize {
        REGISTER_COUNT
    }
}
