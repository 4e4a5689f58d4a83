use crate::capability;
use crate::config::{DecayConfig, MemoryType};
use crate::error::{AccelError, AccelResult};

/// Age past which a memory counts as old for the recency paradox.
pub const RECENCY_AGE_HOURS: f64 = 168.0;
/// Last access within this window counts as a recent revisit.
pub const RECENCY_ACCESS_HOURS: f64 = 24.0;
/// Multiplier applied to an old memory that was revisited recently.
pub const RECENCY_BOOST: f64 = 1.3;

#[cfg(feature = "parallel")]
const PARALLEL_MIN_BATCH: usize = 1024;
#[cfg(feature = "parallel")]
const PARALLEL_CHUNK: usize = 512;

/// Snapshot of one memory record, as seen by the decay formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayInput {
    /// Undecayed importance in [0, 1].
    pub importance: f64,
    /// Age in hours since creation. `None` while the record is not yet valid.
    pub hours_passed: Option<f64>,
    pub access_count: u32,
    pub connection_count: u32,
    /// Hours since the last access. `None` if never accessed.
    pub last_access_hours: Option<f64>,
    pub memory_type: MemoryType,
    /// Distinct channels referencing the record.
    pub channel_mentions: u32,
}

impl DecayInput {
    /// A never-accessed, unconnected conversation memory. A negative age means
    /// the record is not yet valid.
    pub fn new(importance: f64, hours_passed: f64) -> Self {
        Self {
            importance,
            hours_passed: non_negative(hours_passed),
            access_count: 0,
            connection_count: 0,
            last_access_hours: None,
            memory_type: MemoryType::Conversation,
            channel_mentions: 0,
        }
    }

    /// Build from sentinel-encoded raw values: negative hours mean absent,
    /// negative counts saturate to zero and the type index is clamped.
    pub fn from_raw(
        importance: f64,
        hours_passed: f64,
        access_count: i64,
        connection_count: i64,
        last_access_hours: f64,
        memory_type: i64,
        channel_mentions: i64,
    ) -> Self {
        Self {
            importance,
            hours_passed: non_negative(hours_passed),
            access_count: saturate_count(access_count),
            connection_count: saturate_count(connection_count),
            last_access_hours: non_negative(last_access_hours),
            memory_type: MemoryType::from_index(memory_type),
            channel_mentions: saturate_count(channel_mentions),
        }
    }

    pub fn with_access_count(mut self, access_count: u32) -> Self {
        self.access_count = access_count;
        self
    }

    pub fn with_connection_count(mut self, connection_count: u32) -> Self {
        self.connection_count = connection_count;
        self
    }

    /// Negative values mean "never accessed".
    pub fn with_last_access_hours(mut self, last_access_hours: f64) -> Self {
        self.last_access_hours = non_negative(last_access_hours);
        self
    }

    pub fn with_memory_type(mut self, memory_type: MemoryType) -> Self {
        self.memory_type = memory_type;
        self
    }

    pub fn with_channel_mentions(mut self, channel_mentions: u32) -> Self {
        self.channel_mentions = channel_mentions;
        self
    }

    /// Credit one virtual access when the record was last touched during a
    /// peak activity hour.
    pub fn with_circadian_stability(mut self, last_accessed_hour: u8, peak_hours: &[u8]) -> Self {
        self.access_count =
            apply_circadian_stability(self.access_count, last_accessed_hour, peak_hours);
        self
    }
}

fn non_negative(hours: f64) -> Option<f64> {
    if hours < 0.0 {
        None
    } else {
        Some(hours)
    }
}

fn saturate_count(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

const HOURS_PER_DAY: usize = 24;

/// Access count adjusted for time-of-day: accesses during a peak hour count once more.
pub fn apply_circadian_stability(access_count: u32, last_accessed_hour: u8, peak_hours: &[u8]) -> u32 {
    if peak_hours.contains(&last_accessed_hour) {
        access_count.saturating_add(1)
    } else {
        access_count
    }
}

/// Hours of the day whose activity rate exceeds `mean + 0.5 * stddev`.
///
/// `hourly_rate` must hold 24 buckets; any other length, or a histogram with
/// no activity at all, yields no peak hours. Output is ascending.
pub fn detect_peak_hours(hourly_rate: &[f64]) -> Vec<u8> {
    if hourly_rate.len() != HOURS_PER_DAY {
        return Vec::new();
    }
    let total: f64 = hourly_rate.iter().sum();
    if total == 0.0 {
        return Vec::new();
    }
    let buckets = HOURS_PER_DAY as f64;
    let mean = total / buckets;
    let variance = hourly_rate.iter().map(|rate| (rate - mean).powi(2)).sum::<f64>() / buckets;
    let threshold = mean + 0.5 * variance.sqrt();

    (0u8..)
        .zip(hourly_rate)
        .filter(|&(_, &rate)| rate > threshold)
        .map(|(hour, _)| hour)
        .collect()
}

#[inline]
fn stability(access_count: u32, config: &DecayConfig) -> f64 {
    1.0 + config.access_stability_k * f64::from(access_count).ln_1p()
}

#[inline]
fn channel_boost(channel_mentions: u32, config: &DecayConfig) -> f64 {
    1.0 / (1.0 + config.channel_diversity_k * f64::from(channel_mentions))
}

#[inline]
fn recency_paradox(hours_passed: f64, last_access_hours: Option<f64>) -> bool {
    matches!(
        last_access_hours,
        Some(last) if hours_passed > RECENCY_AGE_HOURS && last < RECENCY_ACCESS_HOURS
    )
}

/// Decayed importance for a single memory.
///
/// Formula: importance * exp(-rate * hours), where
/// rate = base * type_multiplier * channel_boost / stability * (1 - resistance).
/// Old memories revisited within the last day get a 30% boost, and the result
/// never drops below `importance * min_retention`.
pub fn calculate(input: &DecayInput, config: &DecayConfig) -> f64 {
    let Some(hours_passed) = input.hours_passed else {
        return input.importance;
    };

    let stability = stability(input.access_count, config);
    let resistance = (f64::from(input.connection_count) * config.relation_resistance_k).min(1.0);
    let type_multiplier = config.type_multipliers[input.memory_type];
    let channel_boost = channel_boost(input.channel_mentions, config);

    let effective_rate =
        config.base_decay_rate * type_multiplier * channel_boost / stability * (1.0 - resistance);
    let mut decayed = input.importance * (-effective_rate * hours_passed).exp();

    if recency_paradox(hours_passed, input.last_access_hours) {
        decayed *= RECENCY_BOOST;
    }

    decayed.max(input.importance * config.min_retention)
}

/// Decayed importance for a batch of memories, in input order.
///
/// Dispatches to the AVX2 lane kernel when the host supports it; every score
/// matches [`calculate`] on the same input.
pub fn calculate_batch(inputs: &[DecayInput], config: &DecayConfig) -> Vec<f64> {
    tracing::debug!(
        len = inputs.len(),
        vectorized = capability::vectorized_path_active(),
        "decay batch"
    );

    let mut scores = vec![0.0; inputs.len()];

    #[cfg(feature = "parallel")]
    if inputs.len() >= PARALLEL_MIN_BATCH {
        use rayon::prelude::*;
        inputs
            .par_chunks(PARALLEL_CHUNK)
            .zip(scores.par_chunks_mut(PARALLEL_CHUNK))
            .for_each(|(chunk, out)| fill(chunk, config, out));
        return scores;
    }

    fill(inputs, config, &mut scores);
    scores
}

/// Reference batch path: [`calculate`] applied element by element.
pub fn calculate_batch_scalar(inputs: &[DecayInput], config: &DecayConfig) -> Vec<f64> {
    inputs.iter().map(|input| calculate(input, config)).collect()
}

fn fill(inputs: &[DecayInput], config: &DecayConfig, out: &mut [f64]) {
    #[cfg(target_arch = "x86_64")]
    if capability::has_avx2() {
        // SAFETY: AVX2 support was detected at runtime just above.
        unsafe { avx2::fill(inputs, config, out) };
        return;
    }

    fill_scalar(inputs, config, out);
}

fn fill_scalar(inputs: &[DecayInput], config: &DecayConfig, out: &mut [f64]) {
    for (input, slot) in inputs.iter().zip(out.iter_mut()) {
        *slot = calculate(input, config);
    }
}

#[cfg(target_arch = "x86_64")]
mod avx2 {
    use std::arch::x86_64::*;

    use super::{channel_boost, fill_scalar, recency_paradox, stability, DecayInput, RECENCY_BOOST};
    use crate::config::DecayConfig;

    const LANES: usize = 4;

    /// Four records per step. The rate arithmetic runs in vector registers in
    /// the same operation order as `calculate`; `ln_1p`, `exp` and the recency
    /// check stay scalar per lane.
    ///
    /// # Safety
    /// Caller must ensure AVX2 is available.
    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn fill(inputs: &[DecayInput], config: &DecayConfig, out: &mut [f64]) {
        let one = _mm256_set1_pd(1.0);
        let base_rate = _mm256_set1_pd(config.base_decay_rate);
        let relation_k = _mm256_set1_pd(config.relation_resistance_k);
        let min_retention = _mm256_set1_pd(config.min_retention);

        let mut lanes = inputs.chunks_exact(LANES);
        let mut outs = out.chunks_exact_mut(LANES);

        for (lane, dst) in (&mut lanes).zip(&mut outs) {
            let mut importance = [0.0; LANES];
            let mut connections = [0.0; LANES];
            let mut stab = [0.0; LANES];
            let mut type_mult = [0.0; LANES];
            let mut boost = [0.0; LANES];
            for (k, input) in lane.iter().enumerate() {
                importance[k] = input.importance;
                connections[k] = f64::from(input.connection_count);
                stab[k] = stability(input.access_count, config);
                type_mult[k] = config.type_multipliers[input.memory_type];
                boost[k] = channel_boost(input.channel_mentions, config);
            }

            let resistance = _mm256_min_pd(
                _mm256_mul_pd(_mm256_loadu_pd(connections.as_ptr()), relation_k),
                one,
            );
            let mut rate = _mm256_mul_pd(base_rate, _mm256_loadu_pd(type_mult.as_ptr()));
            rate = _mm256_mul_pd(rate, _mm256_loadu_pd(boost.as_ptr()));
            rate = _mm256_div_pd(rate, _mm256_loadu_pd(stab.as_ptr()));
            rate = _mm256_mul_pd(rate, _mm256_sub_pd(one, resistance));

            let mut rates = [0.0; LANES];
            _mm256_storeu_pd(rates.as_mut_ptr(), rate);

            let mut decayed = [0.0; LANES];
            for (k, input) in lane.iter().enumerate() {
                let hours = input.hours_passed.unwrap_or(0.0);
                decayed[k] = input.importance * (-rates[k] * hours).exp();
                if recency_paradox(hours, input.last_access_hours) {
                    decayed[k] *= RECENCY_BOOST;
                }
            }

            let imp = _mm256_loadu_pd(importance.as_ptr());
            let floored = _mm256_max_pd(
                _mm256_loadu_pd(decayed.as_ptr()),
                _mm256_mul_pd(imp, min_retention),
            );
            _mm256_storeu_pd(dst.as_mut_ptr(), floored);

            // Not-yet-valid records keep their importance untouched.
            for (k, input) in lane.iter().enumerate() {
                if input.hours_passed.is_none() {
                    dst[k] = input.importance;
                }
            }
        }

        fill_scalar(lanes.remainder(), config, outs.into_remainder());
    }
}

/// Parallel raw arrays, one element per record, sentinel-encoded as in
/// [`DecayInput::from_raw`].
#[derive(Debug, Clone, Copy)]
pub struct DecayColumns<'a> {
    pub importance: &'a [f64],
    pub hours_passed: &'a [f64],
    pub access_count: &'a [i64],
    pub connection_count: &'a [i64],
    pub last_access_hours: &'a [f64],
    pub memory_type: &'a [i64],
    pub channel_mentions: &'a [i64],
}

impl DecayColumns<'_> {
    pub fn len(&self) -> usize {
        self.importance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.importance.is_empty()
    }

    fn check_lengths(&self) -> AccelResult<()> {
        let expected = self.len();
        let lengths = [
            ("hours_passed", self.hours_passed.len()),
            ("access_count", self.access_count.len()),
            ("connection_count", self.connection_count.len()),
            ("last_access_hours", self.last_access_hours.len()),
            ("memory_type", self.memory_type.len()),
            ("channel_mentions", self.channel_mentions.len()),
        ];
        match lengths.iter().find(|(_, actual)| *actual != expected) {
            Some(&(column, actual)) => Err(AccelError::ColumnLength {
                column,
                expected,
                actual,
            }),
            None => Ok(()),
        }
    }

    fn to_inputs(self) -> Vec<DecayInput> {
        (0..self.len())
            .map(|i| {
                DecayInput::from_raw(
                    self.importance[i],
                    self.hours_passed[i],
                    self.access_count[i],
                    self.connection_count[i],
                    self.last_access_hours[i],
                    self.memory_type[i],
                    self.channel_mentions[i],
                )
            })
            .collect()
    }
}

/// Batch decay over parallel columns. Fails without a partial result when
/// any column length disagrees with `importance`.
pub fn calculate_batch_columns(
    columns: &DecayColumns<'_>,
    config: &DecayConfig,
) -> AccelResult<Vec<f64>> {
    columns.check_lengths()?;
    Ok(calculate_batch(&columns.to_inputs(), config))
}
