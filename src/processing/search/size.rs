//! Size mode: bounded search onto a byte budget.
//!
//! Encoders have no "produce N bytes" knob, so the search encodes once at
//! the configured starting quality and then walks a short list of cheaper
//! candidates. Lossy formats trade quality, lossless formats trade pixels.
//! The best candidate seen is kept even when the budget is never met, as
//! long as it beats the original.

use tracing::{debug, warn};

use crate::core::{CompressionConfig, CompressionResult, Dimensions};
use crate::processing::codec::{EncodeRequest, Encoded, Resize, resize};
use crate::utils::{OptimizerError, OptimizerResult};

use super::{AdaptiveSearch, SearchLimits, square};

/// Outcome of comparing a candidate with its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Within budget and smaller than the original
    Reached,
    /// No smaller than the previous candidate
    Stalled,
    Continue,
}

/// When the search may stop.
#[derive(Debug, Clone, Copy)]
pub struct StopPolicy {
    pub target_bytes: u64,
    pub original_size: u64,
}

impl StopPolicy {
    pub fn satisfied(&self, size: u64) -> bool {
        size <= self.target_bytes && size < self.original_size
    }

    pub fn verdict(&self, previous: u64, current: u64) -> Verdict {
        if self.satisfied(current) {
            Verdict::Reached
        } else if current >= previous {
            Verdict::Stalled
        } else {
            Verdict::Continue
        }
    }
}

/// Produces the refinement requests that follow the baseline encode.
///
/// Lossy formats decay the quality geometrically down to a floor. Lossless
/// formats scale the dimensions by `sqrt(target / current * safety)` and
/// give up once a step would move both edges by less than the stall
/// threshold.
#[derive(Debug, Clone)]
pub struct Candidates {
    base: EncodeRequest,
    limits: SearchLimits,
    target_bytes: u64,
    step: i32,
}

impl Candidates {
    pub fn new(base: EncodeRequest, limits: SearchLimits, target_bytes: u64) -> Self {
        Self {
            base,
            limits,
            target_bytes,
            step: 0,
        }
    }

    /// Next request given the dimensions and size of the last encode.
    pub fn next(&mut self, current: Dimensions, current_size: u64) -> Option<EncodeRequest> {
        self.step += 1;

        if self.base.format.has_quality_lever() {
            let quality = (self.base.quality * self.limits.quality_decay.powi(self.step))
                .max(self.limits.min_quality);
            return Some(EncodeRequest { quality, ..self.base });
        }

        if current_size == 0 {
            return None;
        }

        let scale = (self.target_bytes as f64 / current_size as f64 * self.limits.shrink_safety).sqrt();
        let next = resize::scale_by(current, scale, self.limits.min_edge);
        let stall = self.limits.stall_px;
        if next.width.abs_diff(current.width) < stall && next.height.abs_diff(current.height) < stall {
            debug!(
                "Resize step {}×{} → {}×{} is below {}px, stopping",
                current.width, current.height, next.width, next.height, stall
            );
            return None;
        }

        Some(EncodeRequest {
            resize: Some(Resize::Exact(next)),
            ..self.base
        })
    }
}

/// Smallest acceptable candidate so far.
#[derive(Debug)]
pub struct BestSoFar {
    original_size: u64,
    best: Option<Encoded>,
    smallest_seen: Option<u64>,
}

impl BestSoFar {
    pub fn new(original_size: u64) -> Self {
        Self {
            original_size,
            best: None,
            smallest_seen: None,
        }
    }

    /// Keeps `candidate` when it beats both the original and the current best.
    pub fn offer(&mut self, candidate: Encoded) {
        let size = candidate.size();
        self.smallest_seen = Some(self.smallest_seen.map_or(size, |s| s.min(size)));

        let improves = size < self.original_size && self.best.as_ref().is_none_or(|b| size < b.size());
        if improves {
            self.best = Some(candidate);
        }
    }

    pub fn best_size(&self) -> Option<u64> {
        self.best.as_ref().map(Encoded::size)
    }

    pub fn into_result(self, attempts: u32) -> OptimizerResult<CompressionResult> {
        match self.best {
            Some(best) => Ok(CompressionResult::new(
                best.bytes,
                self.original_size,
                attempts,
                Some(best.dimensions),
            )),
            None => Err(OptimizerError::Convergence {
                attempts,
                original_size: self.original_size,
                best_size: self.smallest_seen.unwrap_or(self.original_size),
            }),
        }
    }
}

/// Downscale-only constraint applied to every size-mode encode.
fn size_constraint(config: &CompressionConfig, limits: &SearchLimits) -> Option<Resize> {
    let edge = config.max_longest_edge;

    if !config.output_format.has_quality_lever() {
        return match config.max_box() {
            Some(bounds) if config.keep_aspect_ratio => Some(Resize::FitWithin(bounds)),
            _ => Some(Resize::FitWithin(square(edge))),
        };
    }

    (edge < limits.large_edge_cutoff).then(|| Resize::FitWithin(square(edge)))
}

pub(super) fn run(
    search: &AdaptiveSearch,
    source: &[u8],
    config: &CompressionConfig,
    progress: &dyn Fn(f64),
) -> OptimizerResult<CompressionResult> {
    // A byte budget always outranks the resolution lock.
    let config = &CompressionConfig {
        always_keep_resolution: false,
        ..config.clone()
    };
    let limits = search.limits();
    let original_size = source.len() as u64;
    let policy = StopPolicy {
        target_bytes: config.target_bytes(),
        original_size,
    };

    if original_size <= policy.target_bytes {
        debug!(
            "Original {} bytes already within {} byte budget",
            original_size, policy.target_bytes
        );
        progress(1.0);
        return Ok(CompressionResult::passthrough(source, 0));
    }

    let mut attempts = 0;
    let working = search.working_source(source, config, progress, &mut attempts)?;

    let base = EncodeRequest {
        resize: size_constraint(config, limits),
        quality: config.initial_quality,
        format: config.output_format,
    };
    let baseline = search.codec().transcode(&working, &base, progress)?;
    attempts += 1;

    let mut previous = (baseline.dimensions, baseline.size());
    let mut best = BestSoFar::new(original_size);
    best.offer(baseline);
    debug!(
        "Baseline encode: {} bytes (budget {}, original {})",
        previous.1, policy.target_bytes, original_size
    );

    if !policy.satisfied(previous.1) {
        let mut candidates = Candidates::new(base, limits.clone(), policy.target_bytes);

        for _ in 0..limits.max_refinements {
            let Some(request) = candidates.next(previous.0, previous.1) else {
                break;
            };

            let encoded = match search.codec().transcode(&working, &request, progress) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!("Refinement attempt {} failed, keeping best so far: {}", attempts + 1, e);
                    break;
                }
            };
            attempts += 1;

            let current = (encoded.dimensions, encoded.size());
            best.offer(encoded);
            debug!(
                "Attempt {}: {} bytes at quality {:.3}",
                attempts, current.1, request.quality
            );

            match policy.verdict(previous.1, current.1) {
                Verdict::Reached => break,
                Verdict::Stalled => {
                    debug!("No further shrink ({} → {} bytes), stopping", previous.1, current.1);
                    break;
                }
                Verdict::Continue => previous = current,
            }
        }
    }

    if let Some(size) = best.best_size().filter(|&size| size > policy.target_bytes) {
        debug!("Budget missed, using best result {} bytes", size);
    }
    best.into_result(attempts)
}
