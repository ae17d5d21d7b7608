//! Adaptive search for a re-encoding at or under a byte budget.
//!
//! Policy entries are tried in order and the first one that fits is taken,
//! even if a later entry would have produced fewer bytes. When nothing fits,
//! a single emergency encode is returned whether or not it fits; callers read
//! [`CompressedImage::within_budget`] instead of assuming compliance.

use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::ports::{CodecError, ImageCodec};
use crate::domain::value_objects::{PolicyEntry, Quality, Scale, DEFAULT_POLICY, EMERGENCY_ENTRY};

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("All {attempts} encode attempts failed, last error: {last_error}")]
    AllAttemptsFailed { attempts: usize, last_error: String },
}

/// One encode tried during a search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionAttempt {
    pub entry: PolicyEntry,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
}

/// Search outcome
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    pub scale: Scale,
    /// Encoded size is at or under the requested budget
    pub within_budget: bool,
    /// Produced by the emergency parameters (or the smallest fallback)
    pub emergency: bool,
    pub attempts: Vec<CompressionAttempt>,
}

impl CompressedImage {
    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

struct Candidate {
    attempt: CompressionAttempt,
    bytes: Vec<u8>,
}

pub struct CompressionEngine {
    codec: Arc<dyn ImageCodec>,
    policy: Vec<PolicyEntry>,
    emergency: PolicyEntry,
}

impl CompressionEngine {
    pub fn new(codec: Arc<dyn ImageCodec>) -> Self {
        Self::with_policy(codec, DEFAULT_POLICY.to_vec(), EMERGENCY_ENTRY)
    }

    pub fn with_policy(
        codec: Arc<dyn ImageCodec>,
        policy: Vec<PolicyEntry>,
        emergency: PolicyEntry,
    ) -> Self {
        Self {
            codec,
            policy,
            emergency,
        }
    }

    pub fn policy(&self) -> &[PolicyEntry] {
        &self.policy
    }

    pub fn codec(&self) -> &Arc<dyn ImageCodec> {
        &self.codec
    }

    /// Find an encoding of `image` at or under `budget_bytes` (best effort)
    pub fn compress(
        &self,
        image: &DynamicImage,
        budget_bytes: u64,
    ) -> Result<CompressedImage, CompressionError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(CompressionError::EmptyImage { width, height });
        }

        let mut attempts = Vec::with_capacity(self.policy.len() + 1);
        let mut smallest: Option<Candidate> = None;

        for entry in &self.policy {
            let candidate = match self.encode(image, *entry) {
                Ok(candidate) => candidate,
                Err(e) => {
                    debug!(%entry, error = %e, "encode attempt failed");
                    continue;
                }
            };
            attempts.push(candidate.attempt);
            debug!(
                %entry,
                bytes = candidate.attempt.byte_size,
                budget = budget_bytes,
                "encode attempt"
            );

            if candidate.attempt.byte_size <= budget_bytes {
                info!(
                    %entry,
                    bytes = candidate.attempt.byte_size,
                    budget = budget_bytes,
                    "Compression met budget"
                );
                return Ok(Self::finish(candidate, true, false, attempts));
            }

            let is_smaller = smallest
                .as_ref()
                .map(|best| candidate.attempt.byte_size < best.attempt.byte_size)
                .unwrap_or(true);
            if is_smaller {
                smallest = Some(candidate);
            }
        }

        if let Some(best) = &smallest {
            warn!(
                smallest = best.attempt.byte_size,
                budget = budget_bytes,
                "No policy entry met budget, using emergency encode"
            );
        }

        match self.encode(image, self.emergency) {
            Ok(candidate) => {
                attempts.push(candidate.attempt);
                let within_budget = candidate.attempt.byte_size <= budget_bytes;
                if !within_budget {
                    warn!(
                        bytes = candidate.attempt.byte_size,
                        budget = budget_bytes,
                        "Emergency encode still exceeds budget"
                    );
                }
                Ok(Self::finish(candidate, within_budget, true, attempts))
            }
            Err(e) => match smallest {
                Some(best) => {
                    warn!(error = %e, "Emergency encode failed, keeping smallest attempt");
                    Ok(Self::finish(best, false, true, attempts))
                }
                None => Err(CompressionError::AllAttemptsFailed {
                    attempts: self.policy.len() + 1,
                    last_error: e.to_string(),
                }),
            },
        }
    }

    fn encode(
        &self,
        image: &DynamicImage,
        entry: PolicyEntry,
    ) -> Result<Candidate, CodecError> {
        let (width, height) = entry.target_dimensions(image.width(), image.height());
        let bytes = self.codec.encode(image, width, height, entry.quality)?;
        Ok(Candidate {
            attempt: CompressionAttempt {
                entry,
                width,
                height,
                byte_size: bytes.len() as u64,
            },
            bytes,
        })
    }

    fn finish(
        candidate: Candidate,
        within_budget: bool,
        emergency: bool,
        attempts: Vec<CompressionAttempt>,
    ) -> CompressedImage {
        CompressedImage {
            width: candidate.attempt.width,
            height: candidate.attempt.height,
            quality: candidate.attempt.entry.quality,
            scale: candidate.attempt.entry.scale,
            bytes: candidate.bytes,
            within_budget,
            emergency,
            attempts,
        }
    }
}
